//! Request harness: one tagged call, classified against its expectations.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use crate::expectation::{ExpectationSet, TRANSPORT_ERROR_CHECK};
use crate::reporter::{CheckEvent, OutcomeSink, RequestEvent};
use crate::request::OperationRequest;
use crate::transport::{HttpResponse, Transport};

const BODY_SNIPPET_LEN: usize = 256;

/// Classified result of one request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    tag: &'static str,
    all_passed: bool,
    failed_checks: BTreeSet<String>,
    status: u16,
    body_snippet: String,
    latency: std::time::Duration,
    json: Option<Value>,
}

impl Outcome {
    fn from_response(
        tag: &'static str,
        response: &HttpResponse,
        failed_checks: BTreeSet<String>,
        latency: std::time::Duration,
    ) -> Self {
        Self {
            tag,
            all_passed: failed_checks.is_empty(),
            failed_checks,
            status: response.status,
            body_snippet: snippet(&response.body),
            latency,
            json: response.json().cloned(),
        }
    }

    fn transport_failure(tag: &'static str, message: String, latency: std::time::Duration) -> Self {
        Self {
            tag,
            all_passed: false,
            failed_checks: BTreeSet::from([TRANSPORT_ERROR_CHECK.to_string()]),
            status: 0,
            body_snippet: snippet(&message),
            latency,
            json: None,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn all_passed(&self) -> bool {
        self.all_passed
    }

    pub fn failed_checks(&self) -> &BTreeSet<String> {
        &self.failed_checks
    }

    pub fn has_failed(&self, check: &str) -> bool {
        self.failed_checks.contains(check)
    }

    /// 0 when the transport failed
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body_snippet(&self) -> &str {
        &self.body_snippet
    }

    pub fn latency(&self) -> std::time::Duration {
        self.latency
    }

    pub fn is_transport_error(&self) -> bool {
        self.has_failed(TRANSPORT_ERROR_CHECK)
    }

    /// Top-level string field of the JSON response body
    pub fn json_str(&self, field: &str) -> Option<&str> {
        self.json.as_ref()?.get(field)?.as_str()
    }
}

fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Issues requests through a [`Transport`] and reports classified outcomes.
#[derive(Clone)]
pub struct RequestHarness {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn OutcomeSink>,
}

impl RequestHarness {
    pub fn new(transport: Arc<dyn Transport>, sink: Arc<dyn OutcomeSink>) -> Self {
        Self { transport, sink }
    }

    pub fn sink(&self) -> &Arc<dyn OutcomeSink> {
        &self.sink
    }

    /// Execute with the expectations declared for the request's operation
    pub async fn call(&self, request: &OperationRequest) -> Outcome {
        let expectations = ExpectationSet::for_operation(request.operation());
        self.execute(request, &expectations).await
    }

    /// Send the request exactly once and evaluate every expectation.
    ///
    /// Never fails: transport errors become an outcome with status 0 and a
    /// single failed `transport-error` check.
    pub async fn execute(&self, request: &OperationRequest, expectations: &ExpectationSet) -> Outcome {
        let tag = request.tag();
        let start = Instant::now();
        let result = self.transport.send(request).await;
        let latency = start.elapsed();

        let outcome = match result {
            Ok(response) => {
                let mut failed = BTreeSet::new();
                for check in expectations.evaluate(&response) {
                    if !check.passed {
                        failed.insert(check.name.clone());
                    }
                    self.sink.record_check(CheckEvent {
                        tag,
                        check: check.name,
                        passed: check.passed,
                        timestamp: Utc::now(),
                    });
                }
                Outcome::from_response(tag, &response, failed, latency)
            }
            Err(e) => {
                self.sink.record_check(CheckEvent {
                    tag,
                    check: TRANSPORT_ERROR_CHECK.to_string(),
                    passed: false,
                    timestamp: Utc::now(),
                });
                Outcome::transport_failure(tag, e.to_string(), latency)
            }
        };

        self.sink.record_request(RequestEvent {
            tag,
            status: outcome.status,
            passed: outcome.all_passed,
            latency,
            timestamp: Utc::now(),
        });

        if !outcome.all_passed {
            tracing::warn!(
                tag,
                status = outcome.status,
                failed = ?outcome.failed_checks,
                "{} failed: {} {}",
                tag,
                outcome.status,
                outcome.body_snippet
            );
        }

        outcome
    }
}
