#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bankload_core::{
    CheckEvent, HttpResponse, Operation, OperationRequest, OutcomeSink, RequestEvent,
    RequestHarness, SessionReport, SessionWorkflow, Transport, TransportError, WorkflowPlan,
    JSON_CONTENT_TYPE,
};

/// What the scripted transport answers with
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(HttpResponse),
    Fail,
}

pub fn json(status: u16, body: &str) -> Reply {
    Reply::Respond(HttpResponse::new(
        status,
        vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
        body,
    ))
}

pub fn empty(status: u16) -> Reply {
    Reply::Respond(HttpResponse::new(status, vec![], ""))
}

/// In-memory banking API. Answers like a healthy server unless a reply is queued
/// for an operation, in which case queued replies are consumed first.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<Operation, VecDeque<Reply>>>,
    requests: Mutex<Vec<OperationRequest>>,
    accounts_created: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Hold every request open for `delay` so overlapping calls can be observed
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn queue(&self, operation: Operation, reply: Reply) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<OperationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.operation() == operation)
            .count()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.operation())
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn default_reply(&self, request: &OperationRequest) -> Reply {
        match request.operation() {
            Operation::GetToken => json(200, r#"{"token":"abc"}"#),
            Operation::CreateAccount => {
                let n = self.accounts_created.fetch_add(1, Ordering::SeqCst) + 1;
                json(201, &format!(r#"{{"accountID":"acc-{}"}}"#, n))
            }
            Operation::GetAllAccounts => json(200, "[]"),
            Operation::GetAccount => json(200, r#"{"amount":0}"#),
            Operation::Deposit
            | Operation::Withdraw
            | Operation::CloseAccount
            | Operation::DeleteAccount => empty(204),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &OperationRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&request.operation())
            .and_then(VecDeque::pop_front);
        let reply = queued.unwrap_or_else(|| self.default_reply(request));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail => Err(TransportError::Connect {
                url: format!("http://localhost:8080/api/v1{}", request.path()),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Keeps every event it is given
#[derive(Default)]
pub struct RecordingSink {
    pub checks: Mutex<Vec<CheckEvent>>,
    pub requests: Mutex<Vec<RequestEvent>>,
    pub sessions: Mutex<Vec<SessionReport>>,
    pub dropped: AtomicUsize,
}

impl RecordingSink {
    pub fn checks(&self) -> Vec<CheckEvent> {
        self.checks.lock().unwrap().clone()
    }

    pub fn failed_checks(&self) -> Vec<(&'static str, String)> {
        self.checks()
            .into_iter()
            .filter(|c| !c.passed)
            .map(|c| (c.tag, c.check))
            .collect()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.requests.lock().unwrap().iter().map(|r| r.tag).collect()
    }
}

impl OutcomeSink for RecordingSink {
    fn record_check(&self, event: CheckEvent) {
        self.checks.lock().unwrap().push(event);
    }

    fn record_request(&self, event: RequestEvent) {
        self.requests.lock().unwrap().push(event);
    }

    fn record_session(&self, report: &SessionReport) {
        self.sessions.lock().unwrap().push(report.clone());
    }

    fn record_dropped_arrival(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Fixture {
    pub transport: Arc<ScriptedTransport>,
    pub sink: Arc<RecordingSink>,
    pub workflow: SessionWorkflow,
}

pub fn fixture(transport: ScriptedTransport, plan: WorkflowPlan) -> Fixture {
    let transport = Arc::new(transport);
    let sink = Arc::new(RecordingSink::default());
    let harness = RequestHarness::new(transport.clone(), sink.clone());
    Fixture {
        transport,
        sink,
        workflow: SessionWorkflow::new(harness, plan),
    }
}
