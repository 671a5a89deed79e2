//! Declarative response checks.
//!
//! An [`ExpectationSet`] maps check names to predicates over an
//! [`HttpResponse`]. The harness evaluates every check, in declaration order,
//! for every response.

use std::fmt;
use std::sync::Arc;

use crate::request::Operation;
use crate::transport::HttpResponse;

/// Content type the banking API returns for JSON bodies
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Name of the synthetic check recorded when the transport fails
pub const TRANSPORT_ERROR_CHECK: &str = "transport-error";

pub type Predicate = Arc<dyn Fn(&HttpResponse) -> bool + Send + Sync>;

#[derive(Clone)]
struct Check {
    name: String,
    predicate: Predicate,
}

/// Ordered set of named checks for one operation type
#[derive(Clone, Default)]
pub struct ExpectationSet {
    checks: Vec<Check>,
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named check. A later check with the same name replaces the earlier one.
    pub fn check<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&HttpResponse) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let predicate: Predicate = Arc::new(predicate);
        match self.checks.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.predicate = predicate,
            None => self.checks.push(Check { name, predicate }),
        }
        self
    }

    /// `status is <code>`
    pub fn status_is(self, code: u16) -> Self {
        self.check(format!("status is {}", code), move |r| r.status == code)
    }

    /// `<field> is present`: the body is a JSON object with a non-empty string field
    pub fn json_field_present(self, field: &'static str) -> Self {
        self.check(format!("{} is present", field), move |r| {
            r.json_str(field).is_some_and(|v| !v.is_empty())
        })
    }

    /// `response is in json`
    pub fn json_content_type(self) -> Self {
        self.check("response is in json", |r| {
            r.content_type() == Some(JSON_CONTENT_TYPE)
        })
    }

    /// The checks each banking operation is held to
    pub fn for_operation(operation: Operation) -> Self {
        match operation {
            Operation::GetToken => Self::new()
                .status_is(200)
                .json_field_present("token")
                .json_content_type(),
            Operation::CreateAccount => Self::new()
                .status_is(201)
                .json_field_present("accountID")
                .json_content_type(),
            Operation::GetAllAccounts | Operation::GetAccount => {
                Self::new().status_is(200).json_content_type()
            }
            Operation::Deposit
            | Operation::Withdraw
            | Operation::CloseAccount
            | Operation::DeleteAccount => Self::new().status_is(204),
        }
    }

    /// Evaluate all checks. None are skipped.
    pub fn evaluate(&self, response: &HttpResponse) -> Vec<CheckResult> {
        self.checks
            .iter()
            .map(|check| CheckResult {
                name: check.name.clone(),
                passed: (check.predicate)(response),
            })
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Debug for ExpectationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
