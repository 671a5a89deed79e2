//! Session workflow: the ordered banking operations one simulated user performs.
//!
//! ```text
//! Unauthenticated -> Authenticated -> AccountsProvisioned -> Operating -> Closing -> Closed
//!        \                 \
//!         `----------------`-------------------> Abandoned
//! ```
//!
//! Login and account creation are hard dependencies: a failure there abandons
//! the session and nothing else is sent. Every other failure is classified by
//! the harness and the session carries on.

use async_trait::async_trait;
use futures::future::join_all;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ProfileError;
use crate::harness::{Outcome, RequestHarness};
use crate::request::{AccountType, OperationRequest};
use crate::scheduler::SessionRunner;
use crate::session::{AbandonReason, Session, SessionReport, SessionState};

/// Inclusive range amounts are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    pub const DEPOSIT: AmountRange = AmountRange {
        min: 90.0,
        max: 200.0,
    };
    pub const WITHDRAW: AmountRange = AmountRange {
        min: 20.0,
        max: 80.0,
    };

    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(self.min >= 0.0 && self.min <= self.max && self.max.is_finite()) {
            return Err(ProfileError::InvalidAmountRange {
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(())
    }

    /// Uniform draw rounded to two decimal places
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let raw = if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        };
        ((raw * 100.0).round() / 100.0).clamp(self.min, self.max)
    }
}

/// What a session does once it is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    /// One entry per account to create, fired as a single batch
    pub account_types: Vec<AccountType>,
    #[serde(default = "default_deposit")]
    pub deposit: AmountRange,
    #[serde(default = "default_withdraw")]
    pub withdraw: AmountRange,
}

fn default_deposit() -> AmountRange {
    AmountRange::DEPOSIT
}

fn default_withdraw() -> AmountRange {
    AmountRange::WITHDRAW
}

impl WorkflowPlan {
    pub fn new(account_types: Vec<AccountType>) -> Self {
        Self {
            account_types,
            deposit: AmountRange::DEPOSIT,
            withdraw: AmountRange::WITHDRAW,
        }
    }

    /// One checking account
    pub fn smoke() -> Self {
        Self::new(vec![AccountType::Checking])
    }

    /// A checking and a saving account
    pub fn stress() -> Self {
        Self::new(vec![AccountType::Checking, AccountType::Saving])
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(1..=2).contains(&self.account_types.len()) {
            return Err(ProfileError::InvalidAccountCount(self.account_types.len()));
        }
        self.deposit.validate()?;
        self.withdraw.validate()
    }
}

impl Default for WorkflowPlan {
    fn default() -> Self {
        Self::smoke()
    }
}

/// Drives sessions through the banking workflow
#[derive(Clone)]
pub struct SessionWorkflow {
    harness: RequestHarness,
    plan: WorkflowPlan,
}

impl SessionWorkflow {
    pub fn new(harness: RequestHarness, plan: WorkflowPlan) -> Self {
        Self { harness, plan }
    }

    pub fn plan(&self) -> &WorkflowPlan {
        &self.plan
    }

    /// Run one session to a terminal state and report it to the sink.
    pub async fn run(&self, session_id: u64, iterations: u32) -> SessionReport {
        let mut session = Session::new(session_id);
        self.harness.sink().record_session_start(session_id);
        self.drive(&mut session, iterations).await;
        let report = session.report();
        self.harness.sink().record_session(&report);
        report
    }

    /// Advance `session` until it is `Closed` or `Abandoned`.
    pub async fn drive(&self, session: &mut Session, iterations: u32) {
        if !self.authenticate(session).await {
            return;
        }
        if !self.provision_accounts(session).await {
            return;
        }

        session.transition_to(SessionState::Operating);
        let iterations = iterations.max(1);
        loop {
            self.run_iteration(session).await;
            let is_final = session.iteration_index() + 1 >= iterations;
            session.advance_iteration();
            if is_final {
                self.close_accounts(session).await;
                break;
            }
        }
        session.transition_to(SessionState::Closed);
    }

    async fn issue(&self, session: &mut Session, request: OperationRequest) -> Outcome {
        session.count_requests(1);
        self.harness.call(&request).await
    }

    /// `Unauthenticated -> Authenticated`, or abandon
    pub async fn authenticate(&self, session: &mut Session) -> bool {
        let outcome = self.issue(session, OperationRequest::login()).await;
        if !outcome.all_passed() {
            session.abandon(AbandonReason::LoginFailed);
            return false;
        }

        let token = outcome.json_str("token").unwrap_or_default().to_string();
        if token.is_empty() {
            session.abandon(AbandonReason::MissingToken);
            return false;
        }

        session.set_token(token);
        session.transition_to(SessionState::Authenticated);
        true
    }

    /// `Authenticated -> AccountsProvisioned`, or abandon.
    ///
    /// All creations are sent together and joined before any result is inspected.
    pub async fn provision_accounts(&self, session: &mut Session) -> bool {
        let requests: Vec<_> = self
            .plan
            .account_types
            .iter()
            .map(|account_type| OperationRequest::create_account(session.token(), *account_type))
            .collect();
        session.count_requests(requests.len());

        let outcomes = join_all(requests.iter().map(|r| self.harness.call(r))).await;

        let mut ids = Vec::with_capacity(outcomes.len());
        for outcome in &outcomes {
            if !outcome.all_passed() {
                session.abandon(AbandonReason::AccountCreationFailed);
                return false;
            }
            match outcome.json_str("accountID") {
                Some(id) if !id.is_empty() => ids.push(id.to_string()),
                _ => {
                    session.abandon(AbandonReason::MissingAccountId);
                    return false;
                }
            }
        }

        session.set_account_ids(ids);
        session.transition_to(SessionState::AccountsProvisioned);
        true
    }

    /// One pass of reads, deposits and withdrawals over every owned account.
    ///
    /// A withdrawal is only sent for accounts whose deposit passed in this pass.
    pub async fn run_iteration(&self, session: &mut Session) {
        let token = session.token().to_string();
        let ids = session.account_ids().to_vec();

        self.issue(session, OperationRequest::get_all_accounts(&token))
            .await;

        for id in &ids {
            self.issue(session, OperationRequest::get_account(&token, id))
                .await;
        }

        let mut deposited = Vec::with_capacity(ids.len());
        for id in &ids {
            let amount = self.plan.deposit.sample(&mut rand::thread_rng());
            let outcome = self
                .issue(session, OperationRequest::deposit(&token, id, amount))
                .await;
            if outcome.all_passed() {
                deposited.push(id);
            } else {
                tracing::debug!(
                    session = session.id(),
                    account = %id,
                    "deposit failed, skipping withdraw"
                );
            }
        }

        for id in deposited {
            let amount = self.plan.withdraw.sample(&mut rand::thread_rng());
            self.issue(session, OperationRequest::withdraw(&token, id, amount))
                .await;
        }
    }

    /// Close then delete every owned account. Delete is attempted even if close failed.
    pub async fn close_accounts(&self, session: &mut Session) {
        session.transition_to(SessionState::Closing);
        let token = session.token().to_string();
        let ids = session.account_ids().to_vec();

        for id in &ids {
            self.issue(session, OperationRequest::close_account(&token, id))
                .await;
            self.issue(session, OperationRequest::delete_account(&token, id))
                .await;
        }
    }
}

#[async_trait]
impl SessionRunner for SessionWorkflow {
    async fn run_session(&self, session_id: u64, iterations: u32) -> SessionReport {
        self.run(session_id, iterations).await
    }
}
