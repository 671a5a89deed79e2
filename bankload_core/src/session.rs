//! Per-session state.
//!
//! A [`Session`] is owned by exactly one workflow run. Nothing here is shared
//! across sessions.

use std::fmt;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    AccountsProvisioned,
    Operating,
    Closing,
    /// Completed normally
    Closed,
    /// Stopped after a hard-dependency failure
    Abandoned,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Abandoned)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a session stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbandonReason {
    /// Login checks failed
    LoginFailed,
    /// Login passed its checks but the token was empty
    MissingToken,
    /// At least one account creation failed its checks
    AccountCreationFailed,
    /// Account creation passed its checks but returned no id
    MissingAccountId,
    /// The session task panicked
    Panicked,
}

impl fmt::Display for AbandonReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbandonReason::LoginFailed => "login failed",
            AbandonReason::MissingToken => "missing token",
            AbandonReason::AccountCreationFailed => "account creation failed",
            AbandonReason::MissingAccountId => "missing account id",
            AbandonReason::Panicked => "session task panicked",
        };
        f.write_str(s)
    }
}

/// One simulated client's lifetime
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    /// Empty until login succeeds
    token: String,
    account_ids: Vec<String>,
    iteration_index: u32,
    state: SessionState,
    abandon_reason: Option<AbandonReason>,
    history: Vec<SessionState>,
    requests_issued: usize,
}

impl Session {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            token: String::new(),
            account_ids: Vec::new(),
            iteration_index: 0,
            state: SessionState::Unauthenticated,
            abandon_reason: None,
            history: vec![SessionState::Unauthenticated],
            requests_issued: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn account_ids(&self) -> &[String] {
        &self.account_ids
    }

    pub fn iteration_index(&self) -> u32 {
        self.iteration_index
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn terminated(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn abandon_reason(&self) -> Option<AbandonReason> {
        self.abandon_reason
    }

    /// Every state entered, in order
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    pub(crate) fn transition_to(&mut self, state: SessionState) {
        if self.state.is_terminal() || self.state == state {
            return;
        }
        tracing::debug!(session = self.id, from = %self.state, to = %state, "session transition");
        self.history.push(state);
        self.state = state;
    }

    pub(crate) fn abandon(&mut self, reason: AbandonReason) {
        if self.state.is_terminal() {
            return;
        }
        tracing::warn!(session = self.id, state = %self.state, %reason, "session abandoned");
        self.abandon_reason = Some(reason);
        self.transition_to(SessionState::Abandoned);
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = token;
    }

    pub(crate) fn set_account_ids(&mut self, ids: Vec<String>) {
        self.account_ids = ids;
    }

    pub(crate) fn advance_iteration(&mut self) {
        self.iteration_index += 1;
    }

    pub(crate) fn count_requests(&mut self, n: usize) {
        self.requests_issued += n;
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.id,
            final_state: self.state,
            abandon_reason: self.abandon_reason,
            iterations_completed: self.iteration_index,
            requests_issued: self.requests_issued,
        }
    }
}

/// Summary of a finished session, handed to the scheduler and the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session_id: u64,
    pub final_state: SessionState,
    pub abandon_reason: Option<AbandonReason>,
    pub iterations_completed: u32,
    pub requests_issued: usize,
}

impl SessionReport {
    pub fn is_closed(&self) -> bool {
        self.final_state == SessionState::Closed
    }

    pub fn is_abandoned(&self) -> bool {
        self.final_state == SessionState::Abandoned
    }
}
