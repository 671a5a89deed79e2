//! Concurrency scheduling.
//!
//! The scheduler only knows how to start sessions and wait for them to reach a
//! terminal state; what a session does is behind [`SessionRunner`].

pub mod fixed;
pub mod pool;
pub mod ramping;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProfileError;
use crate::profile::LoadProfile;
use crate::reporter::{NullSink, OutcomeSink};
use crate::session::SessionReport;

pub use pool::{PoolSlot, SessionPool};
pub use ramping::ArrivalSchedule;

/// Constructs a session and drives it to `Closed` or `Abandoned`
#[async_trait]
pub trait SessionRunner: Send + Sync + 'static {
    async fn run_session(&self, session_id: u64, iterations: u32) -> SessionReport;
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sessions_started: usize,
    pub sessions_closed: usize,
    pub sessions_abandoned: usize,
    pub arrivals_dropped: usize,
    pub peak_concurrency: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub(crate) fn record(&mut self, report: &SessionReport) {
        if report.is_closed() {
            self.sessions_closed += 1;
        } else {
            self.sessions_abandoned += 1;
        }
    }

    pub(crate) fn record_join(&mut self, result: Result<SessionReport, tokio::task::JoinError>) {
        match result {
            Ok(report) => self.record(&report),
            Err(e) => {
                tracing::error!("Session task panicked: {}", e);
                self.sessions_abandoned += 1;
            }
        }
    }

    pub fn sessions_finished(&self) -> usize {
        self.sessions_closed + self.sessions_abandoned
    }
}

/// Runs a [`LoadProfile`] against a [`SessionRunner`]
pub struct Scheduler {
    runner: Arc<dyn SessionRunner>,
    sink: Arc<dyn OutcomeSink>,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn SessionRunner>) -> Self {
        Self {
            runner,
            sink: Arc::new(NullSink),
        }
    }

    /// Sink notified about dropped arrivals
    pub fn with_sink(mut self, sink: Arc<dyn OutcomeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Validate the profile, then run it to completion
    pub async fn run(&self, profile: &LoadProfile) -> Result<RunSummary, ProfileError> {
        profile.validate()?;
        let summary = match profile {
            LoadProfile::PerWorkerIterations(p) => fixed::run(p, self.runner.clone()).await,
            LoadProfile::RampingArrivalRate(p) => {
                ramping::run(p, self.runner.clone(), self.sink.clone()).await
            }
        };
        tracing::info!(
            started = summary.sessions_started,
            closed = summary.sessions_closed,
            abandoned = summary.sessions_abandoned,
            dropped = summary.arrivals_dropped,
            peak = summary.peak_concurrency,
            "Run complete in {:.2}s",
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    struct InstantRunner;

    #[async_trait]
    impl SessionRunner for InstantRunner {
        async fn run_session(&self, session_id: u64, iterations: u32) -> SessionReport {
            SessionReport {
                session_id,
                final_state: SessionState::Closed,
                abandon_reason: None,
                iterations_completed: iterations,
                requests_issued: 0,
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_profile_is_rejected_before_running() {
        let scheduler = Scheduler::new(Arc::new(InstantRunner));
        let err = scheduler.run(&LoadProfile::fixed(0, 1)).await.unwrap_err();
        assert_eq!(err, ProfileError::NoWorkers);
    }

    #[tokio::test]
    async fn test_dispatches_fixed_profile() {
        let scheduler = Scheduler::new(Arc::new(InstantRunner));
        let summary = scheduler.run(&LoadProfile::fixed(4, 2)).await.unwrap();
        assert_eq!(summary.sessions_started, 4);
        assert_eq!(summary.sessions_closed, 4);
    }
}
