//! Fixed iterations per worker.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::Instant;

use super::{RunSummary, SessionPool, SessionRunner};
use crate::profile::FixedProfile;

/// Start `workers` sessions at once; each loops `iterations_per_worker` times.
pub async fn run(profile: &FixedProfile, runner: Arc<dyn SessionRunner>) -> RunSummary {
    let start = Instant::now();
    let pool = SessionPool::new(profile.workers as usize);
    let mut summary = RunSummary::default();
    let mut sessions = JoinSet::new();

    tracing::info!(
        "Starting {} workers, {} iterations each",
        profile.workers,
        profile.iterations_per_worker
    );

    for worker in 1..=u64::from(profile.workers) {
        let Some(slot) = pool.try_acquire() else {
            break;
        };
        let runner = runner.clone();
        let iterations = profile.iterations_per_worker;
        sessions.spawn(async move {
            let _slot = slot;
            runner.run_session(worker, iterations).await
        });
        summary.sessions_started += 1;
    }

    while let Some(result) = sessions.join_next().await {
        summary.record_join(result);
        tracing::debug!(
            "Waited for {}/{} workers to complete",
            summary.sessions_finished(),
            summary.sessions_started
        );
    }

    summary.peak_concurrency = pool.peak();
    summary.elapsed = start.elapsed();
    summary
}
