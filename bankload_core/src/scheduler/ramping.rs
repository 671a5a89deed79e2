//! Ramping arrival rate.
//!
//! Within a stage the rate moves linearly from `r0` to `r1` (arrivals per time
//! unit) over `D` time units, so the arrivals completed after `t` units are
//!
//! ```text
//! A(t) = r0*t + (r1 - r0) * t^2 / (2*D)
//! ```
//!
//! Arrival `n` fires at the `t` where the running total reaches `n`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};

use super::{RunSummary, SessionPool, SessionRunner};
use crate::profile::{RampingProfile, Stage};
use crate::reporter::OutcomeSink;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Offset from run start
    start: Duration,
    /// Length in time units
    units: f64,
    r0: f64,
    r1: f64,
}

impl Segment {
    fn total(&self) -> f64 {
        (self.r0 + self.r1) * self.units / 2.0
    }

    /// Time units into the segment at which `a` arrivals have accumulated
    fn time_for(&self, a: f64) -> f64 {
        let k = (self.r1 - self.r0) / (2.0 * self.units);
        let disc = (self.r0 * self.r0 + 4.0 * k * a).max(0.0);
        let denom = self.r0 + disc.sqrt();
        if denom <= 0.0 {
            return self.units;
        }
        (2.0 * a / denom).clamp(0.0, self.units)
    }
}

/// Arrival offsets (from run start) for a ramping profile, in order.
#[derive(Debug, Clone)]
pub struct ArrivalSchedule {
    segments: Vec<Segment>,
    time_unit: Duration,
    index: usize,
    /// Arrivals accumulated before the current segment
    before: f64,
    next: u64,
}

impl ArrivalSchedule {
    pub fn new(profile: &RampingProfile) -> Self {
        let mut segments = Vec::with_capacity(profile.stages.len());
        let mut start = Duration::ZERO;
        let mut rate = f64::from(profile.start_rate);
        for stage in &profile.stages {
            let units = stage.duration.as_secs_f64() / profile.time_unit.as_secs_f64();
            let target = f64::from(stage.target);
            if units > 0.0 {
                segments.push(Segment {
                    start,
                    units,
                    r0: rate,
                    r1: target,
                });
            }
            start += stage.duration;
            rate = target;
        }
        Self {
            segments,
            time_unit: profile.time_unit,
            index: 0,
            before: 0.0,
            next: 1,
        }
    }

    /// Number of arrivals the whole schedule produces
    pub fn expected_arrivals(profile: &RampingProfile) -> u64 {
        let total: f64 = Self::new(profile).segments.iter().map(Segment::total).sum();
        (total + EPSILON).floor() as u64
    }
}

impl Iterator for ArrivalSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let target = self.next as f64;
        while let Some(segment) = self.segments.get(self.index) {
            let total = segment.total();
            if target <= self.before + total + EPSILON {
                let t = segment.time_for(target - self.before);
                self.next += 1;
                return Some(segment.start + self.time_unit.mul_f64(t));
            }
            self.before += total;
            self.index += 1;
        }
        None
    }
}

/// Wait for the stage's start offset, then log it
async fn enter_stage(
    start: Instant,
    idx: usize,
    boundaries: &[(Duration, &Stage)],
    profile: &RampingProfile,
) {
    let (offset, stage) = boundaries[idx];
    sleep_until(start + offset).await;
    tracing::info!(
        "Stage {}: target {}/{:?} over {:?}",
        idx + 1,
        stage.target,
        profile.time_unit,
        stage.duration
    );
}

/// Start one single-pass session per arrival, dropping arrivals when the pool is full.
pub async fn run(
    profile: &RampingProfile,
    runner: Arc<dyn SessionRunner>,
    sink: Arc<dyn OutcomeSink>,
) -> RunSummary {
    let start = Instant::now();
    let pool = SessionPool::new(profile.pre_allocated);
    let mut summary = RunSummary::default();
    let mut sessions = JoinSet::new();

    let mut boundaries = Vec::with_capacity(profile.stages.len());
    let mut offset = Duration::ZERO;
    for stage in &profile.stages {
        boundaries.push((offset, stage));
        offset += stage.duration;
    }
    let total = offset;
    let mut stage_idx = 0usize;

    tracing::info!(
        "Starting ramping arrival rate: {} stages over {:?}, {} pre-allocated slots",
        profile.stages.len(),
        total,
        profile.pre_allocated
    );

    let mut session_id = 0u64;
    for arrival in ArrivalSchedule::new(profile) {
        while stage_idx < boundaries.len() && boundaries[stage_idx].0 <= arrival {
            enter_stage(start, stage_idx, &boundaries, profile).await;
            stage_idx += 1;
        }

        sleep_until(start + arrival).await;

        while let Some(result) = sessions.try_join_next() {
            summary.record_join(result);
        }

        session_id += 1;
        match pool.try_acquire() {
            Some(slot) => {
                let runner = runner.clone();
                let id = session_id;
                sessions.spawn(async move {
                    let _slot = slot;
                    runner.run_session(id, 1).await
                });
                summary.sessions_started += 1;
            }
            None => {
                summary.arrivals_dropped += 1;
                sink.record_dropped_arrival();
                tracing::debug!(
                    session = session_id,
                    in_flight = pool.in_use(),
                    "pool exhausted, dropping arrival"
                );
            }
        }
    }

    while stage_idx < boundaries.len() {
        enter_stage(start, stage_idx, &boundaries, profile).await;
        stage_idx += 1;
    }
    sleep_until(start + total).await;

    tracing::info!(
        "Arrival schedule finished, waiting for {} in-flight sessions...",
        sessions.len()
    );
    while let Some(result) = sessions.join_next().await {
        summary.record_join(result);
        let finished = summary.sessions_finished();
        if finished % 100 == 0 {
            tracing::info!(
                "Waited for {}/{} sessions to complete",
                finished,
                summary.sessions_started
            );
        }
    }

    if summary.arrivals_dropped > 0 {
        tracing::warn!(
            "{} arrivals dropped because all {} slots were busy",
            summary.arrivals_dropped,
            profile.pre_allocated
        );
    }

    summary.peak_concurrency = pool.peak();
    summary.elapsed = start.elapsed();
    summary
}
