//! Metrics collector - thread-safe outcome aggregation with per-tag latency tracking

use super::types::{CheckCounts, TestMetrics};
use bankload_core::{
    AbandonReason, CheckEvent, OutcomeSink, RequestEvent, RunSummary, SessionReport,
};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use uuid::Uuid;

/// Histogram precision in significant digits
const SIGFIG: u8 = 3;

#[derive(Clone)]
pub struct MetricsCollector {
    run_id: Uuid,
    metrics: Arc<RwLock<TestMetrics>>,
    /// Request latencies in microseconds, one histogram per tag
    latencies: Arc<RwLock<BTreeMap<&'static str, Histogram<u64>>>>,
    system: Arc<RwLock<System>>,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new(run_id: Uuid) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        Self {
            run_id,
            metrics: Arc::new(RwLock::new(TestMetrics::default())),
            latencies: Arc::new(RwLock::new(BTreeMap::new())),
            system: Arc::new(RwLock::new(system)),
            start_time: Instant::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Fold the scheduler's totals into the snapshot
    pub fn record_run_summary(&self, summary: &RunSummary) {
        let mut metrics = self.metrics.write();
        metrics.session.peak_concurrency = summary.peak_concurrency;
        // Panicked session tasks never report through the sink
        let unreported = summary
            .sessions_finished()
            .saturating_sub(metrics.session.closed + metrics.session.abandoned);
        if unreported > 0 {
            metrics.session.abandoned += unreported;
            *metrics
                .session
                .abandon_reasons
                .entry(AbandonReason::Panicked.to_string())
                .or_default() += unreported;
            metrics.session.in_flight = metrics.session.in_flight.saturating_sub(unreported);
        }
    }

    /// Update system metrics (CPU, memory)
    pub fn update_system_metrics(&self) {
        let mut system = self.system.write();
        system.refresh_cpu_all();
        system.refresh_memory();

        let mut metrics = self.metrics.write();
        metrics.system.cpu_usage = system.global_cpu_usage();
        metrics.system.memory_used_mb = system.used_memory() / 1024 / 1024;
        metrics.system.memory_total_mb = system.total_memory() / 1024 / 1024;
    }

    pub fn get_snapshot(&self) -> TestMetrics {
        self.metrics.read().clone()
    }

    /// Latency across every tag
    pub fn overall_latency(&self) -> LatencyStats {
        let latencies = self.latencies.read();
        let mut merged = match Histogram::<u64>::new(SIGFIG) {
            Ok(hist) => hist,
            Err(_) => return LatencyStats::default(),
        };
        for hist in latencies.values() {
            if let Err(e) = merged.add(hist) {
                tracing::debug!("Skipping histogram merge: {}", e);
            }
        }
        LatencyStats::from_histogram(&merged)
    }

    /// Latency per tag, in tag order
    pub fn tag_latencies(&self) -> Vec<(&'static str, LatencyStats)> {
        self.latencies
            .read()
            .iter()
            .map(|(tag, hist)| (*tag, LatencyStats::from_histogram(hist)))
            .collect()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn elapsed_secs_f64(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

impl OutcomeSink for MetricsCollector {
    fn record_check(&self, event: CheckEvent) {
        let mut metrics = self.metrics.write();
        let counts = metrics
            .checks
            .entry((event.tag, event.check))
            .or_insert_with(CheckCounts::default);
        if event.passed {
            counts.passes += 1;
        } else {
            counts.fails += 1;
        }
    }

    fn record_request(&self, event: RequestEvent) {
        let mut metrics = self.metrics.write();
        metrics.request.total += 1;
        if event.passed {
            metrics.request.passed += 1;
        } else {
            metrics.request.failed += 1;
        }
        let tag = metrics.tags.entry(event.tag).or_default();
        tag.requests += 1;
        if !event.passed {
            tag.failed += 1;
        }

        // No response, no latency sample
        if event.status == 0 {
            metrics.request.transport_errors += 1;
            return;
        }
        drop(metrics);

        let micros = u64::try_from(event.latency.as_micros()).unwrap_or(u64::MAX);
        let mut latencies = self.latencies.write();
        if !latencies.contains_key(event.tag) {
            match Histogram::new(SIGFIG) {
                Ok(hist) => {
                    latencies.insert(event.tag, hist);
                }
                Err(e) => {
                    tracing::warn!("Failed to create latency histogram for {}: {}", event.tag, e);
                    return;
                }
            }
        }
        if let Some(hist) = latencies.get_mut(event.tag) {
            if let Err(e) = hist.record(micros) {
                tracing::debug!("Dropping latency sample for {}: {}", event.tag, e);
            }
        }
    }

    fn record_session_start(&self, _session_id: u64) {
        let mut metrics = self.metrics.write();
        metrics.session.started += 1;
        metrics.session.in_flight += 1;
    }

    fn record_session(&self, report: &SessionReport) {
        let mut metrics = self.metrics.write();
        metrics.session.in_flight = metrics.session.in_flight.saturating_sub(1);
        metrics.session.iterations += u64::from(report.iterations_completed);
        if report.is_closed() {
            metrics.session.closed += 1;
        } else {
            metrics.session.abandoned += 1;
            let reason = report
                .abandon_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *metrics.session.abandon_reasons.entry(reason).or_default() += 1;
        }
    }

    fn record_dropped_arrival(&self) {
        self.metrics.write().session.dropped_arrivals += 1;
    }
}

/// Latency percentiles in microseconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStats {
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub max: u64,
    pub mean: f64,
    pub count: u64,
}

impl LatencyStats {
    fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.is_empty() {
            return Self::default();
        }
        Self {
            min: hist.min(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
            max: hist.max(),
            mean: hist.mean(),
            count: hist.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankload_core::SessionState;
    use chrono::Utc;
    use std::time::Duration;

    fn request(tag: &'static str, status: u16, passed: bool, millis: u64) -> RequestEvent {
        RequestEvent {
            tag,
            status,
            passed,
            latency: Duration::from_millis(millis),
            timestamp: Utc::now(),
        }
    }

    fn check(tag: &'static str, name: &str, passed: bool) -> CheckEvent {
        CheckEvent {
            tag,
            check: name.to_string(),
            passed,
            timestamp: Utc::now(),
        }
    }

    fn report(id: u64, state: SessionState, reason: Option<AbandonReason>) -> SessionReport {
        SessionReport {
            session_id: id,
            final_state: state,
            abandon_reason: reason,
            iterations_completed: if reason.is_some() { 0 } else { 1 },
            requests_issued: 1,
        }
    }

    #[test]
    fn test_check_counts_per_tag_and_name() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.record_check(check("deposit", "status is 204", true));
        collector.record_check(check("deposit", "status is 204", false));
        collector.record_check(check("withdraw", "status is 204", true));

        let metrics = collector.get_snapshot();
        let deposit = metrics.checks[&("deposit", "status is 204".to_string())];
        assert_eq!(deposit, CheckCounts { passes: 1, fails: 1 });
        assert_eq!(deposit.pass_rate(), 50.0);
        assert_eq!(metrics.failing_checks().count(), 1);
    }

    #[test]
    fn test_requests_and_latency_per_tag() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.record_request(request("getAccount", 200, true, 10));
        collector.record_request(request("getAccount", 200, true, 30));
        collector.record_request(request("deposit", 400, false, 5));
        collector.record_request(request("deposit", 0, false, 60_000));

        let metrics = collector.get_snapshot();
        assert_eq!(metrics.request.total, 4);
        assert_eq!(metrics.request.failed, 2);
        assert_eq!(metrics.request.transport_errors, 1);
        assert_eq!(metrics.tags["deposit"].failed, 2);

        let per_tag = collector.tag_latencies();
        assert_eq!(per_tag.len(), 2);
        let (tag, stats) = &per_tag[1];
        assert_eq!(*tag, "getAccount");
        assert_eq!(stats.count, 2);
        assert!(stats.max >= 29_900 && stats.max <= 30_100, "{}", stats.max);

        // transport errors carry no latency sample
        assert_eq!(collector.overall_latency().count, 3);
    }

    #[test]
    fn test_latency_keeps_its_magnitude() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.record_request(request("getToken", 200, true, 250));
        collector.record_request(request("getToken", 200, true, 1_500));

        let stats = collector.overall_latency();
        assert_eq!(stats.count, 2);
        assert!(stats.min >= 249_000 && stats.min <= 251_000, "{}", stats.min);
        assert!(stats.max >= 1_499_000 && stats.max <= 1_501_000, "{}", stats.max);
        assert!(stats.p50 >= 249_000, "{}", stats.p50);
    }

    #[test]
    fn test_session_lifecycle_counts() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        for id in 1..=3 {
            collector.record_session_start(id);
        }
        collector.record_session(&report(1, SessionState::Closed, None));
        collector.record_session(&report(
            2,
            SessionState::Abandoned,
            Some(AbandonReason::LoginFailed),
        ));
        collector.record_dropped_arrival();

        let session = collector.get_snapshot().session;
        assert_eq!(session.started, 3);
        assert_eq!(session.closed, 1);
        assert_eq!(session.abandoned, 1);
        assert_eq!(session.in_flight, 1);
        assert_eq!(session.dropped_arrivals, 1);
        assert_eq!(session.iterations, 1);
        assert_eq!(session.abandon_reasons.values().sum::<usize>(), 1);
    }

    #[test]
    fn test_run_summary_accounts_for_panicked_sessions() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        collector.record_session_start(1);
        collector.record_session_start(2);
        collector.record_session(&report(1, SessionState::Closed, None));

        collector.record_run_summary(&RunSummary {
            sessions_started: 2,
            sessions_closed: 1,
            sessions_abandoned: 1,
            peak_concurrency: 2,
            ..RunSummary::default()
        });

        let session = collector.get_snapshot().session;
        assert_eq!(session.abandoned, 1);
        assert_eq!(session.in_flight, 0);
        assert_eq!(session.peak_concurrency, 2);
        assert_eq!(session.abandon_reasons[&AbandonReason::Panicked.to_string()], 1);
    }

    #[test]
    fn test_empty_collector_has_zeroed_latency() {
        let collector = MetricsCollector::new(Uuid::new_v4());
        assert_eq!(collector.overall_latency(), LatencyStats::default());
    }
}
