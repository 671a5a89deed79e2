//! Metric types

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct SessionMetrics {
    pub started: usize,
    pub closed: usize,
    pub abandoned: usize,
    pub in_flight: usize,
    pub dropped_arrivals: usize,
    pub peak_concurrency: usize,
    pub iterations: u64,
    pub abandon_reasons: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub transport_errors: usize,
}

/// Per-tag request counts
#[derive(Debug, Clone, Default)]
pub struct TagMetrics {
    pub requests: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounts {
    pub passes: usize,
    pub fails: usize,
}

impl CheckCounts {
    pub fn total(&self) -> usize {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.passes as f64 / self.total() as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemMetrics {
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TestMetrics {
    pub session: SessionMetrics,
    pub request: RequestMetrics,
    pub tags: BTreeMap<&'static str, TagMetrics>,
    /// Keyed by (tag, check name)
    pub checks: BTreeMap<(&'static str, String), CheckCounts>,
    pub system: SystemMetrics,
}

impl TestMetrics {
    /// Checks that failed at least once
    pub fn failing_checks(&self) -> impl Iterator<Item = (&(&'static str, String), &CheckCounts)> {
        self.checks.iter().filter(|(_, counts)| counts.fails > 0)
    }
}
