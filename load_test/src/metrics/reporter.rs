//! Console reporter for metrics with real-time updates

use super::collector::{LatencyStats, MetricsCollector};
use super::types::TestMetrics;
use std::io::{self, Write};
use tokio::time::{interval, Duration};

/// Start periodic metrics reporting (every N seconds)
pub async fn start_periodic_reporter(collector: MetricsCollector, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        collector.update_system_metrics();

        print_live_metrics(&collector);
    }
}

fn ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Print live metrics (clears screen and updates in place)
pub fn print_live_metrics(collector: &MetricsCollector) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");

    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_seconds();
    let latency = collector.overall_latency();

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║             Bank API Load Test - Live Metrics                  ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!(
        "\n⏱️  Elapsed Time: {:02}:{:02}:{:02}    Run: {}",
        elapsed / 3600,
        (elapsed % 3600) / 60,
        elapsed % 60,
        collector.run_id()
    );

    println!("\n┌─ SESSIONS ──────────────────────────────────────────────────┐");
    println!(
        "│  Started:      {:>8}    In-Flight:  {:>8}              │",
        metrics.session.started, metrics.session.in_flight
    );
    println!(
        "│  Closed:       {:>8}    Abandoned:  {:>8}              │",
        metrics.session.closed, metrics.session.abandoned
    );
    if metrics.session.dropped_arrivals > 0 {
        println!(
            "│  Dropped:      {:>8}                                      │",
            metrics.session.dropped_arrivals
        );
    }
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ REQUESTS ──────────────────────────────────────────────────┐");
    println!(
        "│  Total:        {:>8}    Failed:     {:>8}              │",
        metrics.request.total, metrics.request.failed
    );
    if metrics.request.total > 0 {
        let throughput = if elapsed > 0 {
            metrics.request.total as f64 / elapsed as f64
        } else {
            0.0
        };
        println!(
            "│  Pass Rate:    {:>7.2}%    Throughput: {:>7.2}/sec        │",
            rate(metrics.request.passed, metrics.request.total),
            throughput
        );
    }
    println!("└─────────────────────────────────────────────────────────────┘");

    if latency.count > 0 {
        println!("\n┌─ REQUEST LATENCY (ms) ──────────────────────────────────────┐");
        println!(
            "│  P50: {:>8.2}  P90: {:>8.2}  P95: {:>8.2}  Max: {:>8.2} │",
            ms(latency.p50),
            ms(latency.p90),
            ms(latency.p95),
            ms(latency.max)
        );
        println!("└─────────────────────────────────────────────────────────────┘");
    }

    let failing: Vec<_> = metrics.failing_checks().collect();
    if !failing.is_empty() {
        println!("\n┌─ FAILING CHECKS ────────────────────────────────────────────┐");
        for ((tag, check), counts) in failing {
            println!(
                "│  {:<16} {:<24} {:>8} failed    │",
                tag, check, counts.fails
            );
        }
        println!("└─────────────────────────────────────────────────────────────┘");
    }

    println!("\n┌─ SYSTEM ────────────────────────────────────────────────────┐");
    println!(
        "│  CPU Usage:    {:>6.1}%    Memory: {:>6} / {:>6} MB       │",
        metrics.system.cpu_usage, metrics.system.memory_used_mb, metrics.system.memory_total_mb
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n  [Press Ctrl+C to stop test]");

    let _ = io::stdout().flush();
}

fn print_latency_row(label: &str, stats: &LatencyStats) {
    println!(
        "   {:<16} avg={:>8.2} min={:>8.2} p50={:>8.2} p90={:>8.2} p95={:>8.2} max={:>8.2}  ({})",
        label,
        stats.mean / 1000.0,
        ms(stats.min),
        ms(stats.p50),
        ms(stats.p90),
        ms(stats.p95),
        ms(stats.max),
        stats.count
    );
}

fn print_checks(metrics: &TestMetrics) {
    if metrics.checks.is_empty() {
        return;
    }
    println!("\n✅ CHECKS");
    let mut current_tag = "";
    for ((tag, check), counts) in &metrics.checks {
        if *tag != current_tag {
            println!("   {}", tag);
            current_tag = *tag;
        }
        let mark = if counts.fails == 0 { "✓" } else { "✗" };
        println!(
            "     {} {:<26} {:>7.2}%  ✓ {:<8} ✗ {}",
            mark,
            check,
            counts.pass_rate(),
            counts.passes,
            counts.fails
        );
    }
}

/// Print final summary report
pub fn print_final_report(collector: &MetricsCollector) {
    collector.update_system_metrics();
    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_secs_f64();
    let latency = collector.overall_latency();

    println!("\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    FINAL TEST REPORT                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!("\n   Run ID:               {}", collector.run_id());

    println!("\n📊 SESSIONS");
    println!("   Total Started:        {:>10}", metrics.session.started);
    println!("   Total Closed:         {:>10}", metrics.session.closed);
    println!("   Total Abandoned:      {:>10}", metrics.session.abandoned);
    println!("   Iterations:           {:>10}", metrics.session.iterations);
    println!("   Peak Concurrency:     {:>10}", metrics.session.peak_concurrency);
    if metrics.session.dropped_arrivals > 0 {
        println!("   Dropped Arrivals:     {:>10}", metrics.session.dropped_arrivals);
    }
    for (reason, count) in &metrics.session.abandon_reasons {
        println!("     {:<26} {:>8}", reason, count);
    }
    if metrics.session.started > 0 {
        println!(
            "   Completion Rate:      {:>10.2}%",
            rate(metrics.session.closed, metrics.session.started)
        );
    }

    println!("\n🌐 REQUESTS");
    println!("   Total:                {:>10}", metrics.request.total);
    println!("   Failed:               {:>10}", metrics.request.failed);
    println!("   Transport Errors:     {:>10}", metrics.request.transport_errors);
    if elapsed > 0.0 {
        println!(
            "   Throughput:           {:>10.2} requests/sec",
            metrics.request.total as f64 / elapsed
        );
    }
    if metrics.request.total > 0 {
        println!(
            "   Failure Rate:         {:>10.2}%",
            rate(metrics.request.failed, metrics.request.total)
        );
    }
    for (tag, counts) in &metrics.tags {
        println!(
            "     {:<18} {:>8} requests {:>8} failed",
            tag, counts.requests, counts.failed
        );
    }

    if latency.count > 0 {
        println!("\n📈 REQUEST LATENCY (ms)");
        print_latency_row("all", &latency);
        for (tag, stats) in collector.tag_latencies() {
            print_latency_row(tag, &stats);
        }
    }

    print_checks(&metrics);

    println!(
        "\n🖥️  Host: CPU {:.1}%  Memory {} / {} MB",
        metrics.system.cpu_usage, metrics.system.memory_used_mb, metrics.system.memory_total_mb
    );
    println!("\n⏱️  Test Duration: {:.2} seconds", elapsed);
    println!("════════════════════════════════════════════════════════════════\n");
}
