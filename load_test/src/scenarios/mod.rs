//! Load test scenarios
//!
//! Each scenario turns its arguments into a [`RunConfig`] and hands it to
//! [`execute`], which wires the HTTP transport, the metrics collector and the
//! scheduler together.

pub mod smoke;
pub mod stress;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bankload_core::{
    ReqwestTransport, RequestHarness, RunSummary, Scheduler, SessionWorkflow, Transport,
};
use uuid::Uuid;

use crate::cli::GlobalArgs;
use crate::config::RunConfig;
use crate::metrics::collector::MetricsCollector;
use crate::metrics::reporter;

/// Run `config` against the API at `global.base_url` and print the final report
pub async fn execute(global: &GlobalArgs, config: RunConfig) -> Result<RunSummary> {
    let transport = ReqwestTransport::new(
        global.base_url.as_str(),
        Duration::from_secs(global.request_timeout),
    )
    .context("failed to build HTTP client")?;

    let (summary, collector) =
        execute_with(Arc::new(transport), config, global.report_interval).await?;

    reporter::print_final_report(&collector);
    Ok(summary)
}

/// Run `config` over an arbitrary transport
pub async fn execute_with(
    transport: Arc<dyn Transport>,
    config: RunConfig,
    report_interval: u64,
) -> Result<(RunSummary, MetricsCollector)> {
    let run_id = Uuid::new_v4();
    let collector = MetricsCollector::new(run_id);
    let sink = Arc::new(collector.clone());

    let harness = RequestHarness::new(transport, sink.clone());
    let workflow = SessionWorkflow::new(harness, config.workflow);
    let scheduler = Scheduler::new(Arc::new(workflow)).with_sink(sink);

    tracing::info!(%run_id, "Starting run");

    let live = (report_interval > 0).then(|| {
        let collector_clone = collector.clone();
        tokio::spawn(async move {
            reporter::start_periodic_reporter(collector_clone, report_interval).await;
        })
    });

    let result = scheduler.run(&config.profile).await;

    if let Some(handle) = live {
        handle.abort();
    }

    let summary = result.context("load profile rejected")?;
    collector.record_run_summary(&summary);

    if summary.sessions_abandoned > 0 {
        tracing::warn!(
            "{} of {} sessions were abandoned",
            summary.sessions_abandoned,
            summary.sessions_started
        );
    }

    Ok((summary, collector))
}
