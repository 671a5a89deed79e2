use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod metrics;
mod scenarios;

use cli::{Cli, Scenario};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let global = cli.global;

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if global.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Bank API Load Test Starting...");
    tracing::info!("Base URL: {}", global.base_url);
    tracing::info!("Request Timeout: {}s", global.request_timeout);
    if global.report_interval > 0 {
        tracing::info!("Report Interval: {}s", global.report_interval);
    }

    match cli.scenario {
        Scenario::Smoke(args) => scenarios::smoke::run(&global, args).await?,
        Scenario::Stress(args) => scenarios::stress::run(&global, args).await?,
        Scenario::Run(args) => {
            let run_config = config::load_run_config(&args.profile)?;
            tracing::info!("Running profile {}", args.profile);
            tracing::debug!("{:?}", run_config);
            scenarios::execute(&global, run_config).await?;
        }
    }

    tracing::info!("Load test complete");
    Ok(())
}
