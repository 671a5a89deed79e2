//! Smoke scenario - a few workers each looping the full session workflow

use anyhow::Result;

use crate::cli::{GlobalArgs, SmokeArgs};
use crate::config::profiles::smoke_config;

pub async fn run(global: &GlobalArgs, args: SmokeArgs) -> Result<()> {
    let config = smoke_config(&args)?;

    tracing::info!("Running Smoke scenario");
    tracing::info!("  Workers: {}", args.workers);
    tracing::info!("  Iterations per worker: {}", args.iterations);
    tracing::info!("  Accounts: {}", args.account_types.join(", "));

    let summary = super::execute(global, config).await?;

    if summary.sessions_closed == args.workers as usize {
        tracing::info!("All {} workers closed their sessions", args.workers);
    }
    Ok(())
}
