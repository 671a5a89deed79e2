//! Stress scenario - ramping arrival rate against a bounded session pool

use anyhow::Result;
use bankload_core::profile::format_duration;
use bankload_core::scheduler::ArrivalSchedule;
use bankload_core::LoadProfile;

use crate::cli::{GlobalArgs, StressArgs};
use crate::config::profiles::stress_config;

pub async fn run(global: &GlobalArgs, args: StressArgs) -> Result<()> {
    let config = stress_config(&args)?;

    tracing::info!("Running Stress scenario");
    if let LoadProfile::RampingArrivalRate(profile) = &config.profile {
        for (idx, stage) in profile.stages.iter().enumerate() {
            tracing::info!(
                "  Stage {}: {}/{} over {}",
                idx + 1,
                stage.target,
                format_duration(profile.time_unit),
                format_duration(stage.duration)
            );
        }
        tracing::info!("  Start Rate: {}", profile.start_rate);
        tracing::info!("  Pre-allocated: {}", profile.pre_allocated);
        tracing::info!(
            "  Expected Arrivals: {} over {}",
            ArrivalSchedule::expected_arrivals(profile),
            format_duration(profile.total_duration())
        );
    }
    tracing::info!("  Accounts: {}", args.account_types.join(", "));

    let summary = super::execute(global, config).await?;

    if summary.arrivals_dropped > 0 {
        tracing::warn!(
            "Pool of {} slots saturated; consider raising --pre-allocated",
            args.pre_allocated
        );
    }
    Ok(())
}
