use std::path::Path;

use anyhow::{bail, Context, Result};
use bankload_core::profile::{parse_duration, parse_stages};
use bankload_core::{AccountType, LoadProfile, RampingProfile, WorkflowPlan};
use serde::{Deserialize, Serialize};

use crate::cli::{SmokeArgs, StressArgs};

/// Everything a run needs besides the target URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub profile: LoadProfile,
    #[serde(default)]
    pub workflow: WorkflowPlan,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.profile.validate().context("invalid load profile")?;
        self.workflow.validate().context("invalid workflow options")?;
        Ok(())
    }
}

/// Get a run configuration by preset name
pub fn get_preset(name: &str) -> Option<RunConfig> {
    match name {
        "smoke" => Some(smoke_preset()),
        "stress" => Some(stress_preset()),
        _ => None,
    }
}

/// Smoke preset
///
/// Functional check at low volume:
/// - 3 workers, 10 iterations each
/// - one checking account per session
/// - 44 requests per worker
pub fn smoke_preset() -> RunConfig {
    RunConfig {
        profile: LoadProfile::smoke(),
        workflow: WorkflowPlan::smoke(),
    }
}

/// Stress preset
///
/// Capacity test with a ramping arrival rate:
/// - 0 -> 100/s over 10s, hold 20s
/// - 100 -> 500/s over 60s, hold 40s
/// - 500 -> 0/s over 20s
/// - 230 pre-allocated session slots
/// - a checking and a saving account per session
pub fn stress_preset() -> RunConfig {
    RunConfig {
        profile: LoadProfile::stress(),
        workflow: WorkflowPlan::stress(),
    }
}

/// Resolve `run --profile`: a preset name, otherwise a JSON file path
pub fn load_run_config(name_or_path: &str) -> Result<RunConfig> {
    let config = match get_preset(name_or_path) {
        Some(preset) => preset,
        None => read_profile_file(Path::new(name_or_path))?,
    };
    config.validate()?;
    Ok(config)
}

fn read_profile_file(path: &Path) -> Result<RunConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse profile file {}", path.display()))
}

pub fn parse_account_types(names: &[String]) -> Result<Vec<AccountType>> {
    names
        .iter()
        .map(|name| match name.as_str() {
            "checking" => Ok(AccountType::Checking),
            "saving" => Ok(AccountType::Saving),
            other => bail!("unknown account type '{}'", other),
        })
        .collect()
}

pub fn smoke_config(args: &SmokeArgs) -> Result<RunConfig> {
    let config = RunConfig {
        profile: LoadProfile::fixed(args.workers, args.iterations),
        workflow: WorkflowPlan::new(parse_account_types(&args.account_types)?),
    };
    config.validate()?;
    Ok(config)
}

pub fn stress_config(args: &StressArgs) -> Result<RunConfig> {
    let stages = match &args.stages {
        Some(raw) => parse_stages(raw).with_context(|| format!("invalid --stages '{}'", raw))?,
        None => match LoadProfile::stress() {
            LoadProfile::RampingArrivalRate(preset) => preset.stages,
            LoadProfile::PerWorkerIterations(_) => Vec::new(),
        },
    };
    let time_unit = parse_duration(&args.time_unit)
        .with_context(|| format!("invalid --time-unit '{}'", args.time_unit))?;

    let config = RunConfig {
        profile: LoadProfile::RampingArrivalRate(RampingProfile {
            stages,
            start_rate: args.start_rate,
            time_unit,
            pre_allocated: args.pre_allocated,
        }),
        workflow: WorkflowPlan::new(parse_account_types(&args.account_types)?),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankload_core::Stage;
    use std::time::Duration;

    fn stress_args(stages: Option<&str>) -> StressArgs {
        StressArgs {
            stages: stages.map(str::to_string),
            start_rate: 0,
            time_unit: "1s".to_string(),
            pre_allocated: 230,
            account_types: vec!["checking".to_string(), "saving".to_string()],
        }
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["smoke", "stress"] {
            let preset = get_preset(name).unwrap();
            assert!(preset.validate().is_ok(), "{}", name);
        }
        assert!(get_preset("soak").is_none());
    }

    #[test]
    fn test_stress_without_stages_uses_preset() {
        let config = stress_config(&stress_args(None)).unwrap();
        assert_eq!(config, stress_preset());
    }

    #[test]
    fn test_stress_with_custom_stages() {
        let config = stress_config(&stress_args(Some("20:30s,0:1m"))).unwrap();
        let LoadProfile::RampingArrivalRate(profile) = config.profile else {
            panic!("expected ramping profile");
        };
        assert_eq!(
            profile.stages,
            vec![
                Stage::new(20, Duration::from_secs(30)),
                Stage::new(0, Duration::from_secs(60)),
            ]
        );
    }

    #[test]
    fn test_stress_rejects_bad_stages_and_empty_pool() {
        assert!(stress_config(&stress_args(Some("fast"))).is_err());

        let mut args = stress_args(None);
        args.pre_allocated = 0;
        assert!(stress_config(&args).is_err());
    }

    #[test]
    fn test_smoke_rejects_zero_workers() {
        let args = SmokeArgs {
            workers: 0,
            iterations: 10,
            account_types: vec!["checking".to_string()],
        };
        assert!(smoke_config(&args).is_err());
    }

    #[test]
    fn test_load_profile_file() {
        let path = std::env::temp_dir().join(format!("bankload-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{
                "profile": {
                    "executor": "ramping-arrival-rate",
                    "stages": [{"target": 50, "duration": "30s"}, {"target": 0, "duration": "10s"}],
                    "pre_allocated": 40
                },
                "workflow": {"account_types": ["saving"]}
            }"#,
        )
        .unwrap();

        let config = load_run_config(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.workflow.account_types, vec![AccountType::Saving]);
        let LoadProfile::RampingArrivalRate(profile) = config.profile else {
            panic!("expected ramping profile");
        };
        assert_eq!(profile.pre_allocated, 40);
        assert_eq!(profile.time_unit, Duration::from_secs(1));
    }

    #[test]
    fn test_missing_profile_file_names_the_path() {
        let err = load_run_config("/nonexistent/profile.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/profile.json"));
    }
}
