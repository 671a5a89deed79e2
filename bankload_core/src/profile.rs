//! Load profiles: how many sessions run, and when.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, StageParseError};

/// One ramping stage: reach `target` arrivals per time unit by the end of `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub target: u32,
    #[serde(with = "duration_str")]
    pub duration: Duration,
}

impl Stage {
    pub fn new(target: u32, duration: Duration) -> Self {
        Self { target, duration }
    }
}

/// Fixed iterations per worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedProfile {
    pub workers: u32,
    pub iterations_per_worker: u32,
}

/// Ramping arrival rate with a bounded pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampingProfile {
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub start_rate: u32,
    #[serde(with = "duration_str", default = "default_time_unit")]
    pub time_unit: Duration,
    pub pre_allocated: usize,
}

fn default_time_unit() -> Duration {
    Duration::from_secs(1)
}

/// Declarative schedule for a run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum LoadProfile {
    PerWorkerIterations(FixedProfile),
    RampingArrivalRate(RampingProfile),
}

impl LoadProfile {
    pub fn fixed(workers: u32, iterations_per_worker: u32) -> Self {
        LoadProfile::PerWorkerIterations(FixedProfile {
            workers,
            iterations_per_worker,
        })
    }

    pub fn ramping(stages: Vec<Stage>, pre_allocated: usize) -> Self {
        LoadProfile::RampingArrivalRate(RampingProfile {
            stages,
            start_rate: 0,
            time_unit: default_time_unit(),
            pre_allocated,
        })
    }

    /// 3 workers, 10 iterations each
    pub fn smoke() -> Self {
        Self::fixed(3, 10)
    }

    /// Ramp to 100/s, hold, ramp to 500/s, hold, ramp down; 230 pool slots
    pub fn stress() -> Self {
        Self::ramping(
            vec![
                Stage::new(100, Duration::from_secs(10)),
                Stage::new(100, Duration::from_secs(20)),
                Stage::new(500, Duration::from_secs(60)),
                Stage::new(500, Duration::from_secs(40)),
                Stage::new(0, Duration::from_secs(20)),
            ],
            230,
        )
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        match self {
            LoadProfile::PerWorkerIterations(p) => {
                if p.workers == 0 {
                    return Err(ProfileError::NoWorkers);
                }
                if p.iterations_per_worker == 0 {
                    return Err(ProfileError::NoIterations);
                }
            }
            LoadProfile::RampingArrivalRate(p) => {
                if p.stages.is_empty() {
                    return Err(ProfileError::NoStages);
                }
                if p.pre_allocated == 0 {
                    return Err(ProfileError::EmptyPool);
                }
                if p.time_unit.is_zero() {
                    return Err(ProfileError::ZeroTimeUnit);
                }
            }
        }
        Ok(())
    }
}

impl RampingProfile {
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }
}

/// Parse a duration: `250ms`, `10s`, `1m`, `2h`, `1m30s`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration, StageParseError> {
    let input = input.trim();
    let invalid = || StageParseError::InvalidDuration(input.to_string());
    if input.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];
        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => return Err(invalid()),
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(part).ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }
    Ok(total)
}

/// Format a duration the way [`parse_duration`] reads it
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 {
        format!("{}ms", millis)
    } else {
        format!("{}s", duration.as_secs())
    }
}

/// Parse `target:duration[,target:duration...]`, e.g. `100:10s,500:1m,0:20s`
pub fn parse_stages(input: &str) -> Result<Vec<Stage>, StageParseError> {
    let stages = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_stage)
        .collect::<Result<Vec<_>, _>>()?;
    if stages.is_empty() {
        return Err(StageParseError::Empty);
    }
    Ok(stages)
}

fn parse_stage(input: &str) -> Result<Stage, StageParseError> {
    let (target, duration) = input
        .split_once(':')
        .ok_or_else(|| StageParseError::MissingSeparator(input.to_string()))?;
    let target = target
        .trim()
        .parse::<u32>()
        .map_err(|_| StageParseError::InvalidTarget(target.trim().to_string()))?;
    Ok(Stage::new(target, parse_duration(duration)?))
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
