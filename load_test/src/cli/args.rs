use bankload_core::DEFAULT_REQUEST_TIMEOUT;
use clap::{Args, Parser, Subcommand};

/// Banking API load simulator
#[derive(Parser, Debug)]
#[command(name = "load-test")]
#[command(about = "Simulates client sessions against the banking REST API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub scenario: Scenario,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL every request path is appended to
    #[arg(
        long,
        global = true,
        default_value = "http://localhost:8080/api/v1",
        env = "BANK_API_URL"
    )]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(),
        env = "BANK_REQUEST_TIMEOUT"
    )]
    pub request_timeout: u64,

    /// Live metrics refresh interval in seconds (0 disables the live view)
    #[arg(long, global = true, default_value = "2")]
    pub report_interval: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Scenario {
    /// Fixed number of workers, each running a fixed number of iterations
    Smoke(SmokeArgs),

    /// Ramping arrival rate with a bounded session pool
    Stress(StressArgs),

    /// Run a profile preset or a JSON profile file
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SmokeArgs {
    /// Concurrent workers
    #[arg(long, default_value = "3")]
    pub workers: u32,

    /// Iterations per worker
    #[arg(long, default_value = "10")]
    pub iterations: u32,

    /// Accounts each session creates: checking, saving (comma separated, at most two)
    #[arg(
        long = "account-type",
        default_value = "checking",
        value_delimiter = ',',
        value_parser = ["checking", "saving"]
    )]
    pub account_types: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct StressArgs {
    /// Stages as target:duration pairs, e.g. 100:10s,500:1m,0:20s
    #[arg(long)]
    pub stages: Option<String>,

    /// Arrival rate at the start of the first stage
    #[arg(long, default_value = "0")]
    pub start_rate: u32,

    /// Time unit the stage targets are expressed in
    #[arg(long, default_value = "1s")]
    pub time_unit: String,

    /// Session pool size; arrivals beyond it are dropped
    #[arg(long, default_value = "230")]
    pub pre_allocated: usize,

    /// Accounts each session creates: checking, saving (comma separated, at most two)
    #[arg(
        long = "account-type",
        default_value = "checking,saving",
        value_delimiter = ',',
        value_parser = ["checking", "saving"]
    )]
    pub account_types: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Preset name (smoke, stress) or path to a JSON profile file
    #[arg(long)]
    pub profile: String,
}
