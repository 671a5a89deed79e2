pub mod profiles;

pub use profiles::{get_preset, load_run_config, RunConfig};
