//! `ftm config` – show where the config lives and what is in effect.

use anyhow::Result;
use ftm_core::config::{self, FtmConfig};

pub fn run_config(cfg: &FtmConfig) -> Result<()> {
    println!("Config file: {}", config::config_path()?.display());
    if let Ok(path) = ftm_core::logging::log_file_path() {
        println!("Log file:    {}", path.display());
    }
    println!();
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
