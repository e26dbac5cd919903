//! `libreassistant config` — print the default configuration TOML.

use libreassistant_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    println!("# Default configuration ({})", AppConfig::config_dir().join("config.toml").display());
    println!("{}", AppConfig::default_toml());
    Ok(())
}
