use anyhow::{Context, Result};
use shelltrail_runtime_config::{ShelltrailConfig, config_path};

/// Print where configuration and history live, plus the effective settings.
pub fn run_config(config: &ShelltrailConfig, init: bool) -> Result<()> {
    let path = config_path()?;
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            config.save_to(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    println!("config:  {}", path.display());
    println!("history: {}", config.db_path()?.display());
    println!();
    print!(
        "{}",
        toml::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}
