use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::MonitorConfig;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("path", _)) => {
            println!("{}", MonitorConfig::get_config_path()?.display());
            Ok(())
        }
        Some(("set", sub_matches)) => set(sub_matches),
        Some(("reset", _)) => {
            MonitorConfig::default().save()?;
            println!("{}", "Configuration reset to defaults".green());
            Ok(())
        }
        _ => {
            println!("Use 'sysmon config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = MonitorConfig::load()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}

fn set(matches: &ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = MonitorConfig::load()?;
    config
        .set(key, value)
        .with_context(|| format!("Cannot set {}", key))?;
    config.save()?;

    println!("{} {} = {}", "✓".green(), key.bold(), value);
    Ok(())
}
