//! One-shot snapshot command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::system_monitor::MetricsCollector;
use crate::platform::SysinfoSource;
use crate::ui::{print_snapshot, RenderOptions};

use super::monitor::resolve_config;

/// Collect two cycles one interval apart and print the second, so every
/// rate in the output is backed by two real readings.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;

    let source = Arc::new(SysinfoSource::new());
    let mut collector = MetricsCollector::with_config(source, config.collector_config());

    collector.collect();
    std::thread::sleep(config.interval());
    let snapshot = collector.collect();

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    } else {
        let options = RenderOptions {
            top_processes: config.top_processes,
            sort_by: config.sort_by,
            ..Default::default()
        };
        print_snapshot(&snapshot, &options);
    }

    Ok(())
}
