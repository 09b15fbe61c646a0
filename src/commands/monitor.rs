//! Live monitor command handler.
//!
//! Starts the sampling scheduler and renders whatever snapshot is current
//! on each display refresh until Ctrl+C or `--count` is reached.

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::system_monitor::{MetricsCollector, ProcessSortKey, SamplingScheduler};
use crate::core::MonitorConfig;
use crate::platform::SysinfoSource;
use crate::ui::{format_snapshot, RenderOptions};

/// How often the display polls for a newer snapshot
const DISPLAY_REFRESH: Duration = Duration::from_millis(100);

/// Merge command-line overrides into the stored configuration
pub fn resolve_config(matches: &ArgMatches) -> Result<MonitorConfig> {
    let mut config = MonitorConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        MonitorConfig::default()
    });

    if let Some(&interval) = matches.get_one::<u64>("interval") {
        config.interval_ms = interval;
    }
    if let Some(&top) = matches.get_one::<usize>("top") {
        config.top_processes = top;
    }
    if let Some(sort) = matches.get_one::<String>("sort") {
        config.sort_by = sort
            .parse::<ProcessSortKey>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if matches.get_flag("no-processes") {
        config.collect_processes = false;
    }

    config.validate().context("Invalid monitor configuration")?;
    Ok(config)
}

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    let json_output = matches.get_flag("json");
    let max_frames = matches.get_one::<u64>("count").copied();

    let stop_requested = Arc::new(AtomicBool::new(false));
    let stop_flag = stop_requested.clone();
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let source = Arc::new(SysinfoSource::new());
    let collector = MetricsCollector::with_config(source, config.collector_config());
    let mut scheduler = SamplingScheduler::new(collector);
    scheduler
        .start(config.interval())
        .context("Failed to start sampling")?;

    if !json_output {
        println!("{}", "Press Ctrl+C to stop".dimmed());
    }

    let options = RenderOptions {
        top_processes: config.top_processes,
        sort_by: config.sort_by,
        ..Default::default()
    };
    let clear_screen = !json_output && std::io::stdout().is_terminal();

    let mut last_sequence = 0;
    let mut frames = 0u64;
    let result = loop {
        if stop_requested.load(Ordering::Relaxed) {
            break Ok(());
        }
        if max_frames.is_some_and(|max| frames >= max) {
            break Ok(());
        }

        std::thread::sleep(DISPLAY_REFRESH);

        let Some(snapshot) = scheduler.current_snapshot() else {
            continue;
        };
        if snapshot.sequence == last_sequence {
            continue;
        }
        last_sequence = snapshot.sequence;
        frames += 1;

        let rendered = if json_output {
            match serde_json::to_string(snapshot.as_ref()) {
                Ok(line) => line + "\n",
                Err(e) => break Err(anyhow::Error::new(e).context("Failed to serialize snapshot")),
            }
        } else {
            format_snapshot(&snapshot, &options)
        };

        let mut stdout = std::io::stdout().lock();
        if clear_screen {
            let _ = write!(stdout, "\x1B[2J\x1B[H");
        }
        if let Err(e) = stdout.write_all(rendered.as_bytes()).and_then(|_| stdout.flush()) {
            // Closed pipe (e.g. `| head`): stop quietly
            log::debug!("Output closed: {}", e);
            break Ok(());
        }
    };

    scheduler.stop();
    result
}
