use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use sysmon::commands;

/// Options shared by every command that samples the host
fn with_sampling_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("MS")
                .help("Sampling interval in milliseconds (overrides config)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("top")
                .short('t')
                .long("top")
                .value_name("N")
                .help("Number of processes to display")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("sort")
                .short('s')
                .long("sort")
                .value_name("KEY")
                .help("Sort processes by: cpu, memory, name, pid, status"),
        )
        .arg(
            Arg::new("no-processes")
                .long("no-processes")
                .help("Skip the per-process table")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Emit snapshots as JSON")
                .action(ArgAction::SetTrue),
        )
}

fn build_cli() -> Command {
    Command::new("sysmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sample CPU, memory, disk, network and process telemetry")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            with_sampling_args(
                Command::new("monitor").about("Continuously sample and display system metrics"),
            )
            .arg(
                Arg::new("count")
                    .short('n')
                    .long("count")
                    .value_name("N")
                    .help("Stop after N snapshots")
                    .value_parser(value_parser!(u64)),
            ),
        )
        .subcommand(with_sampling_args(
            Command::new("snapshot").about("Take a single snapshot and exit"),
        ))
        .subcommand(
            Command::new("config")
                .about("Show or change the monitor configuration")
                .subcommand(Command::new("show").about("Print the current configuration"))
                .subcommand(Command::new("path").about("Print the configuration file path"))
                .subcommand(
                    Command::new("set")
                        .about("Set a configuration value")
                        .arg(
                            Arg::new("key")
                                .help("Setting name (e.g. interval_ms, top_processes, sort_by)")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value")
                                .required(true)
                                .index(2),
                        ),
                )
                .subcommand(Command::new("reset").about("Restore the default configuration")),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    sysmon::init_logging(matches.get_flag("verbose"));

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor::execute(sub_matches)?,
        Some(("snapshot", sub_matches)) => commands::snapshot::execute(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::execute(sub_matches)?,
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Use 'sysmon --help' for more information.");
        }
    }

    Ok(())
}
