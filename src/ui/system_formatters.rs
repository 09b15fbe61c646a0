use colored::*;
use humansize::{format_size, DECIMAL};
use std::fmt::Write;

use crate::core::system_monitor::{
    sort_processes, ProcessSortKey, ProcessStatus, Reading, SortOrder, SystemSnapshot,
};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Controls how a snapshot is rendered as text
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub top_processes: usize,
    pub sort_by: ProcessSortKey,
    /// Width of the CPU/memory sparklines; 0 hides them
    pub history_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            top_processes: 15,
            sort_by: ProcessSortKey::Cpu,
            history_width: 50,
        }
    }
}

/// Human readable byte count (decimal units)
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.max(0.0).round() as u64))
}

fn colorize_percent(value: f32) -> ColoredString {
    let text = format!("{:.1}%", value);
    if value > 80.0 {
        text.red()
    } else if value > 50.0 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Render a reading, or a dimmed marker when it is missing
fn show<T>(reading: &Reading<T>, render: impl Fn(&T) -> String) -> String {
    match reading {
        Reading::Available(value) => render(value),
        Reading::Unavailable => "n/a".dimmed().to_string(),
        Reading::Unsupported => "unsupported".dimmed().to_string(),
    }
}

/// Unicode sparkline of the last `width` percentages
pub fn sparkline(values: &[f32], width: usize) -> String {
    let start = values.len().saturating_sub(width);
    values[start..]
        .iter()
        .map(|&v| {
            let level = (v.clamp(0.0, 100.0) / 100.0 * (SPARK_LEVELS.len() - 1) as f32).round();
            SPARK_LEVELS[level as usize]
        })
        .collect()
}

fn section_header(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.bold().green());
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
}

pub fn format_snapshot(snapshot: &SystemSnapshot, options: &RenderOptions) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} #{}",
        "SYSTEM MONITOR".bold().bright_cyan(),
        snapshot.sequence
    );
    let _ = writeln!(out, "{}", "=".repeat(80));

    let _ = writeln!(
        out,
        "  CPU: {}   Memory: {}   Disk: {}",
        show(&snapshot.cpu_percent, |v| colorize_percent(*v).to_string()),
        show(&snapshot.memory_percent, |v| colorize_percent(*v).to_string()),
        show(&snapshot.disk_percent, |v| colorize_percent(*v).to_string()),
    );
    let _ = writeln!(
        out,
        "  Uptime: {}   CPU Temp: {}",
        show(&snapshot.uptime_hours, |h| format!("{:.2} h", h)),
        show(&snapshot.cpu_temperature, |t| format!("{:.1} °C", t)),
    );

    if options.history_width > 0 {
        let _ = writeln!(
            out,
            "  CPU    {}",
            sparkline(&snapshot.cpu_history, options.history_width).cyan()
        );
        let _ = writeln!(
            out,
            "  Memory {}",
            sparkline(&snapshot.memory_history, options.history_width).magenta()
        );
    }

    format_network(&mut out, snapshot);
    format_disks(&mut out, snapshot);
    format_processes(&mut out, snapshot, options);

    out
}

fn format_network(out: &mut String, snapshot: &SystemSnapshot) {
    section_header(out, "NETWORK");
    match &snapshot.network {
        Reading::Available(adapters) if adapters.is_empty() => {
            let _ = writeln!(out, "  {}", "No adapters".dimmed());
        }
        Reading::Available(adapters) => {
            for adapter in adapters {
                let _ = writeln!(
                    out,
                    "  {:<24} ↑ {:>12}  ↓ {:>12}",
                    adapter.name,
                    format_rate(adapter.upload_bytes_per_sec),
                    format_rate(adapter.download_bytes_per_sec)
                );
            }
        }
        other => {
            let _ = writeln!(out, "  {}", show(other, |_| String::new()));
        }
    }
}

fn format_disks(out: &mut String, snapshot: &SystemSnapshot) {
    section_header(out, "DISKS");
    match &snapshot.disks {
        Reading::Available(volumes) => {
            for volume in volumes {
                let _ = writeln!(
                    out,
                    "  {:<16} {} of {} used ({})  R {}  W {}",
                    volume.mount_point,
                    format_bytes(volume.used_bytes),
                    format_bytes(volume.total_bytes),
                    colorize_percent(volume.usage_percent),
                    show(&volume.read_bytes_per_sec, |r| format_rate(*r)),
                    show(&volume.write_bytes_per_sec, |w| format_rate(*w)),
                );
            }
        }
        other => {
            let _ = writeln!(out, "  {}", show(other, |_| String::new()));
        }
    }
}

fn format_processes(out: &mut String, snapshot: &SystemSnapshot, options: &RenderOptions) {
    section_header(out, "PROCESSES");
    let records = match &snapshot.processes {
        Reading::Available(records) => records,
        other => {
            let _ = writeln!(out, "  {}", show(other, |_| String::new()));
            return;
        }
    };

    let mut rows = records.clone();
    let order = match options.sort_by {
        ProcessSortKey::Name | ProcessSortKey::Pid => SortOrder::Ascending,
        _ => SortOrder::Descending,
    };
    sort_processes(&mut rows, options.sort_by, order);

    let _ = writeln!(
        out,
        "  {:>7}  {:<28} {:>7} {:>10}  {}",
        "PID".bold(),
        "NAME".bold(),
        "CPU".bold(),
        "MEMORY".bold(),
        "STATUS".bold()
    );
    for record in rows.iter().take(options.top_processes) {
        let status = match record.status {
            ProcessStatus::Running => record.status.label().normal(),
            ProcessStatus::Stale => record.status.label().dimmed(),
        };
        let _ = writeln!(
            out,
            "  {:>7}  {:<28} {:>6.1}% {:>10}  {}",
            record.pid,
            truncate(&record.name, 28),
            record.cpu_usage_percent,
            format_bytes(record.memory_bytes),
            status
        );
    }
    if rows.len() > options.top_processes {
        let _ = writeln!(
            out,
            "  {}",
            format!("... {} more", rows.len() - options.top_processes).dimmed()
        );
    }
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(max_chars.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

pub fn print_snapshot(snapshot: &SystemSnapshot, options: &RenderOptions) {
    print!("{}", format_snapshot(snapshot, options));
}
