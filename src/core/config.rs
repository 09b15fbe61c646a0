use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::system_monitor::{CollectorConfig, ProcessSortKey, DEFAULT_HISTORY_SIZE};
use crate::error::MonitorError;

/// Shortest sampling interval accepted
pub const MIN_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_ms: u64,
    /// Points kept per plotted series
    pub history_capacity: usize,
    pub collect_processes: bool,
    pub collect_network: bool,
    pub collect_disks: bool,
    /// Process rows shown by the text renderer
    pub top_processes: usize,
    pub sort_by: ProcessSortKey,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            history_capacity: DEFAULT_HISTORY_SIZE,
            collect_processes: true,
            collect_network: true,
            collect_disks: true,
            top_processes: 15,
            sort_by: ProcessSortKey::Cpu,
        }
    }
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Ok(Self::load_from(&config_path))
    }

    /// Read a config file, falling back to defaults if it is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                return Self::default();
            }
        };

        // If the file is empty or corrupted, return default config
        if data.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }

        serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid config file {:?}: {}", path, e);
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("sysmon").join("config.json"))
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(MonitorError::config(format!(
                "interval_ms must be at least {} (got {})",
                MIN_INTERVAL_MS, self.interval_ms
            )));
        }
        if self.history_capacity == 0 {
            return Err(MonitorError::config("history_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Update one setting from its textual form (used by `sysmon config set`).
    ///
    /// A value that fails parsing or validation leaves `self` unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
            value
                .parse()
                .map_err(|_| MonitorError::config(format!("invalid value for {}: {}", key, value)))
        }

        let mut updated = self.clone();
        match key {
            "interval_ms" | "interval" => updated.interval_ms = parse(key, value)?,
            "history_capacity" | "history" => updated.history_capacity = parse(key, value)?,
            "collect_processes" => updated.collect_processes = parse(key, value)?,
            "collect_network" => updated.collect_network = parse(key, value)?,
            "collect_disks" => updated.collect_disks = parse(key, value)?,
            "top_processes" | "top" => updated.top_processes = parse(key, value)?,
            "sort_by" | "sort" => {
                updated.sort_by = value.parse().map_err(MonitorError::config)?;
            }
            other => return Err(MonitorError::config(format!("unknown setting: {}", other))),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            collect_processes: self.collect_processes,
            collect_network: self.collect_network,
            collect_disks: self.collect_disks,
            history_capacity: self.history_capacity,
        }
    }
}
