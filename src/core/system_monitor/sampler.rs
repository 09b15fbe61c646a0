//! System-wide metric sampling.
//!
//! One `sample` call reads every system-level counter once and turns it
//! into a snapshot. Network and disk counters go through per-adapter and
//! per-volume rate trackers owned by the sampler; CPU and memory readings
//! are appended to the plotted history series.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::{MonitorError, Result};

use super::collector::CollectorConfig;
use super::history::HistoryBuffer;
use super::metrics::{DiskVolumeState, NetworkAdapterState, Reading, SystemSnapshot};
use super::rate::CounterPair;
use super::source::{AdapterInfo, SourceCapabilities, SystemSource, VolumeInfo};

/// Samples system-wide metrics and keeps the state needed between samples.
#[derive(Debug)]
pub struct MetricSampler {
    capabilities: SourceCapabilities,
    cpu_history: HistoryBuffer<f32>,
    memory_history: HistoryBuffer<f32>,
    adapters: HashMap<String, CounterPair>,
    volumes: HashMap<String, CounterPair>,
    collect_network: bool,
    collect_disks: bool,
}

impl MetricSampler {
    /// Capabilities are fixed for the sampler's lifetime.
    pub fn new(capabilities: SourceCapabilities, config: &CollectorConfig) -> Self {
        Self {
            capabilities,
            cpu_history: HistoryBuffer::with_capacity(config.history_capacity),
            memory_history: HistoryBuffer::with_capacity(config.history_capacity),
            adapters: HashMap::new(),
            volumes: HashMap::new(),
            collect_network: config.collect_network,
            collect_disks: config.collect_disks,
        }
    }

    pub fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    pub fn cpu_history(&self) -> &HistoryBuffer<f32> {
        &self.cpu_history
    }

    pub fn memory_history(&self) -> &HistoryBuffer<f32> {
        &self.memory_history
    }

    pub fn sample(&mut self, source: &dyn SystemSource) -> SystemSnapshot {
        self.sample_at(source, Instant::now())
    }

    /// Build a snapshot of everything except the process table.
    ///
    /// Never fails: a query that errors leaves its field `Unavailable`.
    /// Disabled subsystems are reported as `Unsupported`.
    pub fn sample_at(&mut self, source: &dyn SystemSource, now: Instant) -> SystemSnapshot {
        let cpu_percent = reading(
            source.cpu_load().and_then(|load| {
                if !load.is_finite() {
                    return Err(MonitorError::transient("cpu load is not a finite number"));
                }
                Ok(load.clamp(0.0, 100.0))
            }),
            "cpu load",
        );
        let memory_percent = reading(
            source.memory().and_then(|memory| {
                if memory.total_bytes == 0 {
                    return Err(MonitorError::transient("total memory reported as zero"));
                }
                let used = memory.total_bytes.saturating_sub(memory.available_bytes);
                Ok((used as f64 / memory.total_bytes as f64 * 100.0) as f32)
            }),
            "memory",
        );

        // A failed reading holds the previous point so the series keeps its timebase
        let cpu_point = cpu_percent
            .value()
            .unwrap_or_else(|| self.cpu_history.latest());
        let memory_point = memory_percent
            .value()
            .unwrap_or_else(|| self.memory_history.latest());
        self.cpu_history.append(cpu_point);
        self.memory_history.append(memory_point);

        let disks = if self.collect_disks {
            reading(source.disk_volumes(), "disk volumes")
                .map(|volumes| self.collect_disks(volumes, now))
        } else {
            Reading::Unsupported
        };
        let disk_percent = match &disks {
            Reading::Available(volumes) => aggregate_disk_percent(volumes),
            Reading::Unavailable => Reading::Unavailable,
            Reading::Unsupported => Reading::Unsupported,
        };

        let network = if self.collect_network {
            reading(source.network_adapters(), "network adapters")
                .map(|adapters| self.collect_network(adapters, now))
        } else {
            Reading::Unsupported
        };

        let uptime_hours = reading(source.uptime(), "uptime")
            .map(|uptime| uptime.as_secs_f64() / 3600.0);

        let cpu_temperature = if self.capabilities.cpu_temperature {
            reading(source.cpu_temperature(), "cpu temperature")
        } else {
            Reading::Unsupported
        };

        SystemSnapshot {
            sequence: 0,
            timestamp: chrono::Utc::now().timestamp(),
            cpu_percent,
            memory_percent,
            disk_percent,
            uptime_hours,
            cpu_temperature,
            cpu_history: self.cpu_history.to_vec(),
            memory_history: self.memory_history.to_vec(),
            processes: Reading::Unavailable,
            network,
            disks,
        }
    }

    fn collect_network(
        &mut self,
        adapters: Vec<AdapterInfo>,
        now: Instant,
    ) -> Vec<NetworkAdapterState> {
        // Unplugged adapters lose their trackers; new ones start fresh
        self.adapters
            .retain(|id, _| adapters.iter().any(|adapter| &adapter.id == id));

        adapters
            .into_iter()
            .map(|adapter| {
                let (download, upload) = self
                    .adapters
                    .entry(adapter.id.clone())
                    .or_default()
                    .observe(adapter.bytes_received, adapter.bytes_sent, now);

                NetworkAdapterState {
                    id: adapter.id,
                    name: adapter.name,
                    bytes_sent: adapter.bytes_sent,
                    bytes_received: adapter.bytes_received,
                    upload_bytes_per_sec: upload,
                    download_bytes_per_sec: download,
                }
            })
            .collect()
    }

    fn collect_disks(
        &mut self,
        volumes: Vec<VolumeInfo>,
        now: Instant,
    ) -> Vec<DiskVolumeState> {
        self.volumes
            .retain(|id, _| volumes.iter().any(|volume| &volume.id == id));

        volumes
            .into_iter()
            .map(|volume| {
                let total = volume.total_bytes;
                let free = volume.free_bytes.min(total);
                let used = total - free;

                let (read_bytes_per_sec, write_bytes_per_sec) =
                    match (self.capabilities.disk_io, volume.io) {
                        (false, _) => (Reading::Unsupported, Reading::Unsupported),
                        (true, None) => (Reading::Unavailable, Reading::Unavailable),
                        (true, Some(io)) => {
                            let (read, write) = self
                                .volumes
                                .entry(volume.id.clone())
                                .or_default()
                                .observe(io.read_bytes, io.written_bytes, now);
                            (Reading::Available(read), Reading::Available(write))
                        }
                    };

                DiskVolumeState {
                    id: volume.id,
                    mount_point: volume.mount_point,
                    total_bytes: total,
                    used_bytes: used,
                    free_bytes: free,
                    usage_percent: percent(used, total),
                    read_bytes_per_sec,
                    write_bytes_per_sec,
                }
            })
            .collect()
    }
}

fn reading<T>(result: Result<T>, what: &str) -> Reading<T> {
    match result {
        Ok(value) => Reading::Available(value),
        Err(e) if e.is_unsupported() => Reading::Unsupported,
        Err(e) => {
            log::warn!("Failed to read {}: {}", what, e);
            Reading::Unavailable
        }
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total > 0 {
        (used as f64 / total as f64 * 100.0) as f32
    } else {
        0.0
    }
}

/// Used space over total space across all volumes.
fn aggregate_disk_percent(volumes: &[DiskVolumeState]) -> Reading<f32> {
    let total: u64 = volumes.iter().map(|v| v.total_bytes).sum();
    if total == 0 {
        return Reading::Unavailable;
    }
    let used: u64 = volumes.iter().map(|v| v.used_bytes).sum();
    Reading::Available(percent(used, total))
}
