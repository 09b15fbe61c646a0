use std::sync::Arc;
use std::time::Instant;

use super::history::DEFAULT_HISTORY_SIZE;
use super::metrics::{Reading, SystemSnapshot};
use super::process_table::ProcessTable;
use super::sampler::MetricSampler;
use super::source::SystemSource;

/// Configuration for metrics collection
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub collect_processes: bool,
    pub collect_network: bool,
    pub collect_disks: bool,
    pub history_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            collect_processes: true,
            collect_network: true,
            collect_disks: true,
            history_capacity: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// Runs complete sampling cycles: system-wide metrics plus the process table.
///
/// All keyed state (rate baselines, history) belongs to this instance, so
/// independent collectors never share hidden state.
pub struct MetricsCollector {
    source: Arc<dyn SystemSource>,
    sampler: MetricSampler,
    processes: ProcessTable,
    config: CollectorConfig,
    cycles: u64,
}

impl MetricsCollector {
    /// Create a new MetricsCollector with default configuration
    pub fn new(source: Arc<dyn SystemSource>) -> Self {
        Self::with_config(source, CollectorConfig::default())
    }

    /// Create a new MetricsCollector with custom configuration
    ///
    /// Source capabilities and CPU count are probed here, once.
    pub fn with_config(source: Arc<dyn SystemSource>, config: CollectorConfig) -> Self {
        let capabilities = source.capabilities();
        let cpu_count = source.logical_cpu_count();
        log::debug!(
            "Collector initialised: {} logical CPUs, disk io: {}, cpu temperature: {}",
            cpu_count,
            capabilities.disk_io,
            capabilities.cpu_temperature
        );

        Self {
            sampler: MetricSampler::new(capabilities, &config),
            processes: ProcessTable::new(cpu_count),
            source,
            config,
            cycles: 0,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Number of cycles run so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn collect(&mut self) -> SystemSnapshot {
        self.collect_at(Instant::now())
    }

    /// Collect all configured metrics into one snapshot.
    ///
    /// Disabled subsystems are reported as `Unsupported`; a failing one as
    /// `Unavailable`. Either way the snapshot is produced.
    pub fn collect_at(&mut self, now: Instant) -> SystemSnapshot {
        let source = self.source.as_ref();
        let mut snapshot = self.sampler.sample_at(source, now);

        snapshot.processes = if self.config.collect_processes {
            match self.processes.refresh_at(source, now) {
                Ok(records) => Reading::Available(records),
                Err(e) => {
                    log::warn!("Failed to enumerate processes: {}", e);
                    Reading::Unavailable
                }
            }
        } else {
            Reading::Unsupported
        };

        self.cycles += 1;
        snapshot.sequence = self.cycles;
        snapshot
    }
}
