//! Host counter source abstraction.
//!
//! The sampling engine never talks to the OS directly. Everything it reads
//! goes through [`SystemSource`]; the production implementation lives in the
//! platform layer, tests plug in scripted sources.

use std::time::Duration;

use crate::error::{MonitorError, Result};

/// A live process as seen by one enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Cumulative CPU time of one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTimes {
    pub kernel: Duration,
    pub user: Duration,
    /// Opaque creation stamp. Two different values for one pid mean the pid was reused.
    pub creation_time: u64,
}

impl ProcessTimes {
    pub fn total(&self) -> Duration {
        self.kernel + self.user
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Cumulative I/O byte counters of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub id: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    /// `None` when the platform exposes no per-volume counters.
    pub io: Option<IoCounters>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub id: String,
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Optional counters a source can provide, probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceCapabilities {
    pub disk_io: bool,
    pub cpu_temperature: bool,
}

/// Trait for host counter providers
///
/// Each call is an independent OS query and may fail on its own; callers
/// decide what a failure means for the snapshot being built.
pub trait SystemSource: Send + Sync {
    fn capabilities(&self) -> SourceCapabilities;

    /// Number of logical CPUs used to normalise per-process CPU%.
    fn logical_cpu_count(&self) -> usize;

    fn enumerate_processes(&self) -> Result<Vec<ProcessInfo>>;

    /// Fails with `ProcessGone` if the pid no longer exists.
    fn process_times(&self, pid: u32) -> Result<ProcessTimes>;

    /// Working-set bytes of the process.
    fn process_memory(&self, pid: u32) -> Result<u64>;

    /// System-wide CPU load, already averaged by the OS.
    fn cpu_load(&self) -> Result<f32>;

    fn memory(&self) -> Result<MemoryInfo>;

    fn disk_volumes(&self) -> Result<Vec<VolumeInfo>>;

    fn network_adapters(&self) -> Result<Vec<AdapterInfo>>;

    /// Monotonic time since boot.
    fn uptime(&self) -> Result<Duration>;

    fn cpu_temperature(&self) -> Result<f32> {
        Err(MonitorError::unsupported("cpu temperature"))
    }
}
