use serde::{Deserialize, Serialize};

/// A snapshot field that may be missing.
///
/// `Unavailable` means the query failed this cycle; `Unsupported` means the
/// platform never provides it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    Available(T),
    #[default]
    Unavailable,
    Unsupported,
}

impl<T> Reading<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Reading::Available(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Available(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Available(value) => Reading::Available(f(value)),
            Reading::Unavailable => Reading::Unavailable,
            Reading::Unsupported => Reading::Unsupported,
        }
    }
}

impl<T: Copy> Reading<T> {
    pub fn value(&self) -> Option<T> {
        self.as_option().copied()
    }
}

/// Complete system snapshot produced by one sampling cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// Cycle number, starting at 1 for the first published snapshot
    pub sequence: u64,
    pub timestamp: i64, // Unix timestamp
    pub cpu_percent: Reading<f32>,
    pub memory_percent: Reading<f32>,
    pub disk_percent: Reading<f32>,
    pub uptime_hours: Reading<f64>,
    pub cpu_temperature: Reading<f32>,
    /// Oldest-first copies of the plotted series
    pub cpu_history: Vec<f32>,
    pub memory_history: Vec<f32>,
    pub processes: Reading<Vec<ProcessRecord>>,
    pub network: Reading<Vec<NetworkAdapterState>>,
    pub disks: Reading<Vec<DiskVolumeState>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessStatus {
    #[default]
    Running,
    /// Missed by the latest pass; kept for one cycle to avoid flicker
    Stale,
}

impl ProcessStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessStatus::Running => "Running",
            ProcessStatus::Stale => "Stale",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub memory_bytes: u64,
    /// Kernel + user CPU time at the last successful read, in milliseconds
    pub cpu_time_ms: u64,
    pub cpu_usage_percent: f32,
    pub status: ProcessStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkAdapterState {
    pub id: String,
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub upload_bytes_per_sec: f64,
    pub download_bytes_per_sec: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskVolumeState {
    pub id: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f32,
    pub read_bytes_per_sec: Reading<f64>,
    pub write_bytes_per_sec: Reading<f64>,
}
