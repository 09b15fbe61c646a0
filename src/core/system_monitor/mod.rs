//! System telemetry sampling engine.
//!
//! This module turns raw host counters into rates, bounded history series
//! and immutable snapshots that any number of readers can consume while the
//! scheduler keeps sampling.

mod collector;
mod history;
mod metrics;
pub mod process_table;
mod rate;
mod sampler;
mod scheduler;
pub mod source;

pub use collector::{CollectorConfig, MetricsCollector};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_SIZE};
pub use metrics::{
    DiskVolumeState, NetworkAdapterState, ProcessRecord, ProcessStatus, Reading, SystemSnapshot,
};
pub use process_table::{sort_processes, ProcessSortKey, ProcessTable, SortOrder};
pub use rate::{CounterPair, CounterSample, RateTracker};
pub use sampler::MetricSampler;
pub use scheduler::{SamplingScheduler, SchedulerState, SnapshotReceiver, DEFAULT_INTERVAL};
pub use source::{
    AdapterInfo, IoCounters, MemoryInfo, ProcessInfo, ProcessTimes, SourceCapabilities,
    SystemSource, VolumeInfo,
};
