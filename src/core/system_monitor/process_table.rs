//! Per-process CPU and memory tracking across enumeration passes.
//!
//! The table owns one CPU-time baseline per pid. A pid that drops out of an
//! enumeration, or comes back with a different creation stamp, gets a fresh
//! baseline so a reused pid never inherits someone else's CPU time.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::metrics::{ProcessRecord, ProcessStatus};
use super::rate::RateTracker;
use super::source::{ProcessInfo, SystemSource};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Consecutive misses tolerated before a record is evicted
const MAX_MISSED_CYCLES: u32 = 1;

#[derive(Debug)]
struct TrackedProcess {
    record: ProcessRecord,
    creation_time: u64,
    cpu_time: RateTracker,
    missed_cycles: u32,
}

/// Tracks the live process set and per-process CPU usage.
#[derive(Debug)]
pub struct ProcessTable {
    entries: HashMap<u32, TrackedProcess>,
    cpu_count: usize,
}

impl ProcessTable {
    /// `cpu_count` normalises CPU% so a fully busy machine reads 100%.
    pub fn new(cpu_count: usize) -> Self {
        Self {
            entries: HashMap::new(),
            cpu_count: cpu_count.max(1),
        }
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn refresh(&mut self, source: &dyn SystemSource) -> Result<Vec<ProcessRecord>> {
        self.refresh_at(source, Instant::now())
    }

    /// Run one enumeration pass and return the current records, ordered by pid.
    ///
    /// Fails only when the enumeration itself fails; the table is left
    /// untouched in that case. Per-process failures mark the record stale.
    pub fn refresh_at(
        &mut self,
        source: &dyn SystemSource,
        now: Instant,
    ) -> Result<Vec<ProcessRecord>> {
        let live = source.enumerate_processes()?;
        let mut seen = HashSet::with_capacity(live.len());

        for info in live {
            seen.insert(info.pid);
            self.observe(source, info, now);
        }

        self.entries.retain(|pid, entry| {
            if seen.contains(pid) {
                return true;
            }
            entry.missed_cycles += 1;
            entry.record.status = ProcessStatus::Stale;
            // An enumeration gap may hide pid reuse
            entry.cpu_time.reset();
            if entry.missed_cycles > MAX_MISSED_CYCLES {
                log::debug!("Evicting process {} ({})", pid, entry.record.name);
                return false;
            }
            true
        });

        let mut records: Vec<ProcessRecord> =
            self.entries.values().map(|e| e.record.clone()).collect();
        records.sort_by_key(|r| r.pid);
        Ok(records)
    }

    fn observe(&mut self, source: &dyn SystemSource, info: ProcessInfo, now: Instant) {
        let pid = info.pid;
        let queried = source
            .process_times(pid)
            .and_then(|times| Ok((times, source.process_memory(pid)?)));

        let (times, memory_bytes) = match queried {
            Ok(values) => values,
            Err(e) => {
                if !e.is_process_churn() {
                    log::warn!("Failed to query process {}: {}", pid, e);
                }
                // Keep what we had, flagged, without touching the baseline
                if let Some(entry) = self.entries.get_mut(&pid) {
                    entry.missed_cycles += 1;
                    entry.record.status = ProcessStatus::Stale;
                    if entry.missed_cycles > MAX_MISSED_CYCLES {
                        self.entries.remove(&pid);
                    }
                }
                return;
            }
        };

        let reused = self
            .entries
            .get(&pid)
            .is_some_and(|entry| entry.creation_time != times.creation_time);
        if reused {
            log::debug!("Resetting CPU baseline for reused pid {}", pid);
            self.entries.remove(&pid);
        }

        let cpu_count = self.cpu_count as f64;
        let entry = self.entries.entry(pid).or_insert_with(|| TrackedProcess {
            record: ProcessRecord {
                pid,
                ..Default::default()
            },
            creation_time: times.creation_time,
            cpu_time: RateTracker::new(),
            missed_cycles: 0,
        });

        let cpu_nanos = times.total().as_nanos().min(u64::MAX as u128) as u64;
        let cpu_usage_percent = entry
            .cpu_time
            .observe(cpu_nanos, now)
            .map(|nanos_per_sec| (nanos_per_sec * 100.0 / NANOS_PER_SEC / cpu_count) as f32)
            .unwrap_or(0.0);

        entry.missed_cycles = 0;
        entry.record = ProcessRecord {
            pid,
            name: info.name,
            memory_bytes,
            cpu_time_ms: times.total().as_millis().min(u64::MAX as u128) as u64,
            cpu_usage_percent,
            status: ProcessStatus::Running,
        };
    }
}

/// Ordering keys a consumer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessSortKey {
    Name,
    Pid,
    #[default]
    Cpu,
    Memory,
    Status,
}

impl std::str::FromStr for ProcessSortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "pid" => Ok(Self::Pid),
            "cpu" => Ok(Self::Cpu),
            "memory" | "mem" => Ok(Self::Memory),
            "status" => Ok(Self::Status),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Sort records by `key`; ties always break on pid ascending.
pub fn sort_processes(records: &mut [ProcessRecord], key: ProcessSortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let primary = match key {
            ProcessSortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProcessSortKey::Pid => a.pid.cmp(&b.pid),
            ProcessSortKey::Cpu => a
                .cpu_usage_percent
                .partial_cmp(&b.cpu_usage_percent)
                .unwrap_or(Ordering::Equal),
            ProcessSortKey::Memory => a.memory_bytes.cmp(&b.memory_bytes),
            ProcessSortKey::Status => a.status.cmp(&b.status),
        };
        let primary = match order {
            SortOrder::Ascending => primary,
            SortOrder::Descending => primary.reverse(),
        };
        primary.then_with(|| a.pid.cmp(&b.pid))
    });
}
