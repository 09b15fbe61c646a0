//! Scriptable host used by the integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sysmon::core::system_monitor::{
    AdapterInfo, IoCounters, MemoryInfo, MetricsCollector, ProcessInfo, ProcessTimes,
    SourceCapabilities, SystemSource, VolumeInfo,
};
use sysmon::MonitorError;

#[derive(Debug, Clone)]
pub struct HostProcess {
    pub name: String,
    pub cpu_time: Duration,
    pub creation_time: u64,
    pub memory: u64,
}

/// Counters the test mutates between cycles.
#[derive(Debug, Clone)]
pub struct HostState {
    pub cpu_count: usize,
    pub cpu_load: f32,
    pub memory: MemoryInfo,
    pub processes: HashMap<u32, HostProcess>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub disk_read: u64,
    pub disk_written: u64,
    /// Added to the network and disk counters on every query
    pub counter_step: u64,
    /// Added to `cpu_load` on every query, wrapping at 100
    pub cpu_step: f32,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            cpu_count: 1,
            cpu_load: 10.0,
            memory: MemoryInfo {
                total_bytes: 8_000,
                available_bytes: 2_000,
            },
            processes: HashMap::new(),
            bytes_sent: 0,
            bytes_received: 0,
            disk_read: 0,
            disk_written: 0,
            counter_step: 0,
            cpu_step: 0.0,
        }
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub state: Mutex<HostState>,
    /// Artificial latency for each CPU query
    pub cpu_delay: Mutex<Duration>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_state(state: HostState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            cpu_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn add_process(&self, pid: u32, name: &str, cpu_millis: u64, creation_time: u64) {
        self.state.lock().processes.insert(
            pid,
            HostProcess {
                name: name.to_string(),
                cpu_time: Duration::from_millis(cpu_millis),
                creation_time,
                memory: 1_000_000,
            },
        );
    }

    pub fn set_cpu_time(&self, pid: u32, cpu_millis: u64) {
        if let Some(process) = self.state.lock().processes.get_mut(&pid) {
            process.cpu_time = Duration::from_millis(cpu_millis);
        }
    }
}

pub fn collector_for(host: &Arc<FakeHost>) -> MetricsCollector {
    let source: Arc<dyn SystemSource> = host.clone();
    MetricsCollector::new(source)
}

impl SystemSource for FakeHost {
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities {
            disk_io: true,
            cpu_temperature: false,
        }
    }

    fn logical_cpu_count(&self) -> usize {
        self.state.lock().cpu_count
    }

    fn enumerate_processes(&self) -> sysmon::Result<Vec<ProcessInfo>> {
        Ok(self
            .state
            .lock()
            .processes
            .iter()
            .map(|(&pid, process)| ProcessInfo {
                pid,
                name: process.name.clone(),
            })
            .collect())
    }

    fn process_times(&self, pid: u32) -> sysmon::Result<ProcessTimes> {
        let state = self.state.lock();
        let process = state
            .processes
            .get(&pid)
            .ok_or(MonitorError::ProcessGone(pid))?;
        Ok(ProcessTimes {
            kernel: Duration::ZERO,
            user: process.cpu_time,
            creation_time: process.creation_time,
        })
    }

    fn process_memory(&self, pid: u32) -> sysmon::Result<u64> {
        let state = self.state.lock();
        state
            .processes
            .get(&pid)
            .map(|process| process.memory)
            .ok_or(MonitorError::ProcessGone(pid))
    }

    fn cpu_load(&self) -> sysmon::Result<f32> {
        let delay = *self.cpu_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        let load = state.cpu_load;
        state.cpu_load = (state.cpu_load + state.cpu_step) % 100.0;
        Ok(load)
    }

    fn memory(&self) -> sysmon::Result<MemoryInfo> {
        Ok(self.state.lock().memory)
    }

    fn disk_volumes(&self) -> sysmon::Result<Vec<VolumeInfo>> {
        let mut state = self.state.lock();
        state.disk_read += state.counter_step;
        state.disk_written += state.counter_step;
        Ok(vec![VolumeInfo {
            id: "/".to_string(),
            mount_point: "/".to_string(),
            total_bytes: 1_000,
            free_bytes: 250,
            io: Some(IoCounters {
                read_bytes: state.disk_read,
                written_bytes: state.disk_written,
            }),
        }])
    }

    fn network_adapters(&self) -> sysmon::Result<Vec<AdapterInfo>> {
        let mut state = self.state.lock();
        state.bytes_sent += state.counter_step;
        state.bytes_received += state.counter_step;
        Ok(vec![AdapterInfo {
            id: "eth0".to_string(),
            name: "Ethernet".to_string(),
            bytes_sent: state.bytes_sent,
            bytes_received: state.bytes_received,
        }])
    }

    fn uptime(&self) -> sysmon::Result<Duration> {
        Ok(Duration::from_secs(7_200))
    }
}
