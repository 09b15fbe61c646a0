//! `SystemSource` backed by the `sysinfo` crate.

use std::time::Duration;

use parking_lot::Mutex;
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, Pid, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System,
};

use crate::core::system_monitor::{
    AdapterInfo, IoCounters, MemoryInfo, ProcessInfo, ProcessTimes, SourceCapabilities,
    SystemSource, VolumeInfo,
};
use crate::error::{MonitorError, Result};

/// Labels that identify a CPU package sensor across platforms
const CPU_SENSOR_LABELS: &[&str] = &["cpu", "package", "tctl", "tdie", "core"];

/// Host counters read through sysinfo.
///
/// sysinfo refreshes are `&mut`, so each handle sits behind its own lock;
/// process, disk and network queries never contend with each other.
pub struct SysinfoSource {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    components: Mutex<Components>,
    capabilities: SourceCapabilities,
    cpu_count: usize,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        let mut system = System::new_with_specifics(refresh_kind);

        // CPU usage needs two refreshes spaced by the minimum interval
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();

        let components = Components::new_with_refreshed_list();
        let cpu_temperature = components
            .iter()
            .any(|c| is_cpu_sensor(c.label()) && c.temperature().is_some());

        let capabilities = SourceCapabilities {
            disk_io: cfg!(any(
                target_os = "linux",
                target_os = "windows",
                target_os = "macos",
                target_os = "freebsd"
            )),
            cpu_temperature,
        };
        log::debug!("sysinfo capabilities: {:?}", capabilities);

        Self {
            cpu_count: system.cpus().len().max(1),
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            components: Mutex::new(components),
            capabilities,
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn is_cpu_sensor(label: &str) -> bool {
    let label = label.to_lowercase();
    CPU_SENSOR_LABELS.iter().any(|needle| label.contains(needle))
}

impl SystemSource for SysinfoSource {
    fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    fn logical_cpu_count(&self) -> usize {
        self.cpu_count
    }

    fn enumerate_processes(&self) -> Result<Vec<ProcessInfo>> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let processes: Vec<ProcessInfo> = system
            .processes()
            .values()
            .map(|process| ProcessInfo {
                pid: process.pid().as_u32(),
                name: process.name().to_string_lossy().to_string(),
            })
            .collect();

        if processes.is_empty() {
            return Err(MonitorError::transient("process list is empty"));
        }
        Ok(processes)
    }

    /// sysinfo only reports combined CPU time, so it is returned as user time.
    fn process_times(&self, pid: u32) -> Result<ProcessTimes> {
        let system = self.system.lock();
        let process = system
            .process(Pid::from_u32(pid))
            .ok_or(MonitorError::ProcessGone(pid))?;

        Ok(ProcessTimes {
            kernel: Duration::ZERO,
            user: Duration::from_millis(process.accumulated_cpu_time()),
            creation_time: process.start_time(),
        })
    }

    fn process_memory(&self, pid: u32) -> Result<u64> {
        let system = self.system.lock();
        system
            .process(Pid::from_u32(pid))
            .map(|process| process.memory())
            .ok_or(MonitorError::ProcessGone(pid))
    }

    fn cpu_load(&self) -> Result<f32> {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        let usage = system.global_cpu_usage();
        if usage.is_nan() {
            return Err(MonitorError::transient("cpu usage is not a number"));
        }
        Ok(usage)
    }

    fn memory(&self) -> Result<MemoryInfo> {
        let mut system = self.system.lock();
        system.refresh_memory();
        Ok(MemoryInfo {
            total_bytes: system.total_memory(),
            available_bytes: system.available_memory(),
        })
    }

    fn disk_volumes(&self) -> Result<Vec<VolumeInfo>> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        Ok(disks
            .iter()
            .map(|disk| {
                let usage = disk.usage();
                VolumeInfo {
                    id: disk.mount_point().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    total_bytes: disk.total_space(),
                    free_bytes: disk.available_space(),
                    io: Some(IoCounters {
                        read_bytes: usage.total_read_bytes,
                        written_bytes: usage.total_written_bytes,
                    }),
                }
            })
            .collect())
    }

    fn network_adapters(&self) -> Result<Vec<AdapterInfo>> {
        let mut networks = self.networks.lock();
        networks.refresh(true);

        Ok(networks
            .iter()
            .map(|(name, data)| AdapterInfo {
                id: name.to_string(),
                name: name.to_string(),
                bytes_sent: data.total_transmitted(),
                bytes_received: data.total_received(),
            })
            .collect())
    }

    fn uptime(&self) -> Result<Duration> {
        Ok(Duration::from_secs(System::uptime()))
    }

    fn cpu_temperature(&self) -> Result<f32> {
        if !self.capabilities.cpu_temperature {
            return Err(MonitorError::unsupported("cpu temperature sensor"));
        }

        let mut components = self.components.lock();
        components.refresh(true);

        hottest_cpu_reading(components.iter().map(|c| (c.label(), c.temperature())))
    }
}

/// Highest finite reading among CPU-labelled sensors.
///
/// A sensor list with no CPU sensor left (e.g. a driver unloaded since
/// startup) is `NotFound`; a sensor that reports nothing usable this
/// cycle is a transient failure.
fn hottest_cpu_reading<'a>(
    sensors: impl Iterator<Item = (&'a str, Option<f32>)>,
) -> Result<f32> {
    let mut found_sensor = false;
    let hottest = sensors
        .filter(|(label, _)| is_cpu_sensor(label))
        .inspect(|_| found_sensor = true)
        .filter_map(|(_, temperature)| temperature)
        .filter(|t| t.is_finite())
        .reduce(f32::max);

    match hottest {
        Some(temperature) => Ok(temperature),
        None if found_sensor => Err(MonitorError::transient("no cpu sensor reading")),
        None => Err(MonitorError::not_found("cpu temperature sensor")),
    }
}
