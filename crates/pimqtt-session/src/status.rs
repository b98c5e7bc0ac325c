//! Live system snapshot via `sysinfo`.
//!
//! Every section of [`StatusReport`] is always filled in, possibly with
//! empty collections. Per-resource problems (an unreadable partition, a
//! sensor without a reading) drop only that resource.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use chrono::{DateTime, Utc};
use pimqtt_core::format::{
    format_bytes, format_frequency, format_percent, format_temperature, format_uptime, percent_of,
};
use pimqtt_core::status::{
    AddressFamily, BootInfo, CoreInfo, CpuInfo, DiskInfo, InterfaceAddress, LoadAverage,
    MemoryInfo, NetInfo, NetIo, PartitionUsage, StatusReport, SwapMemory, SystemInfo,
    TemperatureReading, VirtualMemory,
};
use sysinfo::{Components, Disks, Networks, System};
use tracing::{debug, instrument};

/// CPU usage sampling window.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Group name for sensors whose label has no group prefix.
const UNGROUPED_SENSOR: &str = "sensors";

/// Gathers [`StatusReport`]s.
#[derive(Clone, Debug)]
pub struct StatusCollector {
    sample_window: Duration,
}

impl StatusCollector {
    /// Collector with the standard 1-second CPU sampling window.
    pub fn new() -> Self {
        Self {
            sample_window: CPU_SAMPLE_WINDOW,
        }
    }

    /// Collector with a custom sampling window.
    pub fn with_sample_window(sample_window: Duration) -> Self {
        Self { sample_window }
    }

    /// Take a snapshot. Awaits the CPU sampling window.
    #[instrument(skip(self), fields(window_ms = self.sample_window.as_millis()))]
    pub async fn collect(&self) -> StatusReport {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        tokio::time::sleep(self.sample_window).await;
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let report = StatusReport {
            system: system_info(),
            boot: boot_info(),
            cpu: cpu_info(&sys),
            memory: memory_info(&sys),
            disk: disk_info(),
            net: net_info(),
            temperatures: temperatures(),
        };
        debug!(
            cores = report.cpu.logical_cores,
            partitions = report.disk.partitions.len(),
            interfaces = report.net.interfaces.len(),
            "status snapshot collected"
        );
        report
    }
}

impl Default for StatusCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sections ────────────────────────────────────────────────────────────────

fn system_info() -> SystemInfo {
    SystemInfo {
        os: System::name().unwrap_or_default(),
        os_version: System::os_version().unwrap_or_default(),
        kernel: System::kernel_version().unwrap_or_default(),
        hostname: System::host_name().unwrap_or_default(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

fn boot_info() -> BootInfo {
    let uptime_secs = System::uptime();
    let load = System::load_average();
    BootInfo {
        boot_time: format_boot_time(System::boot_time()),
        uptime_secs,
        uptime: format_uptime(uptime_secs),
        load_average: LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        },
    }
}

fn cpu_info(sys: &System) -> CpuInfo {
    let cores: Vec<CoreInfo> = sys
        .cpus()
        .iter()
        .map(|cpu| CoreInfo {
            name: cpu.name().to_string(),
            usage: format_percent(f64::from(cpu.cpu_usage())),
            frequency: format_mhz(cpu.frequency()),
        })
        .collect();
    let frequencies: Vec<u64> = sys.cpus().iter().map(sysinfo::Cpu::frequency).collect();
    let summary = FrequencySummary::from_mhz(&frequencies);

    CpuInfo {
        logical_cores: cores.len(),
        max_frequency: format_mhz(summary.max),
        min_frequency: format_mhz(summary.min),
        current_frequency: format_frequency(summary.mean),
        cores,
        total_usage: format_percent(f64::from(sys.global_cpu_usage())),
    }
}

fn memory_info(sys: &System) -> MemoryInfo {
    let total = sys.total_memory();
    let used = sys.used_memory();
    let swap_total = sys.total_swap();
    let swap_used = sys.used_swap();
    MemoryInfo {
        virtual_memory: VirtualMemory {
            total: format_bytes(total),
            available: format_bytes(sys.available_memory()),
            used: format_bytes(used),
            percentage: format_percent(percent_of(used, total)),
        },
        swap: SwapMemory {
            total: format_bytes(swap_total),
            free: format_bytes(sys.free_swap()),
            used: format_bytes(swap_used),
            percentage: format_percent(percent_of(swap_used, swap_total)),
        },
    }
}

fn disk_info() -> DiskInfo {
    let disks = Disks::new_with_refreshed_list();
    let partitions = disks
        .list()
        .iter()
        .filter_map(|disk| {
            partition_usage(
                &disk.name().to_string_lossy(),
                &disk.mount_point().to_string_lossy(),
                &disk.file_system().to_string_lossy(),
                disk.total_space(),
                disk.available_space(),
            )
        })
        .collect();
    DiskInfo { partitions }
}

fn net_info() -> NetInfo {
    let networks = Networks::new_with_refreshed_list();
    let mut interfaces = BTreeMap::new();
    let mut counters = NetCounters::default();

    for (name, data) in &networks {
        let mac = data.mac_address();
        let mac = (!mac.is_unspecified()).then(|| mac.to_string());
        let ips: Vec<(IpAddr, u8)> = data
            .ip_networks()
            .iter()
            .map(|net| (net.addr, net.prefix))
            .collect();
        let _ = interfaces.insert(name.clone(), interface_addresses(mac, &ips));

        counters.bytes_sent += data.total_transmitted();
        counters.bytes_received += data.total_received();
        counters.packets_sent += data.total_packets_transmitted();
        counters.packets_received += data.total_packets_received();
        counters.errors_in += data.total_errors_on_received();
        counters.errors_out += data.total_errors_on_transmitted();
    }

    NetInfo {
        interfaces,
        io: counters.into_io(),
    }
}

fn temperatures() -> BTreeMap<String, BTreeMap<String, TemperatureReading>> {
    let components = Components::new_with_refreshed_list();
    let mut groups: BTreeMap<String, BTreeMap<String, TemperatureReading>> = BTreeMap::new();
    for component in components.list() {
        let (group, label) = sensor_group(component.label());
        let reading =
            temperature_reading(component.temperature(), component.max(), component.critical());
        let _ = groups.entry(group).or_default().insert(label, reading);
    }
    groups
}

// ── Pure helpers ────────────────────────────────────────────────────────────

#[allow(clippy::cast_precision_loss)]
fn format_mhz(mhz: u64) -> String {
    format_frequency(mhz as f64)
}

fn format_boot_time(epoch_secs: u64) -> String {
    i64::try_from(epoch_secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

/// Sensor reading. `high` carries the observed peak; sysinfo exposes no
/// high threshold.
fn temperature_reading(
    current: Option<f32>,
    peak: Option<f32>,
    critical: Option<f32>,
) -> TemperatureReading {
    TemperatureReading {
        current: current.map(format_temperature),
        high: peak.map(format_temperature),
        critical: critical.map(format_temperature),
    }
}

/// Max, min, and mean of the cores' current frequencies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct FrequencySummary {
    max: u64,
    min: u64,
    mean: f64,
}

impl FrequencySummary {
    fn from_mhz(frequencies: &[u64]) -> Self {
        if frequencies.is_empty() {
            return Self::default();
        }
        let sum: u64 = frequencies.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum as f64 / frequencies.len() as f64;
        Self {
            max: frequencies.iter().copied().max().unwrap_or_default(),
            min: frequencies.iter().copied().min().unwrap_or_default(),
            mean,
        }
    }
}

/// Usage of one partition; `None` when its size cannot be read.
fn partition_usage(
    device: &str,
    mountpoint: &str,
    file_system_type: &str,
    total: u64,
    available: u64,
) -> Option<PartitionUsage> {
    if total == 0 {
        debug!(device, mountpoint, "skipping partition with unreadable size");
        return None;
    }
    let used = total.saturating_sub(available);
    Some(PartitionUsage {
        device: device.to_owned(),
        mountpoint: mountpoint.to_owned(),
        file_system_type: file_system_type.to_owned(),
        total_size: format_bytes(total),
        used: format_bytes(used),
        free: format_bytes(available),
        percentage: format_percent(percent_of(used, total)),
    })
}

/// Addresses of one interface: link layer first, then IP addresses in order.
fn interface_addresses(mac: Option<String>, ips: &[(IpAddr, u8)]) -> Vec<InterfaceAddress> {
    let link = mac.map(|address| InterfaceAddress {
        family: AddressFamily::Link,
        address,
        netmask: None,
        broadcast: Some("ff:ff:ff:ff:ff:ff".to_string()),
    });
    let ip = ips.iter().map(|&(addr, prefix)| match addr {
        IpAddr::V4(v4) => InterfaceAddress {
            family: AddressFamily::Ipv4,
            address: v4.to_string(),
            netmask: Some(ipv4_netmask(prefix).to_string()),
            broadcast: Some(ipv4_broadcast(v4, prefix).to_string()),
        },
        IpAddr::V6(v6) => InterfaceAddress {
            family: AddressFamily::Ipv6,
            address: v6.to_string(),
            netmask: Some(ipv6_netmask(prefix).to_string()),
            broadcast: None,
        },
    });
    link.into_iter().chain(ip).collect()
}

fn ipv4_netmask(prefix: u8) -> Ipv4Addr {
    let prefix = u32::from(prefix.min(32));
    let bits = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
    Ipv4Addr::from(bits)
}

fn ipv4_broadcast(addr: Ipv4Addr, prefix: u8) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr) | !u32::from(ipv4_netmask(prefix)))
}

fn ipv6_netmask(prefix: u8) -> Ipv6Addr {
    let prefix = u32::from(prefix.min(128));
    let bits = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
    Ipv6Addr::from(bits)
}

/// Split a sensor label into `(group, label)` on the first space.
fn sensor_group(label: &str) -> (String, String) {
    match label.trim().split_once(' ') {
        Some((group, rest)) if !rest.trim().is_empty() => {
            (group.to_owned(), rest.trim().to_owned())
        }
        _ => (UNGROUPED_SENSOR.to_owned(), label.trim().to_owned()),
    }
}

#[derive(Default)]
struct NetCounters {
    bytes_sent: u64,
    bytes_received: u64,
    packets_sent: u64,
    packets_received: u64,
    errors_in: u64,
    errors_out: u64,
}

impl NetCounters {
    fn into_io(self) -> NetIo {
        NetIo {
            bytes_sent: format_bytes(self.bytes_sent),
            bytes_received: format_bytes(self.bytes_received),
            packets_sent: self.packets_sent,
            packets_received: self.packets_received,
            errors_in: self.errors_in,
            errors_out: self.errors_out,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
