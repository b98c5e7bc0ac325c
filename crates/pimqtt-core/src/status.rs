//! Status report types.
//!
//! Field names are `snake_case` on the wire. Every subsystem section is always
//! present; sections that cannot be read on a platform serialize as empty
//! collections rather than being dropped.

use std::collections::BTreeMap;

use serde::Serialize;

/// Full system snapshot published in response to `status`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StatusReport {
    /// OS identity.
    pub system: SystemInfo,
    /// Boot time, uptime, load.
    pub boot: BootInfo,
    /// CPU count, frequencies, per-core load.
    pub cpu: CpuInfo,
    /// Virtual memory and swap.
    pub memory: MemoryInfo,
    /// Per-partition usage.
    pub disk: DiskInfo,
    /// Interface addressing and cumulative counters.
    pub net: NetInfo,
    /// Sensor group → label → reading.
    pub temperatures: BTreeMap<String, BTreeMap<String, TemperatureReading>>,
}

/// OS identity.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SystemInfo {
    /// OS name (e.g. `Debian GNU/Linux`).
    pub os: String,
    /// OS release version.
    pub os_version: String,
    /// Kernel version.
    pub kernel: String,
    /// Host name.
    pub hostname: String,
    /// CPU architecture.
    pub arch: String,
}

/// Boot and load information.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BootInfo {
    /// Boot time, RFC 3339.
    pub boot_time: String,
    /// Seconds since boot.
    pub uptime_secs: u64,
    /// Uptime rendered as `1d 2h 3m 4s`.
    pub uptime: String,
    /// 1/5/15 minute load averages.
    pub load_average: LoadAverage,
}

/// Load averages.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LoadAverage {
    /// One-minute average.
    pub one: f64,
    /// Five-minute average.
    pub five: f64,
    /// Fifteen-minute average.
    pub fifteen: f64,
}

/// CPU section.
///
/// The max/min/current frequencies summarize the cores' current clock
/// readings at sampling time; they are not the hardware frequency limits.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CpuInfo {
    /// Logical core count.
    pub logical_cores: usize,
    /// Highest current per-core frequency.
    pub max_frequency: String,
    /// Lowest current per-core frequency.
    pub min_frequency: String,
    /// Mean frequency across cores.
    pub current_frequency: String,
    /// Per-core usage and frequency.
    pub cores: Vec<CoreInfo>,
    /// Usage across all cores.
    pub total_usage: String,
}

/// One logical core.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CoreInfo {
    /// Core label as reported by the OS.
    pub name: String,
    /// Usage over the sampling window.
    pub usage: String,
    /// Current frequency.
    pub frequency: String,
}

/// Memory section.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryInfo {
    /// Physical memory.
    #[serde(rename = "virtual")]
    pub virtual_memory: VirtualMemory,
    /// Swap space.
    pub swap: SwapMemory,
}

/// Physical memory usage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VirtualMemory {
    /// Total installed.
    pub total: String,
    /// Available for new allocations.
    pub available: String,
    /// In use.
    pub used: String,
    /// Used share of total.
    pub percentage: String,
}

/// Swap usage.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SwapMemory {
    /// Total swap.
    pub total: String,
    /// Unused swap.
    pub free: String,
    /// Used swap.
    pub used: String,
    /// Used share of total.
    pub percentage: String,
}

/// Disk section.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiskInfo {
    /// Readable partitions; unreadable ones are skipped.
    pub partitions: Vec<PartitionUsage>,
}

/// Usage of a single mounted partition.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PartitionUsage {
    /// Device name.
    pub device: String,
    /// Mount point.
    pub mountpoint: String,
    /// File system type.
    pub file_system_type: String,
    /// Total capacity.
    pub total_size: String,
    /// Used space.
    pub used: String,
    /// Free space.
    pub free: String,
    /// Used share of total.
    pub percentage: String,
}

/// Network section.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetInfo {
    /// Interface name → addresses.
    pub interfaces: BTreeMap<String, Vec<InterfaceAddress>>,
    /// Cumulative counters across all interfaces.
    pub io: NetIo,
}

/// Address family of an interface address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AddressFamily {
    /// IPv4.
    #[serde(rename = "IPv4")]
    Ipv4,
    /// IPv6.
    #[serde(rename = "IPv6")]
    Ipv6,
    /// Link-layer (MAC).
    #[serde(rename = "link")]
    Link,
}

/// One address bound to an interface.
#[derive(Clone, Debug, Serialize)]
pub struct InterfaceAddress {
    /// Address family.
    pub family: AddressFamily,
    /// Address text.
    pub address: String,
    /// Netmask text, when meaningful for the family.
    pub netmask: Option<String>,
    /// Broadcast address, when meaningful for the family.
    pub broadcast: Option<String>,
}

/// Cumulative network counters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetIo {
    /// Bytes sent.
    pub bytes_sent: String,
    /// Bytes received.
    pub bytes_received: String,
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Receive errors.
    pub errors_in: u64,
    /// Transmit errors.
    pub errors_out: u64,
}

/// A single temperature sensor reading.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TemperatureReading {
    /// Current temperature.
    pub current: Option<String>,
    /// Highest temperature observed since the sensor was first read.
    ///
    /// A peak reading, not a configured threshold.
    pub high: Option<String>,
    /// Critical threshold.
    pub critical: Option<String>,
}
