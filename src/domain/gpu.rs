//! GPU facts read through NVML
//!
//! These are the raw values the NVML backend packs into NV-CONTROL
//! attribute values.

use serde::{Deserialize, Serialize};

/// PCI location and identity of a GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PciInfo {
    pub domain: u32,
    pub bus: u32,
    pub device: u32,
    pub function: u32,
    pub vendor_id: u16,
    pub device_id: u16,
}

impl PciInfo {
    /// `vendor << 16 | device`, the packing of the `PCI_ID` attribute
    pub fn packed_id(&self) -> i64 {
        (i64::from(self.vendor_id) << 16) | i64::from(self.device_id)
    }
}

/// VRAM/Memory information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Total memory in bytes
    pub total: u64,
    /// Used memory in bytes
    pub used: u64,
    /// Free memory in bytes
    pub free: u64,
}

impl MemoryInfo {
    /// Create a new memory info value
    pub fn new(total: u64, used: u64, free: u64) -> Self {
        Self { total, used, free }
    }

    /// Get total memory in MB
    pub fn total_mb(&self) -> u64 {
        self.total / (1024 * 1024)
    }

    /// Get total memory in KB
    pub fn total_kb(&self) -> u64 {
        self.total / 1024
    }

    /// Get used memory in MB
    pub fn used_mb(&self) -> u64 {
        self.used / (1024 * 1024)
    }
}

/// ECC mode of a GPU that supports ECC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EccState {
    /// ECC active now
    pub enabled: bool,
    /// ECC active after the next reboot
    pub pending: bool,
}

/// Current clock frequencies in MHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClockFrequencies {
    pub graphics_mhz: u32,
    pub memory_mhz: u32,
}

impl ClockFrequencies {
    /// `graphics << 16 | memory`, the packing of `GPU_CURRENT_CLOCK_FREQS`
    pub fn packed(&self) -> i64 {
        (i64::from(self.graphics_mhz & 0xffff) << 16) | i64::from(self.memory_mhz & 0xffff)
    }
}

/// GPU and memory utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Utilization {
    /// GPU utilization percentage (0-100)
    pub gpu: u8,
    /// Memory controller utilization percentage (0-100)
    pub memory: u8,
}

impl Utilization {
    /// Create a new utilization value
    pub fn new(gpu: u8, memory: u8) -> Self {
        Self {
            gpu: gpu.min(100),
            memory: memory.min(100),
        }
    }
}

/// PCIe link properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PcieLink {
    pub max_generation: u32,
    pub max_width: u32,
    pub current_width: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pci_packed_id() {
        let pci = PciInfo {
            vendor_id: 0x10de,
            device_id: 0x2684,
            ..Default::default()
        };
        assert_eq!(pci.packed_id(), 0x10de_2684);
    }

    #[test]
    fn test_clock_packing() {
        let clocks = ClockFrequencies {
            graphics_mhz: 1800,
            memory_mhz: 10501,
        };
        assert_eq!(clocks.packed() >> 16, 1800);
        assert_eq!(clocks.packed() & 0xffff, 10501);
    }

    #[test]
    fn test_memory_units() {
        let mem = MemoryInfo::new(24 * 1024 * 1024 * 1024, 1024 * 1024 * 1024, 0);
        assert_eq!(mem.total_mb(), 24 * 1024);
        assert_eq!(mem.used_mb(), 1024);
        assert_eq!(mem.total_kb(), 24 * 1024 * 1024);
    }

    #[test]
    fn test_utilization_clamped() {
        let util = Utilization::new(120, 40);
        assert_eq!(util.gpu, 100);
        assert_eq!(util.memory, 40);
    }
}
