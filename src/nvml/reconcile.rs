//! GPU identity reconciliation
//!
//! NV-CONTROL and NVML number GPUs independently. The [`IdTable`] maps an
//! NV-CONTROL GPU index to the NVML device with the same UUID. Matching is
//! all-or-nothing: a single miss leaves the identity mapping in place.

use crate::error::NvmlError;
use crate::nvml::GpuManager;

/// NV-CONTROL GPU index to NVML device index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdTable {
    map: Vec<u32>,
    /// Fan count of each GPU, in NV-CONTROL order
    fans: Vec<u32>,
    reconciled: bool,
}

impl IdTable {
    /// Identity mapping over `count` devices
    pub fn identity(count: u32) -> Self {
        Self {
            map: (0..count).collect(),
            fans: vec![0; count as usize],
            reconciled: false,
        }
    }

    /// Match NV-CONTROL UUIDs against NVML UUIDs
    ///
    /// `nv_uuids` is `None` without NV-CONTROL. An entry of `None` means
    /// the UUID query for that GPU failed.
    pub fn reconcile(nv_uuids: Option<&[Option<String>]>, nvml_uuids: &[Option<String>]) -> Self {
        let fallback = Self::identity(nvml_uuids.len() as u32);
        let Some(nv_uuids) = nv_uuids else {
            return fallback;
        };

        let mut map = Vec::with_capacity(nv_uuids.len());
        for (nv_index, uuid) in nv_uuids.iter().enumerate() {
            let matched = uuid.as_deref().and_then(|uuid| {
                nvml_uuids
                    .iter()
                    .position(|candidate| candidate.as_deref() == Some(uuid))
            });
            match matched {
                Some(nvml_index) => map.push(nvml_index as u32),
                None => {
                    log::warn!(
                        "GPU {} has no NVML counterpart; falling back to identity GPU mapping",
                        nv_index
                    );
                    return fallback;
                }
            }
        }

        Self {
            fans: vec![0; map.len()],
            map,
            reconciled: true,
        }
    }

    /// Build the table from a live NVML manager
    pub fn build(manager: &dyn GpuManager, nv_uuids: Option<&[Option<String>]>) -> Result<Self, NvmlError> {
        let nvml_uuids = manager.device_uuids()?;
        let table = Self::reconcile(nv_uuids, &nvml_uuids);
        Ok(table.with_fan_counts(&manager.fan_counts()?))
    }

    /// Record fan counts, indexed by NVML device
    pub fn with_fan_counts(mut self, counts: &[u32]) -> Self {
        self.fans = self
            .map
            .iter()
            .map(|&nvml| counts.get(nvml as usize).copied().unwrap_or(0))
            .collect();
        self
    }

    /// Whether UUID matching succeeded
    pub fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn nvml_index(&self, nv_index: u32) -> Option<u32> {
        self.map.get(nv_index as usize).copied()
    }

    /// Cooler target ID to `(nvml device, fan index on that device)`
    ///
    /// Coolers are numbered across GPUs in NV-CONTROL order.
    pub fn cooler(&self, cooler_id: u32) -> Option<(u32, u32)> {
        let mut first = 0;
        for (nv_index, &count) in self.fans.iter().enumerate() {
            if cooler_id < first + count {
                return Some((self.map[nv_index], cooler_id - first));
            }
            first += count;
        }
        None
    }

    /// Thermal sensor target ID to `(nvml device, sensor index)`
    ///
    /// Each GPU exposes a single sensor.
    pub fn sensor(&self, sensor_id: u32) -> Option<(u32, u32)> {
        self.nvml_index(sensor_id).map(|nvml| (nvml, 0))
    }

    pub fn cooler_count(&self) -> u32 {
        self.fans.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uuids(list: &[&str]) -> Vec<Option<String>> {
        list.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_all_matched() {
        let nv = uuids(&["GPU-b", "GPU-a"]);
        let nvml = uuids(&["GPU-a", "GPU-b"]);
        let table = IdTable::reconcile(Some(&nv), &nvml);
        assert!(table.is_reconciled());
        assert_eq!(table.nvml_index(0), Some(1));
        assert_eq!(table.nvml_index(1), Some(0));
    }

    #[test]
    fn test_one_miss_gives_identity() {
        let nv = uuids(&["GPU-b", "GPU-x"]);
        let nvml = uuids(&["GPU-a", "GPU-b"]);
        let table = IdTable::reconcile(Some(&nv), &nvml);
        assert!(!table.is_reconciled());
        assert_eq!(table.nvml_index(0), Some(0));
        assert_eq!(table.nvml_index(1), Some(1));
    }

    #[test]
    fn test_failed_uuid_query_gives_identity() {
        let nv = vec![Some("GPU-b".to_string()), None];
        let nvml = uuids(&["GPU-a", "GPU-b"]);
        let table = IdTable::reconcile(Some(&nv), &nvml);
        assert_eq!(table, IdTable::identity(2));
    }

    #[test]
    fn test_no_nvcontrol_gives_identity() {
        let nvml = uuids(&["GPU-a", "GPU-b", "GPU-c"]);
        let table = IdTable::reconcile(None, &nvml);
        assert!(!table.is_reconciled());
        assert_eq!(table.len(), 3);
        assert_eq!(table.nvml_index(2), Some(2));
        assert_eq!(table.nvml_index(3), None);
    }

    #[test]
    fn test_cooler_mapping_follows_nvcontrol_order() {
        let nv = uuids(&["GPU-b", "GPU-a"]);
        let nvml = uuids(&["GPU-a", "GPU-b"]);
        // NVML device 0 has 3 fans, device 1 has 2
        let table = IdTable::reconcile(Some(&nv), &nvml).with_fan_counts(&[3, 2]);

        assert_eq!(table.cooler_count(), 5);
        assert_eq!(table.cooler(0), Some((1, 0)));
        assert_eq!(table.cooler(1), Some((1, 1)));
        assert_eq!(table.cooler(2), Some((0, 0)));
        assert_eq!(table.cooler(4), Some((0, 2)));
        assert_eq!(table.cooler(5), None);
    }

    #[test]
    fn test_sensor_mapping() {
        let table = IdTable::identity(2);
        assert_eq!(table.sensor(1), Some((1, 0)));
        assert_eq!(table.sensor(2), None);
    }
}
