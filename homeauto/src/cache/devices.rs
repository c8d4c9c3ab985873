//! Filtered device list of one action

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::devicelist::{Capability, RawDevice};
use crate::utils::is_due;

/// Minimum time between two device list fetches
pub const DEVICE_LIST_COOLDOWN: Duration = Duration::from_secs(300);

/// A selectable device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub ain: String,
    pub name: String,
}

/// Last fetched device list, already filtered for one action kind.
///
/// `None` means the list was never fetched; `Some` with no entries means the
/// gateway has no matching device.
#[derive(Debug, Clone)]
pub struct DeviceCache {
    devices: Option<Vec<Device>>,
    last_refresh: Option<DateTime<Utc>>,
    cooldown: Duration,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::with_cooldown(DEVICE_LIST_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            devices: None,
            last_refresh: None,
            cooldown,
        }
    }

    /// Rebuild from persisted settings
    pub fn restore(devices: Option<Vec<Device>>, last_refresh: Option<DateTime<Utc>>) -> Self {
        Self {
            devices,
            last_refresh,
            cooldown: DEVICE_LIST_COOLDOWN,
        }
    }

    pub fn devices(&self) -> &[Device] {
        self.devices.as_deref().unwrap_or_default()
    }

    /// Persisted form of the list
    pub fn snapshot(&self) -> Option<Vec<Device>> {
        self.devices.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.devices().is_empty()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Never fetched, or the cooldown has elapsed (exclusive bound)
    pub fn is_list_stale(&self, now: DateTime<Utc>) -> bool {
        self.devices.is_none() || is_due(now, self.last_refresh, self.cooldown)
    }

    /// Replace the whole list with the matching subset of `raw`
    pub fn replace(
        &mut self,
        raw: &[RawDevice],
        capability: Capability,
        now: DateTime<Utc>,
    ) -> &[Device] {
        self.devices = Some(filter_devices(raw, capability));
        self.last_refresh = Some(now);
        self.devices()
    }

    pub fn find(&self, ain: &str) -> Option<&Device> {
        self.devices().iter().find(|d| d.ain == ain)
    }
}

impl Default for DeviceCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Present devices exposing `capability`, first occurrence of each AIN
pub fn filter_devices(raw: &[RawDevice], capability: Capability) -> Vec<Device> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|d| d.is_present() && d.has(capability))
        .filter(|d| !d.identifier.trim().is_empty())
        .filter(|d| seen.insert(d.identifier.clone()))
        .map(|d| Device {
            ain: d.identifier.clone(),
            name: if d.name.trim().is_empty() {
                d.identifier.clone()
            } else {
                d.name.clone()
            },
        })
        .collect()
}
