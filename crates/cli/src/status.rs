// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device status records and the shared status table.
//!
//! The table is the only shared mutable state in the process. Writers are
//! the collectors and the change pipeline; readers are the web edge and
//! the reporter. Every `set` also fans the new status out to dashboard
//! subscribers through the hub, by value.

use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::DeviceConfig;
use crate::driver::Artifacts;
use crate::hub::{Event, Hub};

/// Collection lifecycle state for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Pending,
    Error,
    Timeout,
    Success,
}

/// Change summary for a single artifact.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigDiff {
    /// Unified diff body with the four header lines stripped.
    pub diff: String,
    pub added: u64,
    pub removed: u64,
    /// Brand-new file rather than a modification.
    pub new_file: bool,
}

/// Dynamic record for one device, overwritten at the start of every
/// collection attempt and mutated by at most one collector at a time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceStatus {
    pub device: DeviceConfig,
    pub state: DeviceState,
    pub state_previous: DeviceState,
    #[serde(serialize_with = "epoch_secs")]
    pub when: SystemTime,
    pub configs: Artifacts,
    pub diffs: BTreeMap<String, ConfigDiff>,
    pub error_message: String,
}

fn epoch_secs<S: serde::Serializer>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    let secs =
        t.duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    s.serialize_u64(secs)
}

impl DeviceStatus {
    /// Fresh record at the start of a collection attempt.
    pub fn pending(device: DeviceConfig, previous: DeviceState) -> Self {
        Self {
            device,
            state: DeviceState::Pending,
            state_previous: previous,
            when: SystemTime::now(),
            configs: Artifacts::new(),
            diffs: BTreeMap::new(),
            error_message: String::new(),
        }
    }

    /// Advance to `next`, remembering the state being left.
    pub fn transition(&mut self, next: DeviceState) {
        self.state_previous = self.state;
        self.state = next;
        self.when = SystemTime::now();
    }
}

/// Process-wide hostname → status table with exclusive-writer /
/// shared-reader discipline. The lock is held only for map operations;
/// callers always work on copies.
pub struct StatusStore {
    table: Mutex<HashMap<String, DeviceStatus>>,
    hub: Hub,
}

impl StatusStore {
    pub fn new(hub: Hub) -> Self {
        Self { table: Mutex::new(HashMap::new()), hub }
    }

    pub fn get(&self, hostname: &str) -> Option<DeviceStatus> {
        self.table.lock().get(hostname).cloned()
    }

    /// Snapshot of every device's status.
    pub fn get_all(&self) -> HashMap<String, DeviceStatus> {
        self.table.lock().clone()
    }

    /// Store the status and broadcast it to dashboard subscribers. The
    /// broadcast happens under the lock so per-device event order always
    /// matches table order; the hub send never blocks.
    pub fn set(&self, status: DeviceStatus) {
        let mut table = self.table.lock();
        self.hub.broadcast(Event::device(&status));
        table.insert(status.device.hostname.clone(), status);
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
