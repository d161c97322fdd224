// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory registry of client sessions.
//!
//! One record per distinct client address, kept in first-contact order.
//! Records are never evicted and nothing is persisted across restarts.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use tracing::debug;

use crate::bluetooth::UNKNOWN;

/// A client that has sent at least one valid payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    /// Device address, the registry key.
    pub address: String,
    /// Name shown on the console.
    pub display_name: String,
    /// Name the app put in its payload.
    pub client_reported_name: String,
    /// Name derived from transport metadata.
    pub link_level_name: String,
    /// When the last accepted payload arrived.
    pub last_seen: DateTime<Local>,
}

/// Name fields carried by an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub display_name: String,
    pub client_reported_name: String,
    pub link_level_name: String,
}

/// Result of [`DeviceRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// True only for the call that inserted the record.
    pub is_new: bool,
}

/// Registry of known client sessions.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<DeviceRecord>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the record for `address`.
    ///
    /// `Unknown` is never stored. The existence check and the write happen
    /// under one lock, so exactly one concurrent caller sees `is_new`.
    pub fn upsert(&self, address: &str, update: DeviceUpdate) -> UpsertOutcome {
        self.upsert_at(address, update, Local::now())
    }

    fn upsert_at(&self, address: &str, update: DeviceUpdate, now: DateTime<Local>) -> UpsertOutcome {
        if address == UNKNOWN {
            debug!("Not tracking write from unidentified client");
            return UpsertOutcome { is_new: false };
        }

        let mut devices = self.devices.write();

        if let Some(device) = devices.iter_mut().find(|d| d.address == address) {
            // Wall clock may step backwards; last_seen must not.
            let last_seen = now.max(device.last_seen);
            *device = DeviceRecord {
                address: address.to_string(),
                display_name: update.display_name,
                client_reported_name: update.client_reported_name,
                link_level_name: update.link_level_name,
                last_seen,
            };
            debug!("Refreshed device session: {}", address);
            UpsertOutcome { is_new: false }
        } else {
            devices.push(DeviceRecord {
                address: address.to_string(),
                display_name: update.display_name,
                client_reported_name: update.client_reported_name,
                link_level_name: update.link_level_name,
                last_seen: now,
            });
            debug!("Added device session: {}", address);
            UpsertOutcome { is_new: true }
        }
    }

    /// Point-in-time copy in insertion order.
    pub fn snapshot(&self) -> Vec<DeviceRecord> {
        self.devices.read().clone()
    }

    pub fn count(&self) -> usize {
        self.devices.read().len()
    }

    pub fn get(&self, address: &str) -> Option<DeviceRecord> {
        self.devices
            .read()
            .iter()
            .find(|d| d.address == address)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    fn update(name: &str) -> DeviceUpdate {
        DeviceUpdate {
            display_name: name.to_string(),
            client_reported_name: name.to_string(),
            link_level_name: "Device-EEFF".to_string(),
        }
    }

    #[test]
    fn test_new_registry_empty() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_first_upsert_is_new() {
        let registry = DeviceRegistry::new();

        let outcome = registry.upsert("AA:BB:CC:DD:EE:FF", update("My Phone"));

        assert!(outcome.is_new);
        assert_eq!(registry.count(), 1);
        let record = registry.get("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(record.display_name, "My Phone");
    }

    #[test]
    fn test_repeat_upsert_is_idempotent_on_identity() {
        let registry = DeviceRegistry::new();

        registry.upsert("AA:BB:CC:DD:EE:FF", update("My Phone"));
        let outcome = registry.upsert("AA:BB:CC:DD:EE:FF", update("My Phone"));

        assert!(!outcome.is_new);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_upsert_overwrites_names() {
        let registry = DeviceRegistry::new();

        registry.upsert("AA:BB:CC:DD:EE:FF", update("My Phone"));
        registry.upsert("AA:BB:CC:DD:EE:FF", update("My Phone 2"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].display_name, "My Phone 2");
        assert_eq!(snapshot[0].client_reported_name, "My Phone 2");
    }

    #[test]
    fn test_unknown_address_not_tracked() {
        let registry = DeviceRegistry::new();

        let outcome = registry.upsert("Unknown", update("My Phone"));

        assert!(!outcome.is_new);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_snapshot_in_insertion_order() {
        let registry = DeviceRegistry::new();

        registry.upsert("33:33:33:33:33:33", update("c"));
        registry.upsert("11:11:11:11:11:11", update("a"));
        registry.upsert("22:22:22:22:22:22", update("b"));
        registry.upsert("33:33:33:33:33:33", update("c2"));

        let addresses: Vec<String> = registry.snapshot().into_iter().map(|d| d.address).collect();
        assert_eq!(
            addresses,
            vec![
                "33:33:33:33:33:33",
                "11:11:11:11:11:11",
                "22:22:22:22:22:22"
            ]
        );
    }

    #[test]
    fn test_last_seen_never_decreases() {
        let registry = DeviceRegistry::new();
        let now = Local::now();

        registry.upsert_at("AA:BB:CC:DD:EE:FF", update("p"), now);
        registry.upsert_at("AA:BB:CC:DD:EE:FF", update("p"), now - Duration::seconds(30));
        assert_eq!(registry.get("AA:BB:CC:DD:EE:FF").unwrap().last_seen, now);

        let later = now + Duration::seconds(5);
        registry.upsert_at("AA:BB:CC:DD:EE:FF", update("p"), later);
        assert_eq!(registry.get("AA:BB:CC:DD:EE:FF").unwrap().last_seen, later);
    }

    #[test]
    fn test_concurrent_first_contact_reports_new_once() {
        let registry = Arc::new(DeviceRegistry::new());
        let barrier = Arc::new(Barrier::new(8));
        let new_count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                let new_count = new_count.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if registry.upsert("AA:BB:CC:DD:EE:FF", update("p")).is_new {
                        new_count.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(new_count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.count(), 1);
    }
}
