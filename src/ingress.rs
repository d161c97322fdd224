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

//! Handling of writes to the control characteristic.
//!
//! Every write is decoded, attributed to a client, recorded in the device
//! registry and reported as one status line. The handler is the terminal
//! sink of the transport callback: nothing it does can fail upward, and a
//! malformed write only costs that one message.

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::bluetooth::client_info::{self, ClientMetadata};
use crate::bluetooth::{ControlPayload, PairingNotifier, UNKNOWN};
use crate::state::AppState;
use crate::storage::DeviceUpdate;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened to a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Decoded and processed. `is_new` marks first contact from the address.
    Accepted { is_new: bool },
    /// Not a decodable control payload; dropped.
    Rejected,
    /// Arrived after shutdown was requested; dropped.
    Ignored,
}

/// Write-characteristic handler.
pub struct ControlIngress {
    state: Arc<AppState>,
    notifier: PairingNotifier,
}

impl ControlIngress {
    pub fn new(state: Arc<AppState>, notifier: PairingNotifier) -> Self {
        Self { state, notifier }
    }

    /// Process one write. Never blocks on I/O and never fails.
    pub fn handle_write(&self, data: &[u8], meta: &ClientMetadata) -> WriteOutcome {
        let Some(_in_flight) = self.state.lifecycle.enter() else {
            debug!("Ignoring {} byte write received during shutdown", data.len());
            return WriteOutcome::Ignored;
        };

        debug!("📥 BLE WRITE RECEIVED: {} bytes", data.len());
        debug!("Write data (hex): {}", hex::encode(data));

        let now = Local::now();
        let payload = match ControlPayload::decode(data) {
            Ok(p) => p,
            Err(e) => {
                error!("[{}] [BLE] write parse error: {}", now.format(TIMESTAMP_FORMAT), e);
                return WriteOutcome::Rejected;
            }
        };
        self.state.record_payload(payload.clone());

        let identity = client_info::resolve(meta);
        let address = identity.address();
        let link_level_name = identity.name();
        let final_name = payload.client_reported_name().unwrap_or(link_level_name);

        let outcome = self.state.registry.upsert(
            address,
            DeviceUpdate {
                display_name: final_name.to_string(),
                client_reported_name: payload.device_name.clone(),
                link_level_name: link_level_name.to_string(),
            },
        );

        if outcome.is_new {
            info!("[NEW DEVICE] {} ({}) connected", final_name, address);
            self.notifier.send(address);
        }

        let label = display_label(payload.client_reported_name(), link_level_name, address);
        if let Some(manual) = payload.manual {
            debug!("[{}] manual x={} y={}", label, manual.x, manual.y);
        }
        info!("{}", status_line(now, &label, &payload));

        WriteOutcome::Accepted {
            is_new: outcome.is_new,
        }
    }
}

fn is_known(value: &str) -> bool {
    !value.is_empty() && value != UNKNOWN
}

/// Last eight characters of the address, `DD:EE:FF` for a MAC.
fn address_suffix(address: &str) -> String {
    let len = address.chars().count();
    address.chars().skip(len.saturating_sub(8)).collect()
}

/// Identify a client for logs: app name, then link name (each with the
/// address suffix when the address is known), then the bare address.
pub fn display_label(client_reported: Option<&str>, link_level: &str, address: &str) -> String {
    let with_suffix = |name: &str| {
        if is_known(address) {
            format!("{}({})", name, address_suffix(address))
        } else {
            name.to_string()
        }
    };

    match client_reported.filter(|name| is_known(name)) {
        Some(name) => with_suffix(name),
        None if is_known(link_level) => with_suffix(link_level),
        None if is_known(address) => address.to_string(),
        None => UNKNOWN.to_string(),
    }
}

/// One-line summary of a control payload.
///
/// With power off the speed, tracking and face values in the payload are
/// not reported. The link and the registry entry stay up either way.
pub fn status_line(now: DateTime<Local>, label: &str, payload: &ControlPayload) -> String {
    let time = now.format(TIMESTAMP_FORMAT);
    if payload.power_on {
        format!(
            "[{}] [BLE] [{}] POWER:ON SPEED:{}% TRACK:{} FACE:{}",
            time,
            label,
            payload.speed_label(),
            if payload.tracking_on { "ON" } else { "OFF" },
            payload.face_label()
        )
    } else {
        format!(
            "[{}] [BLE] [{}] POWER:OFF SPEED:STOP TRACK:OFF FACE:NONE (link kept)",
            time, label
        )
    }
}
