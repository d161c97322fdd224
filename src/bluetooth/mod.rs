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

//! Bluetooth LE peripheral: protocol, client identification, notifications
//! and the BlueZ GATT server.

pub mod ble_constants;
pub mod client_info;
pub mod gatt_server;
pub mod notify;
pub mod pairing;
pub mod protocol;

pub use ble_constants::{NOTIFY_CHAR_UUID, SERVICE_NAME, SERVICE_UUID, UNKNOWN, WRITE_CHAR_UUID};
pub use client_info::{ClientIdentity, ClientMetadata};
pub use gatt_server::GattServer;
pub use notify::{BroadcastNotifySink, NotifyError, NotifySink};
pub use pairing::PairingNotifier;
pub use protocol::{ControlPayload, DecodeError, ManualControl, NotificationMessage, NotificationType};
