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

//! Application-level pairing acknowledgement.
//!
//! "Pairing" here is first contact: the first valid payload from an address
//! is answered with a `pairing_success` notification. No link-level security
//! is involved.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use super::notify::NotifySink;
use super::protocol::NotificationMessage;

/// Sends pairing acknowledgements through a [`NotifySink`].
#[derive(Clone)]
pub struct PairingNotifier {
    sink: Arc<dyn NotifySink>,
}

impl PairingNotifier {
    pub fn new(sink: Arc<dyn NotifySink>) -> Self {
        Self { sink }
    }

    /// Acknowledge first contact from `address`.
    ///
    /// Fire-and-forget: failures are logged and never retried.
    pub fn send(&self, address: &str) {
        let message = NotificationMessage::pairing_success(address, Utc::now());

        let data = match message.encode() {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode pairing success: {}", e);
                return;
            }
        };

        match self.sink.notify(data) {
            Ok(()) => info!("[NOTIFY] Pairing success sent to {}", address),
            Err(e) => error!("Failed to send pairing success to {}: {}", address, e),
        }
    }
}
