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

//! Shared application state.

use parking_lot::RwLock;

use crate::bluetooth::ControlPayload;
use crate::lifecycle::Lifecycle;
use crate::storage::{DeviceRecord, DeviceRegistry};

/// State shared between the GATT callbacks, the console and the supervisor.
#[derive(Default)]
pub struct AppState {
    pub registry: DeviceRegistry,
    pub lifecycle: Lifecycle,
    last_payload: RwLock<Option<ControlPayload>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_payload(&self, payload: ControlPayload) {
        *self.last_payload.write() = Some(payload);
    }

    /// The most recently accepted control payload.
    pub fn last_payload(&self) -> Option<ControlPayload> {
        self.last_payload.read().clone()
    }

    pub fn device_count(&self) -> usize {
        self.registry.count()
    }

    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.registry.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }
}
