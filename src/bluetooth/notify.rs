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

//! Outgoing half of the BLE boundary.

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Reasons a notification could not be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notify characteristic not available")]
    Unavailable,
    #[error("no client subscribed to notifications")]
    NoSubscribers,
}

/// Anything that can push bytes to subscribed clients.
///
/// Implementations must not block: `notify` is called from the write
/// callback path.
pub trait NotifySink: Send + Sync {
    fn notify(&self, data: Vec<u8>) -> Result<(), NotifyError>;
}

/// Notify sink fanning each notification out to every subscribed client.
///
/// Starts detached; notifications fail with [`NotifyError::Unavailable`]
/// until the GATT server attaches it. Each client notify session holds its
/// own receiver, so nothing is queued for clients that are not subscribed.
#[derive(Default)]
pub struct BroadcastNotifySink {
    tx: Mutex<Option<broadcast::Sender<Vec<u8>>>>,
}

impl BroadcastNotifySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable delivery. `capacity` bounds how far a slow subscriber may lag.
    pub fn attach(&self, capacity: usize) {
        let (tx, _) = broadcast::channel(capacity.max(1));
        *self.tx.lock() = Some(tx);
        debug!("Notify sink attached (capacity {})", capacity);
    }

    /// Close every subscription so the notify sessions exit.
    pub fn detach(&self) {
        if self.tx.lock().take().is_some() {
            debug!("Notify sink detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.tx.lock().is_some()
    }

    /// Receiver for one client notify session. `None` while detached.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Vec<u8>>> {
        self.tx.lock().as_ref().map(broadcast::Sender::subscribe)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx
            .lock()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl NotifySink for BroadcastNotifySink {
    fn notify(&self, data: Vec<u8>) -> Result<(), NotifyError> {
        let guard = self.tx.lock();
        let tx = guard.as_ref().ok_or(NotifyError::Unavailable)?;
        let receivers = tx.send(data).map_err(|_| NotifyError::NoSubscribers)?;
        debug!("Notification queued for {} subscriber(s)", receivers);
        Ok(())
    }
}

/// In-memory sink standing in for the BLE stack in tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub fail_with: Option<NotifyError>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn failing(error: NotifyError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }
}

#[cfg(test)]
impl NotifySink for RecordingSink {
    fn notify(&self, data: Vec<u8>) -> Result<(), NotifyError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.sent.lock().push(data);
        Ok(())
    }
}
