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

//! Process lifecycle: the running flag, shutdown signalling and draining of
//! in-flight write handling.

use parking_lot::{RwLock, RwLockReadGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Fallback interval at which the supervisor re-checks the running flag.
pub const SUPERVISOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Running flag plus the gate that in-flight handlers hold.
pub struct Lifecycle {
    running: watch::Sender<bool>,
    gate: RwLock<()>,
}

/// Held for the duration of one ingress call.
pub struct InFlightGuard<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (running, _) = watch::channel(true);
        Self {
            running,
            gate: RwLock::new(()),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Clear the running flag. Returns true only for the call that cleared it.
    pub fn request_stop(&self) -> bool {
        let flipped = self.running.send_if_modified(|running| {
            let was_running = *running;
            *running = false;
            was_running
        });
        if flipped {
            info!("Shutdown requested");
        }
        flipped
    }

    /// Resolves once the running flag is cleared.
    pub async fn stopped(&self) {
        let mut rx = self.running.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|running| !*running).await;
    }

    /// Register an in-flight call. `None` once shutdown was requested.
    pub fn enter(&self) -> Option<InFlightGuard<'_>> {
        let guard = self.gate.read();
        if !self.is_running() {
            return None;
        }
        Some(InFlightGuard { _guard: guard })
    }

    /// Block until every outstanding [`InFlightGuard`] is released.
    ///
    /// Call after [`Lifecycle::request_stop`]; later `enter` calls return `None`.
    pub fn drain(&self) {
        drop(self.gate.write());
        debug!("In-flight write handling drained");
    }
}

/// Wait until shutdown is requested, either by the console or by an
/// interrupt signal, so the caller can tear down.
pub async fn supervise(lifecycle: &Lifecycle) {
    let stopped = lifecycle.stopped();
    tokio::pin!(stopped);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupt_armed = true;
    let mut tick = tokio::time::interval(SUPERVISOR_POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut stopped => break,
            result = &mut interrupt, if interrupt_armed => {
                match result {
                    Ok(()) => {
                        info!("Interrupt received");
                        lifecycle.request_stop();
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to listen for interrupt signal: {}", e);
                        interrupt_armed = false;
                    }
                }
            }
            _ = tick.tick() => {
                if !lifecycle.is_running() {
                    break;
                }
            }
        }
    }

    debug!("Supervisor proceeding to teardown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_starts_running() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_running());
        assert!(lifecycle.enter().is_some());
    }

    #[test]
    fn test_request_stop_flips_once() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.request_stop());
        assert!(!lifecycle.request_stop());
        assert!(!lifecycle.is_running());
        assert!(lifecycle.enter().is_none());
    }

    #[tokio::test]
    async fn test_stopped_resolves_after_request() {
        let lifecycle = Arc::new(Lifecycle::new());

        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.stopped().await })
        };

        lifecycle.request_stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stopped() did not resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_supervisor_proceeds_within_poll_interval() {
        let lifecycle = Arc::new(Lifecycle::new());

        let supervisor = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { supervise(&lifecycle).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        lifecycle.request_stop();

        tokio::time::timeout(SUPERVISOR_POLL_INTERVAL, supervisor)
            .await
            .expect("supervisor did not proceed to teardown")
            .unwrap();
    }

    #[test]
    fn test_drain_waits_for_in_flight_call() {
        let lifecycle = Arc::new(Lifecycle::new());
        let finished = Arc::new(AtomicBool::new(false));
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();

        let worker = {
            let lifecycle = lifecycle.clone();
            let finished = finished.clone();
            std::thread::spawn(move || {
                let _guard = lifecycle.enter().expect("should be running");
                entered_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(50));
                finished.store(true, Ordering::SeqCst);
            })
        };

        entered_rx.recv().unwrap();
        lifecycle.request_stop();
        lifecycle.drain();

        assert!(finished.load(Ordering::SeqCst));
        assert!(lifecycle.enter().is_none());
        worker.join().unwrap();
    }
}
