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

//! AmbientNode - BLE peripheral control plane.

use ambient_node::bluetooth::{
    BroadcastNotifySink, GattServer, PairingNotifier, NOTIFY_CHAR_UUID, SERVICE_UUID,
    WRITE_CHAR_UUID,
};
use ambient_node::config::Settings;
use ambient_node::console::{self, Console};
use ambient_node::ingress::ControlIngress;
use ambient_node::lifecycle;
use ambient_node::logging::init_logging;
use ambient_node::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::resolve()?;
    init_logging(&settings.log)?;

    info!("Starting AmbientNode v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::new());
    let notify_sink = Arc::new(BroadcastNotifySink::new());
    let ingress = Arc::new(ControlIngress::new(
        state.clone(),
        PairingNotifier::new(notify_sink.clone()),
    ));

    let mut server = GattServer::new(&settings, ingress, notify_sink).await?;
    server.start().await?;

    info!("Service UUID: {}", SERVICE_UUID);
    info!("Write characteristic: {}", WRITE_CHAR_UUID);
    info!("Notify characteristic: {}", NOTIFY_CHAR_UUID);
    info!("BLE link is kept regardless of power state");
    info!("Multiple devices can connect at the same time");
    info!("Waiting for data...");
    console::write_help(&mut std::io::stdout())?;

    // stdin reads block, so the console gets its own thread. It is not joined:
    // after an interrupt it may still be parked in a read.
    let console_state = state.clone();
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let console = Console::new(console_state.clone());
            let stdin = std::io::stdin();
            if let Err(e) = console.run(stdin.lock(), &mut std::io::stdout()) {
                error!("Console failed: {}", e);
                console_state.lifecycle.request_stop();
            }
        })
        .context("Failed to spawn console thread")?;

    lifecycle::supervise(&state.lifecycle).await;

    // Let in-flight writes finish; the flag keeps new ones out.
    tokio::task::block_in_place(|| state.lifecycle.drain());
    server.stop();

    info!("BLE service shut down cleanly");
    Ok(())
}
