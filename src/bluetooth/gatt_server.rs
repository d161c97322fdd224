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

//! BLE GATT server implementation for AmbientNode.

use anyhow::{Context, Result};
use bluer::adv::{Advertisement, AdvertisementHandle, Type as AdvertisementType};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicWrite, CharacteristicWriteMethod,
    CharacteristicWriteRequest, Service,
};
use bluer::Adapter;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use super::ble_constants::*;
use super::client_info::ClientMetadata;
use super::notify::BroadcastNotifySink;
use crate::config::Settings;
use crate::ingress::ControlIngress;

/// GATT server for AmbientNode.
pub struct GattServer {
    adapter: Adapter,
    advertised_name: String,
    notify_queue_capacity: usize,
    ingress: Arc<ControlIngress>,
    notify_sink: Arc<BroadcastNotifySink>,
    adv_handle: Option<AdvertisementHandle>,
    app_handle: Option<ApplicationHandle>,
}

impl GattServer {
    /// Create a new GATT server on the configured adapter.
    pub async fn new(
        settings: &Settings,
        ingress: Arc<ControlIngress>,
        notify_sink: Arc<BroadcastNotifySink>,
    ) -> Result<Self> {
        info!("Initializing BLE GATT server...");

        let session = bluer::Session::new()
            .await
            .context("Failed to create BlueZ session")?;
        info!("BlueZ session created");

        let adapter = match &settings.adapter {
            Some(name) => session
                .adapter(name)
                .with_context(|| format!("Bluetooth adapter {} not available", name))?,
            None => session
                .default_adapter()
                .await
                .context("No default Bluetooth adapter")?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        adapter.set_alias(settings.advertised_name.clone()).await?;
        info!("Bluetooth name set to: {}", settings.advertised_name);

        Ok(Self {
            adapter,
            advertised_name: settings.advertised_name.clone(),
            notify_queue_capacity: settings.notify_queue_capacity,
            ingress,
            notify_sink,
            adv_handle: None,
            app_handle: None,
        })
    }

    /// Register the GATT service and start advertising.
    pub async fn start(&mut self) -> Result<()> {
        self.register_gatt_service()
            .await
            .context("Failed to register GATT service")?;

        self.start_advertising()
            .await
            .context("Failed to start advertising")?;

        info!("GATT server started successfully");
        Ok(())
    }

    /// Stop advertising and unregister the service.
    pub fn stop(&mut self) {
        self.notify_sink.detach();

        if self.adv_handle.take().is_some() {
            info!("BLE advertising stopped");
        }
        if self.app_handle.take().is_some() {
            info!("GATT service unregistered");
        }
    }

    async fn register_gatt_service(&mut self) -> Result<()> {
        debug!("📝 Registering control characteristic: {}", WRITE_CHAR_UUID);
        debug!("   Properties: WRITE_WITHOUT_RESPONSE");

        let write_char = {
            let ingress = self.ingress.clone();

            Characteristic {
                uuid: WRITE_CHAR_UUID,
                write: Some(CharacteristicWrite {
                    // Write-without-response only, so clients are not pushed into link-level pairing
                    write: false,
                    write_without_response: true,
                    method: CharacteristicWriteMethod::Fun(Box::new(
                        move |data: Vec<u8>, req: CharacteristicWriteRequest| {
                            let ingress = ingress.clone();

                            Box::pin(async move {
                                debug!(
                                    "Write from {}: MTU={}, offset={}",
                                    req.device_address, req.mtu, req.offset
                                );
                                let meta =
                                    ClientMetadata::from_address(req.device_address.to_string());
                                ingress.handle_write(&data, &meta);
                                Ok(())
                            })
                        },
                    )),
                    ..Default::default()
                }),
                ..Default::default()
            }
        };

        debug!("📝 Registering notify characteristic: {}", NOTIFY_CHAR_UUID);
        debug!("   Properties: NOTIFY");

        self.notify_sink.attach(self.notify_queue_capacity);
        let notify_sink = self.notify_sink.clone();

        let notify_char = Characteristic {
            uuid: NOTIFY_CHAR_UUID,
            notify: Some(CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |mut notifier| {
                    // One receiver per client session; every session gets every notification
                    let subscription = notify_sink.subscribe();

                    Box::pin(async move {
                        let Some(mut rx) = subscription else {
                            warn!("Client subscribed while notifications are disabled");
                            return;
                        };

                        debug!("Notification loop started");
                        loop {
                            let data = tokio::select! {
                                _ = notifier.stopped() => {
                                    info!("Client unsubscribed from notifications");
                                    break;
                                }
                                received = rx.recv() => received,
                            };

                            match data {
                                Ok(data) => {
                                    debug!("Sending notification: {} bytes", data.len());
                                    if let Err(e) = notifier.notify(data).await {
                                        error!("Failed to send notification: {}", e);
                                        break;
                                    }
                                }
                                Err(RecvError::Lagged(skipped)) => {
                                    warn!("Notification session lagged, {} message(s) skipped", skipped);
                                }
                                Err(RecvError::Closed) => {
                                    info!("Notify sink detached, exiting notification loop");
                                    break;
                                }
                            }
                        }
                        debug!("Notification loop exited");
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        };

        let service = Service {
            uuid: SERVICE_UUID,
            primary: true,
            characteristics: vec![write_char, notify_char],
            ..Default::default()
        };

        let app = Application {
            services: vec![service],
            ..Default::default()
        };

        self.app_handle = Some(self.adapter.serve_gatt_application(app).await?);

        info!("GATT service registered: {}", SERVICE_UUID);
        Ok(())
    }

    async fn start_advertising(&mut self) -> Result<()> {
        let adv = Advertisement {
            advertisement_type: AdvertisementType::Peripheral,
            service_uuids: vec![SERVICE_UUID].into_iter().collect(),
            discoverable: Some(true),
            local_name: Some(self.advertised_name.clone()),
            ..Default::default()
        };

        self.adv_handle = Some(self.adapter.advertise(adv).await?);

        info!("Advertising as {}", self.advertised_name);
        Ok(())
    }
}
