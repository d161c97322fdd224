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

//! AmbientNode BLE peripheral.
//!
//! Receives control payloads from the mobile app over a GATT write
//! characteristic, tracks which clients have made contact, acknowledges
//! first contact over a notify characteristic, and exposes the session
//! registry on an operator console.

pub mod bluetooth;
pub mod config;
pub mod console;
pub mod ingress;
pub mod lifecycle;
pub mod logging;
pub mod state;
pub mod storage;
