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

//! BLE service and characteristic identifiers for AmbientNode.

use uuid::Uuid;

/// Local name the peripheral advertises and reports on the console.
pub const SERVICE_NAME: &str = "AmbientNode";

/// AmbientNode GATT service UUID.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef0);

/// Control characteristic UUID (the mobile app writes control payloads here).
/// Properties: Write Without Response
pub const WRITE_CHAR_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef1);

/// Notification characteristic UUID (the peripheral pushes pairing acks here).
/// Properties: Notify
pub const NOTIFY_CHAR_UUID: Uuid = Uuid::from_u128(0x12345678_1234_5678_1234_56789abcdef2);

/// Sentinel used for any identity the transport could not resolve.
pub const UNKNOWN: &str = "Unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "12345678-1234-5678-1234-56789abcdef0"
        );
        assert_eq!(
            WRITE_CHAR_UUID.to_string(),
            "12345678-1234-5678-1234-56789abcdef1"
        );
        assert_eq!(
            NOTIFY_CHAR_UUID.to_string(),
            "12345678-1234-5678-1234-56789abcdef2"
        );
    }
}
