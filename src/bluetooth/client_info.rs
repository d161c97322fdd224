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

//! Best-effort identification of the client behind a characteristic write.

use super::ble_constants::UNKNOWN;

/// Transport metadata attached to a write, as far as BlueZ reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetadata {
    /// Device address, e.g. `AA:BB:CC:DD:EE:FF`.
    pub address: Option<String>,
    /// D-Bus object path, e.g. `/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF`.
    pub device_path: Option<String>,
}

impl ClientMetadata {
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            device_path: None,
        }
    }

    pub fn from_device_path(path: impl Into<String>) -> Self {
        Self {
            address: None,
            device_path: Some(path.into()),
        }
    }
}

/// Outcome of resolving client metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    Resolved { address: String, name: String },
    Unresolved,
}

impl ClientIdentity {
    pub fn address(&self) -> &str {
        match self {
            Self::Resolved { address, .. } => address,
            Self::Unresolved => UNKNOWN,
        }
    }

    /// Link-level name derived from the address.
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved { name, .. } => name,
            Self::Unresolved => UNKNOWN,
        }
    }
}

/// Resolve the client identity. Never fails; anything unusable is `Unresolved`.
pub fn resolve(meta: &ClientMetadata) -> ClientIdentity {
    let address = meta
        .address
        .as_deref()
        .and_then(normalize_address)
        .or_else(|| meta.device_path.as_deref().and_then(address_from_path));

    match address {
        Some(address) => {
            let name = link_level_name(&address);
            ClientIdentity::Resolved { address, name }
        }
        None => ClientIdentity::Unresolved,
    }
}

/// `Device-EEFF` for `AA:BB:CC:DD:EE:FF`.
fn link_level_name(address: &str) -> String {
    let tail = &address[address.len().saturating_sub(5)..];
    format!("Device-{}", tail.replace(':', ""))
}

fn address_from_path(path: &str) -> Option<String> {
    let (_, dev) = path.rsplit_once("dev_")?;
    // Child objects such as `/service0001/char0002` are not part of the address
    let dev = dev.split('/').next()?;
    normalize_address(&dev.replace('_', ":"))
}

fn normalize_address(raw: &str) -> Option<String> {
    let address = raw.trim().to_ascii_uppercase();
    let octets: Vec<&str> = address.split(':').collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    if !well_formed || address == "00:00:00:00:00:00" {
        return None;
    }
    Some(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_from_address() {
        let identity = resolve(&ClientMetadata::from_address("aa:bb:cc:dd:ee:ff"));
        assert_eq!(
            identity,
            ClientIdentity::Resolved {
                address: "AA:BB:CC:DD:EE:FF".to_string(),
                name: "Device-EEFF".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_from_device_path() {
        let identity = resolve(&ClientMetadata::from_device_path(
            "/org/bluez/hci0/dev_12_34_56_78_9A_BC",
        ));
        assert_eq!(identity.address(), "12:34:56:78:9A:BC");
        assert_eq!(identity.name(), "Device-9ABC");
    }

    #[test]
    fn test_resolve_path_with_child_object() {
        let identity = resolve(&ClientMetadata::from_device_path(
            "/org/bluez/hci0/dev_12_34_56_78_9A_BC/service0001",
        ));
        assert_eq!(identity.address(), "12:34:56:78:9A:BC");
    }

    #[test]
    fn test_address_preferred_over_path() {
        let meta = ClientMetadata {
            address: Some("11:22:33:44:55:66".to_string()),
            device_path: Some("/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF".to_string()),
        };
        assert_eq!(resolve(&meta).address(), "11:22:33:44:55:66");
    }

    #[test]
    fn test_unresolvable_metadata() {
        for meta in [
            ClientMetadata::default(),
            ClientMetadata::from_address("00:00:00:00:00:00"),
            ClientMetadata::from_address("not-an-address"),
            ClientMetadata::from_device_path("/org/bluez/hci0"),
            ClientMetadata::from_device_path("/org/bluez/hci0/dev_"),
            ClientMetadata::from_device_path("/org/bluez/hci0/dev_ZZ_11"),
        ] {
            let identity = resolve(&meta);
            assert_eq!(identity, ClientIdentity::Unresolved, "{:?}", meta);
            assert_eq!(identity.address(), "Unknown");
            assert_eq!(identity.name(), "Unknown");
        }
    }
}
