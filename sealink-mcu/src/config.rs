//! Receiver configuration

use serde::{Deserialize, Serialize};

use sealink_proto::ble::DEVICE_NAME;
use sealink_proto::{KEY_PATH, MAX_CIPHERTEXT_LEN, NOTIFY_INTERVAL_MS};

/// Whether the device tries to load a key and decrypt inbound writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decryption {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name shown in BLE scans
    pub device_name: String,
    /// Private key location on the storage partition
    pub key_path: String,
    /// Interval between periodic notifications while connected
    pub notify_interval_ms: u64,
    pub decryption: Decryption,
    /// Writes longer than this are rejected before decrypt
    pub max_ciphertext_len: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            key_path: KEY_PATH.to_string(),
            notify_interval_ms: NOTIFY_INTERVAL_MS,
            decryption: Decryption::Enabled,
            max_ciphertext_len: MAX_CIPHERTEXT_LEN,
        }
    }
}

impl DeviceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_key_path(mut self, path: impl Into<String>) -> Self {
        self.key_path = path.into();
        self
    }

    pub fn with_notify_interval_ms(mut self, interval: u64) -> Self {
        self.notify_interval_ms = interval;
        self
    }

    pub fn with_decryption(mut self, decryption: Decryption) -> Self {
        self.decryption = decryption;
        self
    }

    pub fn with_max_ciphertext_len(mut self, len: usize) -> Self {
        self.max_ciphertext_len = len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol() {
        let config = DeviceConfig::default();
        assert_eq!(config.device_name, "M5Stack-BLE");
        assert_eq!(config.key_path, "/private.pem");
        assert_eq!(config.notify_interval_ms, 2000);
        assert_eq!(config.decryption, Decryption::Enabled);
        assert_eq!(config.max_ciphertext_len, 256);
    }

    #[test]
    fn partial_json_is_rejected_and_lowercase_toggle_accepted() {
        let json = r#"{"device_name":"x","key_path":"/k.pem","notify_interval_ms":500,
                       "decryption":"disabled","max_ciphertext_len":128}"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.decryption, Decryption::Disabled);
        assert_eq!(config.notify_interval_ms, 500);

        assert!(serde_json::from_str::<DeviceConfig>(r#"{"device_name":"x"}"#).is_err());
    }
}
