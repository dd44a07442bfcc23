//! BLE GATT Service Protocol Constants for the Sealink receiver
//!
//! One service, one characteristic (read/write/notify + CCCD). Senders
//! write ciphertext (or plain text when the device runs without a key)
//! and receive acknowledgements and periodic ticks as notifications.

/// BLE Service UUID: 4fafc201-1fb5-459e-8fcc-c5c9c331914b
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Data Characteristic UUID (read/write/notify)
pub const DATA_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Same UUIDs as u128, for stacks that build UUIDs at compile time
pub const SERVICE_UUID_U128: u128 = 0x4fafc201_1fb5_459e_8fcc_c5c9c331914b;
pub const DATA_UUID_U128: u128 = 0xbeb5483e_36e1_4688_b7f5_ea07361b26a8;

/// Name the device advertises under
pub const DEVICE_NAME: &str = "M5Stack-BLE";

/// Acknowledgements written back to the data characteristic
pub mod ack {
    /// Payload shown (passthrough or decrypted)
    pub const RECEIVED: &[u8] = b"Received!";

    /// Payload arrived but could not be decrypted
    pub const DECRYPT_FAILED: &[u8] = b"Decrypt failed!";
}

/// Characteristic value right after service registration
pub mod ready {
    pub const ENCRYPTED: &[u8] = b"Ready for encrypted data";
    pub const PLAIN_ONLY: &[u8] = b"RSA not available - plain text only";
}
