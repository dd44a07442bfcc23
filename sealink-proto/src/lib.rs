//! Sealink wire protocol - BLE constants and notification framing
//!
//! Shared between the device firmware and host-side senders. No
//! dependencies so it builds for any MCU target.

pub mod ble;

/// Where the device expects its private key
pub const KEY_PATH: &str = "/private.pem";

/// Interval between periodic notifications while a peer is connected
pub const NOTIFY_INTERVAL_MS: u64 = 2000;

/// Largest ciphertext accepted (modulus size of a 2048-bit key)
pub const MAX_CIPHERTEXT_LEN: usize = 256;

const TICK_PREFIX: &str = "tick:";

/// Periodic notification payload: `tick:<n>` in ASCII decimal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick(pub u32);

impl Tick {
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{TICK_PREFIX}{}", self.0).into_bytes()
    }

    /// Returns None for anything that is not a tick (e.g. an ack)
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(data).ok()?;
        let digits = text.strip_prefix(TICK_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Tick)
    }
}
