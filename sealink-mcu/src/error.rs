//! Error types for the receiver core

use thiserror::Error;

use crate::presentation::Status;

/// Loading the private key failed. Every variant is recoverable: the
/// device keeps running in plain-text passthrough mode.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("private key not found: {0}")]
    NotFound(String),

    #[error("malformed private key: {0}")]
    Malformed(String),

    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyError {
    /// Operator-facing status for this failure
    pub fn status(&self) -> Status {
        match self {
            KeyError::NotFound(_) => Status::NoKey,
            KeyError::Malformed(_) => Status::MalformedKey,
            KeyError::Io(_) => Status::StorageUnavailable,
        }
    }
}

/// A single decrypt failed. Reported once, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("ciphertext too large: {len} bytes (max: {max})")]
    OversizedInput { len: usize, max: usize },

    #[error("invalid padding or ciphertext format")]
    PaddingOrFormatInvalid,

    #[error("no private key loaded")]
    KeyUnavailable,
}

/// Failures reported by the BLE stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("failed to start advertising: {0}")]
    AdvertiseFailed(String),

    #[error("failed to notify peer: {0}")]
    NotifyFailed(String),

    #[error("failed to set characteristic value: {0}")]
    WriteFailed(String),
}
