//! Sealink MCU Library
//!
//! Core of the Sealink receiver: a BLE peripheral that accepts one peer,
//! decrypts inbound writes with an on-device RSA key and shows the result.
//!
//! This crate provides:
//! - The link session state machine (advertise / connect / re-advertise,
//!   periodic tick notifications)
//! - Private key loading and PKCS#1 v1.5 decryption
//! - Inbound write routing and acknowledgement
//! - Traits for the BLE stack, key storage and presentation
//!
//! # MCU implementations
//! - ESP32 (M5Stack): see `firmware/m5stack-receiver`
//!
//! Everything here is single-threaded and non-blocking apart from the RSA
//! operation itself, which runs to completion inside one step.

pub mod config;
pub mod crypto;
pub mod device;
pub mod error;
pub mod keystore;
pub mod link;
pub mod presentation;
pub mod router;
pub mod session;
pub mod storage;

pub use config::{Decryption, DeviceConfig};
pub use crypto::CryptoEngine;
pub use device::Device;
pub use error::{CryptoError, KeyError, LinkError};
pub use keystore::PrivateKey;
pub use link::{EventQueue, EventSender, InboundMessage, LinkEvent, LinkServer, SimLink};
pub use presentation::{LogPresenter, PresentationEvent, Presenter, Status};
pub use router::{MessageRouter, RouterOutcome};
pub use session::{LinkSession, SessionState};
pub use storage::{FileEntry, KeyFs, MemFs, StdFs, Unmounted};
