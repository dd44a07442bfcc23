//! Sealink sender
//!
//! Host-side BLE central for Sealink receivers: seal a message to the
//! device's public key and write it to the data characteristic.
//!
//! # Example
//!
//! ```ignore
//! use sealink_send::{ble, seal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let public = seal::load_public_key("device_pub.pem")?;
//!     let ciphertext = seal::seal(&public, b"hello", &mut rand::thread_rng())?;
//!     let ack = ble::send(None, &ciphertext).await?;
//!     println!("{:?}", ack);
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod seal;
