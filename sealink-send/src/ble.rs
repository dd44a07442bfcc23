//! BLE Client for Sealink receivers
//!
//! Provides functions to scan for receivers, write a payload to the data
//! characteristic and follow its notifications.

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use std::time::Duration;
use uuid::Uuid;

use sealink_proto::ble::{DATA_UUID_U128, DEVICE_NAME, SERVICE_UUID_U128};
use sealink_proto::Tick;

const SERVICE_UUID: Uuid = Uuid::from_u128(SERVICE_UUID_U128);
const DATA_UUID: Uuid = Uuid::from_u128(DATA_UUID_U128);

const FIND_SCAN_SECS: u64 = 5;
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// A discovered BLE device
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiscoveredDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    pub is_receiver: bool,
}

/// Notification received from a receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Tick(u32),
    Ack(Vec<u8>),
}

impl Notification {
    pub fn parse(value: &[u8]) -> Self {
        match Tick::from_bytes(value) {
            Some(Tick(n)) => Notification::Tick(n),
            None => Notification::Ack(value.to_vec()),
        }
    }
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or_else(|| "No Bluetooth adapter found".into())
}

fn looks_like_receiver(name: &str, services: &[Uuid]) -> bool {
    // NimBLE sometimes reports "nimble [<name>]"
    name == DEVICE_NAME || name.contains(&format!("[{DEVICE_NAME}")) || services.contains(&SERVICE_UUID)
}

/// Scan for BLE devices
///
/// Returns every device seen. Receivers have `is_receiver = true`.
pub async fn scan(duration_secs: u64) -> Result<Vec<DiscoveredDevice>, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_else(|| "Unknown".to_string());
            let address = peripheral.address().to_string();
            let is_receiver = looks_like_receiver(&name, &props.services);

            devices.push(DiscoveredDevice { name, address, rssi: props.rssi, is_receiver });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Find a receiver by name/address pattern, or the first receiver seen
pub async fn find_device(target: Option<&str>) -> Result<Peripheral, Box<dyn std::error::Error>> {
    let adapter = get_adapter().await?;

    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(FIND_SCAN_SECS)).await;

    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let name = props.local_name.unwrap_or_default();
            let addr = peripheral.address().to_string();

            let matches = match target {
                Some(t) => name.contains(t) || addr.contains(t),
                None => looks_like_receiver(&name, &props.services),
            };

            if matches {
                adapter.stop_scan().await?;
                return Ok(peripheral);
            }
        }
    }

    adapter.stop_scan().await?;
    Err("No Sealink receiver found".into())
}

async fn open(target: Option<&str>) -> Result<(Peripheral, Characteristic), Box<dyn std::error::Error>> {
    let device = find_device(target).await?;

    device.connect().await?;
    device.discover_services().await?;

    let data_char = device
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == DATA_UUID)
        .ok_or("Data characteristic not found")?;

    device.subscribe(&data_char).await?;
    Ok((device, data_char))
}

/// Write `payload` (ciphertext or plain text) and wait for the receiver's ack
///
/// Returns `None` if no ack arrived in time. Ticks received meanwhile are
/// skipped.
pub async fn send(
    target: Option<&str>,
    payload: &[u8],
) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    let (device, data_char) = open(target).await?;
    let mut notifications = device.notifications().await?;

    device.write(&data_char, payload, WriteType::WithResponse).await?;

    let wait_ack = async {
        while let Some(n) = notifications.next().await {
            if n.uuid != DATA_UUID {
                continue;
            }
            if let Notification::Ack(ack) = Notification::parse(&n.value) {
                return Some(ack);
            }
        }
        None
    };
    let ack = tokio::time::timeout(ACK_TIMEOUT, wait_ack).await.unwrap_or(None);

    let _ = device.disconnect().await;
    Ok(ack)
}

/// Stay connected for `duration_secs`, passing every notification to `on_notify`
pub async fn watch<F>(
    target: Option<&str>,
    duration_secs: u64,
    mut on_notify: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnMut(Notification),
{
    let (device, _data_char) = open(target).await?;
    let mut notifications = device.notifications().await?;

    let follow = async {
        while let Some(n) = notifications.next().await {
            if n.uuid == DATA_UUID {
                on_notify(Notification::parse(&n.value));
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(duration_secs), follow).await;

    device.disconnect().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_detection() {
        assert!(looks_like_receiver("M5Stack-BLE", &[]));
        assert!(looks_like_receiver("nimble [M5Stack-BLE]", &[]));
        assert!(looks_like_receiver("Unknown", &[SERVICE_UUID]));
        assert!(!looks_like_receiver("Headphones", &[]));
    }

    #[test]
    fn notification_kinds() {
        assert_eq!(Notification::parse(b"tick:7"), Notification::Tick(7));
        assert_eq!(
            Notification::parse(b"Decrypt failed!"),
            Notification::Ack(b"Decrypt failed!".to_vec())
        );
    }

    #[test]
    fn uuids_match_protocol_strings() {
        assert_eq!(SERVICE_UUID.to_string(), sealink_proto::ble::SERVICE_UUID);
        assert_eq!(DATA_UUID.to_string(), sealink_proto::ble::DATA_UUID);
    }
}
