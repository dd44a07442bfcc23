//! Sealink receiver for M5Stack (ESP32)
//!
//! Advertises a single BLE service, decrypts inbound writes with the RSA
//! key stored on the SPIFFS partition (`/private.pem`) and reports every
//! event on the serial console. Without a key it shows writes as plain
//! text.

mod ble;
mod storage;

use std::time::{Duration, Instant};

use log::*;
use sealink_mcu::{Device, DeviceConfig, LogPresenter, Unmounted};

/// Main loop period; one link event is handled per iteration
const LOOP_DELAY: Duration = Duration::from_millis(50);

const HEAP_REPORT_MS: u64 = 10_000;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Sealink receiver v0.1");
    let boot = Instant::now();
    let config = DeviceConfig::default();

    let (events, queue) = sealink_mcu::link::channel();
    let link = ble::start_ble_server(&config.device_name, events, boot)?;

    let mut device = match storage::mount() {
        Ok(fs) => Device::boot(&config, &fs, link, LogPresenter, queue),
        Err(e) => {
            error!("Failed to mount SPIFFS: {:?} - RSA will be disabled", e);
            Device::boot(&config, &Unmounted, link, LogPresenter, queue)
        }
    };

    if device.decryption_enabled() {
        info!("RSA decryption is enabled");
    } else {
        warn!("RSA decryption is disabled - plain text only");
    }

    let mut last_heap_report = 0;
    loop {
        let now = boot.elapsed().as_millis() as u64;
        device.step(now);

        if now.saturating_sub(last_heap_report) >= HEAP_REPORT_MS {
            // SAFETY: plain read of an IDF counter
            let free = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
            info!("Free heap: {} bytes", free);
            last_heap_report = now;
        }

        std::thread::sleep(LOOP_DELAY);
    }
}
