//! NimBLE GATT server for the receiver
//!
//! One service with one read/write/notify characteristic (NimBLE adds the
//! 0x2902 descriptor for notify). Callbacks only push events into the
//! main loop's queue; all decisions happen in `Device::step`.

use std::sync::Arc;
use std::time::Instant;

use esp32_nimble::utilities::mutex::Mutex;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{BLEAdvertisementData, BLECharacteristic, BLEDevice, NimbleProperties};
use log::*;
use sealink_mcu::link::EventSender;
use sealink_mcu::{LinkError, LinkServer};
use sealink_proto::ble::{DATA_UUID, SERVICE_UUID};

/// [`LinkServer`] over the NimBLE singleton
pub struct NimbleLink {
    data_char: Arc<Mutex<BLECharacteristic>>,
}

/// Register the service and callbacks. Advertising data is prepared but
/// not started; the session starts it.
pub fn start_ble_server(
    device_name: &str,
    events: EventSender,
    boot: Instant,
) -> anyhow::Result<NimbleLink> {
    let service_uuid = parse_uuid(SERVICE_UUID)?;
    let data_uuid = parse_uuid(DATA_UUID)?;

    let ble_device = BLEDevice::take();

    // Set the device name (this is what shows up in BLE scans)
    BLEDevice::set_device_name(device_name)
        .map_err(|e| anyhow::anyhow!("failed to set device name: {:?}", e))?;

    let server = ble_device.get_server();
    // re-advertising is the session's job
    server.advertise_on_disconnect(false);

    let on_connect = events.clone();
    server.on_connect(move |server, desc| {
        info!("BLE client connected");
        // Update connection parameters for better performance
        let _ = server.update_conn_params(desc.conn_handle(), 24, 48, 0, 60);
        on_connect.peer_connected();
    });

    let on_disconnect = events.clone();
    server.on_disconnect(move |_desc, reason| {
        info!("BLE client disconnected: {:?}", reason);
        on_disconnect.peer_disconnected();
    });

    let service = server.create_service(service_uuid);
    let data_char = service.lock().create_characteristic(
        data_uuid,
        NimbleProperties::READ | NimbleProperties::WRITE | NimbleProperties::NOTIFY,
    );

    let on_write = events;
    data_char.lock().on_write(move |args| {
        let data = args.recv_data().to_vec();
        let at = boot.elapsed().as_millis() as u64;
        info!("BLE: write of {} bytes", data.len());
        on_write.write(data, at);
    });

    let advertising = ble_device.get_advertising();
    advertising
        .lock()
        .scan_response(true)
        .set_data(
            BLEAdvertisementData::new()
                .name(device_name)
                .add_service_uuid(service_uuid),
        )
        .map_err(|e| anyhow::anyhow!("failed to set advertising data: {:?}", e))?;

    info!("BLE service registered as '{}'", device_name);
    Ok(NimbleLink { data_char })
}

fn parse_uuid(uuid: &str) -> anyhow::Result<BleUuid> {
    BleUuid::from_uuid128_string(uuid).map_err(|e| anyhow::anyhow!("bad UUID {uuid}: {e:?}"))
}

impl LinkServer for NimbleLink {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        let ble_device = BLEDevice::take();
        let mut advertising = ble_device.get_advertising().lock();
        if advertising.is_advertising() {
            return Ok(());
        }
        advertising
            .start()
            .map_err(|e| LinkError::AdvertiseFailed(format!("{:?}", e)))
    }

    fn stop_advertising(&mut self) -> Result<(), LinkError> {
        let ble_device = BLEDevice::take();
        let mut advertising = ble_device.get_advertising().lock();
        if !advertising.is_advertising() {
            return Ok(());
        }
        advertising
            .stop()
            .map_err(|e| LinkError::AdvertiseFailed(format!("{:?}", e)))
    }

    fn set_characteristic_value(&mut self, value: &[u8]) -> Result<(), LinkError> {
        self.data_char.lock().set_value(value);
        Ok(())
    }

    fn notify(&mut self) -> Result<(), LinkError> {
        let ble_device = BLEDevice::take();
        if ble_device.get_server().connected_count() == 0 {
            return Err(LinkError::NotifyFailed("no peer connected".to_string()));
        }
        self.data_char.lock().notify();
        Ok(())
    }
}
