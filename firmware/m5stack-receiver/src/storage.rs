//! SPIFFS partition holding the private key
//!
//! Mounted into the VFS so plain `std::fs` works on it; the key is then
//! `/spiffs/private.pem` on the device and `/private.pem` to the core.

use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, EspError};
use sealink_mcu::StdFs;

const MOUNT_POINT: &str = "/spiffs";

pub fn mount() -> Result<StdFs, EspError> {
    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: std::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: conf and its strings outlive the call; IDF copies them
    esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
    Ok(StdFs::new(MOUNT_POINT))
}
