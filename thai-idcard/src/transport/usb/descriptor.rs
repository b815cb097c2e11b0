// thai-idcard/src/transport/usb/descriptor.rs

use std::time::Duration;

use rusb::{Device, UsbContext};

use crate::Result;
use crate::types::UsbDeviceDescriptor;

const STRING_TIMEOUT: Duration = Duration::from_millis(200);

/// Platform identifier of a device: its usbfs node path.
pub fn identifier_of<T: UsbContext>(device: &Device<T>) -> String {
    format!(
        "/dev/bus/usb/{:03}/{:03}",
        device.bus_number(),
        device.address()
    )
}

/// Numeric id stable while the device stays plugged in.
pub fn device_id_of<T: UsbContext>(device: &Device<T>) -> u32 {
    u32::from(device.bus_number()) * 1000 + u32::from(device.address())
}

/// Snapshot a device. String descriptors need an open handle, so they stay
/// empty for devices the process may not open.
pub fn describe<T: UsbContext>(device: &Device<T>) -> Result<UsbDeviceDescriptor> {
    let dd = device.device_descriptor()?;
    let mut snapshot = UsbDeviceDescriptor::new(identifier_of(device), dd.vendor_id(), dd.product_id())
        .with_device_id(device_id_of(device));

    if let Ok(config) = device.active_config_descriptor() {
        snapshot = snapshot.with_interface_count(config.num_interfaces());
    }

    if let Ok(handle) = device.open() {
        let language = handle
            .read_languages(STRING_TIMEOUT)
            .ok()
            .and_then(|langs| langs.first().copied());
        if let Some(lang) = language {
            let manufacturer = handle.read_manufacturer_string(lang, &dd, STRING_TIMEOUT).ok();
            let product = handle.read_product_string(lang, &dd, STRING_TIMEOUT).ok();
            snapshot = snapshot.with_names(manufacturer, product);
        }
    }
    Ok(snapshot)
}
