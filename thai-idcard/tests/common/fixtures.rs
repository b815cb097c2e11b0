// fixtures.rs: devices, listeners and card images shared by the tests

use std::sync::{Arc, Mutex};

use thai_idcard::events::{DeviceEvent, ReaderEvent};
use thai_idcard::test_support::{SampleCard, acs_reader};
use thai_idcard::transport::MockCard;
use thai_idcard::{Coordinator, UsbDeviceDescriptor};

/// A second reader on the same bus from another vendor.
pub fn foreign_reader() -> UsbDeviceDescriptor {
    UsbDeviceDescriptor::new("/dev/bus/usb/001/005", 0x04E6, 0x5116)
        .with_names(Some("Identiv".into()), Some("uTrust 2700 R".into()))
        .with_device_id(1005)
}

/// Another ACS reader, plugged in after the first one.
pub fn second_acs_reader() -> UsbDeviceDescriptor {
    UsbDeviceDescriptor::new("/dev/bus/usb/001/003", 0x072F, 0x2200)
        .with_names(Some("ACS".into()), Some("ACR39U ICC Reader".into()))
        .with_device_id(1003)
}

pub fn acs() -> UsbDeviceDescriptor {
    acs_reader()
}

pub fn sample_card() -> MockCard {
    SampleCard::default().mock_card()
}

/// Everything both listeners received, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    pub devices: Arc<Mutex<Vec<DeviceEvent>>>,
    pub readers: Arc<Mutex<Vec<ReaderEvent>>>,
}

impl Recorder {
    pub fn attach(coord: &Coordinator) -> Self {
        let rec = Self::default();
        let devices = Arc::clone(&rec.devices);
        coord.set_device_listener(move |ev| devices.lock().unwrap().push(ev.clone()));
        let readers = Arc::clone(&rec.readers);
        coord.set_reader_listener(move |ev| readers.lock().unwrap().push(ev.clone()));
        rec
    }

    pub fn device_events(&self) -> Vec<DeviceEvent> {
        self.devices.lock().unwrap().clone()
    }

    pub fn reader_events(&self) -> Vec<ReaderEvent> {
        self.readers.lock().unwrap().clone()
    }
}
