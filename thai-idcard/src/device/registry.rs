// thai-idcard/src/device/registry.rs

use log::debug;

use crate::device::signal::SignalSender;
use crate::types::UsbDeviceDescriptor;
use crate::{Error, Result};

/// Platform USB host: enumeration and permission bookkeeping.
pub trait UsbHost: Send {
    /// Devices currently visible on the bus.
    fn devices(&self) -> Result<Vec<UsbDeviceDescriptor>>;

    /// Whether the process may open the device right now.
    fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool;

    /// Start a permission request. The call returns immediately; the answer
    /// is delivered later by posting `Signal::PermissionResult` on `reply`.
    fn request_permission(
        &mut self,
        device: &UsbDeviceDescriptor,
        reply: &SignalSender,
    ) -> Result<()>;
}

/// Read-side view over the USB host.
pub struct DeviceRegistry {
    host: Box<dyn UsbHost>,
}

impl DeviceRegistry {
    pub fn new(host: Box<dyn UsbHost>) -> Self {
        Self { host }
    }

    pub fn list(&self) -> Result<Vec<UsbDeviceDescriptor>> {
        self.host.devices()
    }

    /// Look a device up by its platform identifier.
    pub fn find(&self, identifier: &str) -> Result<UsbDeviceDescriptor> {
        self.list()?
            .into_iter()
            .find(|d| d.identifier == identifier)
            .ok_or_else(|| Error::DeviceNotFound(identifier.to_string()))
    }

    pub fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool {
        self.host.has_permission(device)
    }

    pub fn request_permission(
        &mut self,
        device: &UsbDeviceDescriptor,
        reply: &SignalSender,
    ) -> Result<()> {
        debug!("requesting permission for {}", device.identifier);
        self.host.request_permission(device, reply)
    }
}
