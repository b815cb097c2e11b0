// thai-idcard/src/transport/usb/mod.rs

#![cfg(feature = "usb")]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use rusb::{Context, Device, HotplugBuilder, UsbContext};

use crate::device::registry::UsbHost;
use crate::device::signal::{Signal, SignalSender};
use crate::types::UsbDeviceDescriptor;
use crate::{Error, Result};

mod descriptor;
pub use descriptor::{describe, device_id_of, identifier_of};

/// Desktop USB host on libusb. "Permission" means the process can open the
/// device node; a permission request is answered at once.
pub struct RusbHost {
    context: Context,
    vendor_filter: Option<u16>,
}

impl RusbHost {
    pub fn new() -> Result<Self> {
        Ok(Self {
            context: Context::new()?,
            vendor_filter: None,
        })
    }

    /// Only report devices from `vendor_id`.
    pub fn with_vendor_filter(mut self, vendor_id: u16) -> Self {
        self.vendor_filter = Some(vendor_id);
        self
    }

    fn find(&self, snapshot: &UsbDeviceDescriptor) -> Result<Device<Context>> {
        self.context
            .devices()?
            .iter()
            .find(|d| identifier_of(d) == snapshot.identifier)
            .ok_or_else(|| Error::DeviceNotFound(snapshot.identifier.clone()))
    }

    /// Forward hotplug arrivals and departures as signals until the returned
    /// watch is dropped.
    pub fn watch(&self, signals: SignalSender) -> Result<HotplugWatch> {
        if !rusb::has_hotplug() {
            return Err(Error::Usb(rusb::Error::NotSupported));
        }
        let context = self.context.clone();
        let vendor_filter = self.vendor_filter;
        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::clone(&stop);
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("thai-idcard-hotplug".into())
            .spawn(move || {
                let mut builder = HotplugBuilder::new();
                if let Some(vid) = vendor_filter {
                    builder.vendor_id(vid);
                }
                let registration = builder
                    .enumerate(true)
                    .register(&context, Box::new(HotplugForwarder { signals }));
                let _registration = match registration {
                    Ok(r) => {
                        let _ = ready_tx.send(Ok(()));
                        r
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while !running.load(Ordering::SeqCst) {
                    if let Err(e) = context.handle_events(Some(Duration::from_millis(200))) {
                        warn!("libusb event handling failed: {}", e);
                    }
                }
                debug!("hotplug watch stopped");
            })
            .map_err(|e| Error::EventLoop(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(HotplugWatch {
                stop,
                thread: Some(thread),
            }),
            Ok(Err(e)) => Err(Error::Usb(e)),
            Err(_) => Err(Error::EventLoop("hotplug thread exited early".into())),
        }
    }
}

impl UsbHost for RusbHost {
    fn devices(&self) -> Result<Vec<UsbDeviceDescriptor>> {
        let mut found = Vec::new();
        for device in self.context.devices()?.iter() {
            match describe(&device) {
                Ok(d) if self.vendor_filter.is_none_or(|v| v == d.vendor_id) => found.push(d),
                Ok(_) => {}
                Err(e) => debug!("skipping {}: {}", identifier_of(&device), e),
            }
        }
        Ok(found)
    }

    fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool {
        self.find(device).is_ok_and(|d| d.open().is_ok())
    }

    fn request_permission(
        &mut self,
        device: &UsbDeviceDescriptor,
        reply: &SignalSender,
    ) -> Result<()> {
        reply.post(Signal::PermissionResult {
            device: device.clone(),
            granted: self.has_permission(device),
        });
        Ok(())
    }
}

struct HotplugForwarder {
    signals: SignalSender,
}

impl rusb::Hotplug<Context> for HotplugForwarder {
    fn device_arrived(&mut self, device: Device<Context>) {
        match describe(&device) {
            Ok(d) => self.signals.post(Signal::Attached(d)),
            Err(e) => warn!("cannot describe arrived device: {}", e),
        }
    }

    fn device_left(&mut self, device: Device<Context>) {
        // 抜去後は文字列ディスクリプタを読めない
        let snapshot = match device.device_descriptor() {
            Ok(dd) => UsbDeviceDescriptor::new(identifier_of(&device), dd.vendor_id(), dd.product_id()),
            Err(_) => UsbDeviceDescriptor::new(identifier_of(&device), 0, 0),
        };
        self.signals
            .post(Signal::Detached(snapshot.with_device_id(device_id_of(&device))));
    }
}

/// Running hotplug forwarder. Dropping it stops the libusb event thread.
pub struct HotplugWatch {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for HotplugWatch {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}
