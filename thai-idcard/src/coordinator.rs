// thai-idcard/src/coordinator.rs
//! Owns the registry, the lifecycle monitor and the reader session, and
//! runs the event loop that feeds platform signals into the monitor.
//!
//! Lock order is monitor, then registry, then session. Card reads only take
//! the session lock. A detach severs the session's link before any lock is
//! taken, so a read in flight gives the lock back at its next exchange.

use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::card::{self, ReadOutcome, ThaiIdCard};
use crate::config::ReaderConfig;
use crate::device::monitor::{DeviceLifecycleState, LifecycleHost, LifecycleMonitor};
use crate::device::registry::{DeviceRegistry, UsbHost};
use crate::device::signal::{LoopMessage, Signal, SignalSender};
use crate::events::{DeviceEvent, EventHub, ReaderEvent};
use crate::reader::{Link, ReaderSession};
use crate::transport::ReaderDriver;
use crate::types::UsbDeviceDescriptor;
use crate::{Error, Result};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // a panicking listener must not wedge the reader for good
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Open `device` on the session. Alongside the result, returns the device
/// whose handle was closed on the way: the replaced one on success, or the
/// previous one when the driver failed after it had been closed.
fn open_session(
    session: &mut ReaderSession,
    device: &UsbDeviceDescriptor,
) -> (Option<UsbDeviceDescriptor>, Result<()>) {
    let previous = session.device().cloned();
    let result = session.open(device);
    let displaced = match &result {
        Err(_) if session.is_open() => None,
        _ => previous,
    };
    (displaced, result)
}

/// Side effects requested by the monitor during one `step`. Reader events
/// are collected and published once every lock is released.
struct StepHost<'a> {
    registry: &'a mut DeviceRegistry,
    session: &'a Mutex<ReaderSession>,
    signals: &'a SignalSender,
    reader_events: Vec<ReaderEvent>,
}

impl LifecycleHost for StepHost<'_> {
    fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool {
        self.registry.has_permission(device)
    }

    fn request_permission(&mut self, device: &UsbDeviceDescriptor) -> Result<()> {
        self.registry.request_permission(device, self.signals)
    }

    fn open_reader(&mut self, device: &UsbDeviceDescriptor) -> Result<()> {
        let (displaced, result) = open_session(&mut lock(self.session), device);
        if let Some(old) = displaced {
            self.reader_events.push(ReaderEvent::Released {
                identifier: old.identifier,
            });
        }
        result?;
        self.reader_events.push(ReaderEvent::Bound {
            device: device.clone(),
        });
        Ok(())
    }

    fn close_reader(&mut self, device: &UsbDeviceDescriptor) {
        match lock(self.session).close_if(device) {
            Ok(true) => self.reader_events.push(ReaderEvent::Released {
                identifier: device.identifier.clone(),
            }),
            Ok(false) => {}
            Err(e) => {
                warn!("closing reader for {} failed: {}", device.identifier, e);
                self.reader_events.push(ReaderEvent::Released {
                    identifier: device.identifier.clone(),
                });
            }
        }
    }
}

pub struct Coordinator {
    monitor: Mutex<LifecycleMonitor>,
    registry: Mutex<DeviceRegistry>,
    session: Mutex<ReaderSession>,
    link: Link,
    events: EventHub,
    signals: SignalSender,
    receiver: Mutex<Option<Receiver<LoopMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(host: Box<dyn UsbHost>, driver: Box<dyn ReaderDriver>, config: ReaderConfig) -> Self {
        let (tx, rx) = channel();
        let session = ReaderSession::new(driver, config);
        let link = session.link();
        Self {
            monitor: Mutex::new(LifecycleMonitor::new()),
            registry: Mutex::new(DeviceRegistry::new(host)),
            session: Mutex::new(session),
            link,
            events: EventHub::new(),
            signals: SignalSender::new(tx),
            receiver: Mutex::new(Some(rx)),
            worker: Mutex::new(None),
        }
    }

    /// Handle platform callbacks post their signals through.
    pub fn signal_sender(&self) -> SignalSender {
        self.signals.clone()
    }

    pub fn link(&self) -> Link {
        self.link.clone()
    }

    pub fn state(&self) -> DeviceLifecycleState {
        lock(&self.monitor).state().clone()
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn set_device_listener<F>(&self, listener: F)
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        self.events.device.set_listener(listener);
    }

    pub fn set_reader_listener<F>(&self, listener: F)
    where
        F: Fn(&ReaderEvent) + Send + Sync + 'static,
    {
        self.events.reader.set_listener(listener);
    }

    fn publish_reader_events(&self, events: Vec<ReaderEvent>) {
        for ev in &events {
            self.events.reader.emit(ev);
        }
    }

    /// Run one signal through the lifecycle monitor and publish what it
    /// produced.
    pub fn dispatch(&self, signal: Signal) {
        debug!("dispatch {:?}", signal);
        if let Signal::Detached(device) = &signal {
            if self.link.sever_if_bound(&device.identifier) {
                info!("reader link to {} severed", device.identifier);
            }
        }

        let (event, reader_events) = {
            let mut monitor = lock(&self.monitor);
            let mut registry = lock(&self.registry);
            let mut host = StepHost {
                registry: &mut *registry,
                session: &self.session,
                signals: &self.signals,
                reader_events: Vec::new(),
            };
            let event = monitor.step(signal, &mut host);
            (event, host.reader_events)
        };

        self.publish_reader_events(reader_events);
        if let Some(ev) = event {
            self.events.device.emit(&ev);
        }
    }

    /// Dispatch every queued signal on the calling thread. Does nothing once
    /// the event loop thread owns the queue.
    pub fn run_pending(&self) -> usize {
        let mut handled = 0;
        loop {
            let next = {
                let receiver = lock(&self.receiver);
                match receiver.as_ref() {
                    Some(rx) => rx.try_recv(),
                    None => return handled,
                }
            };
            match next {
                Ok(LoopMessage::Signal(signal)) => {
                    self.dispatch(signal);
                    handled += 1;
                }
                Ok(LoopMessage::Stop) | Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                    return handled;
                }
            }
        }
    }

    /// Move the signal queue onto a dedicated thread.
    pub fn spawn_event_loop(self: &Arc<Self>) -> Result<()> {
        let rx = lock(&self.receiver)
            .take()
            .ok_or_else(|| Error::EventLoop("already running".into()))?;
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = thread::Builder::new()
            .name("thai-idcard-events".into())
            .spawn(move || {
                while let Ok(LoopMessage::Signal(signal)) = rx.recv() {
                    match weak.upgrade() {
                        Some(this) => this.dispatch(signal),
                        None => break,
                    }
                }
                debug!("event loop stopped");
            })
            .map_err(|e| Error::EventLoop(e.to_string()))?;

        *lock(&self.worker) = Some(handle);
        Ok(())
    }

    /// Stop the event loop thread and wait for it.
    pub fn shutdown(&self) {
        self.signals.stop();
        let worker = lock(&self.worker).take();
        if let Some(handle) = worker {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("event loop thread panicked");
            }
        }
    }

    /// Visible devices. Flags are reported as `false`; the host learns the
    /// real permission through `request_permission` and the device stream.
    pub fn device_list(&self) -> Result<Vec<DeviceEvent>> {
        let registry = lock(&self.registry);
        Ok(registry
            .list()?
            .into_iter()
            .map(|d| DeviceEvent::new(d, false, false))
            .collect())
    }

    /// Ask for permission to use `identifier`. An already permitted device
    /// is reported with `has_permission = true` and no request is made;
    /// otherwise the answer arrives later as a `PermissionResult` signal.
    pub fn request_permission(&self, identifier: &str) -> Result<DeviceEvent> {
        let mut monitor = lock(&self.monitor);
        let mut registry = lock(&self.registry);
        let device = registry.find(identifier)?;
        if registry.has_permission(&device) {
            return Ok(DeviceEvent::new(device, false, true));
        }
        monitor.track_unpermitted(&device);
        registry.request_permission(&device, &self.signals)?;
        Ok(DeviceEvent::new(device, false, false))
    }

    /// Open the reader for `identifier`. `has_permission` is the host's own
    /// view; the device must be permitted by either the host or the
    /// registry.
    pub fn open_device(&self, identifier: &str, has_permission: bool) -> Result<DeviceEvent> {
        let mut reader_events = Vec::new();
        let result = {
            let mut monitor = lock(&self.monitor);
            let registry = lock(&self.registry);
            let device = registry.find(identifier)?;
            if !has_permission && !registry.has_permission(&device) {
                return Err(Error::PermissionDenied(device.identifier));
            }

            let (displaced, result) = open_session(&mut lock(&self.session), &device);
            if let Some(old) = displaced {
                if result.is_err() {
                    monitor.record_closed(&old);
                }
                reader_events.push(ReaderEvent::Released {
                    identifier: old.identifier,
                });
            }
            // the monitor only moves once the session holds the new handle
            result.map(|()| {
                monitor.record_permitted(&device);
                monitor.record_opened(&device);
                device
            })
        };

        if let Ok(device) = &result {
            reader_events.push(ReaderEvent::Bound {
                device: device.clone(),
            });
        }
        self.publish_reader_events(reader_events);
        result.map(|device| DeviceEvent::new(device, true, has_permission))
    }

    /// Warm-reset the card, negotiate the protocol and select the applet.
    /// Returns the ATR.
    pub fn power_on(&self) -> Result<Vec<u8>> {
        let mut session = lock(&self.session);
        let atr = session.power_on()?;
        let protocol = session.config().protocol;
        session.set_protocol(protocol)?;
        match ThaiIdCard::connect(&mut session).and_then(|c| c.select()) {
            Ok(_) => debug!("Thai ID applet selected"),
            Err(e) if e.is_device_lost() => return Err(e),
            Err(e) => warn!("applet selection after power on failed: {}", e),
        }
        Ok(atr)
    }

    /// Power the card down and release the reader.
    pub fn power_off(&self) -> Result<()> {
        let mut monitor = lock(&self.monitor);
        let mut session = lock(&self.session);
        let device = session.device().cloned();
        let result = session.power_off();
        drop(session);

        if let Some(device) = device {
            monitor.record_closed(&device);
            drop(monitor);
            self.publish_reader_events(vec![ReaderEvent::Released {
                identifier: device.identifier,
            }]);
        }
        result
    }

    pub fn read_all(&self) -> Result<ReadOutcome> {
        let mut session = lock(&self.session);
        card::read_all(&mut session)
    }

    pub fn read_specific<S: AsRef<str>>(&self, fields: &[S]) -> Result<ReadOutcome> {
        let mut session = lock(&self.session);
        card::read_specific(&mut session, fields)
    }

    pub fn is_reader_open(&self) -> bool {
        lock(&self.session).is_open()
    }

    pub fn bound_device(&self) -> Option<UsbDeviceDescriptor> {
        lock(&self.session).device().cloned()
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
