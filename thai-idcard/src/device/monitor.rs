// thai-idcard/src/device/monitor.rs

use log::{debug, info, warn};

use crate::Result;
use crate::device::signal::Signal;
use crate::events::DeviceEvent;
use crate::types::UsbDeviceDescriptor;

/// Lifecycle of the single tracked USB reader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceLifecycleState {
    #[default]
    NotPresent,
    AttachedUnpermitted(UsbDeviceDescriptor),
    AttachedPermitted(UsbDeviceDescriptor),
    Opened(UsbDeviceDescriptor),
    Detached(UsbDeviceDescriptor),
}

impl DeviceLifecycleState {
    pub fn device(&self) -> Option<&UsbDeviceDescriptor> {
        match self {
            Self::NotPresent => None,
            Self::AttachedUnpermitted(d)
            | Self::AttachedPermitted(d)
            | Self::Opened(d)
            | Self::Detached(d) => Some(d),
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(
            self,
            Self::AttachedUnpermitted(_) | Self::AttachedPermitted(_) | Self::Opened(_)
        )
    }

    pub fn has_permission(&self) -> bool {
        matches!(self, Self::AttachedPermitted(_) | Self::Opened(_))
    }

    fn tracks(&self, device: &UsbDeviceDescriptor) -> bool {
        self.device().is_some_and(|d| d.same_device(device))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::NotPresent => "NotPresent",
            Self::AttachedUnpermitted(_) => "AttachedUnpermitted",
            Self::AttachedPermitted(_) => "AttachedPermitted",
            Self::Opened(_) => "Opened",
            Self::Detached(_) => "Detached",
        }
    }
}

/// Side effects the monitor asks for while handling a signal.
pub trait LifecycleHost {
    fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool;

    /// Fire-and-forget; the answer comes back as `Signal::PermissionResult`.
    fn request_permission(&mut self, device: &UsbDeviceDescriptor) -> Result<()>;

    /// Open the reader session for `device`.
    fn open_reader(&mut self, device: &UsbDeviceDescriptor) -> Result<()>;

    /// Close the reader session if it is bound to `device`.
    fn close_reader(&mut self, device: &UsbDeviceDescriptor);
}

/// USB lifecycle state machine. `step` consumes one platform signal and
/// returns the notification to publish, if any.
#[derive(Debug, Default)]
pub struct LifecycleMonitor {
    state: DeviceLifecycleState,
}

impl LifecycleMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeviceLifecycleState {
        &self.state
    }

    fn set(&mut self, next: DeviceLifecycleState) {
        if next != self.state {
            info!(
                "lifecycle {} -> {}{}",
                self.state.name(),
                next.name(),
                next.device()
                    .map(|d| format!(" ({})", d.identifier))
                    .unwrap_or_default()
            );
        }
        self.state = next;
    }

    pub fn step(&mut self, signal: Signal, host: &mut dyn LifecycleHost) -> Option<DeviceEvent> {
        match signal {
            Signal::Attached(device) => Some(self.on_attached(device, host)),
            Signal::Detached(device) => Some(self.on_detached(device, host)),
            Signal::PermissionResult { device, granted } => {
                self.on_permission_result(device, granted, host)
            }
        }
    }

    fn on_attached(
        &mut self,
        device: UsbDeviceDescriptor,
        host: &mut dyn LifecycleHost,
    ) -> DeviceEvent {
        let permitted = host.has_permission(&device);

        match &self.state {
            // 単一リーダー前提: 開いている方を追跡し続ける
            DeviceLifecycleState::Opened(current) => {
                if !current.same_device(&device) {
                    debug!(
                        "{} attached while {} is open; not tracking it",
                        device.identifier, current.identifier
                    );
                }
            }
            _ if permitted => self.set(DeviceLifecycleState::AttachedPermitted(device.clone())),
            _ => {
                self.set(DeviceLifecycleState::AttachedUnpermitted(device.clone()));
                if let Err(e) = host.request_permission(&device) {
                    warn!("permission request for {} failed: {}", device.identifier, e);
                }
            }
        }

        DeviceEvent::new(device, true, permitted)
    }

    fn on_detached(
        &mut self,
        device: UsbDeviceDescriptor,
        host: &mut dyn LifecycleHost,
    ) -> DeviceEvent {
        host.close_reader(&device);
        if self.state.tracks(&device) {
            self.set(DeviceLifecycleState::Detached(device.clone()));
        }
        DeviceEvent::new(device, false, false)
    }

    fn on_permission_result(
        &mut self,
        device: UsbDeviceDescriptor,
        granted: bool,
        host: &mut dyn LifecycleHost,
    ) -> Option<DeviceEvent> {
        let waiting = matches!(
            &self.state,
            DeviceLifecycleState::AttachedUnpermitted(d) if d.same_device(&device)
        );
        if !waiting {
            debug!(
                "ignoring permission result for {} in state {}",
                device.identifier,
                self.state.name()
            );
            return None;
        }

        if !granted {
            warn!("permission denied for {}", device.identifier);
            return None;
        }

        self.set(DeviceLifecycleState::AttachedPermitted(device.clone()));
        match host.open_reader(&device) {
            Ok(()) => self.set(DeviceLifecycleState::Opened(device.clone())),
            Err(e) => warn!("reader for {} not opened: {}", device.identifier, e),
        }
        Some(DeviceEvent::new(device, true, true))
    }

    /// Start tracking a device the host asked permission for, unless a reader
    /// is already open.
    pub fn track_unpermitted(&mut self, device: &UsbDeviceDescriptor) {
        match &self.state {
            DeviceLifecycleState::Opened(_) => {}
            DeviceLifecycleState::AttachedPermitted(d) if d.same_device(device) => {}
            _ => self.set(DeviceLifecycleState::AttachedUnpermitted(device.clone())),
        }
    }

    /// Record that `device` may be opened. An open reader for another device
    /// is left alone; the session closes it when the new one opens.
    pub fn record_permitted(&mut self, device: &UsbDeviceDescriptor) {
        if !matches!(&self.state, DeviceLifecycleState::Opened(d) if d.same_device(device)) {
            self.set(DeviceLifecycleState::AttachedPermitted(device.clone()));
        }
    }

    /// Record a successful explicit open. Only valid from `AttachedPermitted`
    /// for the same device, or from `Opened` for another one that the session
    /// has just replaced.
    pub fn record_opened(&mut self, device: &UsbDeviceDescriptor) -> bool {
        let allowed = match &self.state {
            DeviceLifecycleState::AttachedPermitted(d) => d.same_device(device),
            DeviceLifecycleState::Opened(d) => !d.same_device(device),
            _ => false,
        };
        if allowed {
            self.set(DeviceLifecycleState::AttachedPermitted(device.clone()));
            self.set(DeviceLifecycleState::Opened(device.clone()));
        } else if !matches!(&self.state, DeviceLifecycleState::Opened(d) if d.same_device(device)) {
            warn!(
                "open of {} recorded in state {}",
                device.identifier,
                self.state.name()
            );
        }
        allowed
    }

    /// The reader for `device` was closed while the device stays attached.
    pub fn record_closed(&mut self, device: &UsbDeviceDescriptor) {
        if matches!(&self.state, DeviceLifecycleState::Opened(d) if d.same_device(device)) {
            self.set(DeviceLifecycleState::AttachedPermitted(device.clone()));
        }
    }
}
