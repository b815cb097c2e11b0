// thai-idcard/src/events.rs
//! Device and reader event streams.
//!
//! Each stream has at most one listener. Registering a new one replaces the
//! previous listener; events emitted while nobody listens are dropped.

use std::sync::{Arc, Mutex};

use crate::types::UsbDeviceDescriptor;

/// Lifecycle notification for the device stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DeviceEvent {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub device: UsbDeviceDescriptor,
    pub is_attached: bool,
    pub has_permission: bool,
}

impl DeviceEvent {
    pub fn new(device: UsbDeviceDescriptor, is_attached: bool, has_permission: bool) -> Self {
        Self {
            device,
            is_attached,
            has_permission,
        }
    }
}

/// Notification for the reader stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "camelCase"))]
pub enum ReaderEvent {
    /// A supported reader was opened for this device.
    Bound { device: UsbDeviceDescriptor },
    /// The reader handle for this device was closed.
    Released { identifier: String },
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Single-listener event stream.
pub struct Broadcast<E> {
    listener: Mutex<Option<Listener<E>>>,
}

impl<E> Default for Broadcast<E> {
    fn default() -> Self {
        Self {
            listener: Mutex::new(None),
        }
    }
}

impl<E> Broadcast<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Listener<E>>> {
        self.listener.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install `listener`, replacing whatever was registered before.
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        *self.slot() = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.slot() = None;
    }

    pub fn has_listener(&self) -> bool {
        self.slot().is_some()
    }

    /// Deliver `event` to the current listener. The listener runs outside the
    /// lock so it may register a replacement.
    pub fn emit(&self, event: &E) -> bool {
        let listener = self.slot().clone();
        match listener {
            Some(f) => {
                f(event);
                true
            }
            None => false,
        }
    }
}

/// Both outbound streams.
#[derive(Default)]
pub struct EventHub {
    pub device: Broadcast<DeviceEvent>,
    pub reader: Broadcast<ReaderEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }
}
