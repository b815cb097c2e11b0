// thai-idcard/src/device/signal.rs

use std::sync::mpsc::Sender;

use log::warn;

use crate::types::UsbDeviceDescriptor;

/// Platform signals consumed by the lifecycle monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Attached(UsbDeviceDescriptor),
    Detached(UsbDeviceDescriptor),
    PermissionResult {
        device: UsbDeviceDescriptor,
        granted: bool,
    },
}

/// Messages carried by the event loop queue.
#[derive(Debug)]
pub(crate) enum LoopMessage {
    Signal(Signal),
    Stop,
}

/// Cloneable handle platform callbacks use to enqueue signals.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<LoopMessage>,
}

impl SignalSender {
    pub(crate) fn new(tx: Sender<LoopMessage>) -> Self {
        Self { tx }
    }

    /// Enqueue a signal. Delivery is best-effort: once the loop has stopped
    /// the signal is dropped and logged.
    pub fn post(&self, signal: Signal) {
        if let Err(e) = self.tx.send(LoopMessage::Signal(signal)) {
            warn!("event loop is gone, dropping {:?}", e.0);
        }
    }

    pub(crate) fn stop(&self) {
        let _ = self.tx.send(LoopMessage::Stop);
    }
}
