// thai-idcard/src/prelude.rs

pub use crate::card::{CardRecord, FieldFailure, PersonName, ReadOutcome, Selected, ThaiIdCard, Unselected};
pub use crate::config::ReaderConfig;
pub use crate::coordinator::Coordinator;
pub use crate::device::{DeviceLifecycleState, Signal, SignalSender, UsbHost};
pub use crate::events::{DeviceEvent, ReaderEvent};
pub use crate::protocol::{ApduCommand, ApduResponse, Command};
pub use crate::reader::ReaderSession;
pub use crate::transport::{ReaderDriver, ReaderTransport};
pub use crate::{
    Error, FieldName, PowerAction, Protocol, Result, Slot, StatusWord, UsbDeviceDescriptor,
};

#[cfg(feature = "bridge")]
pub use crate::bridge::Bridge;

// Re-export small utilities for convenience
pub use crate::utils::apdu_hex;
