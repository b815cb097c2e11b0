// thai-idcard/src/transport/traits.rs

use crate::Result;
use crate::types::{PowerAction, Protocol, Slot, UsbDeviceDescriptor};

/// Byte-level reader transport for one opened reader. This is the seam to
/// the reader SDK; protocol and session logic never talk to hardware any
/// other way.
pub trait ReaderTransport: Send {
    /// Apply a power action to the slot. Resets return the card's ATR,
    /// power-down returns an empty vector.
    fn power(&mut self, slot: Slot, action: PowerAction) -> Result<Vec<u8>>;

    /// Ask the reader to use `preferred` and return what was negotiated.
    fn set_protocol(&mut self, slot: Slot, preferred: Protocol) -> Result<Protocol>;

    /// Send a command APDU and return the raw response (body + SW1 SW2).
    /// `max_response_len` is the size of the receive buffer.
    fn transmit(&mut self, slot: Slot, command: &[u8], max_response_len: usize)
    -> Result<Vec<u8>>;

    /// Release the reader.
    fn close(&mut self) -> Result<()>;
}

/// Factory side of the reader SDK: decides which USB devices it can drive
/// and opens transports for them.
pub trait ReaderDriver: Send {
    fn is_supported(&self, device: &UsbDeviceDescriptor) -> bool;

    fn open(&mut self, device: &UsbDeviceDescriptor) -> Result<Box<dyn ReaderTransport>>;
}
