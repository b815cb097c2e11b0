// thai-idcard/src/transport/mod.rs

pub mod mock;
#[cfg(feature = "pcsc")]
pub mod pcsc;
pub mod traits;
#[cfg(feature = "usb")]
pub mod usb;

pub use mock::{MockCard, MockDriver, MockReader, MockUsbHost, OpenedReaders};
#[cfg(feature = "pcsc")]
pub use self::pcsc::PcscDriver;
pub use traits::{ReaderDriver, ReaderTransport};
#[cfg(feature = "usb")]
pub use usb::RusbHost;
