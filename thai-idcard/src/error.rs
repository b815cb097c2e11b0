// thai-idcard/src/error.rs

use thiserror::Error;

use crate::types::{FieldName, StatusWord};

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("no reader session is bound")]
    ReaderUnavailable,

    #[error("device {vendor_id:04x}:{product_id:04x} is not supported by the reader layer")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error("failed to open reader: {0}")]
    OpenFailed(String),

    #[error("failed to power the card: {0}")]
    PowerFailed(String),

    #[error("protocol negotiation failed: {0}")]
    ProtocolNegotiationFailed(String),

    #[error("card did not accept the Thai ID applet selection: status={status_word}")]
    CardNotRecognized { status_word: StatusWord },

    #[error("card rejected read of {field}: status={status_word}")]
    CardRejected {
        field: FieldName,
        status_word: StatusWord,
    },

    #[error("device was lost during the operation")]
    DeviceLost,

    #[error("transmit failed: {0}")]
    TransmitFailed(String),

    // USB 実装を後から有効化できるように optional dependency にしている
    #[cfg(feature = "usb")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[error("invalid response length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid chunk layout: {0}")]
    InvalidLayout(String),

    #[error("event loop: {0}")]
    EventLoop(String),
}

impl Error {
    /// True when the error means the reader went away and the caller has to
    /// re-open before retrying.
    pub fn is_device_lost(&self) -> bool {
        matches!(self, Error::DeviceLost)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
