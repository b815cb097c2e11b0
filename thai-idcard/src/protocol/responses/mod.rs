// thai-idcard/src/protocol/responses/mod.rs

use crate::protocol::parser;
use crate::types::StatusWord;
use crate::Result;

/// Response APDU: body plus the trailing status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    pub payload: Vec<u8>,
    pub status_word: StatusWord,
}

impl ApduResponse {
    /// Decode a raw response as returned by the transport.
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let (body, status_word) = parser::split_status(raw)?;
        Ok(Self {
            payload: body.to_vec(),
            status_word,
        })
    }

    /// Only `9000` counts as success.
    pub fn is_success(&self) -> bool {
        self.status_word.is_success()
    }

    /// Number of bytes waiting for a GET RESPONSE, if the card signalled any.
    pub fn pending_len(&self) -> Option<u8> {
        self.status_word.bytes_available()
    }
}
