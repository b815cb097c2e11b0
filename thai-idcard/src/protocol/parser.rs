// thai-idcard/src/protocol/parser.rs

use crate::types::StatusWord;
use crate::{Error, Result};

/// Ensure the slice has at least `min` bytes.
pub fn ensure_len(data: &[u8], min: usize) -> Result<()> {
    if data.len() < min {
        return Err(Error::InvalidLength {
            expected: min,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Split a raw response APDU into its body and trailing status word.
pub fn split_status(raw: &[u8]) -> Result<(&[u8], StatusWord)> {
    ensure_len(raw, 2)?;
    let body_len = raw.len() - 2;
    let sw = StatusWord::from_bytes(raw[body_len], raw[body_len + 1]);
    Ok((&raw[..body_len], sw))
}
