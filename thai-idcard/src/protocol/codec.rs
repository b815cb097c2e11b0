// thai-idcard/src/protocol/codec.rs

use log::debug;

use crate::Result;
use crate::utils::apdu_hex;

use super::commands::Command;
use super::responses::ApduResponse;

/// Encode a Command into the bytes handed to the reader transport.
pub fn encode_command(cmd: &Command) -> Vec<u8> {
    let bytes = cmd.encode();
    debug!("C-APDU {}", apdu_hex(&bytes));
    bytes
}

/// Decode the bytes returned by the transport into a response APDU.
pub fn decode_response(raw: &[u8]) -> Result<ApduResponse> {
    debug!("R-APDU {}", apdu_hex(raw));
    ApduResponse::decode(raw)
}
