// thai-idcard/src/card/operations/exchange.rs

use crate::Result;
use crate::protocol::codec;
use crate::protocol::{ApduResponse, Command, GetResponseVariant};
use crate::reader::ReaderSession;

/// Send `cmd` and, when the card answers `61xx`, collect the data with GET
/// RESPONSE. The returned response is the final one of the exchange.
pub fn exchange(
    session: &mut ReaderSession,
    variant: GetResponseVariant,
    cmd: &Command,
) -> Result<ApduResponse> {
    let apdu = cmd.to_apdu();
    let raw = session.transmit(&codec::encode_command(cmd), apdu.expected_len)?;
    let resp = codec::decode_response(&raw)?;

    match resp.pending_len() {
        Some(length) => {
            // 61 00 announces a full 256 bytes
            let available = match length {
                0 => 256,
                n => usize::from(n),
            };
            let follow_up = Command::GetResponse { variant, length };
            let raw = session.transmit(&codec::encode_command(&follow_up), available)?;
            codec::decode_response(&raw)
        }
        None => Ok(resp),
    }
}
