// thai-idcard/src/protocol/commands/read.rs

use super::ApduCommand;
use crate::constants::{CLA_PROPRIETARY, INS_READ_BINARY};

/// Encode the applet's READ BINARY: offset in P1/P2 and a two-byte body
/// `00 len`. The data itself is fetched afterwards with GET RESPONSE.
pub fn encode_read_binary(offset: u16, length: u8) -> ApduCommand {
    let [p1, p2] = offset.to_be_bytes();
    ApduCommand::new(CLA_PROPRIETARY, INS_READ_BINARY, p1, p2)
        .data(vec![0x00, length])
        .expect(length as usize)
}
