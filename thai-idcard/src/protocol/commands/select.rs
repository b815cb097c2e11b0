// thai-idcard/src/protocol/commands/select.rs

use super::ApduCommand;
use crate::constants::{CLA_ISO, INS_SELECT, SELECT_BY_NAME_P1, SELECT_BY_NAME_P2};

/// SELECT by DF name (AID). The applet answers `61xx`, so no Le is sent.
pub fn encode_select(aid: &[u8]) -> ApduCommand {
    ApduCommand::new(CLA_ISO, INS_SELECT, SELECT_BY_NAME_P1, SELECT_BY_NAME_P2).data(aid.to_vec())
}
