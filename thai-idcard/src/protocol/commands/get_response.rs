// thai-idcard/src/protocol/commands/get_response.rs

use super::ApduCommand;
use crate::constants::{ATR_PREFIX_ALT_GET_RESPONSE, CLA_ISO, INS_GET_RESPONSE};

/// Card batches differ in the P2 they expect on GET RESPONSE; the ATR tells
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetResponseVariant {
    #[default]
    Standard,
    Alternate,
}

impl GetResponseVariant {
    pub fn from_atr(atr: &[u8]) -> Self {
        if atr.starts_with(&ATR_PREFIX_ALT_GET_RESPONSE) {
            Self::Alternate
        } else {
            Self::Standard
        }
    }

    fn p2(&self) -> u8 {
        match self {
            Self::Standard => 0x00,
            Self::Alternate => 0x01,
        }
    }
}

pub fn encode_get_response(variant: GetResponseVariant, length: u8) -> ApduCommand {
    ApduCommand::new(CLA_ISO, INS_GET_RESPONSE, 0x00, variant.p2())
        .le(length)
        .expect(length as usize)
}
