// thai-idcard/src/constants.rs
//! Protocol constants for the Thai national ID applet

/// Application identifier of the Thai ID applet.
pub const THAI_ID_AID: [u8; 8] = [0xA0, 0x00, 0x00, 0x00, 0x54, 0x48, 0x00, 0x01];

/// Interindustry class byte (SELECT, GET RESPONSE).
pub const CLA_ISO: u8 = 0x00;
/// Proprietary class byte used by the applet for READ BINARY.
pub const CLA_PROPRIETARY: u8 = 0x80;

pub const INS_SELECT: u8 = 0xA4;
pub const INS_READ_BINARY: u8 = 0xB0;
pub const INS_GET_RESPONSE: u8 = 0xC0;

/// SELECT by DF name, first occurrence.
pub const SELECT_BY_NAME_P1: u8 = 0x04;
pub const SELECT_BY_NAME_P2: u8 = 0x00;

/// ATR prefix of card batches whose GET RESPONSE needs P2 = 0x01.
pub const ATR_PREFIX_ALT_GET_RESPONSE: [u8; 2] = [0x3B, 0x67];

/// Largest chunk a single READ BINARY can return (Le is one byte).
pub const MAX_READ_LEN: usize = 0xFF;

/// USB vendor id of Advanced Card Systems readers.
pub const ACS_VENDOR_ID: u16 = 0x072F;

/// Field layout table: (offset, length) of each fixed-width text field.
pub const CID_LAYOUT: (u16, u8) = (0x0004, 13);
pub const NAME_TH_LAYOUT: (u16, u8) = (0x0011, 100);
pub const NAME_EN_LAYOUT: (u16, u8) = (0x0075, 100);
pub const BIRTHDATE_LAYOUT: (u16, u8) = (0x00D9, 8);
pub const GENDER_LAYOUT: (u16, u8) = (0x00E1, 1);
pub const ISSUER_LAYOUT: (u16, u8) = (0x00F6, 100);
pub const ISSUE_DATE_LAYOUT: (u16, u8) = (0x0167, 8);
pub const EXPIRE_DATE_LAYOUT: (u16, u8) = (0x016F, 8);
pub const ADDRESS_LAYOUT: (u16, u8) = (0x1579, 100);

/// Photo: JPEG stored from 0x017B as twenty 255-byte chunks.
pub const PHOTO_OFFSET: u16 = 0x017B;
pub const PHOTO_CHUNK_LEN: usize = MAX_READ_LEN;
pub const PHOTO_TOTAL_LEN: usize = 20 * PHOTO_CHUNK_LEN;

/// Separator between name/address parts on the card.
pub const PART_SEPARATOR: char = '#';
