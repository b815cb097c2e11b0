//! TIS-620 decoding for the Thai text fields stored on the card.
//!
//! TIS-620 is a single-byte encoding: 0x00..=0x7F is ASCII and
//! 0xA1..=0xFB map linearly onto the Thai block U+0E01..=U+0E5B. Bytes in
//! the unassigned gaps decode to U+FFFD.

const THAI_FIRST: u8 = 0xA1;
const THAI_LAST: u8 = 0xFB;
const THAI_BASE: u32 = 0x0E01;

/// Decode one TIS-620 byte.
pub fn tis620_char(byte: u8) -> char {
    match byte {
        0x00..=0x7F => byte as char,
        THAI_FIRST..=THAI_LAST => {
            // 0xDB..=0xDE are unassigned in the standard
            if (0xDB..=0xDE).contains(&byte) {
                char::REPLACEMENT_CHARACTER
            } else {
                char::from_u32(THAI_BASE + u32::from(byte - THAI_FIRST))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            }
        }
        _ => char::REPLACEMENT_CHARACTER,
    }
}

/// Decode a TIS-620 byte string.
pub fn decode_tis620(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| tis620_char(b)).collect()
}

/// Decode a fixed-width card field: NUL padding and surrounding spaces are
/// dropped.
pub fn decode_fixed_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_tis620(&bytes[..end]).trim().to_string()
}

/// Encode text as TIS-620. Characters outside ASCII and the Thai block
/// become `?`.
pub fn encode_tis620(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            cp @ 0x00..=0x7F => cp as u8,
            cp @ 0x0E01..=0x0E5B => (cp - THAI_BASE) as u8 + THAI_FIRST,
            _ => b'?',
        })
        .collect()
}
