//! Hex formatting for APDU traces and ATR strings.

use std::fmt::Write;

/// Uppercase hex with a space between bytes, the form APDUs are usually
/// written in. `&[0x3b, 0x67]` -> `"3B 67"`
pub fn apdu_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i != 0 {
            s.push(' ');
        }
        // write! never fails writing to a String
        let _ = write!(&mut s, "{:02X}", b);
    }
    s
}
