//! Small helpers shared by the protocol and card layers: hex formatting for
//! APDU traces and TIS-620 text decoding for card fields.

pub mod hex;
pub mod tis620;

pub use hex::*;
pub use tis620::*;
