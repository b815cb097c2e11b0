// thai-idcard/src/protocol/mod.rs

pub mod codec;
pub mod commands;
pub mod parser;
pub mod responses;

pub use commands::*;
pub use responses::*;
