// thai-idcard/src/reader/mod.rs
//! Reader session: the single open reader handle and its liveness link.

pub mod link;
pub mod session;

pub use link::Link;
pub use session::{ReaderHandle, ReaderSession};
