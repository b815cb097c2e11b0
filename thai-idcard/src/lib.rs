// thai-idcard/src/lib.rs

//! thai-idcard
//!
//! Thai national ID smart cards through USB contact readers: device
//! lifecycle tracking, reader session management and the APDU exchange that
//! turns the card's fields and photo into a typed record.

pub mod card;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod events;
pub mod prelude;
pub mod protocol;
pub mod reader;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

#[cfg(feature = "async")]
pub mod asynchronous;
#[cfg(feature = "bridge")]
pub mod bridge;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
