// Shared helpers for integration tests. Each test crate pulls this in with
// `#[path = "../common/mod.rs"] mod common;` and uses what it needs.
#![allow(dead_code)]

pub mod fixtures;

use std::sync::Once;
use std::time::{Duration, Instant};

static LOGGER: Once = Once::new();

/// Route `log` output through the test harness. `RUST_LOG=debug` shows the
/// APDU trace.
pub fn init_logger() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
