// thai-idcard/src/device/mod.rs
//! USB side: enumeration, platform signals and the lifecycle state machine.

pub mod monitor;
pub mod registry;
pub mod signal;

pub use monitor::{DeviceLifecycleState, LifecycleHost, LifecycleMonitor};
pub use registry::{DeviceRegistry, UsbHost};
pub use signal::{Signal, SignalSender};
