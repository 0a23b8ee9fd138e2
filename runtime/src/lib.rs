//! Process bootstrap helpers shared by the native Regional Pulse binaries.
//!
//! Only logging lives here for now: every binary calls [`init_logging`] once
//! at startup and keeps the returned [`LoggingGuard`] alive until exit.

#[cfg(not(target_arch = "wasm32"))]
mod logging;

#[cfg(not(target_arch = "wasm32"))]
pub use logging::{init_logging, LoggingGuard, LoggingOptions};
