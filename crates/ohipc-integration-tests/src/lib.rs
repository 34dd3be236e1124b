//! End-to-end tests for the ohipc interfaces.
//!
//! Every test here publishes real stubs on an [`IpcRuntime`] worker pool and
//! talks to them through the typed proxies, so requests cross threads,
//! parcels are moved between caller and worker, and death notification runs
//! on the pool exactly as in production use.
//!
//! - [`fixtures`]: runtime setup, raw request helpers and waiting
//! - [`recorders`]: service implementations that record what they receive
//!
//! [`IpcRuntime`]: ohipc_core::IpcRuntime

#![deny(rust_2018_idioms)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::print_stdout)]

pub mod fixtures;
pub mod recorders;

pub use fixtures::{
    CALL_TIMEOUT, DELIVERY_TIMEOUT, event, send_raw, test_runtime, test_runtime_with, token_only,
    wait_until,
};
pub use recorders::{
    CountingObserver, Delivery, EventRecorder, RecordingScheduler, RecordingSession,
};
