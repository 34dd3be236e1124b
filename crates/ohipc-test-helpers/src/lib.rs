//! Shared test utilities for ohipc.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]`
//! - [`assertions`] - Status assertion macros
//! - [`mock`] - Scriptable remote objects and an inline loopback transport
//! - [`logging`] - Test tracing subscriber
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! ohipc-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use ohipc_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod assertions;
pub mod logging;
pub mod mock;
pub mod must;
pub mod prelude;

pub use logging::init_test_tracing;
pub use must::*;
