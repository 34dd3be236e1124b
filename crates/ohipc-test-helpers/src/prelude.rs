//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use ohipc_test_helpers::prelude::*;
//! ```

pub use crate::assertions::StatusValue;
pub use crate::logging::init_test_tracing;
pub use crate::mock::{LoopbackRemote, MockRemoteObject, RecordedCall};
pub use crate::must::{must, must_err, must_some};
pub use crate::{assert_ok_status, assert_status};

/// Result type for tests that propagate any error.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
