//! Prelude module for convenient error handling imports.
//!
//! ```
//! use ohipc_errors::prelude::*;
//!
//! fn require_token(token: Option<&str>) -> IpcResult<&str> {
//!     token.ok_or_else(|| IpcError::transaction_failed("interface token missing"))
//! }
//!
//! assert!(require_token(None).is_err());
//! ```

pub use crate::{
    IpcResult, ParcelResult,
    common::{ErrorKind, ErrorSeverity},
    ipc::IpcError,
    parcel::ParcelError,
    status::StatusCode,
};
