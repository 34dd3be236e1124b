//! Status codes and error types for the ohipc stub/proxy runtime.
//!
//! Every remote call has two independent result channels:
//!
//! - the **transport status**, returned out-of-band by `send_request` and
//!   modelled here as [`StatusCode`] / [`IpcError`];
//! - the **application result**, written by the service into the reply
//!   payload and defined per interface (not in this crate).
//!
//! # Modules
//!
//! - [`status`]: numeric transport status codes with stable wire values
//! - [`common`]: error taxonomy ([`ErrorKind`]) and [`ErrorSeverity`]
//! - [`parcel`]: codec errors raised while reading or writing a parcel
//! - [`ipc`]: the top-level [`IpcError`] returned by stubs, proxies and the transport
//!
//! # Example
//!
//! ```
//! use ohipc_errors::prelude::*;
//!
//! fn check_count(count: i32, limit: usize) -> IpcResult<usize> {
//!     let count = usize::try_from(count).map_err(|_| ParcelError::InvalidLength(count))?;
//!     if count > limit {
//!         return Err(IpcError::invalid_value("count", format!("{count} exceeds {limit}")));
//!     }
//!     Ok(count)
//! }
//!
//! let err = check_count(2001, 2000).unwrap_err();
//! assert_eq!(err.status_code(), Some(StatusCode::InvalidValue));
//! assert_eq!(err.kind(), ErrorKind::MalformedArgument);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod ipc;
pub mod parcel;
pub mod prelude;
pub mod status;

pub use common::{ErrorKind, ErrorSeverity};
pub use ipc::IpcError;
pub use parcel::ParcelError;
pub use status::StatusCode;

/// Result of a stub handler, proxy call or transport operation.
pub type IpcResult<T = ()> = std::result::Result<T, IpcError>;

/// Result of a single parcel read or write.
pub type ParcelResult<T = ()> = std::result::Result<T, ParcelError>;
