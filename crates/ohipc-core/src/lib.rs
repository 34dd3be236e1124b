//! Parcel codec, stub/proxy dispatch and in-process transport.
//!
//! A remote interface is spoken over an opaque handle using numeric
//! operation codes. The client side ([`RemoteProxy`]) writes an interface
//! token and the arguments into a [`MessageParcel`] and issues the code; the
//! server side ([`IpcStub`]) checks the token, looks the code up in an
//! immutable [`DispatchTable`] and runs the bound handler, which reads the
//! arguments back in the same order and writes the results into the reply.
//!
//! # Architecture
//!
//! - [`parcel`]: the FIFO binary codec and [`Parcelable`]
//! - [`option`]: synchronous and one-way call modes
//! - [`remote`]: the [`RemoteObject`] handle trait and reserved codes
//! - [`stub`]: token check, dispatch table and default handling
//! - [`proxy`]: request building on the client side
//! - [`death`]: death recipients and their registry
//! - [`runtime`]: worker pool hosting published stubs
//! - [`config`]: transport configuration
//! - [`stats`]: per-code transaction statistics
//!
//! # Two result channels
//!
//! The transport status of a call is the `Err` side of
//! [`RemoteObject::send_request`]. What the service itself decided travels
//! inside the reply, in whatever shape the interface defines. A non-OK
//! transport status means the reply must not be read.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod death;
pub mod option;
pub mod parcel;
pub mod prelude;
pub mod proxy;
pub mod remote;
pub mod runtime;
pub mod stats;
pub mod stub;

pub use config::{TransportConfig, TransportConfigBuilder};
pub use death::{
    ChannelDeathRecipient, DeathNotice, DeathRecipient, DeathRegistry, HandlerDeathRecipient,
};
pub use option::{MessageOption, TransactionMode};
pub use parcel::{CYCLE_LIMIT, DEFAULT_MAX_PARCEL_SIZE, MessageParcel, Parcelable};
pub use proxy::{RemoteProxy, reply_error};
pub use remote::{
    DUMP_TRANSACTION, FIRST_CALL_TRANSACTION, INTERFACE_TRANSACTION, LAST_CALL_TRANSACTION,
    PING_TRANSACTION, RemoteObject,
};
pub use runtime::{IpcRuntime, RemoteHandle, RuntimeState};
pub use stats::{CodeStats, MAX_TRACKED_CODES, TransactionStats};
pub use stub::{
    DispatchTable, DispatchTableBuilder, HandlerFn, IpcStub, RequestState, check_interface_token,
    default_on_remote_request,
};

pub use ohipc_errors::{IpcError, IpcResult, ParcelError, ParcelResult, StatusCode};
