//! Window session interface.
//!
//! A window session is the host-side record of one application window.
//! The client connects with its stage and event channel handles, then
//! drives the session through foreground and background, moves and
//! resizes it, and reports extension and picture-in-picture events.
//!
//! Every handler answers with a [`WsError`] in the reply payload; the
//! transport status only reports requests the [`SessionStub`] could not
//! parse. The [`SessionProxy`] folds transport failures into
//! [`WsError::IpcFailed`] so callers deal with a single result type.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod code;
pub mod error;
pub mod geometry;
pub mod prelude;
pub mod property;
pub mod proxy;
pub mod session;
pub mod stub;

pub use code::SessionInterfaceCode;
pub use error::WsError;
pub use geometry::{
    AvoidArea, AvoidAreaType, KeyboardLayoutParams, MaximizeMode, Rect, SessionEvent,
    SessionGravity, SizeChangeReason, WindowMode,
};
pub use property::{SystemSessionConfig, WindowSessionProperty};
pub use proxy::SessionProxy;
pub use session::{
    ConnectReply, ConnectRequest, SESSION_STAGE_DESCRIPTOR, Session,
    WINDOW_EVENT_CHANNEL_DESCRIPTOR,
};
pub use stub::{SESSION_DESCRIPTOR, SessionStub};
