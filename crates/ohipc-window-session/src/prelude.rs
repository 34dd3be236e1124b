//! Convenience re-exports for session hosts and clients.

pub use crate::code::SessionInterfaceCode;
pub use crate::error::WsError;
pub use crate::geometry::{
    AvoidArea, AvoidAreaType, KeyboardLayoutParams, MaximizeMode, Rect, SessionEvent,
    SessionGravity, SizeChangeReason, WindowMode,
};
pub use crate::property::{SystemSessionConfig, WindowSessionProperty};
pub use crate::proxy::SessionProxy;
pub use crate::session::{ConnectReply, ConnectRequest, Session};
pub use crate::stub::{SESSION_DESCRIPTOR, SessionStub};
