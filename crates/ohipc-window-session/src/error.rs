//! Window session result codes.
//!
//! Every session handler answers with one of these as a `u32` at the end
//! of its reply. They are application results: a handler that writes
//! [`WsError::InvalidSession`] still completes the transaction with a
//! successful transport status.

use std::fmt;

/// Result of a window session operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WsError {
    /// Success.
    #[default]
    Ok = 0,
    /// Nothing to do.
    DoNothing = 1,
    /// Out of memory.
    NoMem = 2,
    /// The session was already destroyed.
    DestroyedObject = 3,
    /// No such window.
    InvalidWindow = 4,
    /// Mode or size not allowed for this window.
    InvalidWindowModeOrSize = 5,
    /// Operation not allowed in the current state.
    InvalidOperation = 6,
    /// Caller lacks a required permission.
    InvalidPermission = 7,
    /// Caller is not a system application.
    NotSystemApp = 8,
    /// No remote animation is registered.
    NoRemoteAnimation = 9,
    /// No such display.
    InvalidDisplay = 10,
    /// No such parent window.
    InvalidParent = 11,
    /// Could not switch to full screen.
    OperFullscreenFailed = 12,
    /// The operation is already in progress.
    RepeatOperation = 13,
    /// The session record is missing or invalid.
    InvalidSession = 14,
    /// The caller is not allowed to target this session.
    InvalidCalling = 15,
    /// The device does not support the operation.
    DeviceNotSupport = 801,
    /// A required object was null.
    NullPtr = 1001,
    /// Unknown type argument.
    InvalidType = 1002,
    /// Invalid argument.
    InvalidParam = 1003,
    /// The system ability manager could not be reached.
    Samgr = 1004,
    /// The request could not be written, sent or answered.
    IpcFailed = 1005,
}

impl WsError {
    const ALL: [WsError; 22] = [
        WsError::Ok,
        WsError::DoNothing,
        WsError::NoMem,
        WsError::DestroyedObject,
        WsError::InvalidWindow,
        WsError::InvalidWindowModeOrSize,
        WsError::InvalidOperation,
        WsError::InvalidPermission,
        WsError::NotSystemApp,
        WsError::NoRemoteAnimation,
        WsError::InvalidDisplay,
        WsError::InvalidParent,
        WsError::OperFullscreenFailed,
        WsError::RepeatOperation,
        WsError::InvalidSession,
        WsError::InvalidCalling,
        WsError::DeviceNotSupport,
        WsError::NullPtr,
        WsError::InvalidType,
        WsError::InvalidParam,
        WsError::Samgr,
        WsError::IpcFailed,
    ];

    /// Wire value.
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Whether the result is success.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == WsError::Ok
    }
}

impl From<WsError> for u32 {
    fn from(err: WsError) -> Self {
        err.code()
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_parse_back() {
        for err in WsError::ALL {
            assert_eq!(WsError::from_code(err.code()), Some(err));
        }
        assert_eq!(WsError::from_code(1000), None);
        assert_eq!(WsError::IpcFailed.code(), 1005);
        assert!(WsError::default().is_ok());
    }
}
