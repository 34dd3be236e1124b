//! Transport status codes.
//!
//! These are the values a stub returns from `on_remote_request` and a
//! transport returns from `send_request`. They are independent of any
//! result code a service writes into the reply payload.

use core::fmt;

use crate::common::{ErrorKind, ErrorSeverity};

/// Numeric transport status.
///
/// Values are part of the wire contract and must not be renumbered.
///
/// # Examples
///
/// ```
/// use ohipc_errors::{ErrorKind, StatusCode};
///
/// assert_eq!(StatusCode::InvalidState.code(), 5);
/// assert_eq!(StatusCode::from_code(-22), Some(StatusCode::InvalidValue));
/// assert_eq!(StatusCode::InvalidState.kind(), Some(ErrorKind::IdentityMismatch));
/// assert!(StatusCode::Ok.is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    /// `NO_ERROR` / `ERR_OK` / `ERR_NONE`.
    Ok = 0,
    /// The request could not be parsed or carried (missing token included).
    TransactionFailed = 1,
    /// The target object is not known to the transport.
    UnknownObject = 2,
    /// An object could not be flattened into the parcel.
    FlattenObject = 3,
    /// No handler is registered for the operation code.
    UnknownTransaction = 4,
    /// The interface token did not match the stub's descriptor.
    InvalidState = 5,
    /// The reply could not be parsed.
    InvalidReply = 6,
    /// A required capability handle or object was absent.
    InvalidData = 7,
    /// The remote object has died.
    DeadObject = 8,
    /// A synchronous call did not complete in time.
    TimedOut = 9,
    /// A required argument was missing, null, or out of bounds.
    InvalidValue = -22,
}

impl StatusCode {
    /// All status codes, in declaration order.
    pub const ALL: [StatusCode; 11] = [
        StatusCode::Ok,
        StatusCode::TransactionFailed,
        StatusCode::UnknownObject,
        StatusCode::FlattenObject,
        StatusCode::UnknownTransaction,
        StatusCode::InvalidState,
        StatusCode::InvalidReply,
        StatusCode::InvalidData,
        StatusCode::DeadObject,
        StatusCode::TimedOut,
        StatusCode::InvalidValue,
    ];

    /// Wire value of the status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Parse a wire value. Returns `None` for codes outside the transport range,
    /// which are interface-specific statuses.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Ok),
            1 => Some(StatusCode::TransactionFailed),
            2 => Some(StatusCode::UnknownObject),
            3 => Some(StatusCode::FlattenObject),
            4 => Some(StatusCode::UnknownTransaction),
            5 => Some(StatusCode::InvalidState),
            6 => Some(StatusCode::InvalidReply),
            7 => Some(StatusCode::InvalidData),
            8 => Some(StatusCode::DeadObject),
            9 => Some(StatusCode::TimedOut),
            -22 => Some(StatusCode::InvalidValue),
            _ => None,
        }
    }

    /// Whether this is the success status.
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }

    /// Protocol-level classification, `None` for [`StatusCode::Ok`].
    pub fn kind(self) -> Option<ErrorKind> {
        match self {
            StatusCode::Ok => None,
            StatusCode::TransactionFailed
            | StatusCode::UnknownObject
            | StatusCode::InvalidReply
            | StatusCode::DeadObject
            | StatusCode::TimedOut => Some(ErrorKind::TransportFailure),
            StatusCode::InvalidState => Some(ErrorKind::IdentityMismatch),
            StatusCode::UnknownTransaction => Some(ErrorKind::UnknownOperation),
            StatusCode::FlattenObject | StatusCode::InvalidData | StatusCode::InvalidValue => {
                Some(ErrorKind::MalformedArgument)
            }
        }
    }

    /// Severity used when logging this status.
    pub fn severity(self) -> ErrorSeverity {
        match self {
            StatusCode::Ok => ErrorSeverity::Info,
            StatusCode::UnknownTransaction
            | StatusCode::InvalidValue
            | StatusCode::InvalidData
            | StatusCode::FlattenObject => ErrorSeverity::Warning,
            StatusCode::TransactionFailed
            | StatusCode::InvalidState
            | StatusCode::InvalidReply
            | StatusCode::TimedOut => ErrorSeverity::Error,
            StatusCode::UnknownObject | StatusCode::DeadObject => ErrorSeverity::Critical,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "NO_ERROR",
            StatusCode::TransactionFailed => "ERR_TRANSACTION_FAILED",
            StatusCode::UnknownObject => "ERR_UNKNOWN_OBJECT",
            StatusCode::FlattenObject => "ERR_FLATTEN_OBJECT",
            StatusCode::UnknownTransaction => "ERR_UNKNOWN_TRANSACTION",
            StatusCode::InvalidState => "ERR_INVALID_STATE",
            StatusCode::InvalidReply => "ERR_INVALID_REPLY",
            StatusCode::InvalidData => "ERR_INVALID_DATA",
            StatusCode::DeadObject => "ERR_DEAD_OBJECT",
            StatusCode::TimedOut => "ERR_TIMED_OUT",
            StatusCode::InvalidValue => "ERR_INVALID_VALUE",
        };
        write!(f, "{name}({})", self.code())
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_for_all() {
        for status in StatusCode::ALL {
            assert_eq!(StatusCode::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(StatusCode::from_code(401), None);
        assert_eq!(StatusCode::from_code(-1), None);
    }

    #[test]
    fn test_display_includes_value() {
        assert_eq!(StatusCode::InvalidValue.to_string(), "ERR_INVALID_VALUE(-22)");
        assert_eq!(StatusCode::Ok.to_string(), "NO_ERROR(0)");
    }

    #[test]
    fn test_dead_object_is_critical() {
        assert_eq!(StatusCode::DeadObject.severity(), ErrorSeverity::Critical);
        assert_eq!(StatusCode::InvalidValue.severity(), ErrorSeverity::Warning);
    }
}
