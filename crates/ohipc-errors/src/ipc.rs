//! Top-level IPC error.

use crate::common::{ErrorKind, ErrorSeverity};
use crate::parcel::ParcelError;
use crate::status::StatusCode;

/// Error returned by stub handlers, proxies and the transport.
///
/// Each variant maps to exactly one wire status through [`IpcError::status`].
/// Interface-specific statuses (for example the common event service's
/// parameter error) travel through [`IpcError::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IpcError {
    /// The request could not be carried or parsed before dispatch.
    #[error("transaction failed: {reason}")]
    TransactionFailed {
        /// What failed.
        reason: String,
    },

    /// The interface token did not match the stub's descriptor.
    #[error("interface token mismatch: expected {expected:?}, received {received:?}")]
    IdentityMismatch {
        /// Descriptor of the receiving stub.
        expected: String,
        /// Token found in the request.
        received: String,
    },

    /// No handler is registered for the operation code.
    #[error("unknown transaction code {code} for {descriptor}")]
    UnknownTransaction {
        /// Operation code of the request.
        code: u32,
        /// Descriptor of the receiving stub.
        descriptor: String,
    },

    /// A required argument was missing, null, or out of bounds.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Argument name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A required capability handle or object was absent.
    #[error("invalid data for `{field}`: {reason}")]
    InvalidData {
        /// Argument name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A parcel read or write failed.
    #[error("parcel error: {0}")]
    Parcel(#[from] ParcelError),

    /// The reply could not be parsed by the proxy.
    #[error("invalid reply: {0}")]
    InvalidReply(String),

    /// The handler rejected the request with an interface-specific status.
    #[error("request rejected with status {code}: {reason}")]
    Rejected {
        /// Interface-specific status value.
        code: i32,
        /// Why it was rejected.
        reason: String,
    },

    /// A status received from the transport without further detail.
    #[error("remote returned status {0}")]
    Status(i32),

    /// The remote object has died.
    #[error("remote object {descriptor:?} is dead")]
    DeadObject {
        /// Descriptor of the dead object.
        descriptor: String,
    },

    /// A synchronous call did not complete in time.
    #[error("transaction timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Invalid transport configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport could not be started.
    #[error("transport initialization failed: {0}")]
    TransportInit(String),

    /// The transport has been shut down.
    #[error("transport is shut down")]
    ShutdownRequested,
}

impl IpcError {
    /// Wire value of the transport status for this error.
    pub fn status(&self) -> i32 {
        match self {
            IpcError::Rejected { code, .. } => *code,
            IpcError::Status(code) => *code,
            other => other.status_code().map_or(StatusCode::TransactionFailed.code(), StatusCode::code),
        }
    }

    /// Transport status for this error, `None` for interface-specific codes.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            IpcError::TransactionFailed { .. } => Some(StatusCode::TransactionFailed),
            IpcError::IdentityMismatch { .. } => Some(StatusCode::InvalidState),
            IpcError::UnknownTransaction { .. } => Some(StatusCode::UnknownTransaction),
            IpcError::InvalidValue { .. } => Some(StatusCode::InvalidValue),
            IpcError::InvalidData { .. } => Some(StatusCode::InvalidData),
            IpcError::Parcel(e) => Some(e.status()),
            IpcError::InvalidReply(_) => Some(StatusCode::InvalidReply),
            IpcError::Rejected { code, .. } => StatusCode::from_code(*code),
            IpcError::Status(code) => StatusCode::from_code(*code),
            IpcError::DeadObject { .. } | IpcError::ShutdownRequested => Some(StatusCode::DeadObject),
            IpcError::Timeout { .. } => Some(StatusCode::TimedOut),
            IpcError::InvalidConfig(_) | IpcError::TransportInit(_) => {
                Some(StatusCode::TransactionFailed)
            }
        }
    }

    /// Protocol-level classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IpcError::Rejected { .. } => ErrorKind::MalformedArgument,
            IpcError::Status(code) => StatusCode::from_code(*code)
                .and_then(StatusCode::kind)
                .unwrap_or(ErrorKind::ApplicationError),
            other => other
                .status_code()
                .and_then(StatusCode::kind)
                .unwrap_or(ErrorKind::TransportFailure),
        }
    }

    /// Severity used when logging this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IpcError::Parcel(e) => e.severity(),
            IpcError::Rejected { .. } => ErrorSeverity::Warning,
            IpcError::TransportInit(_) | IpcError::ShutdownRequested => ErrorSeverity::Critical,
            other => other
                .status_code()
                .map_or(ErrorSeverity::Error, StatusCode::severity),
        }
    }

    /// Check if the caller may retry the call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IpcError::Timeout { .. } | IpcError::TransactionFailed { .. })
    }

    /// Check if the remote side or the transport is gone for good.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IpcError::DeadObject { .. } | IpcError::ShutdownRequested | IpcError::TransportInit(_)
        )
    }

    /// Create a transaction-failed error.
    pub fn transaction_failed(reason: impl Into<String>) -> Self {
        IpcError::TransactionFailed {
            reason: reason.into(),
        }
    }

    /// Create an identity mismatch error.
    pub fn identity_mismatch(expected: impl Into<String>, received: impl Into<String>) -> Self {
        IpcError::IdentityMismatch {
            expected: expected.into(),
            received: received.into(),
        }
    }

    /// Create an unknown transaction error.
    pub fn unknown_transaction(code: u32, descriptor: impl Into<String>) -> Self {
        IpcError::UnknownTransaction {
            code,
            descriptor: descriptor.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        IpcError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Create an invalid value error for a required object that was absent.
    pub fn missing(field: &'static str) -> Self {
        IpcError::invalid_value(field, "required object is missing")
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: &'static str, reason: impl Into<String>) -> Self {
        IpcError::InvalidData {
            field,
            reason: reason.into(),
        }
    }

    /// Create an error carrying an interface-specific status.
    pub fn rejected(code: i32, reason: impl Into<String>) -> Self {
        IpcError::Rejected {
            code,
            reason: reason.into(),
        }
    }

    /// Create a dead object error.
    pub fn dead_object(descriptor: impl Into<String>) -> Self {
        IpcError::DeadObject {
            descriptor: descriptor.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        IpcError::Timeout { timeout_ms }
    }

    /// Rebuild an error from a bare wire status. Returns `None` for [`StatusCode::Ok`].
    pub fn from_status(code: i32) -> Option<Self> {
        if code == StatusCode::Ok.code() {
            None
        } else {
            Some(IpcError::Status(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mismatch_maps_to_invalid_state() {
        let err = IpcError::identity_mismatch("OHOS.ISession", "OHOS.Other");
        assert_eq!(err.status(), 5);
        assert_eq!(err.kind(), ErrorKind::IdentityMismatch);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_rejected_keeps_interface_code() {
        let err = IpcError::rejected(401, "publish info missing");
        assert_eq!(err.status(), 401);
        assert_eq!(err.status_code(), None);
        assert_eq!(err.kind(), ErrorKind::MalformedArgument);
    }

    #[test]
    fn test_parcel_error_conversion() {
        let err: IpcError = ParcelError::InvalidUtf8.into();
        assert_eq!(err.status_code(), Some(StatusCode::InvalidValue));
    }

    #[test]
    fn test_from_status() {
        assert_eq!(IpcError::from_status(0), None);
        let err = IpcError::from_status(8);
        assert!(matches!(err, Some(IpcError::Status(8))));
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::TransportFailure));
    }

    #[test]
    fn test_fatal_and_recoverable() {
        assert!(IpcError::dead_object("x").is_fatal());
        assert!(IpcError::timeout(100).is_recoverable());
        assert!(!IpcError::missing("want").is_fatal());
    }
}
