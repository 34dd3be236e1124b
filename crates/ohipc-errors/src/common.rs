//! Error taxonomy shared by every IPC crate.
//!
//! [`ErrorKind`] names *what went wrong* at the protocol level, independent
//! of the concrete numeric status that travels on the wire. [`ErrorSeverity`]
//! drives logging and escalation.

use core::fmt;

/// Protocol-level classification of a failed call.
///
/// The kinds decide how far a failure may travel:
///
/// - `TransportFailure` and `IdentityMismatch` never reach service logic.
/// - `MalformedArgument` is detected while deserializing, before the
///   service runs.
/// - `ApplicationError` is the only kind carried inside a reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// The underlying send/receive primitive failed.
    TransportFailure = 0,
    /// The interface token did not match the stub's descriptor.
    IdentityMismatch = 1,
    /// The operation code is not registered in the dispatch table.
    UnknownOperation = 2,
    /// A required field was missing, null, or out of bounds.
    MalformedArgument = 3,
    /// The service ran and reported a domain failure.
    ApplicationError = 4,
}

impl ErrorKind {
    /// Whether a caller may reasonably retry after this kind of failure.
    ///
    /// This layer never retries on its own; the answer is advisory for the
    /// code that owns the proxy.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransportFailure)
    }

    /// Whether the failure happened before any service logic executed.
    pub fn precedes_service(self) -> bool {
        !matches!(self, ErrorKind::ApplicationError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TransportFailure => write!(f, "transport failure"),
            ErrorKind::IdentityMismatch => write!(f, "identity mismatch"),
            ErrorKind::UnknownOperation => write!(f, "unknown operation"),
            ErrorKind::MalformedArgument => write!(f, "malformed argument"),
            ErrorKind::ApplicationError => write!(f, "application error"),
        }
    }
}

/// Error severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Expected outcome worth a debug line.
    Info = 0,
    /// Rejected request; the caller sent something wrong.
    Warning = 1,
    /// The call failed and the caller must handle it.
    Error = 2,
    /// The peer or the runtime is gone.
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
