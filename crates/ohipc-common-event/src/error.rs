//! Result codes of the common event service.
//!
//! These travel in two places: as the transport status of a rejected
//! publish or subscribe request, and as the `i32` result a handler writes
//! into the reply.

/// Common event result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CesErrorCode {
    /// Success.
    Ok = 0,
    /// Caller lacks a required permission.
    PermissionDenied = 201,
    /// Caller is not a system application.
    NotSystemApp = 202,
    /// A required parameter was missing or malformed.
    ParamInvalid = 401,
    /// The event carries no action.
    WantActionIsNull = 1_500_001,
    /// Sandboxed applications may not use this operation.
    SandboxNotSupport = 1_500_002,
    /// Events are published too often.
    EventFreqTooHigh = 1_500_003,
    /// Caller is neither a system ability nor a system application.
    NotSaSystemApp = 1_500_004,
    /// The listener is not subscribed.
    NoSubscriber = 1_500_005,
    /// The user id is invalid.
    UserIdInvalid = 1_500_006,
    /// The request could not be sent to the service.
    SendError = 1_500_007,
    /// Internal service error.
    CesmError = 1_500_008,
    /// System error.
    SysError = 1_500_009,
}

impl CesErrorCode {
    /// Wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether the code is success.
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == CesErrorCode::Ok
    }
}

impl From<CesErrorCode> for i32 {
    fn from(code: CesErrorCode) -> Self {
        code.code()
    }
}
