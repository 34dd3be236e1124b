//! Assertion macros for transport statuses.

/// Assert that an `IpcResult` failed with the given wire status.
///
/// The status may be a `StatusCode` or a raw `i32`.
///
/// ```rust
/// use ohipc_errors::{IpcError, StatusCode};
/// use ohipc_test_helpers::assert_status;
///
/// let result: Result<(), IpcError> = Err(IpcError::missing("want"));
/// assert_status!(result, StatusCode::InvalidValue);
/// assert_status!(result, -22);
/// ```
#[macro_export]
macro_rules! assert_status {
    ($result:expr, $status:expr $(,)?) => {
        match &$result {
            Ok(value) => panic!(
                "assertion failed: expected status {:?}, got Ok({:?})",
                $status, value
            ),
            Err(err) => {
                let expected: i32 = $crate::assertions::StatusValue::value(&$status);
                assert_eq!(
                    err.status(),
                    expected,
                    "unexpected status for error: {err}"
                );
            }
        }
    };
}

/// Assert that an `IpcResult` succeeded.
#[macro_export]
macro_rules! assert_ok_status {
    ($result:expr $(,)?) => {
        if let Err(err) = &$result {
            panic!(
                "assertion failed: expected OK, got status {} ({err})",
                err.status()
            );
        }
    };
}

/// Anything usable as an expected status.
pub trait StatusValue {
    /// Wire value.
    fn value(&self) -> i32;
}

impl StatusValue for i32 {
    fn value(&self) -> i32 {
        *self
    }
}

impl StatusValue for ohipc_errors::StatusCode {
    fn value(&self) -> i32 {
        self.code()
    }
}

#[cfg(test)]
mod tests {
    use ohipc_errors::{IpcError, StatusCode};

    #[test]
    fn test_assert_status_matches() {
        let result: Result<u8, IpcError> = Err(IpcError::dead_object("x"));
        assert_status!(result, StatusCode::DeadObject);
        let ok: Result<u8, IpcError> = Ok(1);
        assert_ok_status!(ok);
    }

    #[test]
    #[should_panic(expected = "expected status")]
    fn test_assert_status_rejects_ok() {
        let result: Result<u8, IpcError> = Ok(1);
        assert_status!(result, 5);
    }
}
