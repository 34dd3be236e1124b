//! Unwrap helpers with good error messages.
//!
//! Use these instead of `unwrap()` and `expect()` in test code; the panic
//! points at the caller.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value.
///
/// ```rust
/// use ohipc_test_helpers::must;
///
/// let value = must(Ok::<_, String>(7));
/// assert_eq!(value, 7);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap the error of a `Result`, panicking if it succeeded.
///
/// ```rust
/// use ohipc_test_helpers::must_err;
///
/// let err = must_err(Err::<(), _>("boom"));
/// assert_eq!(err, "boom");
/// ```
///
/// # Panics
///
/// Panics if the result is `Ok`.
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("must_err: expected Err, got Ok({v:?})"),
        Err(e) => e,
    }
}
