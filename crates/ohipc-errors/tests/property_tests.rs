//! Property-based tests for status code mapping.

use ohipc_errors::{ErrorKind, IpcError, StatusCode};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_from_code_is_inverse_of_code(code in any::<i32>()) {
        if let Some(status) = StatusCode::from_code(code) {
            prop_assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_raw_status_roundtrips(code in any::<i32>().prop_filter("non-zero", |c| *c != 0)) {
        let err = IpcError::from_status(code);
        prop_assert!(err.is_some());
        if let Some(err) = err {
            prop_assert_eq!(err.status(), code);
        }
    }

    #[test]
    fn test_rejected_is_always_malformed_argument(code in any::<i32>(), reason in ".*") {
        let err = IpcError::rejected(code, reason.clone());
        prop_assert_eq!(err.kind(), ErrorKind::MalformedArgument);
        prop_assert!(err.to_string().contains(&reason));
    }

    #[test]
    fn test_unknown_transaction_mentions_code(code in any::<u32>()) {
        let err = IpcError::unknown_transaction(code, "OHOS.ISession");
        prop_assert_eq!(err.status(), 4);
        prop_assert!(err.to_string().contains(&code.to_string()));
    }
}
