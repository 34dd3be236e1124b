//! Snapshot tests for error message formatting.

use ohipc_errors::{IpcError, ParcelError, StatusCode};

mod status_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_invalid_state() {
        assert_snapshot!(StatusCode::InvalidState.to_string(), @"ERR_INVALID_STATE(5)");
    }

    #[test]
    fn test_unknown_transaction() {
        assert_snapshot!(StatusCode::UnknownTransaction.to_string(), @"ERR_UNKNOWN_TRANSACTION(4)");
    }
}

mod parcel_error_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_collection_too_large() {
        let err = ParcelError::CollectionTooLarge {
            count: 2001,
            limit: 2000,
        };
        assert_snapshot!(err.to_string(), @"collection of 2001 elements exceeds limit of 2000");
    }

    #[test]
    fn test_object_slot() {
        let err = ParcelError::ObjectSlot { slot: 3, len: 1 };
        assert_snapshot!(err.to_string(), @"remote object slot 3 out of range (1 objects attached)");
    }
}

mod ipc_error_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_missing() {
        assert_snapshot!(IpcError::missing("publishInfo").to_string(), @"invalid value for `publishInfo`: required object is missing");
    }

    #[test]
    fn test_dead_object() {
        assert_snapshot!(IpcError::dead_object("OHOS.ISession").to_string(), @r#"remote object "OHOS.ISession" is dead"#);
    }

    #[test]
    fn test_timeout() {
        assert_snapshot!(IpcError::timeout(250).to_string(), @"transaction timed out after 250ms");
    }
}
