//! Snapshot tests for wire bytes and debug output.

use ohipc_core::{MessageOption, MessageParcel, RequestState, TransportConfig};
use ohipc_errors::ParcelResult;

fn hex(bytes: &[u8]) -> String {
    bytes
        .chunks(4)
        .map(|word| word.iter().map(|b| format!("{b:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

mod wire_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_interface_token_bytes() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_interface_token("OHOS.ISession")?;
        assert_snapshot!(
            hex(parcel.as_bytes()),
            @"0d000000 4f004800 4f005300 2e004900 53006500 73007300 69006f00 6e000000"
        );
        Ok(())
    }

    #[test]
    fn test_mixed_fields_bytes() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_bool(true)?;
        parcel.write_string("abc")?;
        parcel.write_nullable_string(None)?;
        parcel.write_i64(-2)?;
        assert_snapshot!(
            hex(parcel.as_bytes()),
            @"01000000 03000000 61626300 ffffffff feffffff ffffffff"
        );
        Ok(())
    }
}

mod debug_snapshots {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_request_states() {
        let states = [
            RequestState::Received,
            RequestState::TokenChecked,
            RequestState::Dispatched,
            RequestState::HandlerRunning,
            RequestState::ReplyWritten,
        ];
        let rendered: Vec<String> = states.iter().map(ToString::to_string).collect();
        assert_snapshot!(
            rendered.join(" -> "),
            @"RECEIVED -> TOKEN_CHECKED -> DISPATCHED -> HANDLER_RUNNING -> REPLY_WRITTEN"
        );
    }

    #[test]
    fn test_option_flags() {
        assert_snapshot!(
            format!("{} {}", MessageOption::sync().flags(), MessageOption::one_way().flags()),
            @"0 1"
        );
    }

    #[test]
    fn test_default_config_json() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&TransportConfig::default())?;
        assert_snapshot!(
            json,
            @r#"{"worker_threads":4,"sync_timeout":{"secs":5,"nanos":0},"max_parcel_size":1048576,"max_collection_len":2000,"queue_capacity":256,"thread_name_prefix":"ohipc-worker"}"#
        );
        Ok(())
    }
}
