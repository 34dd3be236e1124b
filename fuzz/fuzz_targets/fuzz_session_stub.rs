//! Fuzzes the window session stub with arbitrary request bodies.
//!
//! Must never panic.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_session_stub
#![no_main]
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use ohipc_core::{IpcStub, MessageOption, MessageParcel};
use ohipc_integration_tests::RecordingSession;
use ohipc_window_session::{SESSION_DESCRIPTOR, SessionInterfaceCode, SessionStub};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let codes = SessionInterfaceCode::ALL;
    let Some(&code) = codes.get(usize::from(selector) % codes.len()) else {
        return;
    };

    let mut token = MessageParcel::new();
    if token.write_interface_token(SESSION_DESCRIPTOR).is_err() {
        return;
    }
    let mut bytes = token.as_bytes().to_vec();
    bytes.extend_from_slice(body);

    let stub = SessionStub::new(Arc::new(RecordingSession::default()));
    let mut request = MessageParcel::from_bytes(&bytes);
    let mut reply = MessageParcel::new();
    let _ = stub.on_remote_request(code.into(), &mut request, &mut reply, &MessageOption::sync());
});
