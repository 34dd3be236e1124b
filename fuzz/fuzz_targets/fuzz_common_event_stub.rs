//! Fuzzes the common event stub with arbitrary request bodies.
//!
//! The first byte selects the operation code; the remaining bytes follow a
//! valid interface token. Must never panic.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_common_event_stub
#![no_main]
use libfuzzer_sys::fuzz_target;
use ohipc_common_event::{
    COMMON_EVENT_DESCRIPTOR, CommonEventInterfaceCode, CommonEventStub,
    InMemoryCommonEventService,
};
use ohipc_core::{IpcStub, MessageOption, MessageParcel};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let codes = CommonEventInterfaceCode::ALL;
    let Some(&code) = codes.get(usize::from(selector) % codes.len()) else {
        return;
    };

    let mut token = MessageParcel::new();
    if token.write_interface_token(COMMON_EVENT_DESCRIPTOR).is_err() {
        return;
    }
    let mut bytes = token.as_bytes().to_vec();
    bytes.extend_from_slice(body);

    let stub = CommonEventStub::new(InMemoryCommonEventService::new());
    let mut request = MessageParcel::from_bytes(&bytes);
    let mut reply = MessageParcel::new();
    let _ = stub.on_remote_request(code.into(), &mut request, &mut reply, &MessageOption::sync());
});
