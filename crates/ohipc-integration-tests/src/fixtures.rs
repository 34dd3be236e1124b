//! Runtime setup and request helpers shared by the end-to-end tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ohipc_common_event::CommonEventData;
use ohipc_core::{
    IpcRuntime, MessageOption, MessageParcel, RemoteHandle, RemoteObject, TransportConfig,
};
use ohipc_errors::{IpcResult, ParcelResult};
use ohipc_test_helpers::init_test_tracing;
use ohipc_types::Want;

/// Upper bound on a synchronous call in the test runtime.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a test waits for one-way work to land.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Runtime with four workers.
///
/// # Errors
///
/// Fails if the worker threads cannot be spawned.
pub fn test_runtime() -> IpcResult<IpcRuntime> {
    test_runtime_with(4)
}

/// Runtime with `workers` threads and the test call timeout.
///
/// # Errors
///
/// Fails for a zero worker count or if the threads cannot be spawned.
pub fn test_runtime_with(workers: usize) -> IpcResult<IpcRuntime> {
    init_test_tracing();
    let config = TransportConfig::builder()
        .worker_threads(workers)
        .sync_timeout(CALL_TIMEOUT)
        .thread_name_prefix("ohipc-e2e")
        .build()?;
    IpcRuntime::new(config)
}

/// Event data named `name`.
#[must_use]
pub fn event(name: &str) -> CommonEventData {
    CommonEventData::new(Want::new(name))
}

/// A request holding only the interface token `descriptor`.
///
/// # Errors
///
/// Fails only if the parcel rejects the token write.
pub fn token_only(descriptor: &str) -> ParcelResult<MessageParcel> {
    let mut data = MessageParcel::new();
    data.write_interface_token(descriptor)?;
    Ok(data)
}

/// Send `data` as a synchronous request and return the reply.
///
/// # Errors
///
/// Returns the transport status of the call.
pub fn send_raw(
    handle: &Arc<RemoteHandle>,
    code: impl Into<u32>,
    mut data: MessageParcel,
) -> IpcResult<MessageParcel> {
    let mut reply = MessageParcel::new();
    handle.send_request(code.into(), &mut data, &mut reply, &MessageOption::sync())?;
    reply.rewind_read();
    Ok(reply)
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    true
}
