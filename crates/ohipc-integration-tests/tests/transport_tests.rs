//! Transport behavior: one-way delivery, timeouts, limits, concurrency and
//! shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, Sender};
use ohipc_core::{
    ChannelDeathRecipient, DispatchTable, FIRST_CALL_TRANSACTION, IpcError, IpcResult,
    IpcRuntime, IpcStub, MessageOption, MessageParcel, RemoteHandle, RemoteObject, RuntimeState,
    StatusCode, TransportConfig,
};
use ohipc_integration_tests::{
    CALL_TIMEOUT, DELIVERY_TIMEOUT, send_raw, test_runtime, token_only, wait_until,
};
use ohipc_test_helpers::assert_status;

const DESCRIPTOR: &str = "test.IGate";
const WAIT: u32 = FIRST_CALL_TRANSACTION;
const ECHO: u32 = FIRST_CALL_TRANSACTION + 1;
const SLEEP: u32 = FIRST_CALL_TRANSACTION + 2;

/// Stub whose `WAIT` handler blocks until the test releases it.
struct Gate {
    release: Receiver<()>,
    handled: AtomicUsize,
    table: DispatchTable<Gate>,
}

impl Gate {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = channel::unbounded();
        let gate = Arc::new(Self {
            release: rx,
            handled: AtomicUsize::new(0),
            table: DispatchTable::builder(DESCRIPTOR)
                .handler(WAIT, Self::handle_wait)
                .handler(ECHO, Self::handle_echo)
                .handler(SLEEP, Self::handle_sleep)
                .build(),
        });
        (gate, tx)
    }

    fn handled(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }

    fn handle_wait(&self, _data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        if self.release.recv_timeout(DELIVERY_TIMEOUT).is_ok() {
            self.handled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn handle_echo(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let value = data.read_i32()?;
        reply.write_i32(value)?;
        reply.write_string(thread::current().name().unwrap_or_default())?;
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn handle_sleep(&self, data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        thread::sleep(Duration::from_millis(data.read_u64()?));
        Ok(())
    }
}

impl IpcStub for Gate {
    fn descriptor(&self) -> &str {
        DESCRIPTOR
    }

    fn on_remote_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        self.table.dispatch(self, code, data, reply, option)
    }
}

fn publish_gate(runtime: &IpcRuntime) -> Result<(Arc<Gate>, Sender<()>, Arc<RemoteHandle>)> {
    let (gate, release) = Gate::new();
    let handle = runtime.publish(gate.clone())?;
    Ok((gate, release, handle))
}

fn echo(handle: &Arc<RemoteHandle>, value: i32) -> Result<(i32, String)> {
    let mut data = token_only(DESCRIPTOR)?;
    data.write_i32(value)?;
    let mut reply = send_raw(handle, ECHO, data)?;
    Ok((reply.read_i32()?, reply.read_string()?))
}

#[test]
fn test_one_way_returns_before_handler_runs() -> Result<()> {
    let runtime = test_runtime()?;
    let (gate, release, handle) = publish_gate(&runtime)?;

    let mut reply = MessageParcel::new();
    handle.send_request(
        WAIT,
        &mut token_only(DESCRIPTOR)?,
        &mut reply,
        &MessageOption::one_way(),
    )?;
    assert_eq!(gate.handled(), 0);
    assert_eq!(reply.data_size(), 0);

    release.send(())?;
    assert!(wait_until(DELIVERY_TIMEOUT, || gate.handled() == 1));
    Ok(())
}

#[test]
fn test_sync_call_times_out() -> Result<()> {
    let runtime = test_runtime()?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;

    let mut data = token_only(DESCRIPTOR)?;
    data.write_u64(500)?;
    let option = MessageOption::sync().with_wait_time(Duration::from_millis(50));
    let result = handle.send_request(SLEEP, &mut data, &mut MessageParcel::new(), &option);

    assert_status!(result, StatusCode::TimedOut);
    Ok(())
}

#[test]
fn test_replies_come_from_named_workers() -> Result<()> {
    let runtime = test_runtime()?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;
    let (value, worker) = echo(&handle, 7)?;
    assert_eq!(value, 7);
    assert!(worker.starts_with("ohipc-e2e-"), "unexpected worker name {worker}");
    Ok(())
}

#[test]
fn test_concurrent_callers_share_one_stub() -> Result<()> {
    const CALLERS: i32 = 8;
    const CALLS: i32 = 50;

    let runtime = test_runtime()?;
    let (gate, _release, handle) = publish_gate(&runtime)?;

    let outcomes: Vec<Result<()>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..CALLERS)
            .map(|caller| {
                let handle = Arc::clone(&handle);
                scope.spawn(move || -> Result<()> {
                    for call in 0..CALLS {
                        let value = caller * 1000 + call;
                        let (echoed, _) = echo(&handle, value)?;
                        anyhow::ensure!(echoed == value, "caller {caller} got {echoed}, sent {value}");
                    }
                    Ok(())
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| {
                worker
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("caller thread panicked")))
            })
            .collect()
    });
    for outcome in outcomes {
        outcome?;
    }

    let expected = usize::try_from(CALLERS * CALLS)?;
    assert_eq!(gate.handled(), expected);
    let stats = handle.stats().get(ECHO).context("echo stats recorded")?;
    assert_eq!(stats.count, u64::try_from(expected)?);
    assert_eq!(stats.failures, 0);
    Ok(())
}

#[test]
fn test_unknown_codes_do_not_grow_stats() -> Result<()> {
    const SPRAY: u32 = 2000;

    let runtime = test_runtime()?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;
    echo(&handle, 1)?;

    for offset in 0..SPRAY {
        let result = send_raw(&handle, SLEEP + 1 + offset, token_only(DESCRIPTOR)?);
        assert_status!(result, StatusCode::UnknownTransaction);
    }

    let snapshot = handle.stats().snapshot();
    assert_eq!(snapshot.keys().copied().collect::<Vec<_>>(), vec![ECHO]);
    let unknown = handle.stats().unknown();
    assert_eq!(unknown.count, u64::from(SPRAY));
    assert_eq!(unknown.failures, u64::from(SPRAY));
    assert_eq!(handle.stats().total(), u64::from(SPRAY) + 1);
    Ok(())
}

#[test]
fn test_oversized_request_is_rejected() -> Result<()> {
    let runtime = IpcRuntime::new(
        TransportConfig::builder()
            .worker_threads(1)
            .max_parcel_size(256)
            .build()?,
    )?;
    let (gate, _release, handle) = publish_gate(&runtime)?;

    let mut data = token_only(DESCRIPTOR)?;
    for value in 0..128 {
        data.write_i32(value)?;
    }
    let result = send_raw(&handle, ECHO, data);

    assert_status!(result, StatusCode::TransactionFailed);
    assert_eq!(gate.handled(), 0);
    Ok(())
}

#[test]
fn test_shutdown_kills_published_objects() -> Result<()> {
    let runtime = test_runtime()?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;
    let (recipient, notices) = ChannelDeathRecipient::channel();
    assert!(handle.add_death_recipient(Arc::new(recipient)));

    runtime.shutdown();

    assert_eq!(runtime.state(), RuntimeState::Stopped);
    let notice = notices
        .recv_timeout(DELIVERY_TIMEOUT)
        .context("death notice delivered")?;
    assert_eq!(notice.descriptor, DESCRIPTOR);
    assert!(handle.is_object_dead());
    let mut data = token_only(DESCRIPTOR)?;
    data.write_i32(1)?;
    assert_status!(send_raw(&handle, ECHO, data), StatusCode::DeadObject);
    Ok(())
}

#[test]
fn test_config_loaded_from_json() -> Result<()> {
    let json = serde_json::json!({
        "worker_threads": 2,
        "sync_timeout": { "secs": 1, "nanos": 0 },
        "thread_name_prefix": "json-worker",
    });
    let config = TransportConfig::from_json(&json.to_string())?;
    assert_eq!(config.worker_threads, 2);
    assert_eq!(config.sync_timeout, Duration::from_secs(1));
    assert_eq!(config.max_collection_len, TransportConfig::default().max_collection_len);

    let runtime = IpcRuntime::new(config)?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;
    let (_, worker) = echo(&handle, 0)?;
    assert!(worker.starts_with("json-worker-"));
    assert!(CALL_TIMEOUT > runtime.config().sync_timeout);
    Ok(())
}

#[test]
fn test_invalid_config_is_refused() {
    let result = TransportConfig::from_json(r#"{ "worker_threads": 0 }"#);
    assert!(matches!(result, Err(IpcError::InvalidConfig(_))));
    let remote_count = test_runtime().map(|runtime| runtime.published_count());
    assert!(matches!(remote_count, Ok(0)));
}

#[test]
fn test_dead_handle_refuses_recipients() -> Result<()> {
    let runtime = test_runtime()?;
    let (_gate, _release, handle) = publish_gate(&runtime)?;
    handle.kill();
    let (recipient, _notices) = ChannelDeathRecipient::channel();
    assert!(!handle.add_death_recipient(Arc::new(recipient)));
    let remote: Arc<dyn RemoteObject> = handle;
    assert!(remote.is_object_dead());
    Ok(())
}
