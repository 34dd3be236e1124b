//! Unit tests for the core dispatch layer.

use std::sync::Arc;
use std::time::Duration;

use ohipc_core::prelude::*;
use ohipc_core::{DispatchTable, IpcRuntime, RemoteHandle, StatusCode};
use ohipc_test_helpers::prelude::*;

const DESCRIPTOR: &str = "test.ICalculator";

const ADD: u32 = 1;
const SUM_ALL: u32 = 2;
const NOTIFY: u32 = 3;
const SLOW: u32 = 4;

struct Calculator {
    table: DispatchTable<Calculator>,
    notified: parking_lot::Mutex<Vec<String>>,
}

impl Calculator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            table: DispatchTable::builder(DESCRIPTOR)
                .handler(ADD, Self::handle_add)
                .handler(SUM_ALL, Self::handle_sum_all)
                .handler(NOTIFY, Self::handle_notify)
                .handler(SLOW, Self::handle_slow)
                .build(),
            notified: parking_lot::Mutex::new(Vec::new()),
        })
    }

    fn handle_add(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let a = data.read_i32()?;
        let b = data.read_i32()?;
        reply.write_i32(a.wrapping_add(b))?;
        Ok(())
    }

    fn handle_sum_all(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let count = data.read_count()?;
        let mut sum = 0i64;
        for _ in 0..count {
            sum = sum.wrapping_add(i64::from(data.read_i32()?));
        }
        reply.write_i64(sum)?;
        Ok(())
    }

    fn handle_notify(&self, data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        let event = data.read_string()?;
        self.notified.lock().push(event);
        Ok(())
    }

    fn handle_slow(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let millis = data.read_u64()?;
        std::thread::sleep(Duration::from_millis(millis));
        reply.write_bool(true)?;
        Ok(())
    }
}

impl IpcStub for Calculator {
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

fn runtime() -> IpcRuntime {
    init_test_tracing();
    must(IpcRuntime::new(must(
        TransportConfig::builder()
            .worker_threads(2)
            .sync_timeout(Duration::from_secs(2))
            .build(),
    )))
}

fn published(runtime: &IpcRuntime) -> (Arc<Calculator>, Arc<RemoteHandle>, RemoteProxy) {
    let calculator = Calculator::new();
    let handle = must(runtime.publish(Arc::clone(&calculator) as Arc<dyn IpcStub>));
    let proxy = RemoteProxy::new(Arc::clone(&handle) as Arc<dyn RemoteObject>, DESCRIPTOR);
    (calculator, handle, proxy)
}

mod dispatch_tests {
    use super::*;

    #[test]
    fn test_add_over_loopback() -> IpcResult<()> {
        let remote = LoopbackRemote::new(Calculator::new());
        let proxy = RemoteProxy::new(Arc::clone(&remote) as Arc<dyn RemoteObject>, DESCRIPTOR);
        let mut data = proxy.new_request()?;
        data.write_i32(2)?;
        data.write_i32(40)?;
        let mut reply = proxy.send(ADD, data, MessageOption::sync())?;
        assert_eq!(reply.read_i32()?, 42);
        assert_eq!(remote.codes(), vec![ADD]);
        Ok(())
    }

    #[test]
    fn test_foreign_token_never_reaches_handler() -> IpcResult<()> {
        let calculator = Calculator::new();
        let remote = LoopbackRemote::new(Arc::clone(&calculator) as Arc<dyn IpcStub>);
        let proxy = RemoteProxy::new(remote, "test.IOther");
        let mut data = proxy.new_request()?;
        data.write_string("should not arrive")?;
        let result = proxy.send(NOTIFY, data, MessageOption::sync());
        assert_status!(result, StatusCode::InvalidState);
        assert!(calculator.notified.lock().is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_parcel_is_transaction_failed() {
        let remote = LoopbackRemote::new(Calculator::new());
        let result = remote.send_request(
            u32::MAX,
            &mut MessageParcel::new(),
            &mut MessageParcel::new(),
            &MessageOption::sync(),
        );
        assert_status!(result, StatusCode::TransactionFailed);
    }

    #[test]
    fn test_unknown_code() -> IpcResult<()> {
        let remote = LoopbackRemote::new(Calculator::new());
        let proxy = RemoteProxy::new(remote, DESCRIPTOR);
        let result = proxy.send(99, proxy.new_request()?, MessageOption::sync());
        assert_status!(result, StatusCode::UnknownTransaction);
        Ok(())
    }

    #[test]
    fn test_truncated_arguments_are_invalid_value() -> IpcResult<()> {
        let remote = LoopbackRemote::new(Calculator::new());
        let proxy = RemoteProxy::new(remote, DESCRIPTOR);
        let mut data = proxy.new_request()?;
        data.write_i32(1)?;
        let result = proxy.send(ADD, data, MessageOption::sync());
        assert_status!(result, StatusCode::InvalidValue);
        Ok(())
    }

    #[test]
    fn test_count_above_limit_rejected_before_elements() -> IpcResult<()> {
        let remote = LoopbackRemote::new(Calculator::new());
        let proxy = RemoteProxy::new(remote, DESCRIPTOR);
        let mut data = proxy.new_request()?;
        data.write_i32(2001)?;
        let result = proxy.send(SUM_ALL, data, MessageOption::sync());
        assert_status!(result, StatusCode::InvalidValue);
        Ok(())
    }

    #[test]
    fn test_count_at_limit_accepted() -> IpcResult<()> {
        let remote = LoopbackRemote::new(Calculator::new());
        let proxy = RemoteProxy::new(remote, DESCRIPTOR);
        let mut data = proxy.new_request()?;
        data.write_i32(2000)?;
        for _ in 0..2000 {
            data.write_i32(1)?;
        }
        let mut reply = proxy.send(SUM_ALL, data, MessageOption::sync())?;
        assert_eq!(reply.read_i64()?, 2000);
        Ok(())
    }
}

mod proxy_tests {
    use super::*;

    #[test]
    fn test_transport_failure_is_surfaced() -> IpcResult<()> {
        let mock = MockRemoteObject::new(DESCRIPTOR);
        mock.fail_with(IpcError::timeout(10));
        let proxy = RemoteProxy::new(Arc::clone(&mock) as Arc<dyn RemoteObject>, DESCRIPTOR);
        let result = proxy.send(ADD, proxy.new_request()?, MessageOption::sync());
        assert_status!(result, StatusCode::TimedOut);
        assert_eq!(mock.codes(), vec![ADD]);
        Ok(())
    }

    #[test]
    fn test_request_starts_with_token() -> IpcResult<()> {
        let mock = MockRemoteObject::new(DESCRIPTOR);
        let proxy = RemoteProxy::new(Arc::clone(&mock) as Arc<dyn RemoteObject>, DESCRIPTOR);
        proxy.send(ADD, proxy.new_request()?, MessageOption::one_way())?;
        let call = must_some(mock.last_call(), "call recorded");
        let mut parcel = MessageParcel::from_bytes(&call.data);
        assert_eq!(parcel.read_interface_token()?, DESCRIPTOR);
        assert!(call.one_way);
        Ok(())
    }

    #[test]
    fn test_query_descriptor_bad_reply() {
        let mock = MockRemoteObject::new(DESCRIPTOR);
        let proxy = RemoteProxy::new(mock, DESCRIPTOR);
        assert_status!(proxy.query_descriptor(), StatusCode::InvalidReply);
    }
}

mod runtime_tests {
    use super::*;

    #[test]
    fn test_sync_call_through_workers() -> IpcResult<()> {
        let runtime = runtime();
        let (_calculator, handle, proxy) = published(&runtime);
        let mut data = proxy.new_request()?;
        data.write_i32(-5)?;
        data.write_i32(8)?;
        let mut reply = proxy.send(ADD, data, MessageOption::sync())?;
        assert_eq!(reply.read_i32()?, 3);
        assert_eq!(handle.stats().get(ADD).map(|s| s.count), Some(1));
        Ok(())
    }

    #[test]
    fn test_ping_and_descriptor() -> IpcResult<()> {
        let runtime = runtime();
        let (_calculator, _handle, proxy) = published(&runtime);
        proxy.ping()?;
        assert_eq!(proxy.query_descriptor()?, DESCRIPTOR);
        Ok(())
    }

    #[test]
    fn test_one_way_returns_empty_reply() -> IpcResult<()> {
        let runtime = runtime();
        let (calculator, _handle, proxy) = published(&runtime);
        let mut data = proxy.new_request()?;
        data.write_string("usual.event.TIME_TICK")?;
        let reply = proxy.send(NOTIFY, data, MessageOption::one_way())?;
        assert_eq!(reply.data_size(), 0);

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while calculator.notified.lock().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(calculator.notified.lock().as_slice(), ["usual.event.TIME_TICK"]);
        Ok(())
    }

    #[test]
    fn test_timeout_is_reported() -> IpcResult<()> {
        let runtime = runtime();
        let (_calculator, _handle, proxy) = published(&runtime);
        let mut data = proxy.new_request()?;
        data.write_u64(300)?;
        let result = proxy.send(
            SLOW,
            data,
            MessageOption::sync().with_wait_time(Duration::from_millis(30)),
        );
        assert_status!(result, StatusCode::TimedOut);
        Ok(())
    }

    #[test]
    fn test_kill_notifies_channel_recipient() -> IpcResult<()> {
        let runtime = runtime();
        let (_calculator, handle, proxy) = published(&runtime);
        let (recipient, deaths) = ChannelDeathRecipient::channel();
        assert!(proxy.add_death_recipient(Arc::new(recipient)));
        handle.kill();
        let notice = must(deaths.recv_timeout(Duration::from_secs(2)));
        assert_eq!(notice.descriptor, DESCRIPTOR);
        assert!(proxy.is_dead());
        assert_status!(proxy.ping(), StatusCode::DeadObject);
        Ok(())
    }

    #[test]
    fn test_removed_recipient_is_not_notified() {
        let runtime = runtime();
        let (_calculator, handle, proxy) = published(&runtime);
        let (recipient, deaths) = ChannelDeathRecipient::channel();
        let recipient: Arc<dyn DeathRecipient> = Arc::new(recipient);
        assert!(proxy.add_death_recipient(Arc::clone(&recipient)));
        assert!(proxy.remove_death_recipient(&recipient));
        handle.kill();
        runtime.shutdown();
        assert!(matches!(deaths.try_recv(), Err(_)));
    }

    #[test]
    fn test_oversized_request_rejected() -> IpcResult<()> {
        init_test_tracing();
        let runtime = must(IpcRuntime::new(must(
            TransportConfig::builder().max_parcel_size(256).build(),
        )));
        let (_calculator, _handle, proxy) = published(&runtime);
        let mut data = proxy.new_request()?;
        data.write_string(&"x".repeat(400))?;
        let result = proxy.send(NOTIFY, data, MessageOption::sync());
        assert_status!(result, StatusCode::TransactionFailed);
        Ok(())
    }

    #[test]
    fn test_concurrent_callers() -> IpcResult<()> {
        let runtime = runtime();
        let (_calculator, handle, proxy) = published(&runtime);
        let callers: Vec<_> = (0..8)
            .map(|i| {
                let proxy = proxy.clone();
                std::thread::spawn(move || -> IpcResult<i32> {
                    let mut data = proxy.new_request()?;
                    data.write_i32(i)?;
                    data.write_i32(i)?;
                    Ok(proxy.send(ADD, data, MessageOption::sync())?.read_i32()?)
                })
            })
            .collect();
        let mut results = Vec::new();
        for caller in callers {
            results.push(must(caller.join())?);
        }
        assert_eq!(results, (0..8).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(handle.stats().total(), 8);
        Ok(())
    }
}
