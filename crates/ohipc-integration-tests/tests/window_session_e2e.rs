//! Window session connect and layout calls across the worker pool.

use std::sync::Arc;

use anyhow::Result;
use ohipc_core::{
    INTERFACE_TRANSACTION, IpcRuntime, MessageOption, MessageParcel, PING_TRANSACTION,
    RemoteHandle, RemoteObject,
};
use ohipc_integration_tests::{DELIVERY_TIMEOUT, RecordingSession, test_runtime, wait_until};
use ohipc_test_helpers::prelude::MockRemoteObject;
use ohipc_window_session::{
    ConnectRequest, Rect, SESSION_DESCRIPTOR, SESSION_STAGE_DESCRIPTOR, SessionProxy, SessionStub,
    SizeChangeReason, WINDOW_EVENT_CHANNEL_DESCRIPTOR, WindowSessionProperty, WsError,
};

fn host(runtime: &IpcRuntime) -> Result<(Arc<RecordingSession>, Arc<RemoteHandle>, SessionProxy)> {
    let session = Arc::new(RecordingSession::default());
    let handle = runtime.publish(Arc::new(SessionStub::new(session.clone())))?;
    let remote: Arc<dyn RemoteObject> = handle.clone();
    Ok((session, handle, SessionProxy::new(remote)))
}

fn connect_request() -> ConnectRequest {
    ConnectRequest::new(
        MockRemoteObject::new(SESSION_STAGE_DESCRIPTOR),
        MockRemoteObject::new(WINDOW_EVENT_CHANNEL_DESCRIPTOR),
    )
}

#[test]
fn test_connect_assigns_persistent_id() -> Result<()> {
    let runtime = test_runtime()?;
    let (session, _handle, proxy) = host(&runtime)?;
    let mut request = connect_request().with_property(WindowSessionProperty::new("main"));

    let reply = proxy.connect(&mut request);

    assert_eq!(reply.result, WsError::Ok);
    assert_eq!(session.connects(), 1);
    let property = request.property.unwrap_or_default();
    assert_eq!(property.persistent_id, RecordingSession::PERSISTENT_ID);
    assert_eq!(property.display_id, 1);
    Ok(())
}

#[test]
fn test_one_way_and_sync_calls() -> Result<()> {
    let runtime = test_runtime()?;
    let (session, _handle, proxy) = host(&runtime)?;

    assert_eq!(proxy.background(true), WsError::Ok);
    assert_eq!(
        proxy.update_session_rect(Rect::new(0, 0, 800, 600), SizeChangeReason::Resize),
        WsError::Ok
    );
    assert_eq!(proxy.hide(), WsError::Ok);

    assert!(wait_until(DELIVERY_TIMEOUT, || session.calls().len() == 3));
    let mut calls = session.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            "background true".to_owned(),
            "hide".to_owned(),
            "rect 800x600 Resize".to_owned(),
        ]
    );
    Ok(())
}

#[test]
fn test_meta_transactions_answer_without_session() -> Result<()> {
    let runtime = test_runtime()?;
    let (session, handle, _proxy) = host(&runtime)?;

    let mut reply = MessageParcel::new();
    handle.send_request(
        INTERFACE_TRANSACTION,
        &mut MessageParcel::new(),
        &mut reply,
        &MessageOption::sync(),
    )?;
    assert_eq!(reply.read_string16()?, SESSION_DESCRIPTOR);
    handle.send_request(
        PING_TRANSACTION,
        &mut MessageParcel::new(),
        &mut MessageParcel::new(),
        &MessageOption::sync(),
    )?;

    assert!(session.calls().is_empty());
    assert_eq!(handle.stats().total(), 0);
    Ok(())
}

#[test]
fn test_dead_session_reports_ipc_failure() -> Result<()> {
    let runtime = test_runtime()?;
    let (session, handle, proxy) = host(&runtime)?;
    handle.kill();

    assert_eq!(proxy.hide(), WsError::IpcFailed);
    assert_eq!(proxy.background(false), WsError::IpcFailed);
    assert_eq!(proxy.get_global_maximize_mode(), Err(WsError::IpcFailed));
    assert_eq!(proxy.connect(&mut connect_request()).result, WsError::IpcFailed);
    assert!(session.calls().is_empty());
    assert_eq!(session.connects(), 0);
    Ok(())
}
