//! Request scenarios driven through published stubs with hand-built parcels.

use std::sync::Arc;

use anyhow::Result;
use ohipc_ability::{ABILITY_SCHEDULER_DESCRIPTOR, AbilitySchedulerCode, AbilitySchedulerStub};
use ohipc_common_event::{
    COMMON_EVENT_DESCRIPTOR, CesErrorCode, CommonEventInterfaceCode, CommonEventPublishInfo,
    CommonEventStub, InMemoryCommonEventService,
};
use ohipc_core::{CYCLE_LIMIT, MessageParcel, RemoteObject, StatusCode};
use ohipc_integration_tests::{
    RecordingScheduler, RecordingSession, event, send_raw, test_runtime, token_only,
};
use ohipc_test_helpers::prelude::{MockRemoteObject, assert_status};
use ohipc_window_session::{
    SESSION_DESCRIPTOR, SessionInterfaceCode, SessionStub, WINDOW_EVENT_CHANNEL_DESCRIPTOR,
};

#[test]
fn test_publish_with_event_and_info_succeeds() -> Result<()> {
    let runtime = test_runtime()?;
    let handle = runtime.publish(Arc::new(CommonEventStub::new(InMemoryCommonEventService::new())))?;

    let mut data = token_only(COMMON_EVENT_DESCRIPTOR)?;
    data.write_parcelable(Some(&event("usual.event.TIME_TICK")))?;
    data.write_parcelable(Some(&CommonEventPublishInfo::new()))?;
    let mut reply = send_raw(&handle, CommonEventInterfaceCode::PublishCommonEvent, data)?;

    assert_eq!(reply.read_i32()?, CesErrorCode::Ok.code());
    Ok(())
}

#[test]
fn test_publish_with_stray_bool_is_param_invalid() -> Result<()> {
    let runtime = test_runtime()?;
    let handle = runtime.publish(Arc::new(CommonEventStub::new(InMemoryCommonEventService::new())))?;

    let mut data = token_only(COMMON_EVENT_DESCRIPTOR)?;
    data.write_bool(true)?;
    let result = send_raw(&handle, CommonEventInterfaceCode::PublishCommonEvent, data);

    assert_status!(result, CesErrorCode::ParamInvalid.code());
    Ok(())
}

#[test]
fn test_publish_without_token_fails_before_dispatch() -> Result<()> {
    let runtime = test_runtime()?;
    let handle = runtime.publish(Arc::new(CommonEventStub::new(InMemoryCommonEventService::new())))?;

    let result = send_raw(
        &handle,
        CommonEventInterfaceCode::PublishCommonEvent,
        MessageParcel::new(),
    );

    assert_status!(result, StatusCode::TransactionFailed);
    assert_eq!(handle.stats().total_failures(), 1);
    Ok(())
}

#[test]
fn test_execute_batch_over_limit_reads_nothing() -> Result<()> {
    let runtime = test_runtime()?;
    let scheduler = Arc::new(RecordingScheduler::default());
    let handle = runtime.publish(Arc::new(AbilitySchedulerStub::new(scheduler.clone())))?;

    let mut data = token_only(ABILITY_SCHEDULER_DESCRIPTOR)?;
    data.write_count(CYCLE_LIMIT + 1)?;
    let result = send_raw(&handle, AbilitySchedulerCode::ScheduleExecuteBatch, data);

    assert_status!(result, StatusCode::InvalidValue);
    assert_eq!(scheduler.row_count(), 0);
    Ok(())
}

#[test]
fn test_connect_with_null_stage_skips_session() -> Result<()> {
    let runtime = test_runtime()?;
    let session = Arc::new(RecordingSession::default());
    let handle = runtime.publish(Arc::new(SessionStub::new(session.clone())))?;

    let channel: Arc<dyn RemoteObject> = MockRemoteObject::new(WINDOW_EVENT_CHANNEL_DESCRIPTOR);
    let mut data = token_only(SESSION_DESCRIPTOR)?;
    data.write_remote_object(None)?;
    data.write_remote_object(Some(&channel))?;
    let result = send_raw(&handle, SessionInterfaceCode::Connect, data);

    assert_status!(result, StatusCode::InvalidData);
    assert_eq!(session.connects(), 0);
    Ok(())
}
