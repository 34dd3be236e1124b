//! Server side of the common event interface.
//!
//! Request layouts, after the interface token:
//!
//! | Code | Request | Reply |
//! |------|---------|-------|
//! | `PublishCommonEvent` | event, publish info, `bool` + listener, user id | `i32` |
//! | `PublishCommonEvent2` | event, publish info, `bool` + listener, uid, caller token, user id | `bool` |
//! | `SubscribeCommonEvent` | subscribe info, `bool` + listener, instance key | `i32` |
//! | `UnsubscribeCommonEvent` | listener | `i32` |
//! | `GetStickyCommonEvent` | event name | `bool`, then the event if found |
//! | `DumpState` | dump type, event name, user id | string vector |
//! | `FinishReceiver` | `bool` + proxy, code, data, abort | `bool` |
//! | `Freeze` / `Unfreeze` | uid | `bool` |
//! | `UnfreezeAll` | nothing | `bool` |
//! | `RemoveStickyCommonEvent` | event name | `i32` |
//! | `SetStaticSubscriberState` | enable | `i32` |
//! | `SetStaticSubscriberEventsState` | events, enable | `i32` |
//! | `SetFreezeStatus` | pid count, pids, is freeze | `bool` |
//!
//! Scalars after the required arguments are read leniently: a short
//! request reads them as zero or `false`, as the service has always
//! accepted.

use std::sync::Arc;

use ohipc_core::{DispatchTable, IpcStub, MessageOption, MessageParcel, RemoteObject};
use ohipc_errors::{IpcError, IpcResult};
use tracing::{debug, warn};

use crate::code::CommonEventInterfaceCode as Code;
use crate::error::CesErrorCode;
use crate::service::CommonEventService;
use crate::types::{CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo};

/// Descriptor of the common event service.
pub const COMMON_EVENT_DESCRIPTOR: &str = "OHOS.EventFwk.ICommonEvent";

/// Stub dispatching common event requests to a [`CommonEventService`].
pub struct CommonEventStub {
    service: Arc<dyn CommonEventService>,
    table: DispatchTable<CommonEventStub>,
}

impl CommonEventStub {
    /// Wrap `service`.
    pub fn new(service: Arc<dyn CommonEventService>) -> Self {
        let table = DispatchTable::builder(COMMON_EVENT_DESCRIPTOR)
            .handler(Code::PublishCommonEvent, Self::handle_publish_common_event)
            .handler(Code::PublishCommonEvent2, Self::handle_publish_common_event2)
            .handler(Code::SubscribeCommonEvent, Self::handle_subscribe_common_event)
            .handler(Code::UnsubscribeCommonEvent, Self::handle_unsubscribe_common_event)
            .handler(Code::GetStickyCommonEvent, Self::handle_get_sticky_common_event)
            .handler(Code::DumpState, Self::handle_dump_state)
            .handler(Code::FinishReceiver, Self::handle_finish_receiver)
            .handler(Code::Freeze, Self::handle_freeze)
            .handler(Code::Unfreeze, Self::handle_unfreeze)
            .handler(Code::UnfreezeAll, Self::handle_unfreeze_all)
            .handler(Code::RemoveStickyCommonEvent, Self::handle_remove_sticky_common_event)
            .handler(Code::SetStaticSubscriberState, Self::handle_set_static_subscriber_state)
            .handler(
                Code::SetStaticSubscriberEventsState,
                Self::handle_set_static_subscriber_events_state,
            )
            .handler(Code::SetFreezeStatus, Self::handle_set_freeze_status)
            .build();
        Self { service, table }
    }

    /// The dispatch table, for inspection.
    #[must_use]
    pub fn table(&self) -> &DispatchTable<CommonEventStub> {
        &self.table
    }

    fn handle_publish_common_event(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let (event, info) = read_event_and_info(data).map_err(|reason| {
            warn!(%reason, "publish rejected");
            param_invalid(reason)
        })?;
        let last_subscriber = read_guarded_listener(data);
        let user_id = data.read_i32().unwrap_or_default();

        let ret = self
            .service
            .publish_common_event(&event, &info, last_subscriber, user_id);
        reply.write_i32(ret)?;
        Ok(())
    }

    fn handle_publish_common_event2(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let (event, info) = read_event_and_info(data).map_err(|reason| {
            warn!(%reason, "publish on behalf rejected");
            IpcError::missing(reason)
        })?;
        let last_subscriber = read_guarded_listener(data);
        let uid = data.read_i32().unwrap_or_default();
        let caller_token = data.read_i32().unwrap_or_default();
        let user_id = data.read_i32().unwrap_or_default();

        let ret = self.service.publish_common_event_as(
            &event,
            &info,
            last_subscriber,
            uid,
            caller_token,
            user_id,
        );
        reply.write_bool(ret)?;
        Ok(())
    }

    fn handle_subscribe_common_event(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let info = data
            .read_parcelable::<CommonEventSubscribeInfo>()
            .ok()
            .flatten()
            .ok_or_else(|| param_invalid("subscribe info"))?;
        let listener = read_guarded_listener(data).ok_or_else(|| param_invalid("listener"))?;
        let instance_key = data.read_i32().unwrap_or_default();

        let ret = self
            .service
            .subscribe_common_event(&info, listener, instance_key);
        reply.write_i32(ret)?;
        Ok(())
    }

    fn handle_unsubscribe_common_event(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let listener = read_listener(data).ok_or_else(|| IpcError::missing("listener"))?;
        let ret = self.service.unsubscribe_common_event(&listener);
        reply.write_i32(ret)?;
        Ok(())
    }

    fn handle_get_sticky_common_event(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let event = data.read_string().unwrap_or_default();
        match self.service.get_sticky_common_event(&event) {
            Some(found) => {
                reply.write_bool(true)?;
                reply.write_parcelable(Some(&found))?;
            }
            None => reply.write_bool(false)?,
        }
        Ok(())
    }

    fn handle_dump_state(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let dump_type = u8::try_from(data.read_i32().unwrap_or_default()).unwrap_or_default();
        let event = data.read_string().unwrap_or_default();
        let user_id = data.read_i32().unwrap_or_default();

        let mut state = self.service.dump_state(dump_type, &event, user_id);
        state.truncate(data.max_collection_len());
        reply.write_string_vector(&state)?;
        Ok(())
    }

    fn handle_finish_receiver(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let proxy = read_guarded_listener(data).ok_or_else(|| IpcError::missing("receiver proxy"))?;
        let code = data.read_i32().unwrap_or_default();
        let result_data = data.read_string().unwrap_or_default();
        let abort = data.read_bool().unwrap_or_default();

        let ret = self.service.finish_receiver(&proxy, code, &result_data, abort);
        reply.write_bool(ret)?;
        Ok(())
    }

    fn handle_freeze(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uid = data.read_i32().unwrap_or_default();
        reply.write_bool(self.service.freeze(uid))?;
        Ok(())
    }

    fn handle_unfreeze(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uid = data.read_i32().unwrap_or_default();
        reply.write_bool(self.service.unfreeze(uid))?;
        Ok(())
    }

    fn handle_unfreeze_all(
        &self,
        _data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        reply.write_bool(self.service.unfreeze_all())?;
        Ok(())
    }

    fn handle_remove_sticky_common_event(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let event = data.read_string().unwrap_or_default();
        reply.write_i32(self.service.remove_sticky_common_event(&event))?;
        Ok(())
    }

    fn handle_set_static_subscriber_state(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let enable = data.read_bool().unwrap_or_default();
        reply.write_i32(self.service.set_static_subscriber_state(enable))?;
        Ok(())
    }

    fn handle_set_static_subscriber_events_state(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let events = data.read_string_vector()?;
        let enable = data.read_bool().unwrap_or_default();
        reply.write_i32(self.service.set_static_subscriber_events_state(&events, enable))?;
        Ok(())
    }

    fn handle_set_freeze_status(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let count = data.read_count()?;
        let mut pids = Vec::with_capacity(count.min(data.remaining() / 4));
        for _ in 0..count {
            pids.push(data.read_i32()?);
        }
        let is_freeze = data.read_bool().unwrap_or_default();
        debug!(pids = pids.len(), is_freeze, "set freeze status");
        reply.write_bool(self.service.set_freeze_status(&pids, is_freeze))?;
        Ok(())
    }
}

impl IpcStub for CommonEventStub {
    fn descriptor(&self) -> &str {
        COMMON_EVENT_DESCRIPTOR
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

impl std::fmt::Debug for CommonEventStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonEventStub")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

fn read_event_and_info(
    data: &mut MessageParcel,
) -> Result<(CommonEventData, CommonEventPublishInfo), &'static str> {
    let event = data
        .read_parcelable::<CommonEventData>()
        .ok()
        .flatten()
        .ok_or("event")?;
    let info = data
        .read_parcelable::<CommonEventPublishInfo>()
        .ok()
        .flatten()
        .ok_or("publish info")?;
    Ok((event, info))
}

fn read_listener(data: &mut MessageParcel) -> Option<Arc<dyn RemoteObject>> {
    data.read_remote_object().ok().flatten()
}

fn read_guarded_listener(data: &mut MessageParcel) -> Option<Arc<dyn RemoteObject>> {
    if data.read_bool().unwrap_or_default() {
        read_listener(data)
    } else {
        None
    }
}

fn param_invalid(what: &'static str) -> IpcError {
    IpcError::rejected(
        CesErrorCode::ParamInvalid.code(),
        format!("{what} is missing or malformed"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    struct Defaults;

    impl CommonEventService for Defaults {}

    #[test]
    fn test_every_code_is_registered() {
        let stub = CommonEventStub::new(Arc::new(Defaults));
        let expected: Vec<u32> = Code::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(stub.table().codes(), expected);
    }

    #[test]
    fn test_param_invalid_status() {
        assert_eq!(param_invalid("event").status(), 401);
    }

    #[test]
    #[traced_test]
    fn test_rejected_publish_is_logged() -> IpcResult<()> {
        let stub = CommonEventStub::new(Arc::new(Defaults));
        let mut data = MessageParcel::new();
        data.write_interface_token(COMMON_EVENT_DESCRIPTOR)?;
        data.write_bool(true)?;
        let result = stub.on_remote_request(
            Code::PublishCommonEvent.code(),
            &mut data,
            &mut MessageParcel::new(),
            &MessageOption::sync(),
        );
        assert_eq!(result.map_err(|e| e.status()), Err(401));
        assert!(logs_contain("publish rejected"));
        Ok(())
    }
}
