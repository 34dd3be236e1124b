//! Client side of the common event interface.

use std::sync::Arc;

use ohipc_core::{MessageOption, MessageParcel, RemoteObject, RemoteProxy};
use ohipc_errors::{IpcError, IpcResult, StatusCode};
use tracing::{error, warn};

use crate::code::CommonEventInterfaceCode as Code;
use crate::error::CesErrorCode;
use crate::stub::COMMON_EVENT_DESCRIPTOR;
use crate::types::{CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo};

/// Typed client of the common event service.
///
/// Methods returning `i32` report [`CesErrorCode::SendError`] when the call
/// could not be made, or the service's own code when it rejected the
/// request. Methods returning `bool` report `false` on any failure.
#[derive(Debug, Clone)]
pub struct CommonEventProxy {
    inner: RemoteProxy,
}

impl CommonEventProxy {
    /// Wrap the service handle `remote`.
    pub fn new(remote: Arc<dyn RemoteObject>) -> Self {
        Self {
            inner: RemoteProxy::new(remote, COMMON_EVENT_DESCRIPTOR),
        }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        self.inner.remote()
    }

    /// Publish `event` for `user_id`.
    pub fn publish_common_event(
        &self,
        event: &CommonEventData,
        info: &CommonEventPublishInfo,
        last_subscriber: Option<&Arc<dyn RemoteObject>>,
        user_id: i32,
    ) -> i32 {
        let result = self.call(Code::PublishCommonEvent, MessageOption::sync(), |request| {
            request.write_parcelable(Some(event))?;
            request.write_parcelable(Some(info))?;
            write_guarded(request, last_subscriber)?;
            request.write_i32(user_id)?;
            Ok(())
        });
        read_code(result)
    }

    /// Publish `event` on behalf of `uid`.
    pub fn publish_common_event_as(
        &self,
        event: &CommonEventData,
        info: &CommonEventPublishInfo,
        last_subscriber: Option<&Arc<dyn RemoteObject>>,
        uid: i32,
        caller_token: i32,
        user_id: i32,
    ) -> bool {
        let result = self.call(Code::PublishCommonEvent2, MessageOption::sync(), |request| {
            request.write_parcelable(Some(event))?;
            request.write_parcelable(Some(info))?;
            write_guarded(request, last_subscriber)?;
            request.write_i32(uid)?;
            request.write_i32(caller_token)?;
            request.write_i32(user_id)?;
            Ok(())
        });
        read_bool(result)
    }

    /// Register `listener` for events matching `info`.
    pub fn subscribe_common_event(
        &self,
        info: &CommonEventSubscribeInfo,
        listener: &Arc<dyn RemoteObject>,
        instance_key: i32,
    ) -> i32 {
        let result = self.call(Code::SubscribeCommonEvent, MessageOption::sync(), |request| {
            request.write_parcelable(Some(info))?;
            write_guarded(request, Some(listener))?;
            request.write_i32(instance_key)?;
            Ok(())
        });
        read_code(result)
    }

    /// Remove `listener`.
    pub fn unsubscribe_common_event(&self, listener: &Arc<dyn RemoteObject>) -> i32 {
        let result = self.call(Code::UnsubscribeCommonEvent, MessageOption::sync(), |request| {
            request.write_remote_object(Some(listener))?;
            Ok(())
        });
        read_code(result)
    }

    /// Last sticky event named `event`.
    pub fn get_sticky_common_event(&self, event: &str) -> Option<CommonEventData> {
        let mut reply = self
            .call(Code::GetStickyCommonEvent, MessageOption::sync(), |request| {
                request.write_string(event)?;
                Ok(())
            })
            .ok()?;
        if !reply.read_bool().ok()? {
            return None;
        }
        reply.read_parcelable().ok().flatten()
    }

    /// State lines of the service.
    pub fn dump_state(&self, dump_type: u8, event: &str, user_id: i32) -> Vec<String> {
        self.call(Code::DumpState, MessageOption::sync(), |request| {
            request.write_i32(i32::from(dump_type))?;
            request.write_string(event)?;
            request.write_i32(user_id)?;
            Ok(())
        })
        .and_then(|mut reply| Ok(reply.read_string_vector()?))
        .unwrap_or_default()
    }

    /// Finish an ordered delivery.
    pub fn finish_receiver(
        &self,
        proxy: &Arc<dyn RemoteObject>,
        code: i32,
        data: &str,
        abort: bool,
    ) -> bool {
        let result = self.call(Code::FinishReceiver, MessageOption::one_way(), |request| {
            write_guarded(request, Some(proxy))?;
            request.write_i32(code)?;
            request.write_string(data)?;
            request.write_bool(abort)?;
            Ok(())
        });
        result.is_ok()
    }

    /// Hold events for `uid`.
    pub fn freeze(&self, uid: i32) -> bool {
        read_bool(self.call(Code::Freeze, MessageOption::sync(), |request| {
            request.write_i32(uid)?;
            Ok(())
        }))
    }

    /// Release held events for `uid`.
    pub fn unfreeze(&self, uid: i32) -> bool {
        read_bool(self.call(Code::Unfreeze, MessageOption::sync(), |request| {
            request.write_i32(uid)?;
            Ok(())
        }))
    }

    /// Release held events for every uid.
    pub fn unfreeze_all(&self) -> bool {
        read_bool(self.call(Code::UnfreezeAll, MessageOption::sync(), |_request| Ok(())))
    }

    /// Drop the sticky event named `event`.
    pub fn remove_sticky_common_event(&self, event: &str) -> i32 {
        read_code(self.call(Code::RemoveStickyCommonEvent, MessageOption::sync(), |request| {
            request.write_string(event)?;
            Ok(())
        }))
    }

    /// Switch static subscribers on or off.
    pub fn set_static_subscriber_state(&self, enable: bool) -> i32 {
        read_code(self.call(Code::SetStaticSubscriberState, MessageOption::sync(), |request| {
            request.write_bool(enable)?;
            Ok(())
        }))
    }

    /// Switch static subscribers for `events` on or off.
    pub fn set_static_subscriber_events_state(&self, events: &[String], enable: bool) -> i32 {
        read_code(self.call(
            Code::SetStaticSubscriberEventsState,
            MessageOption::sync(),
            |request| {
                request.write_string_vector(events)?;
                request.write_bool(enable)?;
                Ok(())
            },
        ))
    }

    /// Freeze or unfreeze the processes in `pids`.
    pub fn set_freeze_status(&self, pids: &[i32], is_freeze: bool) -> bool {
        read_bool(self.call(Code::SetFreezeStatus, MessageOption::sync(), |request| {
            request.write_count(pids.len())?;
            for pid in pids {
                request.write_i32(*pid)?;
            }
            request.write_bool(is_freeze)?;
            Ok(())
        }))
    }

    fn call(
        &self,
        code: Code,
        option: MessageOption,
        write: impl FnOnce(&mut MessageParcel) -> IpcResult<()>,
    ) -> IpcResult<MessageParcel> {
        let mut request = self.inner.new_request()?;
        if let Err(e) = write(&mut request) {
            error!(%code, error = %e, "failed to write request");
            return Err(e);
        }
        self.inner.send(code.into(), request, option).inspect_err(|e| {
            warn!(%code, status = e.status(), "common event call failed");
        })
    }
}

fn write_guarded(
    request: &mut MessageParcel,
    object: Option<&Arc<dyn RemoteObject>>,
) -> IpcResult<()> {
    request.write_bool(object.is_some())?;
    if object.is_some() {
        request.write_remote_object(object)?;
    }
    Ok(())
}

/// Service code from the reply, or the reason it is unavailable.
fn read_code(result: IpcResult<MessageParcel>) -> i32 {
    match result {
        Ok(mut reply) => reply
            .read_i32()
            .unwrap_or(CesErrorCode::SendError.code()),
        Err(IpcError::Rejected { code, .. }) => code,
        Err(e) if e.status_code() == Some(StatusCode::InvalidValue) => {
            CesErrorCode::ParamInvalid.code()
        }
        Err(_other) => CesErrorCode::SendError.code(),
    }
}

fn read_bool(result: IpcResult<MessageParcel>) -> bool {
    result
        .and_then(|mut reply| Ok(reply.read_bool()?))
        .unwrap_or(false)
}
