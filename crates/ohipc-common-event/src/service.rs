//! Service-side contract of the common event interface.

use std::sync::Arc;

use ohipc_core::RemoteObject;

use crate::error::CesErrorCode;
use crate::types::{CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo};

/// Business logic behind [`CommonEventStub`](crate::CommonEventStub).
///
/// Every method has a default body so an implementation only overrides
/// what it supports. Defaults report success with no effect, or `false`
/// for boolean queries.
pub trait CommonEventService: Send + Sync + 'static {
    /// Publish `event` for the calling user.
    fn publish_common_event(
        &self,
        _event: &CommonEventData,
        _info: &CommonEventPublishInfo,
        _last_subscriber: Option<Arc<dyn RemoteObject>>,
        _user_id: i32,
    ) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Publish `event` on behalf of `uid`.
    fn publish_common_event_as(
        &self,
        _event: &CommonEventData,
        _info: &CommonEventPublishInfo,
        _last_subscriber: Option<Arc<dyn RemoteObject>>,
        _uid: i32,
        _caller_token: i32,
        _user_id: i32,
    ) -> bool {
        true
    }

    /// Register `listener` for events matching `info`.
    fn subscribe_common_event(
        &self,
        _info: &CommonEventSubscribeInfo,
        _listener: Arc<dyn RemoteObject>,
        _instance_key: i32,
    ) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Remove `listener`.
    fn unsubscribe_common_event(&self, _listener: &Arc<dyn RemoteObject>) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Last sticky event named `event`.
    fn get_sticky_common_event(&self, _event: &str) -> Option<CommonEventData> {
        None
    }

    /// Human-readable state lines.
    fn dump_state(&self, _dump_type: u8, _event: &str, _user_id: i32) -> Vec<String> {
        Vec::new()
    }

    /// Finish an ordered delivery on behalf of the receiver behind `proxy`.
    fn finish_receiver(
        &self,
        _proxy: &Arc<dyn RemoteObject>,
        _code: i32,
        _data: &str,
        _abort: bool,
    ) -> bool {
        false
    }

    /// Hold events for subscribers of `uid`.
    fn freeze(&self, _uid: i32) -> bool {
        false
    }

    /// Release held events for `uid`.
    fn unfreeze(&self, _uid: i32) -> bool {
        false
    }

    /// Release held events for every uid.
    fn unfreeze_all(&self) -> bool {
        false
    }

    /// Drop the sticky event named `event`.
    fn remove_sticky_common_event(&self, _event: &str) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Switch static subscribers on or off.
    fn set_static_subscriber_state(&self, _enable: bool) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Switch static subscribers for `events` on or off.
    fn set_static_subscriber_events_state(&self, _events: &[String], _enable: bool) -> i32 {
        CesErrorCode::Ok.code()
    }

    /// Freeze or unfreeze the processes in `pids`.
    fn set_freeze_status(&self, _pids: &[i32], _is_freeze: bool) -> bool {
        false
    }
}
