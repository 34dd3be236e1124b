//! Event receiver interface.
//!
//! The service holds one [`EventReceiveProxy`] per subscriber and pushes
//! events through it one-way; the subscriber side hosts an
//! [`EventReceiveStub`] wrapping its [`EventReceiver`].

use std::sync::Arc;

use ohipc_core::{
    DispatchTable, IpcStub, MessageOption, MessageParcel, RemoteObject, RemoteProxy,
};
use ohipc_errors::{IpcError, IpcResult};
use tracing::trace;

use crate::code::EventReceiveCode;
use crate::types::CommonEventData;

/// Descriptor of the event receiver.
pub const EVENT_RECEIVE_DESCRIPTOR: &str = "OHOS.EventFwk.IEventReceive";

/// Subscriber-side callback.
pub trait EventReceiver: Send + Sync + 'static {
    /// Called for each delivered event.
    fn notify_event(&self, data: &CommonEventData, ordered: bool, sticky: bool);
}

/// Stub hosting an [`EventReceiver`].
pub struct EventReceiveStub {
    receiver: Arc<dyn EventReceiver>,
    table: DispatchTable<EventReceiveStub>,
}

impl EventReceiveStub {
    /// Wrap `receiver`.
    pub fn new(receiver: Arc<dyn EventReceiver>) -> Self {
        Self {
            receiver,
            table: DispatchTable::builder(EVENT_RECEIVE_DESCRIPTOR)
                .handler(EventReceiveCode::NotifyEvent, Self::handle_notify_event)
                .build(),
        }
    }

    fn handle_notify_event(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let event = data
            .read_parcelable::<CommonEventData>()
            .ok()
            .flatten()
            .ok_or_else(|| IpcError::missing("event data"))?;
        let ordered = data.read_bool().unwrap_or_default();
        let sticky = data.read_bool().unwrap_or_default();
        trace!(event = event.event(), ordered, sticky, "event received");
        self.receiver.notify_event(&event, ordered, sticky);
        Ok(())
    }
}

impl IpcStub for EventReceiveStub {
    fn descriptor(&self) -> &str {
        EVENT_RECEIVE_DESCRIPTOR
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

/// Client for a subscriber's [`EventReceiveStub`].
#[derive(Debug, Clone)]
pub struct EventReceiveProxy {
    inner: RemoteProxy,
}

impl EventReceiveProxy {
    /// Wrap the subscriber handle `remote`.
    pub fn new(remote: Arc<dyn RemoteObject>) -> Self {
        Self {
            inner: RemoteProxy::new(remote, EVENT_RECEIVE_DESCRIPTOR),
        }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        self.inner.remote()
    }

    /// Push `data` to the subscriber without waiting.
    ///
    /// # Errors
    ///
    /// Returns the transport status if the event could not be queued, for
    /// example when the subscriber has died.
    pub fn notify_event(&self, data: &CommonEventData, ordered: bool, sticky: bool) -> IpcResult<()> {
        let mut request = self.inner.new_request()?;
        request.write_parcelable(Some(data))?;
        request.write_bool(ordered)?;
        request.write_bool(sticky)?;
        self.inner
            .send(EventReceiveCode::NotifyEvent.into(), request, MessageOption::one_way())
            .map(drop)
    }
}
