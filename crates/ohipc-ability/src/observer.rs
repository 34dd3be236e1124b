//! Data ability observers.
//!
//! A client registers an observer handle for a URI through the scheduler;
//! the data ability calls it back one-way whenever the data changes.

use std::sync::Arc;

use ohipc_core::{
    DispatchTable, IpcStub, MessageOption, MessageParcel, RemoteObject, RemoteProxy,
};
use ohipc_errors::IpcResult;
use tracing::trace;

use crate::code::DataAbilityObserverCode;

/// Descriptor of a data ability observer.
pub const DATA_ABILITY_OBSERVER_DESCRIPTOR: &str = "ohos.aafwk.DataAbilityObserver";

/// Client-side change callback.
pub trait DataAbilityObserver: Send + Sync + 'static {
    /// Data behind the observed URI changed.
    fn on_change(&self);
}

/// Stub hosting a [`DataAbilityObserver`].
pub struct DataAbilityObserverStub {
    observer: Arc<dyn DataAbilityObserver>,
    table: DispatchTable<DataAbilityObserverStub>,
}

impl DataAbilityObserverStub {
    /// Wrap `observer`.
    pub fn new(observer: Arc<dyn DataAbilityObserver>) -> Self {
        Self {
            observer,
            table: DispatchTable::builder(DATA_ABILITY_OBSERVER_DESCRIPTOR)
                .handler(DataAbilityObserverCode::OnChange, Self::handle_on_change)
                .build(),
        }
    }

    fn handle_on_change(&self, _data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        trace!("data changed");
        self.observer.on_change();
        Ok(())
    }
}

impl IpcStub for DataAbilityObserverStub {
    fn descriptor(&self) -> &str {
        DATA_ABILITY_OBSERVER_DESCRIPTOR
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

/// Client for an observer handle received by the scheduler.
#[derive(Debug, Clone)]
pub struct DataAbilityObserverProxy {
    inner: RemoteProxy,
}

impl DataAbilityObserverProxy {
    /// Wrap the observer handle `remote`.
    pub fn new(remote: Arc<dyn RemoteObject>) -> Self {
        Self {
            inner: RemoteProxy::new(remote, DATA_ABILITY_OBSERVER_DESCRIPTOR),
        }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        self.inner.remote()
    }

    /// Whether `self` and `other` wrap the same handle.
    #[must_use]
    pub fn same_remote(&self, other: &DataAbilityObserverProxy) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self.remote()), Arc::as_ptr(other.remote()))
    }

    /// Tell the observer its data changed, without waiting.
    ///
    /// # Errors
    ///
    /// Returns the transport status if the notification could not be queued.
    pub fn on_change(&self) -> IpcResult<()> {
        let request = self.inner.new_request()?;
        self.inner
            .send(DataAbilityObserverCode::OnChange.into(), request, MessageOption::one_way())
            .map(drop)
    }
}
