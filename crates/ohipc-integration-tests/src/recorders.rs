//! Service implementations that record what reaches them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use ohipc_ability::{
    AbilityScheduler, DataAbilityObserver, DataAbilityObserverProxy, DataAbilityOperation,
    DataAbilityPredicates, DataAbilityResult, LifeCycleStateInfo, OperationType, ResultSet,
    ValueObject, ValuesBucket,
};
use ohipc_common_event::{CommonEventData, EventReceiver};
use ohipc_types::{AbilitySessionInfo, Uri, Want};
use ohipc_window_session::{
    ConnectReply, ConnectRequest, Rect, Session, SizeChangeReason, SystemSessionConfig, WsError,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// One event as seen by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Event name.
    pub event: String,
    /// Result code carried by the event.
    pub code: i32,
    /// Result data carried by the event.
    pub data: String,
    /// Whether it was an ordered delivery.
    pub ordered: bool,
    /// Whether it came from the sticky cache.
    pub sticky: bool,
}

/// Subscriber forwarding each event into a channel.
#[derive(Debug)]
pub struct EventRecorder {
    tx: Sender<Delivery>,
}

impl EventRecorder {
    /// A recorder and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Arc<Self>, Receiver<Delivery>) {
        let (tx, rx) = channel::unbounded();
        (Arc::new(Self { tx }), rx)
    }
}

impl EventReceiver for EventRecorder {
    fn notify_event(&self, data: &CommonEventData, ordered: bool, sticky: bool) {
        let delivery = Delivery {
            event: data.event().to_owned(),
            code: data.code,
            data: data.data.clone(),
            ordered,
            sticky,
        };
        if self.tx.send(delivery).is_err() {
            debug!(event = data.event(), "delivery dropped: test stopped listening");
        }
    }
}

/// Data ability keeping rows in memory and recording lifecycle calls.
#[derive(Default)]
pub struct RecordingScheduler {
    rows: Mutex<Vec<ValuesBucket>>,
    lifecycle: Mutex<Vec<String>>,
    observers: Mutex<Vec<(Uri, DataAbilityObserverProxy)>>,
}

impl RecordingScheduler {
    /// Lifecycle calls in arrival order.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<String> {
        self.lifecycle.lock().clone()
    }

    /// Stored rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    /// Registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    fn push_row(&self, value: &ValuesBucket) -> i32 {
        let mut rows = self.rows.lock();
        rows.push(value.clone());
        i32::try_from(rows.len()).map_or(i32::MAX, |len| len.saturating_sub(1))
    }
}

impl AbilityScheduler for RecordingScheduler {
    fn schedule_ability_transaction(
        &self,
        want: &Want,
        state_info: &LifeCycleStateInfo,
        session_info: Option<AbilitySessionInfo>,
    ) {
        self.lifecycle.lock().push(format!(
            "transaction {} {:?} session={}",
            want.action,
            state_info.state,
            session_info.is_some()
        ));
    }

    fn schedule_connect_ability(&self, want: &Want) {
        self.lifecycle.lock().push(format!("connect {}", want.action));
    }

    fn schedule_disconnect_ability(&self, want: &Want) {
        self.lifecycle.lock().push(format!("disconnect {}", want.action));
    }

    fn insert(&self, _uri: &Uri, value: &ValuesBucket) -> i32 {
        self.push_row(value)
    }

    fn delete(&self, _uri: &Uri, _predicates: &DataAbilityPredicates) -> i32 {
        let mut rows = self.rows.lock();
        let count = rows.len();
        rows.clear();
        i32::try_from(count).unwrap_or(i32::MAX)
    }

    fn query(
        &self,
        _uri: &Uri,
        columns: &[String],
        _predicates: &DataAbilityPredicates,
    ) -> Option<ResultSet> {
        let rows = self.rows.lock();
        let result = rows.iter().fold(ResultSet::new(columns.iter().cloned()), |set, bucket| {
            let row = columns
                .iter()
                .map(|column| bucket.get(column).cloned().unwrap_or(ValueObject::Null))
                .collect();
            set.with_row(row)
        });
        Some(result)
    }

    fn batch_insert(&self, _uri: &Uri, values: &[ValuesBucket]) -> i32 {
        self.rows.lock().extend_from_slice(values);
        i32::try_from(values.len()).unwrap_or(i32::MAX)
    }

    fn schedule_register_observer(&self, uri: &Uri, observer: DataAbilityObserverProxy) -> bool {
        self.observers.lock().push((uri.clone(), observer));
        true
    }

    fn schedule_unregister_observer(&self, uri: &Uri, observer: &DataAbilityObserverProxy) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(u, o)| !(u == uri && o.same_remote(observer)));
        observers.len() != before
    }

    fn schedule_notify_change(&self, uri: &Uri) -> bool {
        let observers: Vec<DataAbilityObserverProxy> = self
            .observers
            .lock()
            .iter()
            .filter(|(u, _)| u == uri)
            .map(|(_, o)| o.clone())
            .collect();
        observers.iter().fold(true, |ok, observer| match observer.on_change() {
            Ok(()) => ok,
            Err(e) => {
                warn!(uri = uri.as_str(), error = %e, "observer notification failed");
                false
            }
        })
    }

    fn execute_batch(&self, operations: &[DataAbilityOperation]) -> Vec<DataAbilityResult> {
        operations
            .iter()
            .map(|operation| match operation.op_type {
                OperationType::Insert => {
                    let index = operation.values.as_ref().map_or(-1, |values| self.push_row(values));
                    DataAbilityResult::inserted(format!("{}/{index}", operation.uri))
                }
                OperationType::Delete => DataAbilityResult::count(
                    self.delete(&operation.uri, &DataAbilityPredicates::default()),
                ),
                OperationType::Update | OperationType::Assert => DataAbilityResult::count(0),
            })
            .collect()
    }
}

/// Data ability observer counting change notifications.
#[derive(Debug, Default)]
pub struct CountingObserver {
    changes: AtomicUsize,
}

impl CountingObserver {
    /// Notifications received so far.
    #[must_use]
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::SeqCst)
    }
}

impl DataAbilityObserver for CountingObserver {
    fn on_change(&self) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Window session host assigning fixed ids on connect.
#[derive(Default)]
pub struct RecordingSession {
    calls: Mutex<Vec<String>>,
    connects: AtomicUsize,
}

impl RecordingSession {
    /// Persistent id handed to every connecting client.
    pub const PERSISTENT_ID: i32 = 42;

    /// Calls in arrival order, connect excluded.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of connects that reached the host.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) -> WsError {
        self.calls.lock().push(call);
        WsError::Ok
    }
}

impl Session for RecordingSession {
    fn connect(&self, request: &mut ConnectRequest) -> ConnectReply {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(property) = request.property.as_mut() {
            property.persistent_id = Self::PERSISTENT_ID;
            property.display_id = 1;
        }
        ConnectReply {
            result: WsError::Ok,
            system_config: SystemSessionConfig::default(),
        }
    }

    fn background(&self, is_from_client: bool) -> WsError {
        self.record(format!("background {is_from_client}"))
    }

    fn hide(&self) -> WsError {
        self.record("hide".to_owned())
    }

    fn update_session_rect(&self, rect: Rect, reason: SizeChangeReason) -> WsError {
        self.record(format!("rect {}x{} {reason:?}", rect.width, rect.height))
    }
}
