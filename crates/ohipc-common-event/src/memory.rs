//! In-memory common event service.
//!
//! Keeps subscribers, sticky events and the freeze state in process memory.
//! Delivery goes through [`EventReceiveProxy`] one-way, so a slow
//! subscriber never blocks the publisher. Subscribers are keyed by their
//! listener handle; a death recipient registered at subscription removes a
//! subscriber whose handle dies.
//!
//! A subscriber is owned by the uid carried in its subscribe info's
//! `user_id`. Events for a frozen owner are queued and flushed on unfreeze.
//! The frozen set and the queues share one lock, so an event is either
//! queued before the owner thaws or delivered directly after.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use ohipc_core::{DeathRecipient, HandlerDeathRecipient, RemoteObject};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::CesErrorCode;
use crate::receiver::EventReceiveProxy;
use crate::service::CommonEventService;
use crate::types::{CommonEventData, CommonEventPublishInfo, CommonEventSubscribeInfo};

struct Subscriber {
    info: CommonEventSubscribeInfo,
    receiver: EventReceiveProxy,
    recipient: Arc<dyn DeathRecipient>,
}

impl Subscriber {
    fn is(&self, listener: &Arc<dyn RemoteObject>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self.receiver.remote()), Arc::as_ptr(listener))
    }
}

struct Pending {
    listener: Arc<dyn RemoteObject>,
    data: CommonEventData,
    ordered: bool,
    sticky: bool,
}

/// Frozen owners and the events queued for them.
#[derive(Default)]
struct FreezeState {
    frozen: BTreeSet<i32>,
    pending: BTreeMap<i32, Vec<Pending>>,
}

impl FreezeState {
    /// Thaw `uids`, returning whatever was queued for them.
    fn thaw(&mut self, uids: &[i32]) -> Vec<(i32, Vec<Pending>)> {
        uids.iter()
            .filter_map(|uid| {
                self.frozen.remove(uid);
                self.pending.remove(uid).map(|events| (*uid, events))
            })
            .collect()
    }
}

/// A record of a finished ordered delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishRecord {
    /// Result code left by the receiver.
    pub code: i32,
    /// Result data left by the receiver.
    pub data: String,
    /// Whether the receiver aborted the delivery.
    pub abort: bool,
}

/// Process-local [`CommonEventService`].
pub struct InMemoryCommonEventService {
    this: Weak<InMemoryCommonEventService>,
    subscribers: RwLock<Vec<Subscriber>>,
    sticky: Mutex<HashMap<String, CommonEventData>>,
    freeze: Mutex<FreezeState>,
    frozen_pids: Mutex<BTreeSet<i32>>,
    static_enabled: Mutex<bool>,
    static_events: Mutex<BTreeSet<String>>,
    finished: Mutex<Vec<FinishRecord>>,
}

impl InMemoryCommonEventService {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            subscribers: RwLock::new(Vec::new()),
            sticky: Mutex::new(HashMap::new()),
            freeze: Mutex::new(FreezeState::default()),
            frozen_pids: Mutex::new(BTreeSet::new()),
            static_enabled: Mutex::new(true),
            static_events: Mutex::new(BTreeSet::new()),
            finished: Mutex::new(Vec::new()),
        })
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Number of events queued for frozen owners.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.freeze.lock().pending.values().map(Vec::len).sum()
    }

    /// Whether static subscribers are switched on.
    #[must_use]
    pub fn static_subscribers_enabled(&self) -> bool {
        *self.static_enabled.lock()
    }

    /// Events with static subscribers switched on individually.
    #[must_use]
    pub fn static_events(&self) -> Vec<String> {
        self.static_events.lock().iter().cloned().collect()
    }

    /// Frozen pids.
    #[must_use]
    pub fn frozen_pids(&self) -> Vec<i32> {
        self.frozen_pids.lock().iter().copied().collect()
    }

    /// Finished ordered deliveries, oldest first.
    #[must_use]
    pub fn finished(&self) -> Vec<FinishRecord> {
        self.finished.lock().clone()
    }

    /// Drop subscribers whose handle has died.
    pub fn prune_dead(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !s.receiver.remote().is_object_dead());
        let removed = before.saturating_sub(subscribers.len());
        if removed > 0 {
            info!(removed, "removed dead subscribers");
        }
        removed
    }

    fn deliver(&self, owner: i32, pending: Pending) {
        {
            let mut state = self.freeze.lock();
            if state.frozen.contains(&owner) {
                debug!(owner, event = pending.data.event(), "owner frozen, event queued");
                state.pending.entry(owner).or_default().push(pending);
                return;
            }
        }
        let receiver = EventReceiveProxy::new(pending.listener);
        if let Err(e) = receiver.notify_event(&pending.data, pending.ordered, pending.sticky) {
            warn!(owner, error = %e, "event delivery failed");
            if e.is_fatal() {
                self.prune_dead();
            }
        }
    }

    fn flush(&self, drained: Vec<(i32, Vec<Pending>)>) {
        for (uid, events) in drained {
            debug!(uid, count = events.len(), "flushing queued events");
            for event in events {
                self.deliver(uid, event);
            }
        }
    }

    fn death_recipient(&self) -> Arc<dyn DeathRecipient> {
        let this = Weak::clone(&self.this);
        Arc::new(HandlerDeathRecipient::new(move |_remote| {
            if let Some(service) = this.upgrade() {
                service.prune_dead();
            }
        }))
    }
}

impl CommonEventService for InMemoryCommonEventService {
    fn publish_common_event(
        &self,
        event: &CommonEventData,
        info: &CommonEventPublishInfo,
        _last_subscriber: Option<Arc<dyn RemoteObject>>,
        user_id: i32,
    ) -> i32 {
        if event.event().is_empty() {
            return CesErrorCode::WantActionIsNull.code();
        }
        if info.sticky {
            self.sticky
                .lock()
                .insert(event.event().to_owned(), event.clone());
        }

        let mut targets: Vec<(i32, i32, Arc<dyn RemoteObject>)> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.info.matching_skills.matches(&event.want))
            .map(|s| {
                (
                    s.info.priority,
                    s.info.user_id,
                    Arc::clone(s.receiver.remote()),
                )
            })
            .collect();
        if info.ordered {
            targets.sort_by(|a, b| b.0.cmp(&a.0));
        }
        debug!(
            event = event.event(),
            user_id,
            subscribers = targets.len(),
            "publishing"
        );
        for (_priority, owner, listener) in targets {
            self.deliver(
                owner,
                Pending {
                    listener,
                    data: event.clone(),
                    ordered: info.ordered,
                    sticky: info.sticky,
                },
            );
        }
        CesErrorCode::Ok.code()
    }

    fn publish_common_event_as(
        &self,
        event: &CommonEventData,
        info: &CommonEventPublishInfo,
        last_subscriber: Option<Arc<dyn RemoteObject>>,
        _uid: i32,
        _caller_token: i32,
        user_id: i32,
    ) -> bool {
        self.publish_common_event(event, info, last_subscriber, user_id) == CesErrorCode::Ok.code()
    }

    fn subscribe_common_event(
        &self,
        info: &CommonEventSubscribeInfo,
        listener: Arc<dyn RemoteObject>,
        _instance_key: i32,
    ) -> i32 {
        if info.matching_skills.events.is_empty() {
            return CesErrorCode::ParamInvalid.code();
        }
        if listener.is_object_dead() {
            warn!("listener is already dead, subscription refused");
            return CesErrorCode::ParamInvalid.code();
        }
        let recipient = self.death_recipient();
        let replaced = {
            let mut subscribers = self.subscribers.write();
            if let Some(existing) = subscribers.iter_mut().find(|s| s.is(&listener)) {
                existing.info = info.clone();
                Some(std::mem::replace(&mut existing.recipient, Arc::clone(&recipient)))
            } else {
                subscribers.push(Subscriber {
                    info: info.clone(),
                    receiver: EventReceiveProxy::new(Arc::clone(&listener)),
                    recipient: Arc::clone(&recipient),
                });
                None
            }
        };
        if let Some(old) = replaced {
            listener.remove_death_recipient(&old);
        }
        // The subscriber is visible before the recipient is armed, so a death
        // from here on is seen either by the recipient or by the check below.
        if !listener.add_death_recipient(recipient) {
            if listener.is_object_dead() {
                self.prune_dead();
                warn!("listener died while subscribing");
                return CesErrorCode::ParamInvalid.code();
            }
            debug!("listener does not report death; dead subscribers are pruned on delivery");
        }
        info!(events = ?info.matching_skills.events, "subscriber added");

        let replay: Vec<CommonEventData> = self
            .sticky
            .lock()
            .values()
            .filter(|sticky| info.matching_skills.matches(&sticky.want))
            .cloned()
            .collect();
        for data in replay {
            self.deliver(
                info.user_id,
                Pending {
                    listener: Arc::clone(&listener),
                    data,
                    ordered: false,
                    sticky: true,
                },
            );
        }
        CesErrorCode::Ok.code()
    }

    fn unsubscribe_common_event(&self, listener: &Arc<dyn RemoteObject>) -> i32 {
        let removed = {
            let mut subscribers = self.subscribers.write();
            let index = subscribers.iter().position(|s| s.is(listener));
            index.map(|i| subscribers.remove(i))
        };
        match removed {
            Some(subscriber) => {
                listener.remove_death_recipient(&subscriber.recipient);
                info!("subscriber removed");
                CesErrorCode::Ok.code()
            }
            None => CesErrorCode::NoSubscriber.code(),
        }
    }

    fn get_sticky_common_event(&self, event: &str) -> Option<CommonEventData> {
        self.sticky.lock().get(event).cloned()
    }

    fn dump_state(&self, _dump_type: u8, event: &str, user_id: i32) -> Vec<String> {
        let mut lines = Vec::new();
        for subscriber in self.subscribers.read().iter() {
            let info = &subscriber.info;
            if !event.is_empty() && !info.matching_skills.has_event(event) {
                continue;
            }
            if user_id != 0 && info.user_id != user_id {
                continue;
            }
            lines.push(format!(
                "subscriber events={:?} priority={} user={}",
                info.matching_skills.events, info.priority, info.user_id
            ));
        }
        let mut sticky: Vec<String> = self
            .sticky
            .lock()
            .keys()
            .filter(|name| event.is_empty() || name.as_str() == event)
            .map(|name| format!("sticky event={name}"))
            .collect();
        sticky.sort();
        lines.extend(sticky);
        lines
    }

    fn finish_receiver(&self, _proxy: &Arc<dyn RemoteObject>, code: i32, data: &str, abort: bool) -> bool {
        self.finished.lock().push(FinishRecord {
            code,
            data: data.to_owned(),
            abort,
        });
        true
    }

    fn freeze(&self, uid: i32) -> bool {
        self.freeze.lock().frozen.insert(uid);
        true
    }

    fn unfreeze(&self, uid: i32) -> bool {
        let (was_frozen, drained) = {
            let mut state = self.freeze.lock();
            let was_frozen = state.frozen.contains(&uid);
            (was_frozen, state.thaw(&[uid]))
        };
        self.flush(drained);
        was_frozen
    }

    fn unfreeze_all(&self) -> bool {
        let drained = {
            let mut state = self.freeze.lock();
            let uids: Vec<i32> = state.frozen.iter().copied().collect();
            state.thaw(&uids)
        };
        self.flush(drained);
        true
    }

    fn remove_sticky_common_event(&self, event: &str) -> i32 {
        if self.sticky.lock().remove(event).is_some() {
            CesErrorCode::Ok.code()
        } else {
            CesErrorCode::ParamInvalid.code()
        }
    }

    fn set_static_subscriber_state(&self, enable: bool) -> i32 {
        *self.static_enabled.lock() = enable;
        CesErrorCode::Ok.code()
    }

    fn set_static_subscriber_events_state(&self, events: &[String], enable: bool) -> i32 {
        let mut switched = self.static_events.lock();
        for event in events {
            if enable {
                switched.insert(event.clone());
            } else {
                switched.remove(event);
            }
        }
        CesErrorCode::Ok.code()
    }

    fn set_freeze_status(&self, pids: &[i32], is_freeze: bool) -> bool {
        let mut frozen = self.frozen_pids.lock();
        for pid in pids {
            if is_freeze {
                frozen.insert(*pid);
            } else {
                frozen.remove(pid);
            }
        }
        true
    }
}

impl std::fmt::Debug for InMemoryCommonEventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCommonEventService")
            .field("subscribers", &self.subscriber_count())
            .field("sticky", &self.sticky.lock().len())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
