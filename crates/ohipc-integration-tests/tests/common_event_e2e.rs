//! Common event publish/subscribe across the worker pool.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use ohipc_common_event::{
    CesErrorCode, CommonEventProxy, CommonEventPublishInfo, CommonEventStub,
    CommonEventSubscribeInfo, EventReceiveStub, InMemoryCommonEventService, MatchingSkills,
};
use ohipc_core::{IpcRuntime, RemoteHandle, RemoteObject};
use ohipc_integration_tests::{
    DELIVERY_TIMEOUT, Delivery, EventRecorder, event, test_runtime, wait_until,
};

const TIME_TICK: &str = "usual.event.TIME_TICK";
const BATTERY_LOW: &str = "usual.event.BATTERY_LOW";
const OWNER: i32 = 100;

struct Harness {
    runtime: IpcRuntime,
    service: Arc<InMemoryCommonEventService>,
    proxy: CommonEventProxy,
}

impl Harness {
    fn start() -> Result<Self> {
        let runtime = test_runtime()?;
        let service = InMemoryCommonEventService::new();
        let remote: Arc<dyn RemoteObject> =
            runtime.publish(Arc::new(CommonEventStub::new(service.clone())))?;
        Ok(Self {
            runtime,
            service,
            proxy: CommonEventProxy::new(remote),
        })
    }

    /// Publish a recorder and subscribe it to `events`.
    fn subscribe(&self, events: &[&str]) -> Result<(Arc<RemoteHandle>, Receiver<Delivery>)> {
        let (recorder, rx) = EventRecorder::channel();
        let handle = self.runtime.publish(Arc::new(EventReceiveStub::new(recorder)))?;
        let listener: Arc<dyn RemoteObject> = handle.clone();
        let info = CommonEventSubscribeInfo::new(MatchingSkills::for_events(events.iter().copied()))
            .with_user_id(OWNER);
        let code = self.proxy.subscribe_common_event(&info, &listener, 0);
        anyhow::ensure!(code == CesErrorCode::Ok.code(), "subscribe failed with {code}");
        Ok((handle, rx))
    }
}

fn next(rx: &Receiver<Delivery>) -> Result<Delivery> {
    rx.recv_timeout(DELIVERY_TIMEOUT)
        .context("no event delivered in time")
}

#[test]
fn test_published_event_reaches_subscriber() -> Result<()> {
    let harness = Harness::start()?;
    let (_handle, rx) = harness.subscribe(&[TIME_TICK])?;

    let data = event(TIME_TICK).with_result(3, "tick");
    let code = harness
        .proxy
        .publish_common_event(&data, &CommonEventPublishInfo::new(), None, OWNER);
    assert_eq!(code, CesErrorCode::Ok.code());

    let delivery = next(&rx)?;
    assert_eq!(delivery.event, TIME_TICK);
    assert_eq!(delivery.code, 3);
    assert_eq!(delivery.data, "tick");
    assert!(!delivery.ordered);
    assert!(!delivery.sticky);
    Ok(())
}

#[test]
fn test_unmatched_event_is_not_delivered() -> Result<()> {
    let harness = Harness::start()?;
    let (_handle, rx) = harness.subscribe(&[TIME_TICK])?;

    harness
        .proxy
        .publish_common_event(&event(BATTERY_LOW), &CommonEventPublishInfo::new(), None, OWNER);

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    Ok(())
}

#[test]
fn test_empty_action_is_rejected_by_service() -> Result<()> {
    let harness = Harness::start()?;
    let code = harness
        .proxy
        .publish_common_event(&event(""), &CommonEventPublishInfo::new(), None, OWNER);
    assert_eq!(code, CesErrorCode::WantActionIsNull.code());
    Ok(())
}

#[test]
fn test_sticky_event_replayed_to_late_subscriber() -> Result<()> {
    let harness = Harness::start()?;
    let info = CommonEventPublishInfo::new().sticky(true);
    harness
        .proxy
        .publish_common_event(&event(BATTERY_LOW), &info, None, OWNER);

    let sticky = harness
        .proxy
        .get_sticky_common_event(BATTERY_LOW)
        .context("sticky event cached")?;
    assert_eq!(sticky.event(), BATTERY_LOW);

    let (_handle, rx) = harness.subscribe(&[BATTERY_LOW])?;
    let delivery = next(&rx)?;
    assert_eq!(delivery.event, BATTERY_LOW);
    assert!(delivery.sticky);

    assert_eq!(
        harness.proxy.remove_sticky_common_event(BATTERY_LOW),
        CesErrorCode::Ok.code()
    );
    assert!(harness.proxy.get_sticky_common_event(BATTERY_LOW).is_none());
    Ok(())
}

#[test]
fn test_frozen_owner_receives_after_unfreeze() -> Result<()> {
    let harness = Harness::start()?;
    let (_handle, rx) = harness.subscribe(&[TIME_TICK])?;

    assert!(harness.proxy.freeze(OWNER));
    harness
        .proxy
        .publish_common_event(&event(TIME_TICK), &CommonEventPublishInfo::new(), None, OWNER);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(harness.service.pending_count(), 1);

    assert!(harness.proxy.unfreeze(OWNER));
    assert_eq!(next(&rx)?.event, TIME_TICK);
    assert_eq!(harness.service.pending_count(), 0);
    Ok(())
}

#[test]
fn test_unsubscribed_listener_gets_nothing() -> Result<()> {
    let harness = Harness::start()?;
    let (handle, rx) = harness.subscribe(&[TIME_TICK])?;
    let listener: Arc<dyn RemoteObject> = handle;

    assert_eq!(
        harness.proxy.unsubscribe_common_event(&listener),
        CesErrorCode::Ok.code()
    );
    assert_eq!(
        harness.proxy.unsubscribe_common_event(&listener),
        CesErrorCode::NoSubscriber.code()
    );

    harness
        .proxy
        .publish_common_event(&event(TIME_TICK), &CommonEventPublishInfo::new(), None, OWNER);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    Ok(())
}

#[test]
fn test_dead_subscriber_is_removed() -> Result<()> {
    let harness = Harness::start()?;
    let (handle, _rx) = harness.subscribe(&[TIME_TICK])?;
    let (_survivor, survivor_rx) = harness.subscribe(&[TIME_TICK])?;
    assert_eq!(harness.service.subscriber_count(), 2);

    handle.kill();
    assert!(wait_until(DELIVERY_TIMEOUT, || harness.service.subscriber_count() == 1));

    harness
        .proxy
        .publish_common_event(&event(TIME_TICK), &CommonEventPublishInfo::new(), None, OWNER);
    assert_eq!(next(&survivor_rx)?.event, TIME_TICK);
    Ok(())
}

#[test]
fn test_dump_lists_live_subscribers() -> Result<()> {
    let harness = Harness::start()?;
    let (_handle, _rx) = harness.subscribe(&[TIME_TICK])?;
    let lines = harness.proxy.dump_state(0, "", 0);
    assert_eq!(lines.len(), 1);
    assert!(lines.iter().all(|line| line.contains(TIME_TICK)));
    Ok(())
}

#[test]
fn test_service_death_fails_later_calls() -> Result<()> {
    let harness = Harness::start()?;
    harness.runtime.shutdown();
    let code = harness
        .proxy
        .publish_common_event(&event(TIME_TICK), &CommonEventPublishInfo::new(), None, OWNER);
    assert_eq!(code, CesErrorCode::SendError.code());
    assert!(!harness.proxy.freeze(OWNER));
    Ok(())
}
