//! Property tests over the running transport.

use std::sync::Arc;

use proptest::prelude::*;

use ohipc_common_event::{
    CesErrorCode, CommonEventProxy, CommonEventPublishInfo, CommonEventStub,
    CommonEventSubscribeInfo, EventReceiveStub, InMemoryCommonEventService, MatchingSkills,
};
use ohipc_core::RemoteObject;
use ohipc_integration_tests::{DELIVERY_TIMEOUT, EventRecorder, event, test_runtime_with};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever result code and data a publisher attaches reach the
    /// subscriber unchanged.
    #[test]
    fn prop_event_payload_reaches_subscriber(
        suffix in "[A-Z_]{1,16}",
        code in any::<i32>(),
        data in "\\PC{0,64}",
    ) {
        let name = format!("usual.event.{suffix}");
        let runtime = test_runtime_with(2);
        prop_assert!(runtime.is_ok());
        let Ok(runtime) = runtime else { return Ok(()) };

        let service: Arc<dyn RemoteObject> = match runtime
            .publish(Arc::new(CommonEventStub::new(InMemoryCommonEventService::new())))
        {
            Ok(handle) => handle,
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };
        let proxy = CommonEventProxy::new(service);

        let (recorder, rx) = EventRecorder::channel();
        let listener: Arc<dyn RemoteObject> =
            match runtime.publish(Arc::new(EventReceiveStub::new(recorder))) {
                Ok(handle) => handle,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            };
        let info = CommonEventSubscribeInfo::new(MatchingSkills::for_events([name.as_str()]));
        prop_assert_eq!(
            proxy.subscribe_common_event(&info, &listener, 0),
            CesErrorCode::Ok.code()
        );

        let published = event(&name).with_result(code, data.as_str());
        prop_assert_eq!(
            proxy.publish_common_event(&published, &CommonEventPublishInfo::new(), None, 0),
            CesErrorCode::Ok.code()
        );

        let delivery = rx.recv_timeout(DELIVERY_TIMEOUT);
        prop_assert!(delivery.is_ok());
        if let Ok(delivery) = delivery {
            prop_assert_eq!(delivery.event, name);
            prop_assert_eq!(delivery.code, code);
            prop_assert_eq!(delivery.data, data);
        }
    }
}
