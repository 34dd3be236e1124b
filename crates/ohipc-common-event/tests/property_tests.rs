//! Property tests for the common event stub and matching skills.

use std::sync::Arc;

use proptest::prelude::*;

use ohipc_common_event::{
    COMMON_EVENT_DESCRIPTOR, CommonEventInterfaceCode, CommonEventService, CommonEventStub,
    MatchingSkills,
};
use ohipc_core::{IpcStub, MessageOption, MessageParcel, Parcelable};
use ohipc_types::Want;

struct Defaults;

impl CommonEventService for Defaults {}

fn event_name() -> impl Strategy<Value = String> {
    "usual\\.event\\.[A-Z_]{1,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Arbitrary argument words after a valid token never panic the stub,
    /// and every failure carries a wire status.
    #[test]
    fn prop_garbage_arguments_yield_status(
        code in prop::sample::select(CommonEventInterfaceCode::ALL.to_vec()),
        words in prop::collection::vec(any::<i32>(), 0..32),
    ) {
        let stub = CommonEventStub::new(Arc::new(Defaults));
        let mut data = MessageParcel::new();
        prop_assert!(data.write_interface_token(COMMON_EVENT_DESCRIPTOR).is_ok());
        for word in &words {
            prop_assert!(data.write_i32(*word).is_ok());
        }
        let result = stub.on_remote_request(
            code.code(),
            &mut data,
            &mut MessageParcel::new(),
            &MessageOption::sync(),
        );
        if let Err(e) = result {
            prop_assert!(e.status_code().is_some(), "{code:?} failed without a status: {e}");
        }
    }

    /// Skills accept exactly the listed event names, before and after a
    /// trip through a parcel.
    #[test]
    fn prop_skills_match_listed_events(
        events in prop::collection::vec(event_name(), 1..8),
        probe in event_name(),
    ) {
        let skills = MatchingSkills::for_events(events.iter().cloned());
        let mut parcel = MessageParcel::new();
        prop_assert!(skills.marshal(&mut parcel).is_ok());
        let decoded = MatchingSkills::unmarshal(&mut parcel);
        prop_assert_eq!(decoded.as_ref().ok(), Some(&skills));

        let listed = events.contains(&probe);
        prop_assert_eq!(skills.matches(&Want::new(probe.as_str())), listed);
        for event in &events {
            prop_assert!(skills.matches(&Want::new(event.as_str())));
        }
    }
}
