//! Property tests: decoding arbitrary input never panics and encoded
//! values decode to themselves.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_types::prelude::*;
use proptest::prelude::*;

fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        any::<bool>().prop_map(ParamValue::Bool),
        any::<i32>().prop_map(ParamValue::Int),
        any::<i64>().prop_map(ParamValue::Long),
        (-1.0e9f64..1.0e9).prop_map(ParamValue::Double),
        ".{0,16}".prop_map(ParamValue::String),
        prop::collection::vec("[a-z]{0,8}", 0..4).prop_map(ParamValue::StringArray),
    ]
}

fn want() -> impl Strategy<Value = Want> {
    (
        "[a-z.]{0,24}",
        prop::option::of(("[a-z.]{1,12}", "[A-Za-z]{1,12}")),
        prop::collection::vec("[a-z.]{1,12}", 0..3),
        prop::option::of("[a-z]{1,8}:///[a-z/]{0,16}"),
        any::<u32>(),
        prop::collection::btree_map("[a-z]{1,6}", param_value(), 0..6),
    )
        .prop_map(|(action, element, entities, uri, flags, params)| {
            let mut want = Want::new(action).with_flags(flags);
            if let Some((bundle, ability)) = element {
                want = want.with_element(ElementName::new(bundle, ability));
            }
            if let Some(uri) = uri {
                want = want.with_uri(uri);
            }
            for entity in entities {
                want = want.with_entity(entity);
            }
            for (key, value) in params {
                want = want.with_param(key, value);
            }
            want
        })
}

proptest! {
    #[test]
    fn prop_want_decodes_to_itself(want in want()) {
        let mut parcel = MessageParcel::new();
        prop_assert!(matches!(want.marshal(&mut parcel), Ok(())));
        let decoded = Want::unmarshal(&mut parcel);
        prop_assert_eq!(decoded.ok(), Some(want));
        prop_assert_eq!(parcel.remaining(), 0);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut parcel = MessageParcel::from_bytes(&bytes);
        let _want = Want::unmarshal(&mut parcel);
        let mut parcel = MessageParcel::from_bytes(&bytes);
        let _map = PacMap::unmarshal(&mut parcel);
        let mut parcel = MessageParcel::from_bytes(&bytes);
        let _info = AbilitySessionInfo::read_from(&mut parcel, SessionInfoLayout::Activation);
    }
}
