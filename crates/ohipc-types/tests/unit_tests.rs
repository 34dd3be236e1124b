//! Unit tests for the shared parcelable types.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use ohipc_types::prelude::*;

fn notes_want() -> Want {
    Want::new("ohos.want.action.viewData")
        .with_element(ElementName::new("com.example.notes", "MainAbility").with_module("entry"))
        .with_uri("dataability:///com.example.notes/items/3")
        .with_entity("entity.system.home")
        .with_flags(0x10)
        .with_param("userId", 100)
        .with_param("tags", vec!["a".to_string(), "b".to_string()])
}

mod want_tests {
    use super::*;

    #[test]
    fn test_full_want_survives_parcel() -> ParcelResult<()> {
        let want = notes_want();
        let mut parcel = MessageParcel::new();
        parcel.write_parcelable(Some(&want))?;
        let decoded = parcel.read_required_parcelable::<Want>("want")?;
        assert_eq!(decoded, want);
        assert!(decoded.has_entity("entity.system.home"));
        assert_eq!(decoded.uri.as_ref().and_then(Uri::scheme), Some("dataability"));
        Ok(())
    }

    #[test]
    fn test_required_want_absent() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_parcelable::<Want>(None)?;
        let result = parcel.read_required_parcelable::<Want>("want");
        assert!(matches!(result, Err(ParcelError::UnexpectedNull("want"))));
        Ok(())
    }

    #[test]
    fn test_wants_in_sequence() -> ParcelResult<()> {
        let first = notes_want();
        let second = Want::new("second");
        let mut parcel = MessageParcel::new();
        parcel.write_vec(&[first.clone(), second.clone()])?;
        parcel.write_i32(77)?;
        let wants = parcel.read_vec::<Want>()?;
        assert_eq!(wants, vec![first, second]);
        assert_eq!(parcel.read_i32()?, 77);
        Ok(())
    }
}

mod params_tests {
    use super::*;

    #[test]
    fn test_remove_and_replace() {
        let mut params = WantParams::new();
        assert_eq!(params.insert("k", 1), None);
        assert_eq!(params.insert("k", "v"), Some(ParamValue::Int(1)));
        assert!(params.contains_key("k"));
        assert_eq!(params.remove("k"), Some(ParamValue::String("v".to_string())));
        assert!(params.is_empty());
    }

    #[test]
    fn test_negative_entry_count() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(-3)?;
        let result = PacMap::unmarshal(&mut parcel);
        assert!(matches!(result, Err(ParcelError::InvalidLength(-3))));
        Ok(())
    }
}

mod session_info_tests {
    use super::*;
    use ohipc_test_helpers::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_caller_token_travels_in_side_table() -> ParcelResult<()> {
        let caller: Arc<dyn ohipc_core::RemoteObject> = MockRemoteObject::new("test.ICaller");
        let info = AbilitySessionInfo {
            caller_token: Some(Arc::clone(&caller)),
            result_code: 3,
            ..AbilitySessionInfo::new(Want::new("finish"))
        };
        let mut parcel = MessageParcel::new();
        info.write_to(&mut parcel, SessionInfoLayout::Termination)?;
        assert_eq!(parcel.object_count(), 1);

        let decoded = AbilitySessionInfo::read_from(&mut parcel, SessionInfoLayout::Termination)?;
        let token = must_some(decoded.caller_token, "caller token");
        assert!(Arc::ptr_eq(&token, &caller));
        assert_eq!(decoded.result_code, 3);
        Ok(())
    }

    #[test]
    fn test_short_parcel_defaults_scalars() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_parcelable(Some(&Want::new("only want")))?;
        let decoded = AbilitySessionInfo::read_from(&mut parcel, SessionInfoLayout::Activation)?;
        assert_eq!(decoded.want.action, "only want");
        assert_eq!(decoded.persistent_id, 0);
        assert_eq!(decoded.state, CallToState::Unknown);
        assert!(decoded.caller_token.is_none());
        assert!(decoded.start_setting.is_none());
        Ok(())
    }
}
