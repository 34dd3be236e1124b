//! Property tests for the parcel codec and token check.

use proptest::prelude::*;

use ohipc_core::{CYCLE_LIMIT, MessageParcel, check_interface_token};
use ohipc_errors::{IpcError, ParcelError};

#[derive(Debug, Clone)]
enum Field {
    Int(i32),
    Long(i64),
    Flag(bool),
    Text(String),
    Wide(String),
    Maybe(Option<String>),
}

fn field() -> impl Strategy<Value = Field> {
    prop_oneof![
        any::<i32>().prop_map(Field::Int),
        any::<i64>().prop_map(Field::Long),
        any::<bool>().prop_map(Field::Flag),
        ".{0,24}".prop_map(Field::Text),
        ".{0,24}".prop_map(Field::Wide),
        proptest::option::of(".{0,12}").prop_map(Field::Maybe),
    ]
}

fn write(parcel: &mut MessageParcel, field: &Field) -> Result<(), ParcelError> {
    match field {
        Field::Int(v) => parcel.write_i32(*v),
        Field::Long(v) => parcel.write_i64(*v),
        Field::Flag(v) => parcel.write_bool(*v),
        Field::Text(v) => parcel.write_string(v),
        Field::Wide(v) => parcel.write_string16(v),
        Field::Maybe(v) => parcel.write_nullable_string(v.as_deref()),
    }
}

fn read_matches(parcel: &mut MessageParcel, field: &Field) -> Result<bool, ParcelError> {
    Ok(match field {
        Field::Int(v) => parcel.read_i32()? == *v,
        Field::Long(v) => parcel.read_i64()? == *v,
        Field::Flag(v) => parcel.read_bool()? == *v,
        Field::Text(v) => parcel.read_string()? == *v,
        Field::Wide(v) => parcel.read_string16()? == *v,
        Field::Maybe(v) => parcel.read_nullable_string()? == *v,
    })
}

proptest! {
    #[test]
    fn prop_fields_read_back_in_write_order(fields in prop::collection::vec(field(), 0..16)) {
        let mut parcel = MessageParcel::new();
        for f in &fields {
            prop_assert!(write(&mut parcel, f).is_ok());
        }
        prop_assert_eq!(parcel.data_size() % 4, 0);
        for f in &fields {
            prop_assert_eq!(read_matches(&mut parcel, f), Ok(true));
        }
        prop_assert_eq!(parcel.remaining(), 0);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut parcel = MessageParcel::from_bytes(&bytes);
        let _token = parcel.read_interface_token();
        let _count = parcel.read_count();
        let _strings = parcel.read_string_vector();
        let _object = parcel.read_remote_object();
        prop_assert!(parcel.read_position() <= bytes.len());
    }

    #[test]
    fn prop_count_limit_enforced(count in any::<i32>()) {
        let mut parcel = MessageParcel::new();
        prop_assert!(parcel.write_i32(count).is_ok());
        let result = parcel.read_count();
        if count < 0 {
            prop_assert_eq!(result, Err(ParcelError::InvalidLength(count)));
        } else if usize::try_from(count).unwrap_or(usize::MAX) > CYCLE_LIMIT {
            let is_too_large = matches!(result, Err(ParcelError::CollectionTooLarge { .. }));
            prop_assert!(is_too_large);
        } else {
            prop_assert_eq!(result.ok().and_then(|c| i32::try_from(c).ok()), Some(count));
        }
    }

    #[test]
    fn prop_token_check_accepts_only_exact_descriptor(
        descriptor in "[A-Za-z.]{1,32}",
        token in "[A-Za-z.]{1,32}",
    ) {
        let mut parcel = MessageParcel::new();
        prop_assert!(parcel.write_interface_token(&token).is_ok());
        let result = check_interface_token(&descriptor, &mut parcel);
        if descriptor == token {
            prop_assert_eq!(result, Ok(()));
        } else {
            let is_mismatch = matches!(result, Err(IpcError::IdentityMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }
}
