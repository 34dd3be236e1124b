//! Fuzzes the parcel reader.
//!
//! The first byte picks a read sequence, the rest is the parcel buffer.
//! Must never panic and must never read past the buffer.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_parcel_read
#![no_main]
use libfuzzer_sys::fuzz_target;
use ohipc_core::MessageParcel;
use ohipc_types::{AbilityStartSetting, Want, WantParams};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let mut parcel = MessageParcel::from_bytes(body);
    parcel.set_limits(64 * 1024, 256);

    for step in 0..8u8 {
        let start = parcel.read_position();
        let ok = match selector.wrapping_add(step) % 10 {
            0 => parcel.read_interface_token().is_ok(),
            1 => parcel.read_string().is_ok(),
            2 => parcel.read_string16().is_ok(),
            3 => parcel.read_bytes().is_ok(),
            4 => parcel.read_string_vector().is_ok(),
            5 => parcel.read_parcelable::<Want>().is_ok(),
            6 => parcel.read_parcelable::<WantParams>().is_ok(),
            7 => parcel.read_parcelable::<AbilityStartSetting>().is_ok(),
            8 => parcel.read_nullable_string().is_ok(),
            _ => parcel.read_i64().is_ok(),
        };
        assert!(parcel.read_position() <= body.len());
        if !ok || parcel.read_position() == start {
            break;
        }
    }
});
