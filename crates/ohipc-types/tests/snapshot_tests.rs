//! Snapshot tests for serialized forms.

use insta::assert_snapshot;
use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::ParcelResult;
use ohipc_types::prelude::*;

#[test]
fn test_want_json() -> Result<(), serde_json::Error> {
    let want = Want::new("usual.event.SCREEN_ON")
        .with_element(ElementName::new("com.example", "Main"))
        .with_param("user", 100);
    assert_snapshot!(
        serde_json::to_string(&want)?,
        @r#"{"action":"usual.event.SCREEN_ON","element":{"device_id":"","bundle_name":"com.example","ability_name":"Main","module_name":""},"entities":[],"uri":null,"flags":0,"mime_type":"","params":{"user":{"type":"int","value":100}}}"#
    );
    Ok(())
}

#[test]
fn test_param_value_wire_bytes() -> ParcelResult<()> {
    let mut parcel = MessageParcel::new();
    ParamValue::Int(-2).marshal(&mut parcel)?;
    ParamValue::Bool(true).marshal(&mut parcel)?;
    let hex = parcel
        .as_bytes()
        .chunks(4)
        .map(|word| word.iter().map(|b| format!("{b:02x}")).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    assert_snapshot!(hex, @"02000000 feffffff 01000000 01000000");
    Ok(())
}
