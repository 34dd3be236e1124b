//! Typed key/value bags.
//!
//! Each entry is written as key, type tag, value. The entry count is
//! validated against the parcel's collection limit before any entry is
//! read, and an unknown tag fails the read.

use std::collections::BTreeMap;

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};

const TAG_BOOL: u32 = 1;
const TAG_INT: u32 = 2;
const TAG_LONG: u32 = 3;
const TAG_DOUBLE: u32 = 4;
const TAG_STRING: u32 = 5;
const TAG_STRING_ARRAY: u32 = 6;

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    /// Boolean.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// List of strings.
    StringArray(Vec<String>),
}

impl ParamValue {
    fn tag(&self) -> u32 {
        match self {
            ParamValue::Bool(_) => TAG_BOOL,
            ParamValue::Int(_) => TAG_INT,
            ParamValue::Long(_) => TAG_LONG,
            ParamValue::Double(_) => TAG_DOUBLE,
            ParamValue::String(_) => TAG_STRING,
            ParamValue::StringArray(_) => TAG_STRING_ARRAY,
        }
    }
}

impl Parcelable for ParamValue {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_u32(self.tag())?;
        match self {
            ParamValue::Bool(v) => parcel.write_bool(*v),
            ParamValue::Int(v) => parcel.write_i32(*v),
            ParamValue::Long(v) => parcel.write_i64(*v),
            ParamValue::Double(v) => parcel.write_f64(*v),
            ParamValue::String(v) => parcel.write_string(v),
            ParamValue::StringArray(v) => parcel.write_string_vector(v),
        }
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let value = match parcel.read_u32()? {
            TAG_BOOL => ParamValue::Bool(parcel.read_bool()?),
            TAG_INT => ParamValue::Int(parcel.read_i32()?),
            TAG_LONG => ParamValue::Long(parcel.read_i64()?),
            TAG_DOUBLE => ParamValue::Double(parcel.read_f64()?),
            TAG_STRING => ParamValue::String(parcel.read_string()?),
            TAG_STRING_ARRAY => ParamValue::StringArray(parcel.read_string_vector()?),
            other => return Err(ParcelError::invalid_enum("param value type", other)),
        };
        Ok(value)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Long(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(v: Vec<String>) -> Self {
        ParamValue::StringArray(v)
    }
}

fn write_entries(
    entries: &BTreeMap<String, ParamValue>,
    parcel: &mut MessageParcel,
) -> ParcelResult<()> {
    parcel.write_count(entries.len())?;
    for (key, value) in entries {
        parcel.write_string(key)?;
        value.marshal(parcel)?;
    }
    Ok(())
}

fn read_entries(parcel: &mut MessageParcel) -> ParcelResult<BTreeMap<String, ParamValue>> {
    let count = parcel.read_count()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key = parcel.read_string()?;
        let value = ParamValue::unmarshal(parcel)?;
        entries.insert(key, value);
    }
    Ok(entries)
}

macro_rules! typed_bag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            entries: BTreeMap<String, ParamValue>,
        }

        impl $name {
            /// Create an empty bag.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Insert or replace `key`, returning the previous value.
            pub fn insert(
                &mut self,
                key: impl Into<String>,
                value: impl Into<ParamValue>,
            ) -> Option<ParamValue> {
                self.entries.insert(key.into(), value.into())
            }

            /// Builder-style insert.
            #[must_use]
            pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
                self.insert(key, value);
                self
            }

            /// Value stored under `key`.
            #[must_use]
            pub fn get(&self, key: &str) -> Option<&ParamValue> {
                self.entries.get(key)
            }

            /// String stored under `key`, if it is a string.
            #[must_use]
            pub fn get_string(&self, key: &str) -> Option<&str> {
                match self.entries.get(key) {
                    Some(ParamValue::String(v)) => Some(v),
                    _ => None,
                }
            }

            /// Integer stored under `key`, if it is an `Int`.
            #[must_use]
            pub fn get_int(&self, key: &str) -> Option<i32> {
                match self.entries.get(key) {
                    Some(ParamValue::Int(v)) => Some(*v),
                    _ => None,
                }
            }

            /// Boolean stored under `key`, if it is a `Bool`.
            #[must_use]
            pub fn get_bool(&self, key: &str) -> Option<bool> {
                match self.entries.get(key) {
                    Some(ParamValue::Bool(v)) => Some(*v),
                    _ => None,
                }
            }

            /// Remove `key`.
            pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
                self.entries.remove(key)
            }

            /// Whether `key` is present.
            #[must_use]
            pub fn contains_key(&self, key: &str) -> bool {
                self.entries.contains_key(key)
            }

            /// Number of entries.
            #[must_use]
            pub fn len(&self) -> usize {
                self.entries.len()
            }

            /// Whether the bag is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }

            /// Entries in key order.
            pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
                self.entries.iter().map(|(k, v)| (k.as_str(), v))
            }
        }

        impl Parcelable for $name {
            fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
                write_entries(&self.entries, parcel)
            }

            fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
                read_entries(parcel).map(|entries| Self { entries })
            }
        }
    };
}

typed_bag! {
    /// Extra parameters attached to a [`Want`](crate::Want).
    WantParams
}

typed_bag! {
    /// Key/value bag used to save and restore ability state.
    PacMap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_accessors() {
        let params = WantParams::new()
            .with("name", "notes")
            .with("count", 3)
            .with("visible", true);
        assert_eq!(params.get_string("name"), Some("notes"));
        assert_eq!(params.get_int("count"), Some(3));
        assert_eq!(params.get_bool("visible"), Some(true));
        assert_eq!(params.get_int("name"), None);
        assert_eq!(
            params.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["count", "name", "visible"]
        );
    }

    #[test]
    fn test_unknown_tag_rejected() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_count(1)?;
        parcel.write_string("k")?;
        parcel.write_u32(99)?;
        let result = PacMap::unmarshal(&mut parcel);
        assert!(matches!(
            result,
            Err(ParcelError::InvalidEnum { value: 99, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_count_checked_before_entries() -> ParcelResult<()> {
        let mut parcel = MessageParcel::new();
        parcel.write_i32(2001)?;
        let result = WantParams::unmarshal(&mut parcel);
        assert!(matches!(
            result,
            Err(ParcelError::CollectionTooLarge { count: 2001, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_round_trip_all_types() -> ParcelResult<()> {
        let map = PacMap::new()
            .with("b", false)
            .with("i", -7)
            .with("l", i64::MAX)
            .with("d", 0.5)
            .with("s", "text")
            .with("a", vec!["x".to_string(), "y".to_string()]);
        let mut parcel = MessageParcel::new();
        map.marshal(&mut parcel)?;
        assert_eq!(PacMap::unmarshal(&mut parcel)?, map);
        assert_eq!(parcel.remaining(), 0);
        Ok(())
    }
}
