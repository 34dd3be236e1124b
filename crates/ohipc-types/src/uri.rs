//! Resource identifiers.

use std::fmt;

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::ParcelResult;
use serde::{Deserialize, Serialize};

/// A resource identifier such as `dataability:///com.example.notes/items/3`.
///
/// The string is carried verbatim; no parsing happens on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    /// Wrap `value`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scheme part before the first `:`, if any.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once(':').map(|(scheme, _rest)| scheme)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Uri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Parcelable for Uri {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string(&self.0)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        parcel.read_string().map(Self)
    }
}
