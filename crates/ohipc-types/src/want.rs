//! The `Want` request object.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::ParcelResult;
use serde::{Deserialize, Serialize};

use crate::params::WantParams;
use crate::uri::Uri;

/// Fully qualified name of an ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementName {
    /// Device the ability runs on, empty for the local device.
    pub device_id: String,
    /// Owning bundle.
    pub bundle_name: String,
    /// Ability name inside the bundle.
    pub ability_name: String,
    /// Module name inside the bundle.
    pub module_name: String,
}

impl ElementName {
    /// Name a local ability.
    pub fn new(bundle_name: impl Into<String>, ability_name: impl Into<String>) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            ability_name: ability_name.into(),
            ..Self::default()
        }
    }

    /// Set the module name.
    #[must_use]
    pub fn with_module(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    /// `bundle/ability` form used in logs.
    #[must_use]
    pub fn uri(&self) -> String {
        if self.device_id.is_empty() {
            format!("/{}/{}", self.bundle_name, self.ability_name)
        } else {
            format!("{}/{}/{}", self.device_id, self.bundle_name, self.ability_name)
        }
    }
}

impl Parcelable for ElementName {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string(&self.device_id)?;
        parcel.write_string(&self.bundle_name)?;
        parcel.write_string(&self.ability_name)?;
        parcel.write_string(&self.module_name)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            device_id: parcel.read_string()?,
            bundle_name: parcel.read_string()?,
            ability_name: parcel.read_string()?,
            module_name: parcel.read_string()?,
        })
    }
}

/// Description of an operation to perform: which ability, what action,
/// on which data, with which extra parameters.
///
/// # Examples
///
/// ```
/// use ohipc_types::{ElementName, Want};
///
/// let want = Want::new("usual.event.SCREEN_ON")
///     .with_element(ElementName::new("com.example.notes", "MainAbility"))
///     .with_param("user", 100);
/// assert_eq!(want.params.get_int("user"), Some(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Want {
    /// Action name; for common events this is the event name.
    pub action: String,
    /// Target ability, absent for implicit wants.
    pub element: Option<ElementName>,
    /// Entity categories.
    pub entities: Vec<String>,
    /// Data the action applies to.
    pub uri: Option<Uri>,
    /// Flag bits.
    pub flags: u32,
    /// MIME type of the data.
    pub mime_type: String,
    /// Extra parameters.
    pub params: WantParams,
}

impl Want {
    /// A want carrying only `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    /// Set the target ability.
    #[must_use]
    pub fn with_element(mut self, element: ElementName) -> Self {
        self.element = Some(element);
        self
    }

    /// Set the data identifier.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<Uri>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Add an entity.
    #[must_use]
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Set the flag bits.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Add an extra parameter.
    #[must_use]
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::params::ParamValue>,
    ) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Whether `entity` is listed.
    #[must_use]
    pub fn has_entity(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }
}

impl Parcelable for Want {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string(&self.action)?;
        parcel.write_parcelable(self.element.as_ref())?;
        parcel.write_string_vector(&self.entities)?;
        parcel.write_nullable_string(self.uri.as_ref().map(Uri::as_str))?;
        parcel.write_u32(self.flags)?;
        parcel.write_string(&self.mime_type)?;
        self.params.marshal(parcel)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            action: parcel.read_string()?,
            element: parcel.read_parcelable()?,
            entities: parcel.read_string_vector()?,
            uri: parcel.read_nullable_string()?.map(Uri::from),
            flags: parcel.read_u32()?,
            mime_type: parcel.read_string()?,
            params: WantParams::unmarshal(parcel)?,
        })
    }
}
