//! Ability session records exchanged with the window layer.
//!
//! An [`AbilitySessionInfo`] is never sent whole. Each operation carries the
//! subset of fields it needs, in a fixed order, chosen with
//! [`SessionInfoLayout`]. The want is always first and always required.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ohipc_core::{MessageParcel, Parcelable, RemoteObject};
use ohipc_errors::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};

use crate::want::Want;

/// Lifecycle state the caller asks the ability to move to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum CallToState {
    /// No preference.
    #[default]
    Unknown = 0,
    /// Bring to the foreground.
    Foreground = 1,
    /// Move to the background.
    Background = 2,
}

impl CallToState {
    /// Wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire value; unrecognised values read as `Unknown`.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => CallToState::Foreground,
            2 => CallToState::Background,
            _ => CallToState::Unknown,
        }
    }
}

/// How the started ability's process is arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Process mode selector.
    pub process_mode: i32,
    /// Start options bit set.
    pub start_options: i32,
}

impl Parcelable for ProcessOptions {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_i32(self.process_mode)?;
        parcel.write_i32(self.start_options)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            process_mode: parcel.read_i32()?,
            start_options: parcel.read_i32()?,
        })
    }
}

/// String settings applied when starting an ability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityStartSetting {
    properties: BTreeMap<String, String>,
}

impl AbilityStartSetting {
    /// Empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Parcelable for AbilityStartSetting {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_count(self.properties.len())?;
        for (key, value) in &self.properties {
            parcel.write_string(key)?;
            parcel.write_string(value)?;
        }
        Ok(())
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let count = parcel.read_count()?;
        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let key = parcel.read_string()?;
            properties.insert(key, parcel.read_string()?);
        }
        Ok(Self { properties })
    }
}

/// Which fields of an [`AbilitySessionInfo`] an operation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInfoLayout {
    /// Pending activation: the full start record.
    Activation,
    /// Visibility change: the start record without the continuous-task flag.
    Visibility,
    /// Termination: want, caller token and result code.
    Termination,
    /// Exception report: want, caller token, id and error details.
    Exception,
}

/// Record describing an ability session.
#[derive(Clone, Default)]
pub struct AbilitySessionInfo {
    /// The want that started or targets the ability.
    pub want: Want,
    /// Request code for result delivery.
    pub request_code: i32,
    /// Persistent session id.
    pub persistent_id: i32,
    /// Requested lifecycle state.
    pub state: CallToState,
    /// Ability instance id.
    pub ui_ability_id: i64,
    /// Token id of the calling process.
    pub calling_token_id: u32,
    /// Whether an existing instance may be reused.
    pub reuse: bool,
    /// Process arrangement, if any.
    pub process_options: Option<ProcessOptions>,
    /// Whether the ability holds a continuous task.
    pub has_continuous_task: bool,
    /// Handle of the caller.
    pub caller_token: Option<Arc<dyn RemoteObject>>,
    /// Start settings, if any.
    pub start_setting: Option<AbilityStartSetting>,
    /// Result code on termination.
    pub result_code: i32,
    /// Error code on exception.
    pub error_code: i32,
    /// Error description on exception.
    pub error_reason: String,
}

impl AbilitySessionInfo {
    /// A record carrying only `want`.
    #[must_use]
    pub fn new(want: Want) -> Self {
        Self {
            want,
            ..Self::default()
        }
    }

    /// Write the fields selected by `layout`.
    ///
    /// # Errors
    ///
    /// Fails if the parcel runs out of capacity.
    pub fn write_to(&self, parcel: &mut MessageParcel, layout: SessionInfoLayout) -> ParcelResult<()> {
        parcel.write_parcelable(Some(&self.want))?;
        match layout {
            SessionInfoLayout::Activation | SessionInfoLayout::Visibility => {
                parcel.write_i32(self.request_code)?;
                parcel.write_i32(self.persistent_id)?;
                parcel.write_i32(self.state.code())?;
                parcel.write_i64(self.ui_ability_id)?;
                parcel.write_u32(self.calling_token_id)?;
                parcel.write_bool(self.reuse)?;
                parcel.write_parcelable(self.process_options.as_ref())?;
                if layout == SessionInfoLayout::Activation {
                    parcel.write_bool(self.has_continuous_task)?;
                }
                self.write_caller_token(parcel)?;
                parcel.write_bool(self.start_setting.is_some())?;
                if let Some(setting) = &self.start_setting {
                    parcel.write_parcelable(Some(setting))?;
                }
            }
            SessionInfoLayout::Termination => {
                self.write_caller_token(parcel)?;
                parcel.write_i32(self.result_code)?;
            }
            SessionInfoLayout::Exception => {
                self.write_caller_token(parcel)?;
                parcel.write_i32(self.persistent_id)?;
                parcel.write_i32(self.error_code)?;
                parcel.write_string(&self.error_reason)?;
            }
        }
        Ok(())
    }

    /// Read the fields selected by `layout`.
    ///
    /// The want must be present. The remaining scalars are read leniently:
    /// a field missing from a short parcel takes its default.
    ///
    /// # Errors
    ///
    /// Returns [`ParcelError::UnexpectedNull`] when the want is absent and
    /// any decode error of the want itself.
    pub fn read_from(parcel: &mut MessageParcel, layout: SessionInfoLayout) -> ParcelResult<Self> {
        let want = parcel.read_required_parcelable::<Want>("want")?;
        let mut info = Self::new(want);
        match layout {
            SessionInfoLayout::Activation | SessionInfoLayout::Visibility => {
                info.request_code = parcel.read_i32().unwrap_or_default();
                info.persistent_id = parcel.read_i32().unwrap_or_default();
                info.state = CallToState::from_code(parcel.read_i32().unwrap_or_default());
                info.ui_ability_id = parcel.read_i64().unwrap_or_default();
                info.calling_token_id = parcel.read_u32().unwrap_or_default();
                info.reuse = parcel.read_bool().unwrap_or_default();
                info.process_options = parcel.read_parcelable().ok().flatten();
                if layout == SessionInfoLayout::Activation {
                    info.has_continuous_task = parcel.read_bool().unwrap_or_default();
                }
                info.caller_token = read_caller_token(parcel);
                if parcel.read_bool().unwrap_or_default() {
                    info.start_setting = parcel.read_parcelable().ok().flatten();
                }
            }
            SessionInfoLayout::Termination => {
                info.caller_token = read_caller_token(parcel);
                info.result_code = parcel.read_i32().unwrap_or_default();
            }
            SessionInfoLayout::Exception => {
                info.caller_token = read_caller_token(parcel);
                info.persistent_id = parcel.read_i32().unwrap_or_default();
                info.error_code = parcel.read_i32().unwrap_or_default();
                info.error_reason = parcel.read_string().unwrap_or_default();
            }
        }
        Ok(info)
    }

    fn write_caller_token(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_bool(self.caller_token.is_some())?;
        if let Some(token) = &self.caller_token {
            parcel.write_remote_object(Some(token))?;
        }
        Ok(())
    }
}

fn read_caller_token(parcel: &mut MessageParcel) -> Option<Arc<dyn RemoteObject>> {
    if parcel.read_bool().unwrap_or_default() {
        parcel.read_remote_object().ok().flatten()
    } else {
        None
    }
}

impl fmt::Debug for AbilitySessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilitySessionInfo")
            .field("want", &self.want)
            .field("request_code", &self.request_code)
            .field("persistent_id", &self.persistent_id)
            .field("state", &self.state)
            .field("ui_ability_id", &self.ui_ability_id)
            .field("reuse", &self.reuse)
            .field("has_caller_token", &self.caller_token.is_some())
            .field("result_code", &self.result_code)
            .field("error_code", &self.error_code)
            .finish_non_exhaustive()
    }
}

/// Whether `err` reports an absent want.
#[must_use]
pub fn is_missing_want(err: &ParcelError) -> bool {
    matches!(err, ParcelError::UnexpectedNull("want"))
}
