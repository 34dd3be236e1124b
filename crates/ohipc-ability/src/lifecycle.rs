//! Lifecycle parcelables.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AbilityLifecycleState {
    /// Created, not started.
    #[default]
    Initial = 0,
    /// Visible, not interactive.
    Inactive = 1,
    /// Interactive.
    Active = 2,
    /// Hidden.
    Background = 3,
    /// Suspended by the system.
    Suspended = 4,
    /// Foreground, window-managed.
    ForegroundNew = 5,
    /// Background, window-managed.
    BackgroundNew = 6,
}

impl AbilityLifecycleState {
    /// Wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire value.
    ///
    /// # Errors
    ///
    /// Returns [`ParcelError::InvalidEnum`] for values outside the enum.
    pub fn from_code(code: i32) -> ParcelResult<Self> {
        match code {
            0 => Ok(Self::Initial),
            1 => Ok(Self::Inactive),
            2 => Ok(Self::Active),
            3 => Ok(Self::Background),
            4 => Ok(Self::Suspended),
            5 => Ok(Self::ForegroundNew),
            6 => Ok(Self::BackgroundNew),
            other => Err(ParcelError::invalid_enum("lifecycle state", other.cast_unsigned())),
        }
    }
}

/// Target state plus the context of a lifecycle transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeCycleStateInfo {
    /// State to move to.
    pub state: AbilityLifecycleState,
    /// Whether the ability was started with a new want.
    pub is_new_want: bool,
    /// Scene flags of the transition.
    pub scene_flag: u32,
    /// Why the ability is being launched.
    pub launch_reason: i32,
    /// Why the ability last exited.
    pub last_exit_reason: i32,
    /// Whether the ability is being created by this transaction.
    pub use_create: bool,
}

impl LifeCycleStateInfo {
    /// Info moving to `state` with everything else zeroed.
    #[must_use]
    pub fn new(state: AbilityLifecycleState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }
}

impl Parcelable for LifeCycleStateInfo {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_i32(self.state.code())?;
        parcel.write_bool(self.is_new_want)?;
        parcel.write_u32(self.scene_flag)?;
        parcel.write_i32(self.launch_reason)?;
        parcel.write_i32(self.last_exit_reason)?;
        parcel.write_bool(self.use_create)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        Ok(Self {
            state: AbilityLifecycleState::from_code(parcel.read_i32()?)?,
            is_new_want: parcel.read_bool()?,
            scene_flag: parcel.read_u32()?,
            launch_reason: parcel.read_i32()?,
            last_exit_reason: parcel.read_i32()?,
            use_create: parcel.read_bool()?,
        })
    }
}

/// Command sent to an ability's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum WindowCommand {
    /// Bring the window to the foreground.
    Foreground = 0,
    /// Send the window to the background.
    Background = 1,
    /// Destroy the window.
    Destroy = 2,
}

impl WindowCommand {
    /// Wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a wire value.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Foreground),
            1 => Some(Self::Background),
            2 => Some(Self::Destroy),
            _ => None,
        }
    }
}
