//! Session property and system configuration parcelables.

use ohipc_core::{MessageParcel, Parcelable};
use ohipc_errors::{ParcelError, ParcelResult};
use serde::{Deserialize, Serialize};

use crate::geometry::{KeyboardLayoutParams, MaximizeMode, Rect, WindowMode};

/// Client-side description of a window, sent with connect, foreground
/// and show requests.
///
/// `token_state` tells the host whether an ability token follows the
/// property in a connect request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSessionProperty {
    /// Window name.
    pub window_name: String,
    /// Current rect.
    pub window_rect: Rect,
    /// Rect requested by the client.
    pub request_rect: Rect,
    /// Window type.
    pub window_type: u32,
    /// Whether the window takes focus.
    pub focusable: bool,
    /// Whether the window takes touch input.
    pub touchable: bool,
    /// Whether an ability token accompanies the property.
    pub token_state: bool,
    /// Turn the screen on when shown.
    pub turn_screen_on: bool,
    /// Keep the screen on while shown.
    pub keep_screen_on: bool,
    /// Hide content from screenshots.
    pub privacy_mode: bool,
    /// Hide content from system captures.
    pub system_privacy_mode: bool,
    /// Display hosting the window.
    pub display_id: u64,
    /// Persistent session id assigned by the host.
    pub persistent_id: i32,
    /// Owning bundle.
    pub bundle_name: String,
    /// Owning module.
    pub module_name: String,
    /// Owning ability.
    pub ability_name: String,
    /// Parent session for sub windows.
    pub parent_persistent_id: i32,
    /// Access token of the owner.
    pub access_token_id: u32,
    /// Maximize layout.
    pub maximize_mode: MaximizeMode,
    /// Requested orientation.
    pub requested_orientation: u32,
    /// Window mode.
    pub window_mode: WindowMode,
    /// Window flag bits.
    pub window_flags: u32,
    /// Whether the host changed the window mode during connect.
    pub need_update_window_mode: bool,
    /// Session that called up the keyboard.
    pub calling_session_id: u32,
    /// Collaborator kind of the owning application.
    pub collaborator_type: i32,
    /// Keyboard layout for keyboard sessions.
    pub keyboard_layout_params: KeyboardLayoutParams,
}

impl Default for WindowSessionProperty {
    fn default() -> Self {
        Self {
            window_name: String::new(),
            window_rect: Rect::default(),
            request_rect: Rect::default(),
            window_type: 1,
            focusable: true,
            touchable: true,
            token_state: false,
            turn_screen_on: false,
            keep_screen_on: false,
            privacy_mode: false,
            system_privacy_mode: false,
            display_id: 0,
            persistent_id: 0,
            bundle_name: String::new(),
            module_name: String::new(),
            ability_name: String::new(),
            parent_persistent_id: -1,
            access_token_id: 0,
            maximize_mode: MaximizeMode::default(),
            requested_orientation: 0,
            window_mode: WindowMode::Fullscreen,
            window_flags: 0,
            need_update_window_mode: false,
            calling_session_id: u32::MAX,
            collaborator_type: -1,
            keyboard_layout_params: KeyboardLayoutParams::default(),
        }
    }
}

impl WindowSessionProperty {
    /// Property for the window `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            window_name: name.into(),
            ..Self::default()
        }
    }
}

impl Parcelable for WindowSessionProperty {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_string(&self.window_name)?;
        self.window_rect.marshal(parcel)?;
        self.request_rect.marshal(parcel)?;
        parcel.write_u32(self.window_type)?;
        parcel.write_bool(self.focusable)?;
        parcel.write_bool(self.touchable)?;
        parcel.write_bool(self.token_state)?;
        parcel.write_bool(self.turn_screen_on)?;
        parcel.write_bool(self.keep_screen_on)?;
        parcel.write_bool(self.privacy_mode)?;
        parcel.write_bool(self.system_privacy_mode)?;
        parcel.write_u64(self.display_id)?;
        parcel.write_i32(self.persistent_id)?;
        parcel.write_string(&self.bundle_name)?;
        parcel.write_string(&self.module_name)?;
        parcel.write_string(&self.ability_name)?;
        parcel.write_i32(self.parent_persistent_id)?;
        parcel.write_u32(self.access_token_id)?;
        parcel.write_u32(self.maximize_mode.code())?;
        parcel.write_u32(self.requested_orientation)?;
        parcel.write_u32(self.window_mode.code())?;
        parcel.write_u32(self.window_flags)?;
        parcel.write_bool(self.need_update_window_mode)?;
        parcel.write_u32(self.calling_session_id)?;
        parcel.write_i32(self.collaborator_type)?;
        self.keyboard_layout_params.marshal(parcel)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let window_name = parcel.read_string()?;
        let window_rect = Rect::unmarshal(parcel)?;
        let request_rect = Rect::unmarshal(parcel)?;
        let window_type = parcel.read_u32()?;
        let focusable = parcel.read_bool()?;
        let touchable = parcel.read_bool()?;
        let token_state = parcel.read_bool()?;
        let turn_screen_on = parcel.read_bool()?;
        let keep_screen_on = parcel.read_bool()?;
        let privacy_mode = parcel.read_bool()?;
        let system_privacy_mode = parcel.read_bool()?;
        let display_id = parcel.read_u64()?;
        let persistent_id = parcel.read_i32()?;
        let bundle_name = parcel.read_string()?;
        let module_name = parcel.read_string()?;
        let ability_name = parcel.read_string()?;
        let parent_persistent_id = parcel.read_i32()?;
        let access_token_id = parcel.read_u32()?;
        let raw = parcel.read_u32()?;
        let maximize_mode = MaximizeMode::from_code(raw)
            .ok_or_else(|| ParcelError::invalid_enum("maximize mode", raw))?;
        let requested_orientation = parcel.read_u32()?;
        let raw = parcel.read_u32()?;
        let window_mode =
            WindowMode::from_code(raw).ok_or_else(|| ParcelError::invalid_enum("window mode", raw))?;
        Ok(Self {
            window_name,
            window_rect,
            request_rect,
            window_type,
            focusable,
            touchable,
            token_state,
            turn_screen_on,
            keep_screen_on,
            privacy_mode,
            system_privacy_mode,
            display_id,
            persistent_id,
            bundle_name,
            module_name,
            ability_name,
            parent_persistent_id,
            access_token_id,
            maximize_mode,
            requested_orientation,
            window_mode,
            window_flags: parcel.read_u32()?,
            need_update_window_mode: parcel.read_bool()?,
            calling_session_id: parcel.read_u32()?,
            collaborator_type: parcel.read_i32()?,
            keyboard_layout_params: KeyboardLayoutParams::unmarshal(parcel)?,
        })
    }
}

/// Display-wide window policy returned by a successful connect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSessionConfig {
    /// Whether windows get system decorations.
    pub is_system_decor_enable: bool,
    /// Whether floating windows may be stretched.
    pub is_stretchable: bool,
    /// Supported window mode bits.
    pub decor_mode_support_info: u32,
    /// Mode for windows that do not ask for one.
    pub default_window_mode: WindowMode,
    /// Upper bound on floating window edges.
    pub max_floating_window_size: u32,
    /// Minimum main window width.
    pub mini_width_of_main_window: u32,
    /// Minimum main window height.
    pub mini_height_of_main_window: u32,
    /// Minimum sub window width.
    pub mini_width_of_sub_window: u32,
    /// Minimum sub window height.
    pub mini_height_of_sub_window: u32,
    /// Whether background switching is enabled.
    pub background_switch: bool,
    /// Whether free multi-window is on.
    pub free_multi_window_enable: bool,
    /// Whether the device supports free multi-window.
    pub free_multi_window_support: bool,
}

impl Default for SystemSessionConfig {
    fn default() -> Self {
        Self {
            is_system_decor_enable: true,
            is_stretchable: false,
            decor_mode_support_info: 0x0F,
            default_window_mode: WindowMode::Fullscreen,
            max_floating_window_size: 1920,
            mini_width_of_main_window: 320,
            mini_height_of_main_window: 240,
            mini_width_of_sub_window: 320,
            mini_height_of_sub_window: 240,
            background_switch: false,
            free_multi_window_enable: false,
            free_multi_window_support: false,
        }
    }
}

impl Parcelable for SystemSessionConfig {
    fn marshal(&self, parcel: &mut MessageParcel) -> ParcelResult<()> {
        parcel.write_bool(self.is_system_decor_enable)?;
        parcel.write_bool(self.is_stretchable)?;
        parcel.write_u32(self.decor_mode_support_info)?;
        parcel.write_u32(self.default_window_mode.code())?;
        parcel.write_u32(self.max_floating_window_size)?;
        parcel.write_u32(self.mini_width_of_main_window)?;
        parcel.write_u32(self.mini_height_of_main_window)?;
        parcel.write_u32(self.mini_width_of_sub_window)?;
        parcel.write_u32(self.mini_height_of_sub_window)?;
        parcel.write_bool(self.background_switch)?;
        parcel.write_bool(self.free_multi_window_enable)?;
        parcel.write_bool(self.free_multi_window_support)
    }

    fn unmarshal(parcel: &mut MessageParcel) -> ParcelResult<Self> {
        let is_system_decor_enable = parcel.read_bool()?;
        let is_stretchable = parcel.read_bool()?;
        let decor_mode_support_info = parcel.read_u32()?;
        let raw = parcel.read_u32()?;
        let default_window_mode = WindowMode::from_code(raw)
            .ok_or_else(|| ParcelError::invalid_enum("default window mode", raw))?;
        Ok(Self {
            is_system_decor_enable,
            is_stretchable,
            decor_mode_support_info,
            default_window_mode,
            max_floating_window_size: parcel.read_u32()?,
            mini_width_of_main_window: parcel.read_u32()?,
            mini_height_of_main_window: parcel.read_u32()?,
            mini_width_of_sub_window: parcel.read_u32()?,
            mini_height_of_sub_window: parcel.read_u32()?,
            background_switch: parcel.read_bool()?,
            free_multi_window_enable: parcel.read_bool()?,
            free_multi_window_support: parcel.read_bool()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_keeps_field_order() -> ParcelResult<()> {
        let property = WindowSessionProperty {
            window_rect: Rect::new(10, 20, 640, 480),
            token_state: true,
            display_id: u64::MAX,
            persistent_id: 77,
            bundle_name: "com.example.notes".to_string(),
            window_mode: WindowMode::Floating,
            ..WindowSessionProperty::new("main")
        };
        let mut parcel = MessageParcel::new();
        property.marshal(&mut parcel)?;
        assert_eq!(parcel.read_string()?, "main");
        assert_eq!(Rect::unmarshal(&mut parcel)?, property.window_rect);
        parcel.rewind_read();
        assert_eq!(WindowSessionProperty::unmarshal(&mut parcel)?, property);
        assert_eq!(parcel.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_unknown_window_mode_is_rejected() -> ParcelResult<()> {
        let config = SystemSessionConfig {
            default_window_mode: WindowMode::Pip,
            ..SystemSessionConfig::default()
        };
        let mut parcel = MessageParcel::new();
        config.marshal(&mut parcel)?;
        assert_eq!(SystemSessionConfig::unmarshal(&mut parcel)?, config);

        let mut parcel = MessageParcel::new();
        parcel.write_bool(true)?;
        parcel.write_bool(false)?;
        parcel.write_u32(0)?;
        parcel.write_u32(55)?;
        assert!(matches!(
            SystemSessionConfig::unmarshal(&mut parcel),
            Err(ParcelError::InvalidEnum { .. })
        ));
        Ok(())
    }
}
