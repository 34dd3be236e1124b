//! Host-side contract of a window session.

use std::fmt;
use std::sync::Arc;

use ohipc_core::RemoteObject;
use ohipc_types::{AbilitySessionInfo, Want, WantParams};

use crate::error::WsError;
use crate::geometry::{
    AvoidArea, AvoidAreaType, KeyboardLayoutParams, MaximizeMode, Rect, SessionEvent,
    SessionGravity, SizeChangeReason,
};
use crate::property::{SystemSessionConfig, WindowSessionProperty};

/// Descriptor of the client stage handle passed to connect.
pub const SESSION_STAGE_DESCRIPTOR: &str = "OHOS.ISessionStage";

/// Descriptor of the window event channel handle passed to connect.
pub const WINDOW_EVENT_CHANNEL_DESCRIPTOR: &str = "OHOS.IWindowEventChannel";

/// Arguments of a connect request.
#[derive(Clone)]
pub struct ConnectRequest {
    /// Client stage the host calls back into.
    pub stage: Arc<dyn RemoteObject>,
    /// Channel input events are delivered through.
    pub event_channel: Arc<dyn RemoteObject>,
    /// Window description, if the client has one.
    pub property: Option<WindowSessionProperty>,
    /// Ability token, sent only when the property's `token_state` is set.
    pub token: Option<Arc<dyn RemoteObject>>,
    /// Identity of the connecting client.
    pub identity_token: String,
}

impl ConnectRequest {
    /// A request with no property, token or identity.
    pub fn new(stage: Arc<dyn RemoteObject>, event_channel: Arc<dyn RemoteObject>) -> Self {
        Self {
            stage,
            event_channel,
            property: None,
            token: None,
            identity_token: String::new(),
        }
    }

    /// Attach a window property.
    #[must_use]
    pub fn with_property(mut self, property: WindowSessionProperty) -> Self {
        self.property = Some(property);
        self
    }

    /// Attach an ability token.
    #[must_use]
    pub fn with_token(mut self, token: Arc<dyn RemoteObject>) -> Self {
        self.token = Some(token);
        self
    }

    /// Set the client identity.
    #[must_use]
    pub fn with_identity_token(mut self, identity_token: impl Into<String>) -> Self {
        self.identity_token = identity_token.into();
        self
    }
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("stage", &self.stage.interface_descriptor())
            .field("event_channel", &self.event_channel.interface_descriptor())
            .field("property", &self.property)
            .field("has_token", &self.token.is_some())
            .field("identity_token", &self.identity_token)
            .finish()
    }
}

/// Outcome of a connect request.
///
/// The host writes its changes to the window property back into the
/// [`ConnectRequest`] it was handed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectReply {
    /// Result of the connect.
    pub result: WsError,
    /// Display-wide window policy.
    pub system_config: SystemSessionConfig,
}

impl ConnectReply {
    /// A reply carrying only `result`.
    #[must_use]
    pub fn failed(result: WsError) -> Self {
        Self {
            result,
            system_config: SystemSessionConfig::default(),
        }
    }
}

/// Host implementation behind [`SessionStub`](crate::SessionStub).
///
/// Every method has a default: results are [`WsError::Ok`], queries
/// answer with default values and notifications are ignored.
pub trait Session: Send + Sync + 'static {
    /// Attach a client, updating `request.property` with the persistent
    /// id, display and layout the host assigns.
    fn connect(&self, _request: &mut ConnectRequest) -> ConnectReply {
        ConnectReply::default()
    }

    /// Bring the session to the foreground.
    fn foreground(&self, _property: WindowSessionProperty, _is_from_client: bool) -> WsError {
        WsError::Ok
    }

    /// Send the session to the background.
    fn background(&self, _is_from_client: bool) -> WsError {
        WsError::Ok
    }

    /// Detach the client.
    fn disconnect(&self, _is_from_client: bool) -> WsError {
        WsError::Ok
    }

    /// Show the session.
    fn show(&self, _property: WindowSessionProperty) -> WsError {
        WsError::Ok
    }

    /// Hide the session.
    fn hide(&self) -> WsError {
        WsError::Ok
    }

    /// Register or unregister the rect change listener.
    fn update_rect_change_listener_registered(&self, _is_register: bool) -> WsError {
        WsError::Ok
    }

    /// Mark the session active or inactive.
    fn update_active_status(&self, _is_active: bool) -> WsError {
        WsError::Ok
    }

    /// Handle a title bar or drag event.
    fn on_session_event(&self, _event: SessionEvent) -> WsError {
        WsError::Ok
    }

    /// Move or resize the session.
    fn update_session_rect(&self, _rect: Rect, _reason: SizeChangeReason) -> WsError {
        WsError::Ok
    }

    /// Raise the session within its application.
    fn raise_to_app_top(&self) -> WsError {
        WsError::Ok
    }

    /// Handle the back key.
    fn request_session_back(&self, _need_move_to_background: bool) -> WsError {
        WsError::Ok
    }

    /// An input event was consumed.
    fn mark_processed(&self, _event_id: i32) -> WsError {
        WsError::Ok
    }

    /// Set the global maximize mode.
    fn set_global_maximize_mode(&self, _mode: MaximizeMode) -> WsError {
        WsError::Ok
    }

    /// Current global maximize mode.
    ///
    /// # Errors
    ///
    /// Returns the session result when the mode cannot be read.
    fn get_global_maximize_mode(&self) -> Result<MaximizeMode, WsError> {
        Ok(MaximizeMode::FullFill)
    }

    /// Whether the session avoids system bars.
    fn on_need_avoid(&self, _status: bool) -> WsError {
        WsError::Ok
    }

    /// Area to keep clear for `area_type`.
    fn get_avoid_area_by_type(&self, _area_type: AvoidAreaType) -> AvoidArea {
        AvoidArea::default()
    }

    /// Replace the session property.
    fn set_session_property(&self, _property: Option<WindowSessionProperty>) -> WsError {
        WsError::Ok
    }

    /// Fix the aspect ratio.
    fn set_aspect_ratio(&self, _ratio: f32) -> WsError {
        WsError::Ok
    }

    /// Toggle the default window animation.
    fn update_window_animation_flag(&self, _need_default_animation: bool) -> WsError {
        WsError::Ok
    }

    /// A custom animation added or removed the window.
    fn update_window_scene_after_custom_animation(&self, _is_add: bool) -> WsError {
        WsError::Ok
    }

    /// Toggle landscape multi-window.
    fn set_landscape_multi_window(&self, _enabled: bool) -> WsError {
        WsError::Ok
    }

    /// Raise above the sub window `sub_window_id`.
    fn raise_above_target(&self, _sub_window_id: i32) -> WsError {
        WsError::Ok
    }

    /// Raise the application's main window.
    fn raise_app_main_window_to_top(&self) -> WsError {
        WsError::Ok
    }

    /// Change visibility together with the status bar.
    fn change_session_visibility_with_status_bar(
        &self,
        _info: AbilitySessionInfo,
        _visible: bool,
    ) -> WsError {
        WsError::Ok
    }

    /// Activate a pending ability session.
    fn pending_session_activation(&self, _info: AbilitySessionInfo) -> WsError {
        WsError::Ok
    }

    /// Terminate the ability session.
    fn terminate_session(&self, _info: AbilitySessionInfo) -> WsError {
        WsError::Ok
    }

    /// Report an ability session exception.
    fn notify_session_exception(&self, _info: AbilitySessionInfo) -> WsError {
        WsError::Ok
    }

    /// Pointer down at (`x`, `y`) outside the focused session.
    fn process_point_down_session(&self, _x: i32, _y: i32) -> WsError {
        WsError::Ok
    }

    /// Set keyboard gravity and height percentage.
    fn set_keyboard_session_gravity(&self, _gravity: SessionGravity, _percent: u32) -> WsError {
        WsError::Ok
    }

    /// Record the session that called up the keyboard.
    fn set_calling_session_id(&self, _calling_session_id: u32) {}

    /// Height of a custom decoration.
    fn set_custom_decor_height(&self, _height: i32) {}

    /// Lay out the keyboard panel.
    fn adjust_keyboard_layout(&self, _params: &KeyboardLayoutParams) -> WsError {
        WsError::Ok
    }

    /// Return an ability result through the session.
    fn transfer_ability_result(&self, _result_code: u32, _want: &Want) -> WsError {
        WsError::Ok
    }

    /// Pass extension data to the host.
    fn transfer_extension_data(&self, _params: &WantParams) -> WsError {
        WsError::Ok
    }

    /// The remote extension is ready.
    fn notify_remote_ready(&self) {}

    /// Extension calls switch to async.
    fn notify_async_on(&self) {}

    /// Extension calls switch to sync.
    fn notify_sync_on(&self) {}

    /// The extension process died.
    fn notify_extension_died(&self) {}

    /// The extension timed out with `error_code`.
    fn notify_extension_timeout(&self, _error_code: i32) {}

    /// Bind a modal UI extension.
    fn trigger_bind_modal_ui_extension(&self) {}

    /// Picture-in-picture window is about to close.
    fn notify_pip_window_prepare_close(&self) {}

    /// Move or resize the picture-in-picture window.
    fn update_pip_rect(&self, _rect: Rect, _reason: SizeChangeReason) -> WsError {
        WsError::Ok
    }
}
