//! Server side of a window session.
//!
//! Handlers answer with a `u32` [`WsError`] as the last reply field. The
//! transport status is reserved for requests the stub cannot parse: a
//! null stage or event channel on connect, an unreadable back-press flag,
//! event id or timeout code, or missing keyboard layout parameters are
//! refused with an invalid-data status; a missing want, want parameters
//! or an unknown enumeration value with an invalid-value status.
//!
//! Most scalar arguments are read leniently and default to zero when the
//! request is short.

use std::sync::Arc;

use ohipc_core::{DispatchTable, IpcStub, MessageOption, MessageParcel, Parcelable};
use ohipc_errors::{IpcError, IpcResult};
use ohipc_types::{AbilitySessionInfo, SessionInfoLayout, Want, WantParams, is_missing_want};
use tracing::{debug, info, warn};

use crate::code::SessionInterfaceCode as Code;
use crate::error::WsError;
use crate::geometry::{
    AvoidAreaType, KeyboardLayoutParams, MaximizeMode, Rect, SessionEvent, SessionGravity,
    SizeChangeReason,
};
use crate::property::WindowSessionProperty;
use crate::session::{ConnectRequest, Session};

/// Descriptor of a window session.
pub const SESSION_DESCRIPTOR: &str = "OHOS.ISession";

/// Stub dispatching session requests to a [`Session`].
pub struct SessionStub {
    session: Arc<dyn Session>,
    table: DispatchTable<SessionStub>,
}

impl SessionStub {
    /// Wrap `session`.
    pub fn new(session: Arc<dyn Session>) -> Self {
        let table = DispatchTable::builder(SESSION_DESCRIPTOR)
            .handler(Code::Connect, Self::handle_connect)
            .handler(Code::Foreground, Self::handle_foreground)
            .handler(Code::Background, Self::handle_background)
            .handler(Code::Disconnect, Self::handle_disconnect)
            .handler(Code::Show, Self::handle_show)
            .handler(Code::Hide, Self::handle_hide)
            .handler(
                Code::UpdateRectChangeListenerRegistered,
                Self::handle_update_rect_change_listener_registered,
            )
            .handler(Code::UpdateActiveStatus, Self::handle_update_active_status)
            .handler(Code::SessionEvent, Self::handle_session_event)
            .handler(Code::UpdateSessionRect, Self::handle_update_session_rect)
            .handler(Code::RaiseToAppTop, Self::handle_raise_to_app_top)
            .handler(Code::BackPressed, Self::handle_back_pressed)
            .handler(Code::MarkProcessed, Self::handle_mark_processed)
            .handler(Code::SetMaximizeMode, Self::handle_set_maximize_mode)
            .handler(Code::GetMaximizeMode, Self::handle_get_maximize_mode)
            .handler(Code::NeedAvoid, Self::handle_need_avoid)
            .handler(Code::GetAvoidArea, Self::handle_get_avoid_area)
            .handler(Code::SetSessionProperty, Self::handle_set_session_property)
            .handler(Code::SetAspectRatio, Self::handle_set_aspect_ratio)
            .handler(Code::UpdateWindowAnimationFlag, Self::handle_update_window_animation_flag)
            .handler(Code::UpdateCustomAnimation, Self::handle_update_custom_animation)
            .handler(Code::SetLandscapeMultiWindow, Self::handle_set_landscape_multi_window)
            .handler(Code::RaiseAboveTarget, Self::handle_raise_above_target)
            .handler(Code::RaiseAppMainWindow, Self::handle_raise_app_main_window)
            .handler(
                Code::ChangeSessionVisibilityWithStatusBar,
                Self::handle_change_visibility_with_status_bar,
            )
            .handler(Code::ActivePendingSession, Self::handle_pending_session_activation)
            .handler(Code::TerminateSession, Self::handle_terminate_session)
            .handler(Code::NotifySessionException, Self::handle_session_exception)
            .handler(Code::ProcessPointDownSession, Self::handle_process_point_down_session)
            .handler(Code::SetKeyboardSessionGravity, Self::handle_set_keyboard_session_gravity)
            .handler(Code::SetCallingSessionId, Self::handle_set_calling_session_id)
            .handler(Code::SetCustomDecorHeight, Self::handle_set_custom_decor_height)
            .handler(Code::AdjustKeyboardLayout, Self::handle_adjust_keyboard_layout)
            .handler(Code::TransferAbilityResult, Self::handle_transfer_ability_result)
            .handler(Code::TransferExtensionData, Self::handle_transfer_extension_data)
            .handler(Code::NotifyRemoteReady, Self::handle_notify_remote_ready)
            .handler(Code::NotifyAsyncOn, Self::handle_notify_async_on)
            .handler(Code::NotifySyncOn, Self::handle_notify_sync_on)
            .handler(Code::NotifyExtensionDied, Self::handle_notify_extension_died)
            .handler(Code::NotifyExtensionTimeout, Self::handle_notify_extension_timeout)
            .handler(Code::TriggerBindModalUiExtension, Self::handle_trigger_bind_modal_ui_extension)
            .handler(Code::NotifyPipWindowPrepareClose, Self::handle_notify_pip_window_prepare_close)
            .handler(Code::UpdatePipRect, Self::handle_update_pip_rect)
            .build();
        Self { session, table }
    }

    /// The dispatch table, for inspection.
    #[must_use]
    pub fn table(&self) -> &DispatchTable<SessionStub> {
        &self.table
    }

    // ---- connection and lifecycle --------------------------------------

    fn handle_connect(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let stage = data.read_remote_object().ok().flatten();
        let event_channel = data.read_remote_object().ok().flatten();
        let (Some(stage), Some(event_channel)) = (stage, event_channel) else {
            warn!("session stage or event channel is null");
            return Err(IpcError::invalid_data(
                "session stage",
                "session stage and event channel are required",
            ));
        };
        let property = read_guarded_property(data);
        let token = if property.as_ref().is_some_and(|p| p.token_state) {
            data.read_remote_object().ok().flatten()
        } else {
            None
        };
        let identity_token = data.read_string().unwrap_or_default();
        let mut request = ConnectRequest {
            stage,
            event_channel,
            property,
            token,
            identity_token,
        };
        let outcome = self.session.connect(&mut request);
        info!(result = %outcome.result, has_property = request.property.is_some(), "session connect");

        reply.write_parcelable(Some(&outcome.system_config))?;
        if let Some(property) = &request.property {
            reply.write_i32(property.persistent_id)?;
            reply.write_u64(property.display_id)?;
            reply.write_bool(property.need_update_window_mode)?;
            if property.need_update_window_mode {
                reply.write_u32(property.window_mode.code())?;
            }
            property.window_rect.marshal(reply)?;
            reply.write_i32(property.collaborator_type)?;
        }
        write_result(reply, outcome.result)
    }

    fn handle_foreground(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let property = read_guarded_property(data).unwrap_or_else(|| {
            warn!("foreground without property");
            WindowSessionProperty::default()
        });
        let is_from_client = data.read_bool().unwrap_or_default();
        info!(is_from_client, "session foreground");
        write_result(reply, self.session.foreground(property, is_from_client))
    }

    fn handle_background(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let is_from_client = data.read_bool().unwrap_or_default();
        info!(is_from_client, "session background");
        write_result(reply, self.session.background(is_from_client))
    }

    fn handle_disconnect(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let is_from_client = data.read_bool().unwrap_or_default();
        info!(is_from_client, "session disconnect");
        write_result(reply, self.session.disconnect(is_from_client))
    }

    fn handle_show(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let property = read_guarded_property(data).unwrap_or_else(|| {
            warn!("show without property");
            WindowSessionProperty::default()
        });
        write_result(reply, self.session.show(property))
    }

    fn handle_hide(&self, _data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        write_result(reply, self.session.hide())
    }

    fn handle_update_rect_change_listener_registered(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let is_register = data.read_bool().unwrap_or_default();
        write_result(
            reply,
            self.session.update_rect_change_listener_registered(is_register),
        )
    }

    fn handle_update_active_status(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let is_active = data.read_bool().unwrap_or_default();
        write_result(reply, self.session.update_active_status(is_active))
    }

    fn handle_session_event(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let raw = data.read_u32().unwrap_or_default();
        let event = SessionEvent::from_code(raw).ok_or_else(|| {
            warn!(event = raw, "unknown session event");
            IpcError::invalid_value("session event", format!("unknown event {raw}"))
        })?;
        debug!(?event, "session event");
        write_result(reply, self.session.on_session_event(event))
    }

    // ---- layout --------------------------------------------------------

    fn handle_update_session_rect(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let rect = Rect::unmarshal(data).unwrap_or_default();
        let reason = SizeChangeReason::from_code_lossy(data.read_u32().unwrap_or_default());
        debug!(?rect, ?reason, "update session rect");
        write_result(reply, self.session.update_session_rect(rect, reason))
    }

    fn handle_raise_to_app_top(&self, _data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        write_result(reply, self.session.raise_to_app_top())
    }

    fn handle_back_pressed(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let need_move_to_background = data.read_bool().map_err(|e| {
            warn!(error = %e, "back press flag is unreadable");
            IpcError::invalid_data("need move to background", e.to_string())
        })?;
        write_result(
            reply,
            self.session.request_session_back(need_move_to_background),
        )
    }

    fn handle_mark_processed(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let event_id = data.read_i32().map_err(|e| {
            warn!(error = %e, "event id is unreadable");
            IpcError::invalid_data("event id", e.to_string())
        })?;
        write_result(reply, self.session.mark_processed(event_id))
    }

    fn handle_set_maximize_mode(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let raw = data.read_u32().unwrap_or_default();
        let mode = MaximizeMode::from_code(raw).ok_or_else(|| {
            warn!(mode = raw, "unknown maximize mode");
            IpcError::invalid_value("maximize mode", format!("unknown mode {raw}"))
        })?;
        write_result(reply, self.session.set_global_maximize_mode(mode))
    }

    fn handle_get_maximize_mode(&self, _data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let (mode, result) = match self.session.get_global_maximize_mode() {
            Ok(mode) => (mode, WsError::Ok),
            Err(result) => (MaximizeMode::FullFill, result),
        };
        reply.write_u32(mode.code())?;
        write_result(reply, result)
    }

    fn handle_need_avoid(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let status = data.read_u32().unwrap_or_default() != 0;
        write_result(reply, self.session.on_need_avoid(status))
    }

    fn handle_get_avoid_area(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let raw = data.read_u32().unwrap_or_default();
        let area_type = AvoidAreaType::from_code(raw).ok_or_else(|| {
            warn!(area_type = raw, "unknown avoid area type");
            IpcError::invalid_value("avoid area type", format!("unknown type {raw}"))
        })?;
        let area = self.session.get_avoid_area_by_type(area_type);
        reply.write_parcelable(Some(&area))?;
        Ok(())
    }

    fn handle_set_session_property(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let property = data.read_parcelable::<WindowSessionProperty>().ok().flatten();
        write_result(reply, self.session.set_session_property(property))
    }

    fn handle_set_aspect_ratio(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let ratio = data.read_f32().unwrap_or_default();
        write_result(reply, self.session.set_aspect_ratio(ratio))
    }

    fn handle_update_window_animation_flag(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let need_default_animation = data.read_bool().unwrap_or_default();
        write_result(
            reply,
            self.session.update_window_animation_flag(need_default_animation),
        )
    }

    fn handle_update_custom_animation(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let is_add = data.read_bool().unwrap_or_default();
        write_result(
            reply,
            self.session.update_window_scene_after_custom_animation(is_add),
        )
    }

    fn handle_set_landscape_multi_window(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let enabled = data.read_bool().unwrap_or_default();
        write_result(reply, self.session.set_landscape_multi_window(enabled))
    }

    fn handle_raise_above_target(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let sub_window_id = data.read_i32().unwrap_or_default();
        write_result(reply, self.session.raise_above_target(sub_window_id))
    }

    fn handle_raise_app_main_window(
        &self,
        _data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        write_result(reply, self.session.raise_app_main_window_to_top())
    }

    // ---- ability sessions ----------------------------------------------

    fn handle_change_visibility_with_status_bar(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let info = read_session_info(data, SessionInfoLayout::Visibility)?;
        let visible = data.read_bool().unwrap_or_default();
        write_result(
            reply,
            self.session
                .change_session_visibility_with_status_bar(info, visible),
        )
    }

    fn handle_pending_session_activation(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let info = read_session_info(data, SessionInfoLayout::Activation)?;
        info!(persistent_id = info.persistent_id, "pending session activation");
        write_result(reply, self.session.pending_session_activation(info))
    }

    fn handle_terminate_session(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let info = read_session_info(data, SessionInfoLayout::Termination)?;
        info!(result_code = info.result_code, "terminate session");
        write_result(reply, self.session.terminate_session(info))
    }

    fn handle_session_exception(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let info = read_session_info(data, SessionInfoLayout::Exception)?;
        warn!(
            persistent_id = info.persistent_id,
            error_code = info.error_code,
            reason = %info.error_reason,
            "session exception"
        );
        write_result(reply, self.session.notify_session_exception(info))
    }

    // ---- keyboard and input --------------------------------------------

    fn handle_process_point_down_session(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let x = data.read_i32().unwrap_or_default();
        let y = data.read_i32().unwrap_or_default();
        write_result(reply, self.session.process_point_down_session(x, y))
    }

    fn handle_set_keyboard_session_gravity(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let raw = data.read_u32().unwrap_or_default();
        let gravity = SessionGravity::from_code(raw).ok_or_else(|| {
            warn!(gravity = raw, "unknown keyboard gravity");
            IpcError::invalid_value("session gravity", format!("unknown gravity {raw}"))
        })?;
        let percent = data.read_u32().unwrap_or_default();
        write_result(
            reply,
            self.session.set_keyboard_session_gravity(gravity, percent),
        )
    }

    fn handle_set_calling_session_id(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let calling_session_id = data.read_u32().unwrap_or_default();
        self.session.set_calling_session_id(calling_session_id);
        write_result(reply, WsError::Ok)
    }

    fn handle_set_custom_decor_height(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let height = data.read_i32().unwrap_or_default();
        self.session.set_custom_decor_height(height);
        Ok(())
    }

    fn handle_adjust_keyboard_layout(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let params = data
            .read_parcelable::<KeyboardLayoutParams>()
            .ok()
            .flatten()
            .ok_or_else(|| {
                warn!("keyboard layout params are missing");
                IpcError::invalid_data("keyboard layout params", "required object is missing")
            })?;
        write_result(reply, self.session.adjust_keyboard_layout(&params))
    }

    // ---- extensions ----------------------------------------------------

    fn handle_transfer_ability_result(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let result_code = data.read_u32().unwrap_or_default();
        let want = data.read_parcelable::<Want>().ok().flatten().ok_or_else(|| {
            warn!("want is missing");
            IpcError::missing("want")
        })?;
        write_result(
            reply,
            self.session.transfer_ability_result(result_code, &want),
        )
    }

    fn handle_transfer_extension_data(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let params = data
            .read_parcelable::<WantParams>()
            .ok()
            .flatten()
            .ok_or_else(|| {
                warn!("want params are missing");
                IpcError::missing("want params")
            })?;
        write_result(reply, self.session.transfer_extension_data(&params))
    }

    fn handle_notify_remote_ready(&self, _data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        self.session.notify_remote_ready();
        Ok(())
    }

    fn handle_notify_async_on(&self, _data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        self.session.notify_async_on();
        Ok(())
    }

    fn handle_notify_sync_on(&self, _data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        self.session.notify_sync_on();
        Ok(())
    }

    fn handle_notify_extension_died(
        &self,
        _data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        info!("extension died");
        self.session.notify_extension_died();
        Ok(())
    }

    fn handle_notify_extension_timeout(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let error_code = data.read_i32().map_err(|e| {
            warn!(error = %e, "timeout code is unreadable");
            IpcError::invalid_data("error code", e.to_string())
        })?;
        self.session.notify_extension_timeout(error_code);
        Ok(())
    }

    fn handle_trigger_bind_modal_ui_extension(
        &self,
        _data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        self.session.trigger_bind_modal_ui_extension();
        Ok(())
    }

    fn handle_notify_pip_window_prepare_close(
        &self,
        _data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        self.session.notify_pip_window_prepare_close();
        Ok(())
    }

    fn handle_update_pip_rect(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let rect = Rect::unmarshal(data).unwrap_or_default();
        let reason =
            SizeChangeReason::from_code_lossy(data.read_i32().unwrap_or_default().cast_unsigned());
        write_result(reply, self.session.update_pip_rect(rect, reason))
    }
}

impl IpcStub for SessionStub {
    fn descriptor(&self) -> &str {
        SESSION_DESCRIPTOR
    }

    fn on_remote_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        self.table.dispatch(self, code, data, reply, option)
    }
}

impl std::fmt::Debug for SessionStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStub")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

fn write_result(reply: &mut MessageParcel, result: WsError) -> IpcResult<()> {
    reply.write_u32(result.code())?;
    Ok(())
}

fn read_guarded_property(data: &mut MessageParcel) -> Option<WindowSessionProperty> {
    if data.read_bool().unwrap_or_default() {
        data.read_parcelable().ok().flatten()
    } else {
        None
    }
}

fn read_session_info(
    data: &mut MessageParcel,
    layout: SessionInfoLayout,
) -> IpcResult<AbilitySessionInfo> {
    AbilitySessionInfo::read_from(data, layout).map_err(|e| {
        warn!(error = %e, ?layout, "ability session info is unreadable");
        if is_missing_want(&e) {
            IpcError::missing("want")
        } else {
            IpcError::from(e)
        }
    })
}
