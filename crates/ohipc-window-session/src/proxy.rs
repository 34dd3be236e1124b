//! Client side of a window session.

use std::sync::Arc;

use ohipc_core::{MessageOption, MessageParcel, Parcelable, RemoteObject, RemoteProxy};
use ohipc_errors::IpcResult;
use ohipc_types::{AbilitySessionInfo, SessionInfoLayout, Want, WantParams};
use tracing::{error, info, warn};

use crate::code::SessionInterfaceCode as Code;
use crate::error::WsError;
use crate::geometry::{
    AvoidArea, AvoidAreaType, KeyboardLayoutParams, MaximizeMode, Rect, SessionEvent,
    SessionGravity, SizeChangeReason, WindowMode,
};
use crate::property::{SystemSessionConfig, WindowSessionProperty};
use crate::session::{ConnectReply, ConnectRequest};
use crate::stub::SESSION_DESCRIPTOR;

/// Typed client of a window session.
///
/// Methods return the session's [`WsError`]. A request that cannot be
/// written or delivered, or a reply that cannot be decoded, yields
/// [`WsError::IpcFailed`]. One-way calls report [`WsError::Ok`] once the
/// request is queued.
#[derive(Debug, Clone)]
pub struct SessionProxy {
    inner: RemoteProxy,
}

impl SessionProxy {
    /// Wrap the session handle `remote`.
    pub fn new(remote: Arc<dyn RemoteObject>) -> Self {
        Self {
            inner: RemoteProxy::new(remote, SESSION_DESCRIPTOR),
        }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        self.inner.remote()
    }

    /// Attach a client stage and event channel.
    ///
    /// On success the persistent id, display, window mode, rect and
    /// collaborator type assigned by the host are written back into
    /// `request.property`. The rect is only taken over when the client
    /// had not set one.
    pub fn connect(&self, request: &mut ConnectRequest) -> ConnectReply {
        let sent = self.request(Code::Connect, |data| {
            data.write_remote_object(Some(&request.stage))?;
            data.write_remote_object(Some(&request.event_channel))?;
            data.write_bool(request.property.is_some())?;
            if let Some(property) = &request.property {
                data.write_parcelable(Some(property))?;
                if property.token_state {
                    data.write_remote_object(request.token.as_ref())?;
                }
            }
            data.write_string(&request.identity_token)?;
            Ok(())
        });
        let mut reply = match sent {
            Ok(reply) => reply,
            Err(result) => return ConnectReply::failed(result),
        };
        match read_connect_reply(&mut reply, request.property.as_mut()) {
            Ok(outcome) => {
                info!(result = %outcome.result, "session connected");
                outcome
            }
            Err(e) => {
                error!(error = %e, "connect reply is unreadable");
                ConnectReply::failed(WsError::IpcFailed)
            }
        }
    }

    /// Bring the session to the foreground.
    pub fn foreground(&self, property: Option<&WindowSessionProperty>, is_from_client: bool) -> WsError {
        self.call(Code::Foreground, |data| {
            write_guarded_property(data, property)?;
            data.write_bool(is_from_client)?;
            Ok(())
        })
    }

    /// Send the session to the background.
    pub fn background(&self, is_from_client: bool) -> WsError {
        self.call(Code::Background, |data| {
            data.write_bool(is_from_client)?;
            Ok(())
        })
    }

    /// Detach the client.
    pub fn disconnect(&self, is_from_client: bool) -> WsError {
        self.call(Code::Disconnect, |data| {
            data.write_bool(is_from_client)?;
            Ok(())
        })
    }

    /// Show the session.
    pub fn show(&self, property: Option<&WindowSessionProperty>) -> WsError {
        self.call(Code::Show, |data| write_guarded_property(data, property))
    }

    /// Hide the session.
    pub fn hide(&self) -> WsError {
        self.call(Code::Hide, |_| Ok(()))
    }

    /// Register or unregister the rect change listener.
    pub fn update_rect_change_listener_registered(&self, is_register: bool) -> WsError {
        self.call(Code::UpdateRectChangeListenerRegistered, |data| {
            data.write_bool(is_register)?;
            Ok(())
        })
    }

    /// Mark the session active or inactive.
    pub fn update_active_status(&self, is_active: bool) -> WsError {
        self.call(Code::UpdateActiveStatus, |data| {
            data.write_bool(is_active)?;
            Ok(())
        })
    }

    /// Raise a title bar or drag event.
    pub fn on_session_event(&self, event: SessionEvent) -> WsError {
        self.call(Code::SessionEvent, |data| {
            data.write_u32(event.code())?;
            Ok(())
        })
    }

    /// Move or resize the session.
    pub fn update_session_rect(&self, rect: Rect, reason: SizeChangeReason) -> WsError {
        self.call(Code::UpdateSessionRect, |data| {
            rect.marshal(data)?;
            data.write_u32(reason.code())?;
            Ok(())
        })
    }

    /// Raise the session within its application.
    pub fn raise_to_app_top(&self) -> WsError {
        self.call(Code::RaiseToAppTop, |_| Ok(()))
    }

    /// Report the back key.
    pub fn request_session_back(&self, need_move_to_background: bool) -> WsError {
        self.call(Code::BackPressed, |data| {
            data.write_bool(need_move_to_background)?;
            Ok(())
        })
    }

    /// Report that an input event was consumed.
    pub fn mark_processed(&self, event_id: i32) -> WsError {
        self.call(Code::MarkProcessed, |data| {
            data.write_i32(event_id)?;
            Ok(())
        })
    }

    /// Set the global maximize mode.
    pub fn set_global_maximize_mode(&self, mode: MaximizeMode) -> WsError {
        self.call(Code::SetMaximizeMode, |data| {
            data.write_u32(mode.code())?;
            Ok(())
        })
    }

    /// Read the global maximize mode.
    ///
    /// # Errors
    ///
    /// Returns the session result, or [`WsError::IpcFailed`] when the call
    /// fails or the reply names no known mode.
    pub fn get_global_maximize_mode(&self) -> Result<MaximizeMode, WsError> {
        let mut reply = self.request(Code::GetMaximizeMode, |_| Ok(()))?;
        let raw = reply.read_u32().map_err(|e| {
            error!(error = %e, "maximize mode reply is unreadable");
            WsError::IpcFailed
        })?;
        match read_result(&mut reply) {
            WsError::Ok => MaximizeMode::from_code(raw).ok_or_else(|| {
                warn!(mode = raw, "unknown maximize mode in reply");
                WsError::IpcFailed
            }),
            result => Err(result),
        }
    }

    /// Tell the host whether the session avoids system bars.
    pub fn on_need_avoid(&self, status: bool) -> WsError {
        self.call(Code::NeedAvoid, |data| {
            data.write_u32(u32::from(status))?;
            Ok(())
        })
    }

    /// Area to keep clear for `area_type`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::IpcFailed`] when the call fails or the reply
    /// carries no area.
    pub fn get_avoid_area_by_type(&self, area_type: AvoidAreaType) -> Result<AvoidArea, WsError> {
        let mut reply = self.request(Code::GetAvoidArea, |data| {
            data.write_u32(area_type.code())?;
            Ok(())
        })?;
        reply
            .read_parcelable::<AvoidArea>()
            .ok()
            .flatten()
            .ok_or_else(|| {
                error!(?area_type, "avoid area reply is unreadable");
                WsError::IpcFailed
            })
    }

    /// Replace the session property.
    pub fn set_session_property(&self, property: Option<&WindowSessionProperty>) -> WsError {
        self.call(Code::SetSessionProperty, |data| {
            data.write_parcelable(property)?;
            Ok(())
        })
    }

    /// Fix the aspect ratio.
    pub fn set_aspect_ratio(&self, ratio: f32) -> WsError {
        self.call(Code::SetAspectRatio, |data| {
            data.write_f32(ratio)?;
            Ok(())
        })
    }

    /// Toggle the default window animation.
    pub fn update_window_animation_flag(&self, need_default_animation: bool) -> WsError {
        self.call(Code::UpdateWindowAnimationFlag, |data| {
            data.write_bool(need_default_animation)?;
            Ok(())
        })
    }

    /// Report that a custom animation added or removed the window.
    pub fn update_window_scene_after_custom_animation(&self, is_add: bool) -> WsError {
        self.call(Code::UpdateCustomAnimation, |data| {
            data.write_bool(is_add)?;
            Ok(())
        })
    }

    /// Toggle landscape multi-window.
    pub fn set_landscape_multi_window(&self, enabled: bool) -> WsError {
        self.call(Code::SetLandscapeMultiWindow, |data| {
            data.write_bool(enabled)?;
            Ok(())
        })
    }

    /// Raise above the sub window `sub_window_id`.
    pub fn raise_above_target(&self, sub_window_id: i32) -> WsError {
        self.call(Code::RaiseAboveTarget, |data| {
            data.write_i32(sub_window_id)?;
            Ok(())
        })
    }

    /// Raise the application's main window.
    pub fn raise_app_main_window_to_top(&self) -> WsError {
        self.call(Code::RaiseAppMainWindow, |_| Ok(()))
    }

    /// Change visibility together with the status bar.
    ///
    /// Returns [`WsError::InvalidSession`] without sending when `info` is
    /// absent.
    pub fn change_session_visibility_with_status_bar(
        &self,
        info: Option<&AbilitySessionInfo>,
        visible: bool,
    ) -> WsError {
        let Some(info) = info else {
            return missing_session_info(Code::ChangeSessionVisibilityWithStatusBar);
        };
        self.call(Code::ChangeSessionVisibilityWithStatusBar, |data| {
            info.write_to(data, SessionInfoLayout::Visibility)?;
            data.write_bool(visible)?;
            Ok(())
        })
    }

    /// Activate a pending ability session.
    ///
    /// Returns [`WsError::InvalidSession`] without sending when `info` is
    /// absent.
    pub fn pending_session_activation(&self, info: Option<&AbilitySessionInfo>) -> WsError {
        self.send_session_info(Code::ActivePendingSession, info, SessionInfoLayout::Activation)
    }

    /// Terminate the ability session.
    ///
    /// Returns [`WsError::InvalidSession`] without sending when `info` is
    /// absent.
    pub fn terminate_session(&self, info: Option<&AbilitySessionInfo>) -> WsError {
        self.send_session_info(Code::TerminateSession, info, SessionInfoLayout::Termination)
    }

    /// Report an ability session exception.
    ///
    /// Returns [`WsError::InvalidSession`] without sending when `info` is
    /// absent.
    pub fn notify_session_exception(&self, info: Option<&AbilitySessionInfo>) -> WsError {
        self.send_session_info(Code::NotifySessionException, info, SessionInfoLayout::Exception)
    }

    /// Report a pointer down at (`x`, `y`).
    pub fn process_point_down_session(&self, x: i32, y: i32) -> WsError {
        self.call(Code::ProcessPointDownSession, |data| {
            data.write_i32(x)?;
            data.write_i32(y)?;
            Ok(())
        })
    }

    /// Set keyboard gravity and height percentage.
    pub fn set_keyboard_session_gravity(&self, gravity: SessionGravity, percent: u32) -> WsError {
        self.call(Code::SetKeyboardSessionGravity, |data| {
            data.write_u32(gravity.code())?;
            data.write_u32(percent)?;
            Ok(())
        })
    }

    /// Record the session that called up the keyboard.
    pub fn set_calling_session_id(&self, calling_session_id: u32) -> WsError {
        self.call(Code::SetCallingSessionId, |data| {
            data.write_u32(calling_session_id)?;
            Ok(())
        })
    }

    /// Report the height of a custom decoration.
    pub fn set_custom_decor_height(&self, height: i32) -> WsError {
        self.call(Code::SetCustomDecorHeight, |data| {
            data.write_i32(height)?;
            Ok(())
        })
    }

    /// Lay out the keyboard panel.
    pub fn adjust_keyboard_layout(&self, params: &KeyboardLayoutParams) -> WsError {
        self.call(Code::AdjustKeyboardLayout, |data| {
            data.write_parcelable(Some(params))?;
            Ok(())
        })
    }

    /// Return an ability result through the session.
    pub fn transfer_ability_result(&self, result_code: u32, want: &Want) -> WsError {
        self.call(Code::TransferAbilityResult, |data| {
            data.write_u32(result_code)?;
            data.write_parcelable(Some(want))?;
            Ok(())
        })
    }

    /// Pass extension data to the host.
    pub fn transfer_extension_data(&self, params: &WantParams) -> WsError {
        self.call(Code::TransferExtensionData, |data| {
            data.write_parcelable(Some(params))?;
            Ok(())
        })
    }

    /// Report that the remote extension is ready.
    pub fn notify_remote_ready(&self) -> WsError {
        self.call(Code::NotifyRemoteReady, |_| Ok(()))
    }

    /// Switch extension calls to async.
    pub fn notify_async_on(&self) -> WsError {
        self.call(Code::NotifyAsyncOn, |_| Ok(()))
    }

    /// Switch extension calls to sync.
    pub fn notify_sync_on(&self) -> WsError {
        self.call(Code::NotifySyncOn, |_| Ok(()))
    }

    /// Report that the extension process died.
    pub fn notify_extension_died(&self) -> WsError {
        self.call(Code::NotifyExtensionDied, |_| Ok(()))
    }

    /// Report that the extension timed out.
    pub fn notify_extension_timeout(&self, error_code: i32) -> WsError {
        self.call(Code::NotifyExtensionTimeout, |data| {
            data.write_i32(error_code)?;
            Ok(())
        })
    }

    /// Bind a modal UI extension. Waits for the host to finish.
    pub fn trigger_bind_modal_ui_extension(&self) -> WsError {
        match self.request(Code::TriggerBindModalUiExtension, |_| Ok(())) {
            Ok(_) => WsError::Ok,
            Err(result) => result,
        }
    }

    /// Report that the picture-in-picture window is about to close.
    pub fn notify_pip_window_prepare_close(&self) -> WsError {
        self.call(Code::NotifyPipWindowPrepareClose, |_| Ok(()))
    }

    /// Move or resize the picture-in-picture window.
    pub fn update_pip_rect(&self, rect: Rect, reason: SizeChangeReason) -> WsError {
        self.call(Code::UpdatePipRect, |data| {
            rect.marshal(data)?;
            data.write_i32(reason.code().cast_signed())?;
            Ok(())
        })
    }

    fn send_session_info(
        &self,
        code: Code,
        info: Option<&AbilitySessionInfo>,
        layout: SessionInfoLayout,
    ) -> WsError {
        let Some(info) = info else {
            return missing_session_info(code);
        };
        self.call(code, |data| {
            info.write_to(data, layout)?;
            Ok(())
        })
    }

    /// Send and, for synchronous codes, read the trailing result.
    fn call(&self, code: Code, write: impl FnOnce(&mut MessageParcel) -> IpcResult<()>) -> WsError {
        match self.request(code, write) {
            Ok(_) if code.is_one_way() => WsError::Ok,
            Ok(mut reply) => read_result(&mut reply),
            Err(result) => result,
        }
    }

    fn request(
        &self,
        code: Code,
        write: impl FnOnce(&mut MessageParcel) -> IpcResult<()>,
    ) -> Result<MessageParcel, WsError> {
        let option = if code.is_one_way() {
            MessageOption::one_way()
        } else {
            MessageOption::sync()
        };
        let mut data = self.inner.new_request().map_err(|e| {
            error!(%code, error = %e, "failed to write interface token");
            WsError::IpcFailed
        })?;
        write(&mut data).map_err(|e| {
            error!(%code, error = %e, "failed to write request");
            WsError::IpcFailed
        })?;
        self.inner.send(code.into(), data, option).map_err(|e| {
            error!(%code, status = e.status(), "session call failed");
            WsError::IpcFailed
        })
    }
}

fn write_guarded_property(
    data: &mut MessageParcel,
    property: Option<&WindowSessionProperty>,
) -> IpcResult<()> {
    data.write_bool(property.is_some())?;
    if let Some(property) = property {
        data.write_parcelable(Some(property))?;
    }
    Ok(())
}

fn missing_session_info(code: Code) -> WsError {
    warn!(%code, "ability session info is null");
    WsError::InvalidSession
}

fn read_result(reply: &mut MessageParcel) -> WsError {
    match reply.read_u32() {
        Ok(raw) => WsError::from_code(raw).unwrap_or_else(|| {
            warn!(result = raw, "unknown session result");
            WsError::IpcFailed
        }),
        Err(e) => {
            error!(error = %e, "session reply is unreadable");
            WsError::IpcFailed
        }
    }
}

fn read_connect_reply(
    reply: &mut MessageParcel,
    property: Option<&mut WindowSessionProperty>,
) -> IpcResult<ConnectReply> {
    let system_config = reply
        .read_parcelable::<SystemSessionConfig>()?
        .unwrap_or_default();
    if let Some(property) = property {
        property.persistent_id = reply.read_i32()?;
        property.display_id = reply.read_u64()?;
        property.need_update_window_mode = reply.read_bool()?;
        if property.need_update_window_mode {
            let raw = reply.read_u32()?;
            property.window_mode = WindowMode::from_code(raw).unwrap_or_default();
        }
        let rect = Rect::unmarshal(reply)?;
        if property.window_rect.is_uninitialized() && !rect.is_uninitialized() {
            property.window_rect = rect;
        }
        property.collaborator_type = reply.read_i32()?;
    }
    Ok(ConnectReply {
        result: read_result(reply),
        system_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohipc_test_helpers::mock::MockRemoteObject;

    fn proxy() -> (Arc<MockRemoteObject>, SessionProxy) {
        let mock = MockRemoteObject::new(SESSION_DESCRIPTOR);
        let remote: Arc<dyn RemoteObject> = mock.clone();
        (mock, SessionProxy::new(remote))
    }

    #[test]
    fn test_lifecycle_modes() {
        let (mock, proxy) = proxy();
        assert_eq!(proxy.background(true), WsError::Ok);
        assert_eq!(proxy.notify_extension_died(), WsError::Ok);
        assert!(mock.calls().iter().all(|call| call.one_way));

        // A synchronous call against an empty reply cannot read a result.
        assert_eq!(proxy.hide(), WsError::IpcFailed);
        assert!(mock.last_call().is_some_and(|call| !call.one_way));
    }

    #[test]
    fn test_missing_session_info_is_not_sent() {
        let (mock, proxy) = proxy();
        assert_eq!(proxy.terminate_session(None), WsError::InvalidSession);
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_dead_session_maps_to_ipc_failed() {
        let (mock, proxy) = proxy();
        mock.fire_death();
        assert_eq!(proxy.background(false), WsError::IpcFailed);
        assert_eq!(proxy.get_global_maximize_mode(), Err(WsError::IpcFailed));
    }
}
