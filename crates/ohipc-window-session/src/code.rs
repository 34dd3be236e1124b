//! Operation codes of the window session.

use std::fmt;

use ohipc_core::FIRST_CALL_TRANSACTION;

/// Operation codes of a window session.
///
/// Values are part of the wire contract and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SessionInterfaceCode {
    /// Attach a client stage and event channel to the session.
    Connect = FIRST_CALL_TRANSACTION,
    /// Bring the session to the foreground.
    Foreground,
    /// Send the session to the background.
    Background,
    /// Detach the client.
    Disconnect,
    /// Show the session.
    Show,
    /// Hide the session.
    Hide,
    /// Register or unregister the rect change listener.
    UpdateRectChangeListenerRegistered,
    /// Mark the session active or inactive.
    UpdateActiveStatus,
    /// Deliver a title bar or drag event.
    SessionEvent,
    /// Move or resize the session.
    UpdateSessionRect,
    /// Raise the session to the top of its application.
    RaiseToAppTop,
    /// Back key pressed in the session.
    BackPressed,
    /// An input event was consumed.
    MarkProcessed,
    /// Set the global maximize mode.
    SetMaximizeMode,
    /// Read the global maximize mode.
    GetMaximizeMode,
    /// Whether the session avoids system bars.
    NeedAvoid,
    /// Area to avoid for a given avoid type.
    GetAvoidArea,
    /// Replace the session property.
    SetSessionProperty,
    /// Fix the aspect ratio.
    SetAspectRatio,
    /// Toggle the default window animation.
    UpdateWindowAnimationFlag,
    /// Custom animation finished.
    UpdateCustomAnimation,
    /// Toggle landscape multi-window.
    SetLandscapeMultiWindow,
    /// Raise above a sub window.
    RaiseAboveTarget,
    /// Raise the application's main window.
    RaiseAppMainWindow,
    /// Change visibility together with the status bar.
    ChangeSessionVisibilityWithStatusBar,
    /// Activate a pending ability session.
    ActivePendingSession,
    /// Terminate the ability session.
    TerminateSession,
    /// Report an ability session exception.
    NotifySessionException,
    /// Pointer down outside the focused session.
    ProcessPointDownSession,
    /// Set keyboard gravity.
    SetKeyboardSessionGravity,
    /// Record the session that called up the keyboard.
    SetCallingSessionId,
    /// Height of a custom decoration.
    SetCustomDecorHeight,
    /// Lay out the keyboard panel.
    AdjustKeyboardLayout,
    /// Return an ability result through the session.
    TransferAbilityResult,
    /// Pass extension data to the host.
    TransferExtensionData,
    /// The remote extension is ready.
    NotifyRemoteReady,
    /// Extension calls switch to async.
    NotifyAsyncOn,
    /// Extension calls switch to sync.
    NotifySyncOn,
    /// The extension process died.
    NotifyExtensionDied,
    /// The extension timed out.
    NotifyExtensionTimeout,
    /// Bind a modal UI extension.
    TriggerBindModalUiExtension,
    /// Picture-in-picture window is about to close.
    NotifyPipWindowPrepareClose,
    /// Move or resize the picture-in-picture window.
    UpdatePipRect,
}

impl SessionInterfaceCode {
    /// All codes, in ascending order.
    pub const ALL: [SessionInterfaceCode; 43] = [
        SessionInterfaceCode::Connect,
        SessionInterfaceCode::Foreground,
        SessionInterfaceCode::Background,
        SessionInterfaceCode::Disconnect,
        SessionInterfaceCode::Show,
        SessionInterfaceCode::Hide,
        SessionInterfaceCode::UpdateRectChangeListenerRegistered,
        SessionInterfaceCode::UpdateActiveStatus,
        SessionInterfaceCode::SessionEvent,
        SessionInterfaceCode::UpdateSessionRect,
        SessionInterfaceCode::RaiseToAppTop,
        SessionInterfaceCode::BackPressed,
        SessionInterfaceCode::MarkProcessed,
        SessionInterfaceCode::SetMaximizeMode,
        SessionInterfaceCode::GetMaximizeMode,
        SessionInterfaceCode::NeedAvoid,
        SessionInterfaceCode::GetAvoidArea,
        SessionInterfaceCode::SetSessionProperty,
        SessionInterfaceCode::SetAspectRatio,
        SessionInterfaceCode::UpdateWindowAnimationFlag,
        SessionInterfaceCode::UpdateCustomAnimation,
        SessionInterfaceCode::SetLandscapeMultiWindow,
        SessionInterfaceCode::RaiseAboveTarget,
        SessionInterfaceCode::RaiseAppMainWindow,
        SessionInterfaceCode::ChangeSessionVisibilityWithStatusBar,
        SessionInterfaceCode::ActivePendingSession,
        SessionInterfaceCode::TerminateSession,
        SessionInterfaceCode::NotifySessionException,
        SessionInterfaceCode::ProcessPointDownSession,
        SessionInterfaceCode::SetKeyboardSessionGravity,
        SessionInterfaceCode::SetCallingSessionId,
        SessionInterfaceCode::SetCustomDecorHeight,
        SessionInterfaceCode::AdjustKeyboardLayout,
        SessionInterfaceCode::TransferAbilityResult,
        SessionInterfaceCode::TransferExtensionData,
        SessionInterfaceCode::NotifyRemoteReady,
        SessionInterfaceCode::NotifyAsyncOn,
        SessionInterfaceCode::NotifySyncOn,
        SessionInterfaceCode::NotifyExtensionDied,
        SessionInterfaceCode::NotifyExtensionTimeout,
        SessionInterfaceCode::TriggerBindModalUiExtension,
        SessionInterfaceCode::NotifyPipWindowPrepareClose,
        SessionInterfaceCode::UpdatePipRect,
    ];

    /// Wire value.
    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Whether the proxy sends this operation without waiting for a reply.
    #[must_use]
    pub fn is_one_way(self) -> bool {
        matches!(
            self,
            Self::Background
                | Self::Disconnect
                | Self::UpdateActiveStatus
                | Self::SessionEvent
                | Self::UpdateSessionRect
                | Self::BackPressed
                | Self::MarkProcessed
                | Self::NeedAvoid
                | Self::UpdateCustomAnimation
                | Self::SetLandscapeMultiWindow
                | Self::RaiseAppMainWindow
                | Self::ChangeSessionVisibilityWithStatusBar
                | Self::ActivePendingSession
                | Self::TerminateSession
                | Self::NotifySessionException
                | Self::SetKeyboardSessionGravity
                | Self::SetCallingSessionId
                | Self::SetCustomDecorHeight
                | Self::AdjustKeyboardLayout
                | Self::TransferAbilityResult
                | Self::TransferExtensionData
                | Self::NotifyRemoteReady
                | Self::NotifyAsyncOn
                | Self::NotifySyncOn
                | Self::NotifyExtensionDied
                | Self::NotifyExtensionTimeout
                | Self::NotifyPipWindowPrepareClose
        )
    }
}

impl From<SessionInterfaceCode> for u32 {
    fn from(code: SessionInterfaceCode) -> Self {
        code.code()
    }
}

impl fmt::Display for SessionInterfaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_from_first_call() {
        for (offset, code) in (0u32..).zip(SessionInterfaceCode::ALL) {
            assert_eq!(code.code(), FIRST_CALL_TRANSACTION + offset);
            assert_eq!(SessionInterfaceCode::from_code(code.code()), Some(code));
        }
        assert_eq!(SessionInterfaceCode::from_code(0), None);
        assert_eq!(SessionInterfaceCode::from_code(44), None);
    }

    #[test]
    fn test_queries_wait_for_reply() {
        for code in [
            SessionInterfaceCode::Connect,
            SessionInterfaceCode::Foreground,
            SessionInterfaceCode::GetAvoidArea,
            SessionInterfaceCode::GetMaximizeMode,
            SessionInterfaceCode::TriggerBindModalUiExtension,
        ] {
            assert!(!code.is_one_way(), "{code}");
        }
        assert!(SessionInterfaceCode::NotifyExtensionDied.is_one_way());
    }
}
