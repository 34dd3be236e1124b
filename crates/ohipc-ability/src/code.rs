//! Operation codes.

use std::fmt;

use ohipc_core::FIRST_CALL_TRANSACTION;

/// Operation codes of the ability scheduler.
///
/// Values are part of the wire contract and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AbilitySchedulerCode {
    /// Move the ability to a lifecycle state.
    ScheduleAbilityTransaction = FIRST_CALL_TRANSACTION,
    /// Deliver the result of an ability started for result.
    SendResult,
    /// Connect to a service ability.
    ScheduleAbilityConnect,
    /// Disconnect from a service ability.
    ScheduleAbilityDisconnect,
    /// Send a start command to a service ability.
    ScheduleAbilityCommand,
    /// Ask whether the ability agrees to terminate.
    SchedulePrepareTerminate,
    /// Send a window command to an ability.
    ScheduleAbilityCommandWindow,
    /// Save ability state.
    ScheduleSaveAbilityState,
    /// Restore ability state.
    ScheduleRestoreAbilityState,
    /// List MIME types of a data ability file.
    ScheduleGetFileTypes,
    /// Open a data ability file.
    ScheduleOpenFile,
    /// Open a raw data ability file.
    ScheduleOpenRawFile,
    /// Insert a row.
    ScheduleInsert,
    /// Update rows.
    ScheduleUpdate,
    /// Delete rows.
    ScheduleDelete,
    /// Query rows.
    ScheduleQuery,
    /// Call a provider method.
    ScheduleCall,
    /// MIME type of a URI.
    ScheduleGetType,
    /// Reload data behind a URI.
    ScheduleReload,
    /// Insert many rows.
    ScheduleBatchInsert,
    /// Register a data observer.
    ScheduleRegisterObserver,
    /// Unregister a data observer.
    ScheduleUnregisterObserver,
    /// Notify observers of a URI.
    ScheduleNotifyChange,
    /// Normalize a URI.
    ScheduleNormalizeUri,
    /// Reverse URI normalization.
    ScheduleDenormalizeUri,
    /// Run a batch of data operations.
    ScheduleExecuteBatch,
    /// Report the outcome of a continuation.
    NotifyContinuationResult,
    /// Ask the ability for its call stub.
    RequestCallRemote,
    /// Continue the ability on another device.
    ContinueAbility,
    /// Dump ability runner state.
    DumpAbilityRunner,
    /// Ask the ability to share data.
    ScheduleShareData,
    /// Execute an intent.
    ScheduleOnExecuteIntent,
    /// Create a modal UI extension.
    CreateModalUiExtension,
    /// Replace the session token.
    UpdateSessionToken,
}

impl AbilitySchedulerCode {
    /// All codes, in ascending order.
    pub const ALL: [AbilitySchedulerCode; 34] = [
        AbilitySchedulerCode::ScheduleAbilityTransaction,
        AbilitySchedulerCode::SendResult,
        AbilitySchedulerCode::ScheduleAbilityConnect,
        AbilitySchedulerCode::ScheduleAbilityDisconnect,
        AbilitySchedulerCode::ScheduleAbilityCommand,
        AbilitySchedulerCode::SchedulePrepareTerminate,
        AbilitySchedulerCode::ScheduleAbilityCommandWindow,
        AbilitySchedulerCode::ScheduleSaveAbilityState,
        AbilitySchedulerCode::ScheduleRestoreAbilityState,
        AbilitySchedulerCode::ScheduleGetFileTypes,
        AbilitySchedulerCode::ScheduleOpenFile,
        AbilitySchedulerCode::ScheduleOpenRawFile,
        AbilitySchedulerCode::ScheduleInsert,
        AbilitySchedulerCode::ScheduleUpdate,
        AbilitySchedulerCode::ScheduleDelete,
        AbilitySchedulerCode::ScheduleQuery,
        AbilitySchedulerCode::ScheduleCall,
        AbilitySchedulerCode::ScheduleGetType,
        AbilitySchedulerCode::ScheduleReload,
        AbilitySchedulerCode::ScheduleBatchInsert,
        AbilitySchedulerCode::ScheduleRegisterObserver,
        AbilitySchedulerCode::ScheduleUnregisterObserver,
        AbilitySchedulerCode::ScheduleNotifyChange,
        AbilitySchedulerCode::ScheduleNormalizeUri,
        AbilitySchedulerCode::ScheduleDenormalizeUri,
        AbilitySchedulerCode::ScheduleExecuteBatch,
        AbilitySchedulerCode::NotifyContinuationResult,
        AbilitySchedulerCode::RequestCallRemote,
        AbilitySchedulerCode::ContinueAbility,
        AbilitySchedulerCode::DumpAbilityRunner,
        AbilitySchedulerCode::ScheduleShareData,
        AbilitySchedulerCode::ScheduleOnExecuteIntent,
        AbilitySchedulerCode::CreateModalUiExtension,
        AbilitySchedulerCode::UpdateSessionToken,
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
            Self::ScheduleAbilityTransaction
                | Self::SendResult
                | Self::ScheduleAbilityConnect
                | Self::ScheduleAbilityDisconnect
                | Self::ScheduleAbilityCommand
                | Self::ScheduleAbilityCommandWindow
                | Self::ScheduleSaveAbilityState
                | Self::ScheduleRestoreAbilityState
                | Self::NotifyContinuationResult
                | Self::RequestCallRemote
                | Self::ContinueAbility
                | Self::ScheduleShareData
                | Self::ScheduleOnExecuteIntent
                | Self::UpdateSessionToken
        )
    }
}

impl From<AbilitySchedulerCode> for u32 {
    fn from(code: AbilitySchedulerCode) -> Self {
        code.code()
    }
}

impl fmt::Display for AbilitySchedulerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// Operation codes of a data ability observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataAbilityObserverCode {
    /// Data behind an observed URI changed.
    OnChange = FIRST_CALL_TRANSACTION,
}

impl From<DataAbilityObserverCode> for u32 {
    fn from(code: DataAbilityObserverCode) -> Self {
        code as u32
    }
}
