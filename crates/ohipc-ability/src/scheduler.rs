//! Service-side contract of the ability scheduler.

use std::fs::File;
use std::sync::Arc;

use ohipc_core::RemoteObject;
use ohipc_types::{AbilitySessionInfo, PacMap, Uri, Want};

use crate::data::{DataAbilityOperation, DataAbilityPredicates, DataAbilityResult, ResultSet, ValuesBucket};
use crate::lifecycle::{LifeCycleStateInfo, WindowCommand};
use crate::observer::DataAbilityObserverProxy;

/// Ability-side implementation behind
/// [`AbilitySchedulerStub`](crate::AbilitySchedulerStub).
///
/// The ability manager drives an ability through these calls. Lifecycle
/// methods are fire-and-forget; data ability methods answer the caller.
/// Every method has a default so an ability only implements what it
/// supports: lifecycle calls do nothing, queries answer "nothing found",
/// counts are zero and URIs map to themselves.
pub trait AbilityScheduler: Send + Sync + 'static {
    /// Move to the state in `state_info`.
    fn schedule_ability_transaction(
        &self,
        _want: &Want,
        _state_info: &LifeCycleStateInfo,
        _session_info: Option<AbilitySessionInfo>,
    ) {
    }

    /// Deliver a result for an ability started with `request_code`.
    fn send_result(&self, _request_code: i32, _result_code: i32, _want: &Want) {}

    /// Accept a connection.
    fn schedule_connect_ability(&self, _want: &Want) {}

    /// Drop a connection.
    fn schedule_disconnect_ability(&self, _want: &Want) {}

    /// Handle a start command.
    fn schedule_command_ability(&self, _want: &Want, _restart: bool, _start_id: i32) {}

    /// Whether the ability agrees to terminate.
    fn schedule_prepare_terminate_ability(&self) -> bool {
        false
    }

    /// Apply a window command.
    fn schedule_command_ability_window(
        &self,
        _want: &Want,
        _session_info: Option<AbilitySessionInfo>,
        _command: WindowCommand,
    ) {
    }

    /// Save state.
    fn schedule_save_ability_state(&self) {}

    /// Restore state saved into `state`.
    fn schedule_restore_ability_state(&self, _state: &PacMap) {}

    /// MIME types of `uri` matching `mime_type_filter`.
    fn get_file_types(&self, _uri: &Uri, _mime_type_filter: &str) -> Vec<String> {
        Vec::new()
    }

    /// Open the file behind `uri`. `None` reports a failure to open.
    fn open_file(&self, _uri: &Uri, _mode: &str) -> Option<File> {
        None
    }

    /// Open the raw file behind `uri`, answering a descriptor number or a
    /// negative value.
    fn open_raw_file(&self, _uri: &Uri, _mode: &str) -> i32 {
        -1
    }

    /// Insert a row, answering its index.
    fn insert(&self, _uri: &Uri, _value: &ValuesBucket) -> i32 {
        0
    }

    /// Update matching rows, answering the count.
    fn update(&self, _uri: &Uri, _value: &ValuesBucket, _predicates: &DataAbilityPredicates) -> i32 {
        0
    }

    /// Delete matching rows, answering the count.
    fn delete(&self, _uri: &Uri, _predicates: &DataAbilityPredicates) -> i32 {
        0
    }

    /// Query matching rows. `None` reports a failed query.
    fn query(
        &self,
        _uri: &Uri,
        _columns: &[String],
        _predicates: &DataAbilityPredicates,
    ) -> Option<ResultSet> {
        None
    }

    /// Call a provider method.
    fn call(&self, _uri: &Uri, _method: &str, _arg: &str, _extras: &PacMap) -> Option<PacMap> {
        None
    }

    /// MIME type of `uri`.
    fn get_type(&self, _uri: &Uri) -> String {
        String::new()
    }

    /// Reload the data behind `uri`.
    fn reload(&self, _uri: &Uri, _extras: &PacMap) -> bool {
        false
    }

    /// Insert `values`, answering the number inserted.
    fn batch_insert(&self, _uri: &Uri, _values: &[ValuesBucket]) -> i32 {
        0
    }

    /// Register `observer` for changes to `uri`.
    fn schedule_register_observer(&self, _uri: &Uri, _observer: DataAbilityObserverProxy) -> bool {
        false
    }

    /// Unregister `observer` from `uri`.
    fn schedule_unregister_observer(&self, _uri: &Uri, _observer: &DataAbilityObserverProxy) -> bool {
        false
    }

    /// Notify observers of `uri`.
    fn schedule_notify_change(&self, _uri: &Uri) -> bool {
        false
    }

    /// Normalized form of `uri`.
    fn normalize_uri(&self, uri: &Uri) -> Uri {
        uri.clone()
    }

    /// Reverse of [`AbilityScheduler::normalize_uri`].
    fn denormalize_uri(&self, uri: &Uri) -> Uri {
        uri.clone()
    }

    /// Run `operations` in order, one result each.
    fn execute_batch(&self, _operations: &[DataAbilityOperation]) -> Vec<DataAbilityResult> {
        Vec::new()
    }

    /// Outcome of a continuation.
    fn notify_continuation_result(&self, _result: i32) {}

    /// Publish the call stub.
    fn call_request(&self) {}

    /// Continue on `device_id`.
    fn continue_ability(&self, _device_id: &str, _version_code: u32) {}

    /// State lines for `params`.
    fn dump_ability_info(&self, _params: &[String]) -> Vec<String> {
        Vec::new()
    }

    /// Share data for `request_code`.
    fn schedule_share_data(&self, _request_code: i32) {}

    /// Execute the intent in `want`.
    fn on_execute_intent(&self, _want: &Want) {}

    /// Create a modal UI extension, answering an error code.
    fn create_modal_ui_extension(&self, _want: &Want) -> i32 {
        0
    }

    /// Replace the session token.
    fn update_session_token(&self, _session_token: Option<Arc<dyn RemoteObject>>) {}
}
