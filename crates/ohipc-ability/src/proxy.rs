//! Client side of the ability scheduler.

use std::fs::File;
use std::sync::Arc;

use ohipc_core::{MessageOption, MessageParcel, Parcelable, RemoteObject, RemoteProxy, reply_error};
use ohipc_errors::{IpcError, IpcResult};
use ohipc_types::{AbilitySessionInfo, PacMap, SessionInfoLayout, Uri, Want};
use tracing::error;

use crate::code::AbilitySchedulerCode as Code;
use crate::data::{
    DataAbilityOperation, DataAbilityPredicates, DataAbilityResult, ResultSet, ValuesBucket,
};
use crate::lifecycle::{LifeCycleStateInfo, WindowCommand};
use crate::stub::ABILITY_SCHEDULER_DESCRIPTOR;

/// Typed client of an ability's scheduler.
///
/// Calls flagged one-way by [`AbilitySchedulerCode::is_one_way`](crate::AbilitySchedulerCode::is_one_way)
/// return as soon as the request is queued. Every method surfaces the
/// transport status; a reply that cannot be decoded is reported as
/// [`IpcError::InvalidReply`].
#[derive(Debug, Clone)]
pub struct AbilitySchedulerProxy {
    inner: RemoteProxy,
}

impl AbilitySchedulerProxy {
    /// Wrap the scheduler handle `remote`.
    pub fn new(remote: Arc<dyn RemoteObject>) -> Self {
        Self {
            inner: RemoteProxy::new(remote, ABILITY_SCHEDULER_DESCRIPTOR),
        }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        self.inner.remote()
    }

    /// Move the ability to the state in `state_info`.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_ability_transaction(
        &self,
        want: &Want,
        state_info: &LifeCycleStateInfo,
        session_info: Option<&AbilitySessionInfo>,
    ) -> IpcResult<()> {
        self.call(Code::ScheduleAbilityTransaction, |request| {
            request.write_parcelable(Some(want))?;
            request.write_parcelable(Some(state_info))?;
            write_session_info(request, session_info)
        })
        .map(drop)
    }

    /// Deliver a result for `request_code`.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn send_result(&self, request_code: i32, result_code: i32, want: &Want) -> IpcResult<()> {
        self.call(Code::SendResult, |request| {
            request.write_i32(request_code)?;
            request.write_i32(result_code)?;
            request.write_parcelable(Some(want))?;
            Ok(())
        })
        .map(drop)
    }

    /// Connect to the ability.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_connect_ability(&self, want: &Want) -> IpcResult<()> {
        self.send_want(Code::ScheduleAbilityConnect, want)
    }

    /// Disconnect from the ability.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_disconnect_ability(&self, want: &Want) -> IpcResult<()> {
        self.send_want(Code::ScheduleAbilityDisconnect, want)
    }

    /// Send a start command.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_command_ability(&self, want: &Want, restart: bool, start_id: i32) -> IpcResult<()> {
        self.call(Code::ScheduleAbilityCommand, |request| {
            request.write_parcelable(Some(want))?;
            request.write_bool(restart)?;
            request.write_i32(start_id)?;
            Ok(())
        })
        .map(drop)
    }

    /// Ask whether the ability agrees to terminate.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn schedule_prepare_terminate_ability(&self) -> IpcResult<bool> {
        let mut reply = self.call(Code::SchedulePrepareTerminate, |_request| Ok(()))?;
        read_flag(&mut reply)
    }

    /// Send `command` to the ability's window.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_command_ability_window(
        &self,
        want: &Want,
        session_info: Option<&AbilitySessionInfo>,
        command: WindowCommand,
    ) -> IpcResult<()> {
        self.call(Code::ScheduleAbilityCommandWindow, |request| {
            request.write_parcelable(Some(want))?;
            write_session_info(request, session_info)?;
            request.write_i32(command.code())?;
            Ok(())
        })
        .map(drop)
    }

    /// Ask the ability to save its state.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_save_ability_state(&self) -> IpcResult<()> {
        self.call(Code::ScheduleSaveAbilityState, |_request| Ok(())).map(drop)
    }

    /// Hand saved state back to the ability.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_restore_ability_state(&self, state: &PacMap) -> IpcResult<()> {
        self.call(Code::ScheduleRestoreAbilityState, |request| {
            request.write_parcelable(Some(state))?;
            Ok(())
        })
        .map(drop)
    }

    /// MIME types of `uri` matching `mime_type_filter`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn get_file_types(&self, uri: &Uri, mime_type_filter: &str) -> IpcResult<Vec<String>> {
        let mut reply = self.call(Code::ScheduleGetFileTypes, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_string(mime_type_filter)?;
            Ok(())
        })?;
        reply.read_string_vector().map_err(reply_error)
    }

    /// Open the file behind `uri` with `mode`.
    ///
    /// # Errors
    ///
    /// Returns the transport status, or an undecodable reply when the
    /// descriptor cannot be taken over.
    pub fn open_file(&self, uri: &Uri, mode: &str) -> IpcResult<File> {
        let mut reply = self.call(Code::ScheduleOpenFile, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_string(mode)?;
            Ok(())
        })?;
        reply.read_file_descriptor().map_err(reply_error)
    }

    /// Open the raw file behind `uri` with `mode`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn open_raw_file(&self, uri: &Uri, mode: &str) -> IpcResult<i32> {
        let mut reply = self.call(Code::ScheduleOpenRawFile, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_string(mode)?;
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Insert `value` into `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn insert(&self, uri: &Uri, value: &ValuesBucket) -> IpcResult<i32> {
        let mut reply = self.call(Code::ScheduleInsert, |request| {
            request.write_parcelable(Some(uri))?;
            value.marshal(request)?;
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Update rows of `uri` matching `predicates`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn update(
        &self,
        uri: &Uri,
        value: &ValuesBucket,
        predicates: &DataAbilityPredicates,
    ) -> IpcResult<i32> {
        let mut reply = self.call(Code::ScheduleUpdate, |request| {
            request.write_parcelable(Some(uri))?;
            value.marshal(request)?;
            request.write_parcelable(Some(predicates))?;
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Delete rows of `uri` matching `predicates`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn delete(&self, uri: &Uri, predicates: &DataAbilityPredicates) -> IpcResult<i32> {
        let mut reply = self.call(Code::ScheduleDelete, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_parcelable(Some(predicates))?;
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Query `columns` of the rows of `uri` matching `predicates`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply. A failed
    /// query arrives as an invalid-value status.
    pub fn query(
        &self,
        uri: &Uri,
        columns: &[String],
        predicates: &DataAbilityPredicates,
    ) -> IpcResult<ResultSet> {
        let mut reply = self.call(Code::ScheduleQuery, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_string_vector(columns)?;
            request.write_parcelable(Some(predicates))?;
            Ok(())
        })?;
        ResultSet::unmarshal(&mut reply).map_err(reply_error)
    }

    /// Call provider method `method`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn call_method(
        &self,
        uri: &Uri,
        method: &str,
        arg: &str,
        extras: &PacMap,
    ) -> IpcResult<Option<PacMap>> {
        let mut reply = self.call(Code::ScheduleCall, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_string(method)?;
            request.write_string(arg)?;
            request.write_parcelable(Some(extras))?;
            Ok(())
        })?;
        reply.read_parcelable().map_err(reply_error)
    }

    /// MIME type of `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn get_type(&self, uri: &Uri) -> IpcResult<String> {
        let mut reply = self.send_uri(Code::ScheduleGetType, uri)?;
        reply.read_string().map_err(reply_error)
    }

    /// Reload the data behind `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn reload(&self, uri: &Uri, extras: &PacMap) -> IpcResult<bool> {
        let mut reply = self.call(Code::ScheduleReload, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_parcelable(Some(extras))?;
            Ok(())
        })?;
        reply.read_bool().map_err(reply_error)
    }

    /// Insert every bucket in `values`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn batch_insert(&self, uri: &Uri, values: &[ValuesBucket]) -> IpcResult<i32> {
        let mut reply = self.call(Code::ScheduleBatchInsert, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_count(values.len())?;
            for value in values {
                value.marshal(request)?;
            }
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Register the observer handle `observer` for `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn schedule_register_observer(
        &self,
        uri: &Uri,
        observer: &Arc<dyn RemoteObject>,
    ) -> IpcResult<bool> {
        let mut reply = self.send_observer(Code::ScheduleRegisterObserver, uri, observer)?;
        read_flag(&mut reply)
    }

    /// Unregister the observer handle `observer` from `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn schedule_unregister_observer(
        &self,
        uri: &Uri,
        observer: &Arc<dyn RemoteObject>,
    ) -> IpcResult<bool> {
        let mut reply = self.send_observer(Code::ScheduleUnregisterObserver, uri, observer)?;
        read_flag(&mut reply)
    }

    /// Notify the observers of `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn schedule_notify_change(&self, uri: &Uri) -> IpcResult<bool> {
        let mut reply = self.send_uri(Code::ScheduleNotifyChange, uri)?;
        read_flag(&mut reply)
    }

    /// Normalized form of `uri`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn normalize_uri(&self, uri: &Uri) -> IpcResult<Uri> {
        let mut reply = self.send_uri(Code::ScheduleNormalizeUri, uri)?;
        reply
            .read_required_parcelable("normalized uri")
            .map_err(reply_error)
    }

    /// Reverse of [`AbilitySchedulerProxy::normalize_uri`].
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn denormalize_uri(&self, uri: &Uri) -> IpcResult<Uri> {
        let mut reply = self.send_uri(Code::ScheduleDenormalizeUri, uri)?;
        reply
            .read_required_parcelable("denormalized uri")
            .map_err(reply_error)
    }

    /// Run `operations` in order.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn execute_batch(
        &self,
        operations: &[DataAbilityOperation],
    ) -> IpcResult<Vec<DataAbilityResult>> {
        let mut reply = self.call(Code::ScheduleExecuteBatch, |request| {
            request.write_count(operations.len())?;
            for operation in operations {
                request.write_parcelable(Some(operation))?;
            }
            Ok(())
        })?;
        let count = reply.read_count().map_err(reply_error)?;
        let mut results = Vec::with_capacity(count.min(reply.remaining() / 4));
        for _ in 0..count {
            results.push(
                reply
                    .read_required_parcelable("batch result")
                    .map_err(reply_error)?,
            );
        }
        Ok(results)
    }

    /// Report the outcome of a continuation.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn notify_continuation_result(&self, result: i32) -> IpcResult<()> {
        self.call(Code::NotifyContinuationResult, |request| {
            request.write_i32(result)?;
            Ok(())
        })
        .map(drop)
    }

    /// Ask the ability to publish its call stub.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn call_request(&self) -> IpcResult<()> {
        self.call(Code::RequestCallRemote, |_request| Ok(())).map(drop)
    }

    /// Continue the ability on `device_id`.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn continue_ability(&self, device_id: &str, version_code: u32) -> IpcResult<()> {
        self.call(Code::ContinueAbility, |request| {
            request.write_string(device_id)?;
            request.write_u32(version_code)?;
            Ok(())
        })
        .map(drop)
    }

    /// State lines for `params`.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn dump_ability_info(&self, params: &[String]) -> IpcResult<Vec<String>> {
        let mut reply = self.call(Code::DumpAbilityRunner, |request| {
            request.write_string_vector(params)?;
            Ok(())
        })?;
        reply.read_string_vector().map_err(reply_error)
    }

    /// Ask the ability to share data for `request_code`.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn schedule_share_data(&self, request_code: i32) -> IpcResult<()> {
        self.call(Code::ScheduleShareData, |request| {
            request.write_i32(request_code)?;
            Ok(())
        })
        .map(drop)
    }

    /// Execute the intent in `want`.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn on_execute_intent(&self, want: &Want) -> IpcResult<()> {
        self.send_want(Code::ScheduleOnExecuteIntent, want)
    }

    /// Create a modal UI extension.
    ///
    /// # Errors
    ///
    /// Returns the transport status or an undecodable reply.
    pub fn create_modal_ui_extension(&self, want: &Want) -> IpcResult<i32> {
        let mut reply = self.call(Code::CreateModalUiExtension, |request| {
            request.write_parcelable(Some(want))?;
            Ok(())
        })?;
        reply.read_i32().map_err(reply_error)
    }

    /// Replace the ability's session token.
    ///
    /// # Errors
    ///
    /// Returns the transport status.
    pub fn update_session_token(&self, session_token: Option<&Arc<dyn RemoteObject>>) -> IpcResult<()> {
        self.call(Code::UpdateSessionToken, |request| {
            request.write_remote_object(session_token)?;
            Ok(())
        })
        .map(drop)
    }

    fn send_want(&self, code: Code, want: &Want) -> IpcResult<()> {
        self.call(code, |request| {
            request.write_parcelable(Some(want))?;
            Ok(())
        })
        .map(drop)
    }

    fn send_uri(&self, code: Code, uri: &Uri) -> IpcResult<MessageParcel> {
        self.call(code, |request| {
            request.write_parcelable(Some(uri))?;
            Ok(())
        })
    }

    fn send_observer(
        &self,
        code: Code,
        uri: &Uri,
        observer: &Arc<dyn RemoteObject>,
    ) -> IpcResult<MessageParcel> {
        self.call(code, |request| {
            request.write_parcelable(Some(uri))?;
            request.write_remote_object(Some(observer))?;
            Ok(())
        })
    }

    fn call(
        &self,
        code: Code,
        write: impl FnOnce(&mut MessageParcel) -> IpcResult<()>,
    ) -> IpcResult<MessageParcel> {
        let option = if code.is_one_way() {
            MessageOption::one_way()
        } else {
            MessageOption::sync()
        };
        let mut request = self.inner.new_request()?;
        if let Err(e) = write(&mut request) {
            error!(%code, error = %e, "failed to write request");
            return Err(e);
        }
        self.inner
            .send(code.into(), request, option)
            .inspect_err(|e| error!(%code, status = e.status(), "scheduler call failed"))
    }
}

fn write_session_info(
    request: &mut MessageParcel,
    session_info: Option<&AbilitySessionInfo>,
) -> IpcResult<()> {
    request.write_bool(session_info.is_some())?;
    if let Some(info) = session_info {
        info.write_to(request, SessionInfoLayout::Activation)?;
    }
    Ok(())
}

fn read_flag(reply: &mut MessageParcel) -> IpcResult<bool> {
    reply
        .read_i32()
        .map(|flag| flag != 0)
        .map_err(reply_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohipc_errors::StatusCode;
    use ohipc_test_helpers::mock::MockRemoteObject;

    fn proxy() -> (Arc<MockRemoteObject>, AbilitySchedulerProxy) {
        let mock = MockRemoteObject::new(ABILITY_SCHEDULER_DESCRIPTOR);
        let remote: Arc<dyn RemoteObject> = mock.clone();
        (mock, AbilitySchedulerProxy::new(remote))
    }

    #[test]
    fn test_lifecycle_calls_are_one_way() -> IpcResult<()> {
        let (mock, proxy) = proxy();
        proxy.schedule_connect_ability(&Want::new("connect"))?;
        proxy.schedule_save_ability_state()?;
        assert!(mock.calls().iter().all(|call| call.one_way));
        assert_eq!(
            mock.codes(),
            vec![
                Code::ScheduleAbilityConnect.code(),
                Code::ScheduleSaveAbilityState.code()
            ]
        );
        Ok(())
    }

    #[test]
    fn test_transport_failure_surfaces() {
        let (mock, proxy) = proxy();
        mock.fail_with(IpcError::dead_object(ABILITY_SCHEDULER_DESCRIPTOR));
        let result = proxy.get_type(&Uri::new("dataability:///a"));
        assert!(matches!(result, Err(ref e) if e.status() == StatusCode::DeadObject.code()));
    }

    #[test]
    fn test_empty_reply_is_invalid_reply() {
        let (_mock, proxy) = proxy();
        let result = proxy.insert(&Uri::new("dataability:///a"), &ValuesBucket::new());
        assert!(matches!(result, Err(IpcError::InvalidReply(_))));
    }
}
