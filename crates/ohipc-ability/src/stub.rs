//! Server side of the ability scheduler.
//!
//! Every handler reads its arguments in the order the proxy writes them.
//! A required want, URI, state map or predicate that is missing or
//! malformed aborts the request with an invalid-value status, and so does
//! an empty mode, MIME filter or method name. Bulk requests check their
//! element count against the collection limit before reading any element.
//!
//! Session info travels behind a presence flag in the activation layout of
//! [`AbilitySessionInfo`].

use std::sync::Arc;

use ohipc_core::{DispatchTable, IpcStub, MessageOption, MessageParcel, Parcelable};
use ohipc_errors::{IpcError, IpcResult};
use ohipc_types::{AbilitySessionInfo, PacMap, SessionInfoLayout, Uri, Want};
use tracing::{debug, info, warn};

use crate::code::AbilitySchedulerCode as Code;
use crate::data::{DataAbilityOperation, DataAbilityPredicates, ValuesBucket};
use crate::lifecycle::{LifeCycleStateInfo, WindowCommand};
use crate::observer::DataAbilityObserverProxy;
use crate::scheduler::AbilityScheduler;

/// Descriptor of the ability scheduler.
pub const ABILITY_SCHEDULER_DESCRIPTOR: &str = "ohos.aafwk.AbilityScheduler";

/// Stub dispatching scheduler requests to an [`AbilityScheduler`].
pub struct AbilitySchedulerStub {
    scheduler: Arc<dyn AbilityScheduler>,
    table: DispatchTable<AbilitySchedulerStub>,
}

impl AbilitySchedulerStub {
    /// Wrap `scheduler`.
    pub fn new(scheduler: Arc<dyn AbilityScheduler>) -> Self {
        let table = DispatchTable::builder(ABILITY_SCHEDULER_DESCRIPTOR)
            .handler(Code::ScheduleAbilityTransaction, Self::handle_ability_transaction)
            .handler(Code::SendResult, Self::handle_send_result)
            .handler(Code::ScheduleAbilityConnect, Self::handle_connect_ability)
            .handler(Code::ScheduleAbilityDisconnect, Self::handle_disconnect_ability)
            .handler(Code::ScheduleAbilityCommand, Self::handle_command_ability)
            .handler(Code::SchedulePrepareTerminate, Self::handle_prepare_terminate)
            .handler(Code::ScheduleAbilityCommandWindow, Self::handle_command_ability_window)
            .handler(Code::ScheduleSaveAbilityState, Self::handle_save_ability_state)
            .handler(Code::ScheduleRestoreAbilityState, Self::handle_restore_ability_state)
            .handler(Code::ScheduleGetFileTypes, Self::handle_get_file_types)
            .handler(Code::ScheduleOpenFile, Self::handle_open_file)
            .handler(Code::ScheduleOpenRawFile, Self::handle_open_raw_file)
            .handler(Code::ScheduleInsert, Self::handle_insert)
            .handler(Code::ScheduleUpdate, Self::handle_update)
            .handler(Code::ScheduleDelete, Self::handle_delete)
            .handler(Code::ScheduleQuery, Self::handle_query)
            .handler(Code::ScheduleCall, Self::handle_call)
            .handler(Code::ScheduleGetType, Self::handle_get_type)
            .handler(Code::ScheduleReload, Self::handle_reload)
            .handler(Code::ScheduleBatchInsert, Self::handle_batch_insert)
            .handler(Code::ScheduleRegisterObserver, Self::handle_register_observer)
            .handler(Code::ScheduleUnregisterObserver, Self::handle_unregister_observer)
            .handler(Code::ScheduleNotifyChange, Self::handle_notify_change)
            .handler(Code::ScheduleNormalizeUri, Self::handle_normalize_uri)
            .handler(Code::ScheduleDenormalizeUri, Self::handle_denormalize_uri)
            .handler(Code::ScheduleExecuteBatch, Self::handle_execute_batch)
            .handler(Code::NotifyContinuationResult, Self::handle_notify_continuation_result)
            .handler(Code::RequestCallRemote, Self::handle_call_request)
            .handler(Code::ContinueAbility, Self::handle_continue_ability)
            .handler(Code::DumpAbilityRunner, Self::handle_dump_ability_info)
            .handler(Code::ScheduleShareData, Self::handle_share_data)
            .handler(Code::ScheduleOnExecuteIntent, Self::handle_on_execute_intent)
            .handler(Code::CreateModalUiExtension, Self::handle_create_modal_ui_extension)
            .handler(Code::UpdateSessionToken, Self::handle_update_session_token)
            .build();
        Self { scheduler, table }
    }

    /// The dispatch table, for inspection.
    #[must_use]
    pub fn table(&self) -> &DispatchTable<AbilitySchedulerStub> {
        &self.table
    }

    // ---- lifecycle -----------------------------------------------------

    fn handle_ability_transaction(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        let state_info = data
            .read_parcelable::<LifeCycleStateInfo>()
            .ok()
            .flatten()
            .ok_or_else(|| {
                warn!("lifecycle state info is missing");
                IpcError::missing("lifecycle state info")
            })?;
        let session_info = read_session_info(data);
        debug!(state = ?state_info.state, action = %want.action, "ability transaction");
        self.scheduler
            .schedule_ability_transaction(&want, &state_info, session_info);
        Ok(())
    }

    fn handle_send_result(&self, data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        let request_code = data.read_i32().unwrap_or_default();
        let result_code = data.read_i32().unwrap_or_default();
        let want = read_want(data)?;
        self.scheduler.send_result(request_code, result_code, &want);
        Ok(())
    }

    fn handle_connect_ability(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        self.scheduler.schedule_connect_ability(&want);
        Ok(())
    }

    fn handle_disconnect_ability(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        self.scheduler.schedule_disconnect_ability(&want);
        Ok(())
    }

    fn handle_command_ability(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        let restart = data.read_bool().unwrap_or_default();
        let start_id = data.read_i32().unwrap_or_default();
        debug!(start_id, restart, "command ability");
        self.scheduler
            .schedule_command_ability(&want, restart, start_id);
        Ok(())
    }

    fn handle_prepare_terminate(
        &self,
        _data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let agreed = self.scheduler.schedule_prepare_terminate_ability();
        reply.write_i32(i32::from(agreed))?;
        Ok(())
    }

    fn handle_command_ability_window(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        let session_info = read_session_info(data);
        let raw = data.read_i32().unwrap_or_default();
        let command = WindowCommand::from_code(raw).ok_or_else(|| {
            warn!(command = raw, "unknown window command");
            IpcError::invalid_value("window command", format!("unknown command {raw}"))
        })?;
        self.scheduler
            .schedule_command_ability_window(&want, session_info, command);
        Ok(())
    }

    fn handle_save_ability_state(
        &self,
        _data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        self.scheduler.schedule_save_ability_state();
        Ok(())
    }

    fn handle_restore_ability_state(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let state = read_pac_map(data, "saved state")?;
        self.scheduler.schedule_restore_ability_state(&state);
        Ok(())
    }

    // ---- data ability --------------------------------------------------

    fn handle_get_file_types(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let filter = read_non_empty(data, "mime type filter")?;
        let types = self.scheduler.get_file_types(&uri, &filter);
        reply.write_string_vector(&types)?;
        Ok(())
    }

    fn handle_open_file(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let mode = read_non_empty(data, "mode")?;
        let file = self.scheduler.open_file(&uri, &mode).ok_or_else(|| {
            warn!(%uri, %mode, "open file failed");
            IpcError::invalid_value("file descriptor", "ability could not open the file")
        })?;
        reply.write_file_descriptor(&file)?;
        Ok(())
    }

    fn handle_open_raw_file(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let mode = read_non_empty(data, "mode")?;
        reply.write_i32(self.scheduler.open_raw_file(&uri, &mode))?;
        Ok(())
    }

    fn handle_insert(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let value = ValuesBucket::unmarshal(data)?;
        let index = self.scheduler.insert(&uri, &value);
        reply.write_i32(index)?;
        info!(%uri, index, "insert finished");
        Ok(())
    }

    fn handle_update(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let value = ValuesBucket::unmarshal(data)?;
        let predicates = read_predicates(data)?;
        reply.write_i32(self.scheduler.update(&uri, &value, &predicates))?;
        Ok(())
    }

    fn handle_delete(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let predicates = read_predicates(data)?;
        reply.write_i32(self.scheduler.delete(&uri, &predicates))?;
        Ok(())
    }

    fn handle_query(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let columns = data.read_string_vector()?;
        let predicates = read_predicates(data)?;
        let result = self
            .scheduler
            .query(&uri, &columns, &predicates)
            .ok_or_else(|| {
                warn!(%uri, "query produced no result set");
                IpcError::invalid_value("result set", "query failed")
            })?;
        result.marshal(reply)?;
        info!(%uri, rows = result.row_count(), "query finished");
        Ok(())
    }

    fn handle_call(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let method = read_non_empty(data, "method")?;
        let arg = read_non_empty(data, "arg")?;
        let extras = read_pac_map(data, "extras")?;
        let result = self.scheduler.call(&uri, &method, &arg, &extras);
        reply.write_parcelable(result.as_ref())?;
        info!(%uri, %method, "call finished");
        Ok(())
    }

    fn handle_get_type(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        reply.write_string(&self.scheduler.get_type(&uri))?;
        Ok(())
    }

    fn handle_reload(&self, data: &mut MessageParcel, reply: &mut MessageParcel) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let extras = read_pac_map(data, "extras")?;
        reply.write_bool(self.scheduler.reload(&uri, &extras))?;
        Ok(())
    }

    fn handle_batch_insert(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let count = read_batch_count(data)?;
        let mut values = Vec::with_capacity(count.min(data.remaining() / 4));
        for _ in 0..count {
            values.push(ValuesBucket::unmarshal(data)?);
        }
        reply.write_i32(self.scheduler.batch_insert(&uri, &values))?;
        Ok(())
    }

    fn handle_register_observer(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let observer = read_observer(data)?;
        let registered = self.scheduler.schedule_register_observer(&uri, observer);
        reply.write_i32(i32::from(registered))?;
        Ok(())
    }

    fn handle_unregister_observer(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        let observer = read_observer(data)?;
        let removed = self.scheduler.schedule_unregister_observer(&uri, &observer);
        reply.write_i32(i32::from(removed))?;
        Ok(())
    }

    fn handle_notify_change(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        reply.write_i32(i32::from(self.scheduler.schedule_notify_change(&uri)))?;
        Ok(())
    }

    fn handle_normalize_uri(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        reply.write_parcelable(Some(&self.scheduler.normalize_uri(&uri)))?;
        Ok(())
    }

    fn handle_denormalize_uri(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let uri = read_uri(data)?;
        reply.write_parcelable(Some(&self.scheduler.denormalize_uri(&uri)))?;
        Ok(())
    }

    fn handle_execute_batch(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let count = read_batch_count(data)?;
        let mut operations = Vec::with_capacity(count.min(data.remaining() / 4));
        for index in 0..count {
            let operation = data
                .read_parcelable::<DataAbilityOperation>()
                .ok()
                .flatten()
                .ok_or_else(|| {
                    warn!(index, "batch operation is null or malformed");
                    IpcError::invalid_value("operation", format!("operation {index} is null or malformed"))
                })?;
            operations.push(operation);
        }

        let results = self.scheduler.execute_batch(&operations);
        reply.write_count(results.len())?;
        for result in &results {
            reply.write_parcelable(Some(result))?;
        }
        info!(operations = operations.len(), results = results.len(), "batch finished");
        Ok(())
    }

    // ---- continuation and misc -----------------------------------------

    fn handle_notify_continuation_result(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let result = data.read_i32().unwrap_or_default();
        self.scheduler.notify_continuation_result(result);
        Ok(())
    }

    fn handle_call_request(
        &self,
        _data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        self.scheduler.call_request();
        Ok(())
    }

    fn handle_continue_ability(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let device_id = data.read_string().unwrap_or_default();
        let version_code = data.read_u32().unwrap_or_default();
        self.scheduler.continue_ability(&device_id, version_code);
        Ok(())
    }

    fn handle_dump_ability_info(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let params = data.read_string_vector()?;
        let mut infos = self.scheduler.dump_ability_info(&params);
        infos.truncate(data.max_collection_len());
        reply.write_string_vector(&infos)?;
        Ok(())
    }

    fn handle_share_data(&self, data: &mut MessageParcel, _reply: &mut MessageParcel) -> IpcResult<()> {
        let request_code = data.read_i32().unwrap_or_default();
        info!(request_code, "share data");
        self.scheduler.schedule_share_data(request_code);
        Ok(())
    }

    fn handle_on_execute_intent(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        self.scheduler.on_execute_intent(&want);
        Ok(())
    }

    fn handle_create_modal_ui_extension(
        &self,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let want = read_want(data)?;
        reply.write_i32(self.scheduler.create_modal_ui_extension(&want))?;
        Ok(())
    }

    fn handle_update_session_token(
        &self,
        data: &mut MessageParcel,
        _reply: &mut MessageParcel,
    ) -> IpcResult<()> {
        let token = data.read_remote_object().ok().flatten();
        self.scheduler.update_session_token(token);
        Ok(())
    }
}

impl IpcStub for AbilitySchedulerStub {
    fn descriptor(&self) -> &str {
        ABILITY_SCHEDULER_DESCRIPTOR
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

impl std::fmt::Debug for AbilitySchedulerStub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilitySchedulerStub")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

fn read_want(data: &mut MessageParcel) -> IpcResult<Want> {
    data.read_parcelable::<Want>().ok().flatten().ok_or_else(|| {
        warn!("want is missing");
        IpcError::missing("want")
    })
}

fn read_uri(data: &mut MessageParcel) -> IpcResult<Uri> {
    data.read_parcelable::<Uri>().ok().flatten().ok_or_else(|| {
        warn!("uri is missing");
        IpcError::missing("uri")
    })
}

fn read_pac_map(data: &mut MessageParcel, what: &'static str) -> IpcResult<PacMap> {
    data.read_parcelable::<PacMap>().ok().flatten().ok_or_else(|| {
        warn!(what, "pac map is missing");
        IpcError::missing(what)
    })
}

fn read_predicates(data: &mut MessageParcel) -> IpcResult<DataAbilityPredicates> {
    data.read_parcelable::<DataAbilityPredicates>()
        .ok()
        .flatten()
        .ok_or_else(|| {
            warn!("predicates are missing");
            IpcError::missing("predicates")
        })
}

fn read_non_empty(data: &mut MessageParcel, what: &'static str) -> IpcResult<String> {
    data.read_string()
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!(what, "required string is empty");
            IpcError::invalid_value(what, "empty or missing")
        })
}

fn read_observer(data: &mut MessageParcel) -> IpcResult<DataAbilityObserverProxy> {
    data.read_remote_object()
        .ok()
        .flatten()
        .map(DataAbilityObserverProxy::new)
        .ok_or_else(|| {
            warn!("observer is missing");
            IpcError::missing("observer")
        })
}

fn read_session_info(data: &mut MessageParcel) -> Option<AbilitySessionInfo> {
    if !data.read_bool().unwrap_or_default() {
        return None;
    }
    AbilitySessionInfo::read_from(data, SessionInfoLayout::Activation)
        .inspect_err(|e| debug!(error = %e, "session info unreadable, ignored"))
        .ok()
}

fn read_batch_count(data: &mut MessageParcel) -> IpcResult<usize> {
    data.read_count().map_err(|e| {
        warn!(error = %e, "batch count rejected");
        IpcError::from(e)
    })
}
