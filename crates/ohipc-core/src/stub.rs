//! Server-side request dispatch.
//!
//! Every incoming request walks the same state machine:
//!
//! ```text
//! RECEIVED -> TOKEN_CHECKED -> DISPATCHED -> HANDLER_RUNNING -> REPLY_WRITTEN
//! ```
//!
//! The token is the first field consumed. A request whose token cannot be
//! read fails with `ERR_TRANSACTION_FAILED`; a readable but foreign token
//! fails with `ERR_INVALID_STATE`. Codes missing from the table go to
//! [`default_on_remote_request`]. A handler that aborts may have written
//! part of the reply; callers discard the reply on any non-OK status.

use std::collections::HashMap;
use std::fmt;

use ohipc_errors::{IpcError, IpcResult};
use tracing::{debug, trace, warn};

use crate::option::MessageOption;
use crate::parcel::MessageParcel;
use crate::remote::{DUMP_TRANSACTION, INTERFACE_TRANSACTION, PING_TRANSACTION};

/// Server-side endpoint of an interface.
pub trait IpcStub: Send + Sync + 'static {
    /// Descriptor this stub answers to.
    fn descriptor(&self) -> &str;

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// Returns the transport status to report to the caller.
    fn on_remote_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()>;
}

/// Handler bound to one operation code.
pub type HandlerFn<S> = fn(&S, &mut MessageParcel, &mut MessageParcel) -> IpcResult<()>;

/// Progress of a single request through the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Request handed to the stub.
    Received,
    /// Interface token matched.
    TokenChecked,
    /// Handler found for the code.
    Dispatched,
    /// Handler is reading arguments and running service logic.
    HandlerRunning,
    /// Handler finished and the reply is complete.
    ReplyWritten,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Received => write!(f, "RECEIVED"),
            RequestState::TokenChecked => write!(f, "TOKEN_CHECKED"),
            RequestState::Dispatched => write!(f, "DISPATCHED"),
            RequestState::HandlerRunning => write!(f, "HANDLER_RUNNING"),
            RequestState::ReplyWritten => write!(f, "REPLY_WRITTEN"),
        }
    }
}

/// Immutable map from operation code to handler, plus the descriptor.
///
/// Built once when the stub is constructed and only read afterwards, so it
/// is shared by concurrent requests without locking.
pub struct DispatchTable<S> {
    descriptor: &'static str,
    handlers: HashMap<u32, HandlerFn<S>>,
}

impl<S> DispatchTable<S> {
    /// Start building a table for `descriptor`.
    #[must_use]
    pub fn builder(descriptor: &'static str) -> DispatchTableBuilder<S> {
        DispatchTableBuilder {
            descriptor,
            handlers: HashMap::new(),
        }
    }

    /// Descriptor the table authenticates against.
    #[must_use]
    pub fn descriptor(&self) -> &'static str {
        self.descriptor
    }

    /// Whether `code` has a handler.
    #[must_use]
    pub fn contains(&self, code: u32) -> bool {
        self.handlers.contains_key(&code)
    }

    /// Number of registered codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered codes in ascending order.
    #[must_use]
    pub fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.handlers.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    /// Run one request through token check, lookup and handler.
    ///
    /// # Errors
    ///
    /// Returns the transport status of the request.
    pub fn dispatch(
        &self,
        stub: &S,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        trace!(code, state = %RequestState::Received);
        check_interface_token(self.descriptor, data)?;
        trace!(code, state = %RequestState::TokenChecked);

        let Some(handler) = self.handlers.get(&code) else {
            return default_on_remote_request(self.descriptor, code, data, reply, option);
        };
        trace!(code, state = %RequestState::Dispatched);

        trace!(code, state = %RequestState::HandlerRunning);
        match handler(stub, data, reply) {
            Ok(()) => {
                trace!(code, state = %RequestState::ReplyWritten);
                Ok(())
            }
            Err(e) => {
                debug!(
                    descriptor = self.descriptor,
                    code,
                    status = e.status(),
                    error = %e,
                    "handler aborted"
                );
                Err(e)
            }
        }
    }
}

impl<S> fmt::Debug for DispatchTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("descriptor", &self.descriptor)
            .field("codes", &self.codes())
            .finish()
    }
}

/// Builder for [`DispatchTable`].
pub struct DispatchTableBuilder<S> {
    descriptor: &'static str,
    handlers: HashMap<u32, HandlerFn<S>>,
}

impl<S> DispatchTableBuilder<S> {
    /// Bind `handler` to `code`. A later binding for the same code replaces
    /// the earlier one.
    #[must_use]
    pub fn handler(mut self, code: impl Into<u32>, handler: HandlerFn<S>) -> Self {
        let code = code.into();
        if self.handlers.insert(code, handler).is_some() {
            warn!(
                descriptor = self.descriptor,
                code, "handler registered twice; keeping the last one"
            );
        }
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> DispatchTable<S> {
        DispatchTable {
            descriptor: self.descriptor,
            handlers: self.handlers,
        }
    }
}

/// Read the interface token and compare it with `descriptor`.
///
/// # Errors
///
/// - [`IpcError::TransactionFailed`] when no token can be read.
/// - [`IpcError::IdentityMismatch`] when the token names another interface.
pub fn check_interface_token(descriptor: &str, data: &mut MessageParcel) -> IpcResult<()> {
    let token = data
        .read_interface_token()
        .map_err(|e| IpcError::transaction_failed(format!("interface token unreadable: {e}")))?;
    if token != descriptor {
        warn!(
            expected = descriptor,
            received = %token,
            "interface token mismatch, request rejected"
        );
        return Err(IpcError::identity_mismatch(descriptor, token));
    }
    Ok(())
}

/// Fallback for codes a stub does not register.
///
/// Answers the ping, descriptor and dump queries and reports every other code as
/// unknown.
///
/// # Errors
///
/// Returns [`IpcError::UnknownTransaction`] for unsupported codes.
pub fn default_on_remote_request(
    descriptor: &str,
    code: u32,
    _data: &mut MessageParcel,
    reply: &mut MessageParcel,
    _option: &MessageOption,
) -> IpcResult<()> {
    match code {
        PING_TRANSACTION => Ok(()),
        INTERFACE_TRANSACTION => {
            reply.write_string16(descriptor)?;
            Ok(())
        }
        DUMP_TRANSACTION => {
            reply.write_string_vector(&[descriptor])?;
            Ok(())
        }
        _ => {
            debug!(descriptor, code, "no handler for code");
            Err(IpcError::unknown_transaction(code, descriptor))
        }
    }
}
