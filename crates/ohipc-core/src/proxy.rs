//! Client-side request building.

use std::fmt;
use std::sync::Arc;

use ohipc_errors::{IpcError, IpcResult, ParcelError};
use tracing::debug;

use crate::death::DeathRecipient;
use crate::option::MessageOption;
use crate::parcel::MessageParcel;
use crate::remote::{INTERFACE_TRANSACTION, PING_TRANSACTION, RemoteObject};

/// Wraps a remote handle and the descriptor of the interface spoken over it.
///
/// Typed proxies hold one of these and nothing else.
#[derive(Clone)]
pub struct RemoteProxy {
    remote: Arc<dyn RemoteObject>,
    descriptor: &'static str,
}

impl RemoteProxy {
    /// Wrap `remote` for the interface named `descriptor`.
    pub fn new(remote: Arc<dyn RemoteObject>, descriptor: &'static str) -> Self {
        Self { remote, descriptor }
    }

    /// The wrapped handle.
    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteObject> {
        &self.remote
    }

    /// Descriptor written as the interface token.
    #[must_use]
    pub fn descriptor(&self) -> &'static str {
        self.descriptor
    }

    /// A fresh request with the interface token already written.
    ///
    /// # Errors
    ///
    /// Fails if the token does not fit the parcel.
    pub fn new_request(&self) -> IpcResult<MessageParcel> {
        let mut data = MessageParcel::new();
        data.write_interface_token(self.descriptor)?;
        Ok(data)
    }

    /// Issue `code` with `data` and return the reply.
    ///
    /// A one-way call returns an empty reply.
    ///
    /// # Errors
    ///
    /// Returns the transport status when it is not OK; the reply is never
    /// read in that case.
    pub fn send(
        &self,
        code: u32,
        mut data: MessageParcel,
        option: MessageOption,
    ) -> IpcResult<MessageParcel> {
        let mut reply = MessageParcel::new();
        if let Err(e) = self
            .remote
            .send_request(code, &mut data, &mut reply, &option)
        {
            debug!(
                descriptor = self.descriptor,
                code,
                status = e.status(),
                error = %e,
                "remote call failed"
            );
            return Err(e);
        }
        Ok(reply)
    }

    /// Probe the remote object.
    ///
    /// # Errors
    ///
    /// Returns the transport status when the object does not answer.
    pub fn ping(&self) -> IpcResult<()> {
        self.send(PING_TRANSACTION, MessageParcel::new(), MessageOption::sync())
            .map(drop)
    }

    /// Ask the remote object for its descriptor.
    ///
    /// # Errors
    ///
    /// Returns the transport status, or [`IpcError::InvalidReply`] when the
    /// reply holds no descriptor.
    pub fn query_descriptor(&self) -> IpcResult<String> {
        let mut reply = self.send(
            INTERFACE_TRANSACTION,
            MessageParcel::new(),
            MessageOption::sync(),
        )?;
        reply.read_string16().map_err(reply_error)
    }

    /// Whether the remote object has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.remote.is_object_dead()
    }

    /// Register a death recipient on the wrapped handle.
    pub fn add_death_recipient(&self, recipient: Arc<dyn DeathRecipient>) -> bool {
        self.remote.add_death_recipient(recipient)
    }

    /// Remove a death recipient from the wrapped handle.
    pub fn remove_death_recipient(&self, recipient: &Arc<dyn DeathRecipient>) -> bool {
        self.remote.remove_death_recipient(recipient)
    }
}

impl fmt::Debug for RemoteProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProxy")
            .field("descriptor", &self.descriptor)
            .field("dead", &self.is_dead())
            .finish()
    }
}

/// Map a failure to read a reply field to [`IpcError::InvalidReply`].
pub fn reply_error(err: ParcelError) -> IpcError {
    IpcError::InvalidReply(err.to_string())
}
