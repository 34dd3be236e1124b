//! Mock remote objects.
//!
//! - [`MockRemoteObject`] records every request and answers with a scripted
//!   status and reply.
//! - [`LoopbackRemote`] hands each request straight to a stub on the
//!   calling thread, so proxy and stub can be paired without a worker pool.

use std::sync::{Arc, Weak};

use ohipc_core::death::{DeathRecipient, DeathRegistry};
use ohipc_core::{IpcStub, MessageOption, MessageParcel, RemoteObject};
use ohipc_errors::{IpcError, IpcResult};
use parking_lot::Mutex;

/// A request seen by a mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Operation code.
    pub code: u32,
    /// Encoded request bytes.
    pub data: Vec<u8>,
    /// Whether the caller asked for a one-way call.
    pub one_way: bool,
}

type ReplyScript = Box<dyn Fn(u32, &mut MessageParcel) -> IpcResult<()> + Send + Sync>;

/// Remote object answering from a script.
pub struct MockRemoteObject {
    descriptor: String,
    calls: Mutex<Vec<RecordedCall>>,
    status: Mutex<Option<IpcError>>,
    reply: Mutex<Option<ReplyScript>>,
    deaths: DeathRegistry,
    this: Weak<MockRemoteObject>,
}

impl MockRemoteObject {
    /// A mock that accepts every request with an empty reply.
    pub fn new(descriptor: impl Into<String>) -> Arc<Self> {
        let descriptor = descriptor.into();
        Arc::new_cyclic(|this| Self {
            descriptor,
            calls: Mutex::new(Vec::new()),
            status: Mutex::new(None),
            reply: Mutex::new(None),
            deaths: DeathRegistry::new(),
            this: Weak::clone(this),
        })
    }

    /// Fail every following request with `error`.
    pub fn fail_with(&self, error: IpcError) {
        *self.status.lock() = Some(error);
    }

    /// Accept requests again.
    pub fn succeed(&self) {
        *self.status.lock() = None;
    }

    /// Write the reply of every following request with `script`.
    pub fn reply_with<F>(&self, script: F)
    where
        F: Fn(u32, &mut MessageParcel) -> IpcResult<()> + Send + Sync + 'static,
    {
        *self.reply.lock() = Some(Box::new(script));
    }

    /// Requests seen so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Codes seen so far.
    pub fn codes(&self) -> Vec<u32> {
        self.calls.lock().iter().map(|call| call.code).collect()
    }

    /// Most recent request.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// Number of registered death recipients.
    pub fn recipient_count(&self) -> usize {
        self.deaths.len()
    }

    /// Mark the object dead and notify recipients on the calling thread.
    pub fn fire_death(&self) {
        let Some(recipients) = self.deaths.mark_dead() else {
            return;
        };
        let remote: Weak<dyn RemoteObject> = self.this.clone();
        for recipient in recipients {
            recipient.on_remote_died(&remote);
        }
    }
}

impl RemoteObject for MockRemoteObject {
    fn interface_descriptor(&self) -> &str {
        &self.descriptor
    }

    fn send_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        self.calls.lock().push(RecordedCall {
            code,
            data: data.as_bytes().to_vec(),
            one_way: option.is_async(),
        });
        if self.deaths.is_dead() {
            return Err(IpcError::dead_object(self.descriptor.as_str()));
        }
        if let Some(error) = self.status.lock().clone() {
            return Err(error);
        }
        if let Some(script) = self.reply.lock().as_ref() {
            script(code, reply)?;
        }
        Ok(())
    }

    fn is_object_dead(&self) -> bool {
        self.deaths.is_dead()
    }

    fn add_death_recipient(&self, recipient: Arc<dyn DeathRecipient>) -> bool {
        self.deaths.add(recipient)
    }

    fn remove_death_recipient(&self, recipient: &Arc<dyn DeathRecipient>) -> bool {
        self.deaths.remove(recipient)
    }
}

impl std::fmt::Debug for MockRemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemoteObject")
            .field("descriptor", &self.descriptor)
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

/// Remote object that runs the stub inline on the caller's thread.
pub struct LoopbackRemote {
    stub: Arc<dyn IpcStub>,
    descriptor: String,
    codes: Mutex<Vec<u32>>,
    deaths: DeathRegistry,
}

impl LoopbackRemote {
    /// Wrap `stub`.
    pub fn new(stub: Arc<dyn IpcStub>) -> Arc<Self> {
        let descriptor = stub.descriptor().to_owned();
        Arc::new(Self {
            stub,
            descriptor,
            codes: Mutex::new(Vec::new()),
            deaths: DeathRegistry::new(),
        })
    }

    /// Codes delivered to the stub so far.
    pub fn codes(&self) -> Vec<u32> {
        self.codes.lock().clone()
    }
}

impl RemoteObject for LoopbackRemote {
    fn interface_descriptor(&self) -> &str {
        &self.descriptor
    }

    fn send_request(
        &self,
        code: u32,
        data: &mut MessageParcel,
        reply: &mut MessageParcel,
        option: &MessageOption,
    ) -> IpcResult<()> {
        if self.deaths.is_dead() {
            return Err(IpcError::dead_object(self.descriptor.as_str()));
        }
        self.codes.lock().push(code);
        data.rewind_read();
        let mut stub_reply = MessageParcel::new();
        self.stub
            .on_remote_request(code, data, &mut stub_reply, option)?;
        if !option.is_async() {
            *reply = stub_reply;
        }
        Ok(())
    }

    fn is_proxy_object(&self) -> bool {
        false
    }

    fn is_object_dead(&self) -> bool {
        self.deaths.is_dead()
    }

    fn add_death_recipient(&self, recipient: Arc<dyn DeathRecipient>) -> bool {
        self.deaths.add(recipient)
    }

    fn remove_death_recipient(&self, recipient: &Arc<dyn DeathRecipient>) -> bool {
        self.deaths.remove(recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::must::{must, must_some};
    use ohipc_core::HandlerDeathRecipient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_mock_records_and_scripts() {
        let mock = MockRemoteObject::new("test.IMock");
        mock.reply_with(|code, reply| {
            reply.write_u32(code)?;
            Ok(())
        });
        let mut data = MessageParcel::new();
        must(data.write_i32(1));
        let mut reply = MessageParcel::new();
        must(mock.send_request(4, &mut data, &mut reply, &MessageOption::one_way()));
        assert_eq!(must(reply.read_u32()), 4);
        let call = must_some(mock.last_call(), "call recorded");
        assert!(call.one_way);
        assert_eq!(call.data, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_mock_fire_death_notifies_once() {
        let mock = MockRemoteObject::new("test.IMock");
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        assert!(mock.add_death_recipient(Arc::new(HandlerDeathRecipient::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }))));
        mock.fire_death();
        mock.fire_death();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(mock.is_object_dead());
    }
}
