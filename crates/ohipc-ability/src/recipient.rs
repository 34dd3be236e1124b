//! Death recipient for scheduler handles.

use std::fmt;
use std::sync::Weak;

use ohipc_core::{DeathRecipient, RemoteObject};
use parking_lot::Mutex;
use tracing::error;

type DiedHandler = Box<dyn FnOnce(&Weak<dyn RemoteObject>) + Send>;

/// Recipient registered by the ability manager on each scheduler handle.
///
/// The handler runs at most once, on the first death notification.
pub struct AbilitySchedulerRecipient {
    handler: Mutex<Option<DiedHandler>>,
}

impl AbilitySchedulerRecipient {
    /// Run `handler` when the scheduler dies.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnOnce(&Weak<dyn RemoteObject>) + Send + 'static,
    {
        Self {
            handler: Mutex::new(Some(Box::new(handler))),
        }
    }
}

impl DeathRecipient for AbilitySchedulerRecipient {
    fn on_remote_died(&self, remote: &Weak<dyn RemoteObject>) {
        error!("ability scheduler died");
        let handler = self.handler.lock().take();
        if let Some(handler) = handler {
            handler(remote);
        }
    }
}

impl fmt::Debug for AbilitySchedulerRecipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilitySchedulerRecipient")
            .field("armed", &self.handler.lock().is_some())
            .finish()
    }
}
