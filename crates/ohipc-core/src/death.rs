//! Death notification.
//!
//! A recipient is registered on a [`RemoteObject`] and told, exactly once,
//! when the object behind it dies. The notification carries only a weak
//! reference: the handle may already be unusable when it arrives, and a
//! recipient must not block.
//!
//! Two recipients cover the common cases:
//!
//! - [`HandlerDeathRecipient`] forwards to a closure stored at registration.
//! - [`ChannelDeathRecipient`] posts a [`DeathNotice`] into a channel so the
//!   owner reacts on its own thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::remote::RemoteObject;

/// Receiver of death notifications.
pub trait DeathRecipient: Send + Sync {
    /// Called once when the remote object dies.
    fn on_remote_died(&self, remote: &Weak<dyn RemoteObject>);
}

/// Callback type stored by [`HandlerDeathRecipient`].
pub type DeathHandler = Box<dyn Fn(&Weak<dyn RemoteObject>) + Send + Sync>;

/// Recipient that forwards to an application-supplied closure.
pub struct HandlerDeathRecipient {
    handler: DeathHandler,
}

impl HandlerDeathRecipient {
    /// Wrap `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Weak<dyn RemoteObject>) + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
        }
    }
}

impl DeathRecipient for HandlerDeathRecipient {
    fn on_remote_died(&self, remote: &Weak<dyn RemoteObject>) {
        (self.handler)(remote);
    }
}

impl fmt::Debug for HandlerDeathRecipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDeathRecipient").finish_non_exhaustive()
    }
}

/// A death event delivered through a channel.
#[derive(Clone)]
pub struct DeathNotice {
    /// Descriptor of the dead object, empty if it was already dropped.
    pub descriptor: String,
    /// Weak reference to the dead handle.
    pub remote: Weak<dyn RemoteObject>,
}

impl fmt::Debug for DeathNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeathNotice")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Recipient that posts a [`DeathNotice`] into a channel.
#[derive(Debug, Clone)]
pub struct ChannelDeathRecipient {
    tx: Sender<DeathNotice>,
}

impl ChannelDeathRecipient {
    /// Create a recipient and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<DeathNotice>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }
}

impl DeathRecipient for ChannelDeathRecipient {
    fn on_remote_died(&self, remote: &Weak<dyn RemoteObject>) {
        let descriptor = remote
            .upgrade()
            .map(|object| object.interface_descriptor().to_owned())
            .unwrap_or_default();
        let notice = DeathNotice {
            descriptor,
            remote: Weak::clone(remote),
        };
        if self.tx.send(notice).is_err() {
            debug!("death notice dropped: receiver is gone");
        }
    }
}

/// Set of recipients attached to one object, plus its dead flag.
#[derive(Default)]
pub struct DeathRegistry {
    recipients: Mutex<Vec<Arc<dyn DeathRecipient>>>,
    dead: AtomicBool,
}

impl DeathRegistry {
    /// Create an empty registry for a live object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient. Fails if the object is dead or the recipient is
    /// already registered.
    pub fn add(&self, recipient: Arc<dyn DeathRecipient>) -> bool {
        let mut recipients = self.recipients.lock();
        if self.is_dead() {
            return false;
        }
        if recipients
            .iter()
            .any(|existing| same_recipient(existing, &recipient))
        {
            return false;
        }
        recipients.push(recipient);
        true
    }

    /// Remove a recipient by pointer identity.
    pub fn remove(&self, recipient: &Arc<dyn DeathRecipient>) -> bool {
        let mut recipients = self.recipients.lock();
        let before = recipients.len();
        recipients.retain(|existing| !same_recipient(existing, recipient));
        recipients.len() != before
    }

    /// Mark the object dead and hand back the recipients to notify.
    ///
    /// Returns `None` if the object was already dead, so each recipient is
    /// told at most once.
    pub fn mark_dead(&self) -> Option<Vec<Arc<dyn DeathRecipient>>> {
        let mut recipients = self.recipients.lock();
        if self.dead.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(std::mem::take(&mut *recipients))
    }

    /// Whether the object has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Number of registered recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.lock().len()
    }

    /// Whether no recipient is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for DeathRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeathRegistry")
            .field("recipients", &self.len())
            .field("dead", &self.is_dead())
            .finish()
    }
}

fn same_recipient(a: &Arc<dyn DeathRecipient>, b: &Arc<dyn DeathRecipient>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counting(AtomicUsize);

    impl DeathRecipient for Counting {
        fn on_remote_died(&self, _remote: &Weak<dyn RemoteObject>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dangling() -> Weak<dyn RemoteObject> {
        Weak::<crate::runtime::RemoteHandle>::new()
    }

    #[test]
    fn test_registry_add_remove() {
        let registry = DeathRegistry::new();
        let recipient: Arc<dyn DeathRecipient> = Arc::new(Counting(AtomicUsize::new(0)));
        assert!(registry.add(Arc::clone(&recipient)));
        assert!(!registry.add(Arc::clone(&recipient)));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&recipient));
        assert!(!registry.remove(&recipient));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mark_dead_once() {
        let registry = DeathRegistry::new();
        let recipient: Arc<dyn DeathRecipient> = Arc::new(Counting(AtomicUsize::new(0)));
        assert!(registry.add(Arc::clone(&recipient)));
        assert_eq!(registry.mark_dead().map(|r| r.len()), Some(1));
        assert!(registry.mark_dead().is_none());
        assert!(!registry.add(recipient));
    }

    #[test]
    fn test_channel_recipient_posts_notice() {
        let (recipient, rx) = ChannelDeathRecipient::channel();
        recipient.on_remote_died(&dangling());
        let notice = rx.try_recv();
        assert!(matches!(notice, Ok(DeathNotice { ref descriptor, .. }) if descriptor.is_empty()));
    }

    #[test]
    fn test_handler_recipient_invokes_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let recipient = HandlerDeathRecipient::new(move |remote| {
            assert!(remote.upgrade().is_none());
            seen.fetch_add(1, Ordering::SeqCst);
        });
        recipient.on_remote_died(&dangling());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
