//! Per-call transport options.

use std::time::Duration;

/// Flag value for a call that waits for a reply.
pub const TF_SYNC: u32 = 0x00;
/// Flag value for a one-way call.
pub const TF_ASYNC: u32 = 0x01;

/// Whether the caller waits for the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Block until the stub has replied or the wait time elapses.
    #[default]
    Sync,
    /// Return once the request is queued; the reply is discarded.
    Async,
}

/// Options attached to one `send_request` call.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use ohipc_core::MessageOption;
///
/// let option = MessageOption::sync().with_wait_time(Duration::from_millis(200));
/// assert!(!option.is_async());
/// assert_eq!(MessageOption::one_way().flags(), ohipc_core::option::TF_ASYNC);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageOption {
    mode: TransactionMode,
    wait_time: Option<Duration>,
}

impl MessageOption {
    /// A synchronous call using the transport's default timeout.
    #[must_use]
    pub fn sync() -> Self {
        Self::default()
    }

    /// A one-way call.
    #[must_use]
    pub fn one_way() -> Self {
        Self {
            mode: TransactionMode::Async,
            wait_time: None,
        }
    }

    /// Override how long a synchronous call may wait.
    #[must_use]
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = Some(wait_time);
        self
    }

    /// Transaction mode.
    #[must_use]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Whether the call is one-way.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.mode == TransactionMode::Async
    }

    /// Wait-time override, if any.
    #[must_use]
    pub fn wait_time(&self) -> Option<Duration> {
        self.wait_time
    }

    /// Raw transaction flags.
    #[must_use]
    pub fn flags(&self) -> u32 {
        match self.mode {
            TransactionMode::Sync => TF_SYNC,
            TransactionMode::Async => TF_ASYNC,
        }
    }

    /// Build options from raw transaction flags. Unknown bits are ignored.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        if flags & TF_ASYNC != 0 {
            Self::one_way()
        } else {
            Self::sync()
        }
    }
}
