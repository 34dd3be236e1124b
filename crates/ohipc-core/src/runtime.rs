//! In-process binder-style transport.
//!
//! [`IpcRuntime`] owns a pool of named worker threads fed by a bounded
//! crossbeam queue. Publishing a stub yields a [`RemoteHandle`]; requests
//! sent through the handle are moved onto a worker, dispatched to the stub,
//! and the reply is moved back to a synchronous caller.
//!
//! The same stub may run on several workers at once. A synchronous caller
//! blocks for at most the configured timeout; a one-way caller returns as
//! soon as the request is queued.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use ohipc_errors::{IpcError, IpcResult};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::TransportConfig;
use crate::death::{DeathRecipient, DeathRegistry};
use crate::option::MessageOption;
use crate::parcel::MessageParcel;
use crate::remote::{
    DUMP_TRANSACTION, INTERFACE_TRANSACTION, PING_TRANSACTION, RemoteObject, is_meta_transaction,
};
use crate::stats::TransactionStats;
use crate::stub::IpcStub;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lifecycle of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Accepting requests.
    Running,
    /// Killing published objects and draining workers.
    ShuttingDown,
    /// All workers have exited.
    Stopped,
}

struct Shared {
    config: TransportConfig,
    jobs: RwLock<Option<Sender<Job>>>,
}

impl Shared {
    fn sender(&self) -> Option<Sender<Job>> {
        self.jobs.read().clone()
    }

    fn submit(&self, job: Job) -> IpcResult<()> {
        let tx = self.sender().ok_or(IpcError::ShutdownRequested)?;
        tx.send_timeout(job, self.config.sync_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => {
                    warn!("request queue full");
                    IpcError::timeout(duration_ms(self.config.sync_timeout))
                }
                SendTimeoutError::Disconnected(_) => IpcError::ShutdownRequested,
            })
    }

    /// Queue `job` without blocking; run it on the current thread when the
    /// queue is full or gone.
    fn submit_or_run(&self, job: Job) {
        match self.sender() {
            Some(tx) => {
                if let Err(e) = tx.try_send(job) {
                    debug!("request queue unavailable, running job inline");
                    run_job(e.into_inner());
                }
            }
            None => run_job(job),
        }
    }
}

fn run_job(job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!("job panicked, worker keeps running");
    }
}

fn worker_main(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        run_job(job);
    }
    debug!("worker exiting");
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Worker pool hosting published stubs.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ohipc_core::prelude::*;
///
/// struct Hello;
///
/// impl IpcStub for Hello {
///     fn descriptor(&self) -> &str {
///         "demo.IHello"
///     }
///
///     fn on_remote_request(
///         &self,
///         _code: u32,
///         data: &mut MessageParcel,
///         reply: &mut MessageParcel,
///         _option: &MessageOption,
///     ) -> IpcResult<()> {
///         check_interface_token(self.descriptor(), data)?;
///         reply.write_string("hello")?;
///         Ok(())
///     }
/// }
///
/// let runtime = IpcRuntime::new(TransportConfig::default())?;
/// let handle = runtime.publish(Arc::new(Hello))?;
/// let proxy = RemoteProxy::new(handle, "demo.IHello");
/// let mut reply = proxy.send(1, proxy.new_request()?, MessageOption::sync())?;
/// assert_eq!(reply.read_string()?, "hello");
/// runtime.shutdown();
/// # Ok::<(), IpcError>(())
/// ```
pub struct IpcRuntime {
    shared: Arc<Shared>,
    state: Mutex<RuntimeState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    published: Mutex<Vec<Weak<RemoteHandle>>>,
}

impl IpcRuntime {
    /// Validate `config` and spawn the worker pool.
    ///
    /// # Errors
    ///
    /// - [`IpcError::InvalidConfig`] for an invalid configuration.
    /// - [`IpcError::TransportInit`] if a worker thread cannot be spawned.
    pub fn new(config: TransportConfig) -> IpcResult<Self> {
        config.validate()?;
        let (tx, rx) = channel::bounded::<Job>(config.queue_capacity);

        let mut workers = Vec::with_capacity(config.worker_threads);
        for index in 0..config.worker_threads {
            let rx = rx.clone();
            let worker = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .spawn(move || worker_main(rx))
                .map_err(|e| {
                    IpcError::TransportInit(format!("failed to spawn worker {index}: {e}"))
                })?;
            workers.push(worker);
        }

        info!(
            workers = config.worker_threads,
            queue_capacity = config.queue_capacity,
            "IPC runtime started"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                jobs: RwLock::new(Some(tx)),
            }),
            state: Mutex::new(RuntimeState::Running),
            workers: Mutex::new(workers),
            published: Mutex::new(Vec::new()),
        })
    }

    /// Runtime with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if worker threads cannot be spawned.
    pub fn with_defaults() -> IpcResult<Self> {
        Self::new(TransportConfig::default())
    }

    /// Host `stub` and return a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`IpcError::ShutdownRequested`] once shutdown has begun.
    pub fn publish(&self, stub: Arc<dyn IpcStub>) -> IpcResult<Arc<RemoteHandle>> {
        if *self.state.lock() != RuntimeState::Running {
            return Err(IpcError::ShutdownRequested);
        }
        let handle = RemoteHandle::new(stub, Arc::clone(&self.shared));
        let mut published = self.published.lock();
        published.retain(|handle| handle.strong_count() > 0);
        published.push(Arc::downgrade(&handle));
        debug!(descriptor = %handle.descriptor, "stub published");
        Ok(handle)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RuntimeState {
        *self.state.lock()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// Number of published handles still referenced somewhere.
    #[must_use]
    pub fn published_count(&self) -> usize {
        self.published
            .lock()
            .iter()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }

    /// Kill every published object, stop accepting requests and join the
    /// workers. Requests already queued still run and fail with
    /// `ERR_DEAD_OBJECT`.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if *state != RuntimeState::Running {
                return;
            }
            *state = RuntimeState::ShuttingDown;
        }
        info!("IPC runtime shutting down");

        let handles: Vec<Arc<RemoteHandle>> = self
            .published
            .lock()
            .drain(..)
            .filter_map(|handle| handle.upgrade())
            .collect();
        for handle in handles {
            handle.kill();
        }

        drop(self.shared.jobs.write().take());

        let current = thread::current().id();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in workers {
            // Shutdown called from inside a handler must not join itself.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }

        *self.state.lock() = RuntimeState::Stopped;
        info!("IPC runtime stopped");
    }
}

impl Drop for IpcRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for IpcRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpcRuntime")
            .field("state", &self.state())
            .field("config", &self.shared.config)
            .field("published", &self.published_count())
            .finish()
    }
}

/// Handle to a stub hosted by an [`IpcRuntime`].
pub struct RemoteHandle {
    descriptor: String,
    stub: RwLock<Option<Arc<dyn IpcStub>>>,
    deaths: DeathRegistry,
    stats: TransactionStats,
    shared: Arc<Shared>,
    this: Weak<RemoteHandle>,
}

impl RemoteHandle {
    fn new(stub: Arc<dyn IpcStub>, shared: Arc<Shared>) -> Arc<Self> {
        let descriptor = stub.descriptor().to_owned();
        Arc::new_cyclic(|this| Self {
            descriptor,
            stub: RwLock::new(Some(stub)),
            deaths: DeathRegistry::new(),
            stats: TransactionStats::new(),
            shared,
            this: Weak::clone(this),
        })
    }

    /// Per-code statistics of requests delivered to the stub.
    #[must_use]
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Simulate the death of the hosting endpoint.
    ///
    /// The stub is released, later and in-flight calls fail with
    /// `ERR_DEAD_OBJECT`, and each registered recipient is notified once on
    /// the worker pool. Killing a dead object does nothing.
    pub fn kill(&self) {
        let Some(recipients) = self.deaths.mark_dead() else {
            return;
        };
        drop(self.stub.write().take());
        info!(
            descriptor = %self.descriptor,
            recipients = recipients.len(),
            "remote object died"
        );

        let remote: Weak<dyn RemoteObject> = self.this.clone();
        for recipient in recipients {
            let remote = Weak::clone(&remote);
            self.shared
                .submit_or_run(Box::new(move || recipient.on_remote_died(&remote)));
        }
    }

    fn dead_error(&self) -> IpcError {
        IpcError::dead_object(self.descriptor.as_str())
    }

    /// Answer a transport-reserved code without consulting the stub.
    fn answer_meta(&self, code: u32, reply: &mut MessageParcel) -> IpcResult<()> {
        match code {
            INTERFACE_TRANSACTION => reply.write_string16(&self.descriptor)?,
            DUMP_TRANSACTION => {
                let mut lines = vec![format!(
                    "{} total={} failures={}",
                    self.descriptor,
                    self.stats.total(),
                    self.stats.total_failures()
                )];
                lines.extend(self.stats.dump_lines());
                reply.write_string_vector(lines.as_slice())?;
            }
            PING_TRANSACTION => {}
            _ => return Err(IpcError::unknown_transaction(code, self.descriptor.as_str())),
        }
        Ok(())
    }

    /// Runs on a worker.
    fn deliver(
        &self,
        code: u32,
        mut request: MessageParcel,
        option: &MessageOption,
    ) -> (IpcResult<()>, MessageParcel) {
        let config = &self.shared.config;
        let mut reply = MessageParcel::with_limits(config.max_parcel_size, config.max_collection_len);
        let stub = self.stub.read().clone();
        let Some(stub) = stub else {
            return (Err(self.dead_error()), reply);
        };

        let started = Instant::now();
        let result = stub.on_remote_request(code, &mut request, &mut reply, option);
        match &result {
            Err(IpcError::UnknownTransaction { .. }) => self.stats.record_unknown(started.elapsed()),
            _ => self.stats.record(code, started.elapsed(), result.is_ok()),
        }
        (result, reply)
    }
}

impl RemoteObject for RemoteHandle {
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
        if self.is_object_dead() {
            return Err(self.dead_error());
        }
        if is_meta_transaction(code) {
            return self.answer_meta(code, reply);
        }

        let config = &self.shared.config;
        if data.data_size() > config.max_parcel_size {
            warn!(
                descriptor = %self.descriptor,
                code,
                size = data.data_size(),
                limit = config.max_parcel_size,
                "request exceeds parcel size limit"
            );
            return Err(IpcError::transaction_failed(format!(
                "request of {} bytes exceeds the {} byte limit",
                data.data_size(),
                config.max_parcel_size
            )));
        }

        let mut request = std::mem::take(data);
        request.rewind_read();
        request.set_limits(config.max_parcel_size, config.max_collection_len);
        let this = Weak::clone(&self.this);
        let option = *option;

        if option.is_async() {
            self.shared.submit(Box::new(move || {
                let Some(handle) = this.upgrade() else {
                    return;
                };
                let (result, _reply) = handle.deliver(code, request, &option);
                if let Err(e) = result {
                    debug!(code, error = %e, "one-way request failed");
                }
            }))?;
            return Ok(());
        }

        let (tx, rx) = channel::bounded(1);
        self.shared.submit(Box::new(move || {
            let outcome = match this.upgrade() {
                Some(handle) => handle.deliver(code, request, &option),
                None => (
                    Err(IpcError::dead_object("released handle")),
                    MessageParcel::new(),
                ),
            };
            if tx.send(outcome).is_err() {
                debug!(code, "caller stopped waiting for the reply");
            }
        }))?;

        let timeout = option.wait_time().unwrap_or(config.sync_timeout);
        match rx.recv_timeout(timeout) {
            Ok((result, stub_reply)) => {
                result?;
                if self.is_object_dead() {
                    return Err(self.dead_error());
                }
                *reply = stub_reply;
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                let timeout_ms = duration_ms(timeout);
                warn!(descriptor = %self.descriptor, code, timeout_ms, "synchronous call timed out");
                Err(IpcError::timeout(timeout_ms))
            }
            Err(RecvTimeoutError::Disconnected) => {
                if self.is_object_dead() {
                    Err(self.dead_error())
                } else {
                    error!(descriptor = %self.descriptor, code, "request dropped before a reply was produced");
                    Err(IpcError::transaction_failed(
                        "request dropped before a reply was produced",
                    ))
                }
            }
        }
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

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHandle")
            .field("descriptor", &self.descriptor)
            .field("dead", &self.is_object_dead())
            .field("recipients", &self.deaths.len())
            .finish()
    }
}
