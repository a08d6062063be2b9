//! The socket pool
//!
//! [`SocketPool`] turns "wait until this handle is ready" into a future. Each pool
//! owns one readiness backend and one loop thread; any number of tasks, on any
//! executor, can suspend on it through [`SocketPool::wait`].
//!
//! # Example
//!
//! ```no_run
//! use std::os::fd::AsRawFd;
//! use std::os::unix::net::UnixStream;
//! use micro_poll::{Interest, PoolConfig, SocketPool};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = SocketPool::new(PoolConfig::default())?;
//! let (socket, _peer) = UnixStream::pair()?;
//! socket.set_nonblocking(true)?;
//!
//! // suspends this task, not the thread, until the socket is readable
//! pool.wait(socket.as_raw_fd(), Interest::Read).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Guarantees
//!
//! - at most one pending waiter per `(handle, interest)`; a second one resolves
//!   with [`WaitError::DuplicateWait`]
//! - waiters made ready by one backend wait are all resumed before the next one
//!   starts, in backend report order
//! - a cancelled or dropped wait leaves no registration behind
//! - when the backend fails or the pool is dropped, every pending and future wait
//!   resolves with [`WaitError::PoolShutdown`]

mod config;
mod reactor;

pub use config::PoolConfig;
pub use reactor::WaitId;

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::thread::{self, JoinHandle};

use futures::FutureExt;
use futures::channel::oneshot;
use tracing::{debug, error};

use crate::error::{ConfigError, WaitError};
use crate::readiness::{Handle, Interest, ReadinessBackend};
use reactor::{Command, Reactor};

static POOL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A cooperative readiness scheduler backed by a single loop thread.
///
/// Dropping the pool stops the loop, deregisters every outstanding registration and
/// resumes the remaining waiters with [`WaitError::PoolShutdown`].
#[derive(Debug)]
pub struct SocketPool {
    commands: Sender<Command>,
    next_id: AtomicU64,
    config: PoolConfig,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl SocketPool {
    /// Builds the backend selected by `config` and starts the loop thread.
    ///
    /// # Errors
    ///
    /// Fails if the backend can't be created or the thread can't be spawned.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        let backend = config.backend_kind().build()?;
        Self::with_backend(config, backend)
    }

    /// Starts a pool around an already built backend.
    ///
    /// The backend kind recorded in `config` is ignored.
    ///
    /// # Errors
    ///
    /// Fails if the loop thread can't be spawned.
    pub fn with_backend(config: PoolConfig, backend: Box<dyn ReadinessBackend>) -> Result<Self, ConfigError> {
        let (commands, receiver) = mpsc::channel();
        let reactor = Reactor::new(backend, config.interval(), receiver);

        let name = format!("micro-poll-{}", POOL_SEQ.fetch_add(1, Ordering::Relaxed));
        let thread = thread::Builder::new().name(name).spawn(move || reactor.run()).map_err(ConfigError::spawn)?;

        Ok(Self { commands, next_id: AtomicU64::new(0), config, thread: Mutex::new(Some(thread)) })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Suspends the caller until `handle` is ready for `interest`.
    ///
    /// The returned future resolves with:
    /// - `Ok(())` once the backend reports readiness
    /// - [`WaitError::Cancelled`] after [`cancel`](Self::cancel)
    /// - [`WaitError::PoolShutdown`] if the pool stops first
    /// - [`WaitError::DuplicateWait`] if `(handle, interest)` already has a pending waiter
    pub fn wait(&self, handle: Handle, interest: Interest) -> PendingWait {
        let id = WaitId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (resume, receiver) = oneshot::channel();

        // once the loop is gone the command comes back and `resume` is dropped with it,
        // which the receiver observes as shutdown
        if self.commands.send(Command::Register { id, handle, interest, resume }).is_err() {
            debug!(handle, ?interest, "wait on a stopped socket pool");
        }

        PendingWait { id, handle, interest, receiver, commands: self.commands.clone(), finished: false }
    }

    /// Cancels a pending wait, resuming it with [`WaitError::Cancelled`].
    ///
    /// Cancelling a wait that already resolved does nothing.
    pub fn cancel(&self, pending: &PendingWait) {
        if !pending.finished {
            let _ = self.commands.send(Command::Cancel { id: pending.id });
        }
    }

    /// Stops the loop and waits for it to drain. Calling it again does nothing.
    pub fn shutdown(&self) {
        let thread = self.thread.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(thread) = thread {
            let _ = self.commands.send(Command::Shutdown);
            if thread.join().is_err() {
                error!("socket pool thread panicked");
            }
        }
    }
}

impl Drop for SocketPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A suspended [`SocketPool::wait`] call.
///
/// Dropping it before it resolves cancels the underlying registration.
#[derive(Debug)]
pub struct PendingWait {
    id: WaitId,
    handle: Handle,
    interest: Interest,
    receiver: oneshot::Receiver<Result<(), WaitError>>,
    commands: Sender<Command>,
    finished: bool,
}

impl PendingWait {
    pub fn id(&self) -> WaitId {
        self.id
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn interest(&self) -> Interest {
        self.interest
    }
}

impl Future for PendingWait {
    type Output = Result<(), WaitError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match ready!(self.receiver.poll_unpin(cx)) {
            Ok(outcome) => outcome,
            // the loop dropped the waiter without answering, it is gone
            Err(oneshot::Canceled) => Err(WaitError::PoolShutdown),
        };
        self.finished = true;
        Poll::Ready(outcome)
    }
}

impl Drop for PendingWait {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.commands.send(Command::Cancel { id: self.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::readiness::BackendKind;

    use super::*;

    fn pool(kind: BackendKind) -> SocketPool {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
        SocketPool::new(PoolConfig::new(Duration::from_millis(2)).unwrap().backend(kind)).unwrap()
    }

    #[tokio::test]
    async fn wait_resumes_when_readable() {
        for kind in [BackendKind::Poll, BackendKind::Mio] {
            let pool = pool(kind);
            let (a, mut b) = UnixStream::pair().unwrap();
            a.set_nonblocking(true).unwrap();

            let pending = pool.wait(a.as_raw_fd(), Interest::Read);
            b.write_all(b"ping").unwrap();

            assert!(pending.await.is_ok(), "{kind:?} backend did not resume");
        }
    }

    #[tokio::test]
    async fn cancel_resumes_with_cancelled() {
        let pool = pool(BackendKind::Poll);
        let (a, _b) = UnixStream::pair().unwrap();

        let pending = pool.wait(a.as_raw_fd(), Interest::Read);
        pool.cancel(&pending);

        assert!(pending.await.unwrap_err().is_cancelled());

        // the registration is gone, so the same interest can be awaited again
        let again = pool.wait(a.as_raw_fd(), Interest::Read);
        pool.cancel(&again);
        assert!(again.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn duplicate_wait_is_signaled() {
        let pool = pool(BackendKind::Poll);
        let (a, _b) = UnixStream::pair().unwrap();

        let first = pool.wait(a.as_raw_fd(), Interest::Read);
        let second = pool.wait(a.as_raw_fd(), Interest::Read);

        assert!(matches!(second.await, Err(WaitError::DuplicateWait { interest: Interest::Read, .. })));
        pool.cancel(&first);
        assert!(first.await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_resumes_pending_and_future_waiters() {
        let pool = Arc::new(pool(BackendKind::Mio));
        let (a, _b) = UnixStream::pair().unwrap();
        a.set_nonblocking(true).unwrap();

        let pending = pool.wait(a.as_raw_fd(), Interest::Read);
        // give the loop a chance to register it
        tokio::time::sleep(Duration::from_millis(20)).await;

        pool.shutdown();
        pool.shutdown();

        assert!(pending.await.unwrap_err().is_shutdown());
        assert!(pool.wait(a.as_raw_fd(), Interest::Read).await.unwrap_err().is_shutdown());
    }

    #[tokio::test]
    async fn independent_pools_do_not_share_registrations() {
        let first = pool(BackendKind::Poll);
        let second = pool(BackendKind::Poll);
        let (a, mut b) = UnixStream::pair().unwrap();

        let one = first.wait(a.as_raw_fd(), Interest::Read);
        let two = second.wait(a.as_raw_fd(), Interest::Read);
        b.write_all(b"x").unwrap();

        assert!(one.await.is_ok());
        assert!(two.await.is_ok());
    }
}
