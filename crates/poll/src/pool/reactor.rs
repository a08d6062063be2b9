//! The socket pool loop.
//!
//! A [`Reactor`] owns the readiness backend and the table of suspended waiters. It
//! is driven by a single thread: every [`turn`](Reactor::turn) applies the queued
//! commands, blocks on the backend for at most one poll interval, then resumes one
//! waiter per ready token in the order the backend reported them.

use std::collections::{HashMap, HashSet};
use std::io;
use std::mem;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use futures::channel::oneshot;
use tracing::{debug, error, info, trace, warn};

use crate::error::{BackendError, WaitError};
use crate::readiness::{Handle, Interest, ReadinessBackend, Token};

/// Identifies one `wait` call for cancellation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WaitId(pub(crate) u64);

pub(crate) type Resume = oneshot::Sender<Result<(), WaitError>>;

/// Requests sent from [`SocketPool`](crate::SocketPool) handles to the loop thread.
#[derive(Debug)]
pub(crate) enum Command {
    Register { id: WaitId, handle: Handle, interest: Interest, resume: Resume },
    Cancel { id: WaitId },
    Shutdown,
}

/// What the loop should do after a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Turn {
    Continue,
    Stop,
}

#[derive(Debug)]
struct Waiter {
    id: WaitId,
    handle: Handle,
    interest: Interest,
    resume: Resume,
}

pub(crate) struct Reactor {
    backend: Box<dyn ReadinessBackend>,
    commands: Receiver<Command>,
    interval: Duration,
    waiters: HashMap<Token, Waiter>,
    tokens: HashMap<WaitId, Token>,
    pending: HashSet<(Handle, Interest)>,
    ready: Vec<Token>,
}

impl Reactor {
    pub(crate) fn new(backend: Box<dyn ReadinessBackend>, interval: Duration, commands: Receiver<Command>) -> Self {
        Self {
            backend,
            commands,
            interval,
            waiters: HashMap::new(),
            tokens: HashMap::new(),
            pending: HashSet::new(),
            ready: Vec::new(),
        }
    }

    /// Runs turns until shut down or the backend fails, then drains every waiter.
    pub(crate) fn run(mut self) {
        info!(backend = self.backend.name(), interval = ?self.interval, "socket pool loop started");
        loop {
            match self.turn() {
                Ok(Turn::Continue) => {}
                Ok(Turn::Stop) => {
                    info!("socket pool loop stopped");
                    break;
                }
                Err(e) => {
                    error!(cause = %e, backend = self.backend.name(), "readiness backend failed, shutting down pool");
                    break;
                }
            }
        }
        self.close();
    }

    /// One cycle: apply commands, wait on the backend, resume the ready waiters.
    ///
    /// Every waiter made ready by this cycle is resumed before it returns.
    pub(crate) fn turn(&mut self) -> io::Result<Turn> {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => return Ok(Turn::Stop),
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => break,
            }
        }

        let mut ready = mem::take(&mut self.ready);
        let result = self.backend.wait(self.interval, &mut ready);
        if result.is_ok() {
            for token in &ready {
                self.resume(*token);
            }
        }
        self.ready = ready;

        result.map(|()| Turn::Continue)
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register { id, handle, interest, resume } => self.register(id, handle, interest, resume),
            Command::Cancel { id } => self.cancel(id),
            Command::Shutdown => {}
        }
    }

    fn register(&mut self, id: WaitId, handle: Handle, interest: Interest, resume: Resume) {
        if self.pending.contains(&(handle, interest)) {
            warn!(handle, ?interest, "rejecting second waiter for the same handle and interest");
            let _ = resume.send(Err(WaitError::duplicate_wait(handle, interest)));
            return;
        }

        match self.backend.register(handle, interest) {
            Ok(token) => {
                trace!(handle, ?interest, ?token, "waiter suspended");
                self.pending.insert((handle, interest));
                self.tokens.insert(id, token);
                self.waiters.insert(token, Waiter { id, handle, interest, resume });
            }
            Err(BackendError::AlreadyRegistered { handle, interest }) => {
                let _ = resume.send(Err(WaitError::duplicate_wait(handle, interest)));
            }
            Err(e) => {
                warn!(handle, ?interest, cause = %e, "can't register waiter");
                let _ = resume.send(Err(e.into()));
            }
        }
    }

    fn cancel(&mut self, id: WaitId) {
        let Some(waiter) = self.tokens.remove(&id).and_then(|token| self.take(token)) else {
            // already resumed, nothing left to cancel
            return;
        };
        debug!(handle = waiter.handle, interest = ?waiter.interest, "waiter cancelled");
        let _ = waiter.resume.send(Err(WaitError::Cancelled));
    }

    fn resume(&mut self, token: Token) {
        let Some(waiter) = self.take(token) else {
            trace!(?token, "readiness without waiter");
            return;
        };
        self.tokens.remove(&waiter.id);
        trace!(handle = waiter.handle, interest = ?waiter.interest, "waiter resumed");
        // the waiter may have been dropped meanwhile, nobody is left to tell
        let _ = waiter.resume.send(Ok(()));
    }

    /// Removes a waiter and its backend registration.
    fn take(&mut self, token: Token) -> Option<Waiter> {
        let waiter = self.waiters.remove(&token)?;
        self.pending.remove(&(waiter.handle, waiter.interest));
        if let Err(e) = self.backend.deregister(token) {
            warn!(handle = waiter.handle, ?token, cause = %e, "can't deregister waiter");
        }
        Some(waiter)
    }

    /// Deregisters everything and resumes every waiter, queued or suspended, with
    /// [`WaitError::PoolShutdown`].
    fn close(&mut self) {
        let tokens: Vec<Token> = self.waiters.keys().copied().collect();
        let count = tokens.len();
        for token in tokens {
            if let Some(waiter) = self.take(token) {
                let _ = waiter.resume.send(Err(WaitError::PoolShutdown));
            }
        }
        self.tokens.clear();

        while let Ok(command) = self.commands.try_recv() {
            if let Command::Register { resume, .. } = command {
                let _ = resume.send(Err(WaitError::PoolShutdown));
            }
        }

        if count > 0 {
            info!(count, "drained pending waiters on shutdown");
        }
    }

    #[cfg(test)]
    fn waiting(&self) -> usize {
        self.waiters.len()
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        if !self.waiters.is_empty() {
            self.close();
        }
    }
}
