use std::io;

use thiserror::Error;

use crate::readiness::{Handle, Interest, Token};

/// Errors raised by a [`ReadinessBackend`](crate::readiness::ReadinessBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("handle {handle} already registered for {interest:?} interest")]
    AlreadyRegistered { handle: Handle, interest: Interest },

    #[error("unknown registration token {token:?}")]
    UnknownToken { token: Token },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl BackendError {
    pub fn already_registered(handle: Handle, interest: Interest) -> Self {
        Self::AlreadyRegistered { handle, interest }
    }

    pub fn unknown_token(token: Token) -> Self {
        Self::UnknownToken { token }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Outcome of a [`PendingWait`](crate::PendingWait) that did not end in readiness.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("wait cancelled")]
    Cancelled,

    #[error("socket pool shut down")]
    PoolShutdown,

    #[error("handle {handle} already has a pending {interest:?} waiter")]
    DuplicateWait { handle: Handle, interest: Interest },

    #[error("register error: {source}")]
    Register {
        #[from]
        source: BackendError,
    },
}

impl WaitError {
    pub fn duplicate_wait(handle: Handle, interest: Interest) -> Self {
        Self::DuplicateWait { handle, interest }
    }

    /// Returns true if the waiter was resumed by an explicit cancel.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled)
    }

    /// Returns true if the pool stopped before the waiter became ready.
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, WaitError::PoolShutdown)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("can't create readiness backend: {source}")]
    Backend {
        #[from]
        source: io::Error,
    },

    #[error("can't spawn socket pool thread: {reason}")]
    Spawn { reason: String },
}

impl ConfigError {
    pub fn spawn<S: ToString>(str: S) -> Self {
        Self::Spawn { reason: str.to_string() }
    }
}
