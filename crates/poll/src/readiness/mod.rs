//! Readiness backends
//!
//! A readiness backend wraps one OS-level I/O multiplexing primitive behind the
//! [`ReadinessBackend`] trait. The [`SocketPool`](crate::SocketPool) owns exactly one
//! backend, selected once through [`BackendKind`] when the pool is built.
//!
//! # Backends
//!
//! - [`PollBackend`]: portable `poll(2)` backend, the default
//! - [`MioBackend`]: epoll on Linux, kqueue on BSD/macOS, via `mio`
//!
//! # Contract
//!
//! - `register` returns a fresh [`Token`]; tokens grow monotonically, so token
//!   order is registration order
//! - registering the same `(handle, interest)` twice before deregistering it is an
//!   error, never merged
//! - `wait` blocks at most `timeout` and reports an empty set when nothing is ready
//! - ready tokens of one handle are reported in registration order

mod mio;
mod poll;

pub use self::mio::MioBackend;
pub use self::poll::PollBackend;

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::error::BackendError;

/// OS socket handle the pool waits on.
pub type Handle = RawFd;

/// The readiness a waiter is interested in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Interest {
    Read,
    Write,
    /// Ready as soon as either direction is.
    Both,
}

impl Interest {
    #[inline]
    pub fn is_readable(self) -> bool {
        matches!(self, Interest::Read | Interest::Both)
    }

    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, Interest::Write | Interest::Both)
    }
}

/// Identifies one registration inside a backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub usize);

/// Strategy wrapping an OS readiness primitive.
pub trait ReadinessBackend: Send {
    /// Registers `handle` for `interest`, returning the token reported by [`wait`](Self::wait).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::AlreadyRegistered`] if `(handle, interest)` is still registered.
    fn register(&mut self, handle: Handle, interest: Interest) -> Result<Token, BackendError>;

    /// Blocks for at most `timeout`, replacing the content of `ready` with the tokens
    /// that became ready.
    ///
    /// An empty `ready` after returning is a timeout, not an error.
    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Token>) -> io::Result<()>;

    /// Removes a registration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::UnknownToken`] if the token is not registered.
    fn deregister(&mut self, token: Token) -> Result<(), BackendError>;

    /// Short backend name used in log events.
    fn name(&self) -> &'static str;
}

/// Selects which backend a pool is built with.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// `poll(2)`, available on every unix.
    #[default]
    Poll,
    /// epoll/kqueue through `mio`.
    Mio,
}

impl BackendKind {
    /// Builds a fresh backend of this kind.
    pub fn build(self) -> io::Result<Box<dyn ReadinessBackend>> {
        match self {
            BackendKind::Poll => Ok(Box::new(PollBackend::new())),
            BackendKind::Mio => Ok(Box::new(MioBackend::new()?)),
        }
    }
}

/// Monotonic token allocator shared by the backends.
#[derive(Debug, Default)]
struct TokenSeq(usize);

impl TokenSeq {
    fn next(&mut self) -> Token {
        let token = Token(self.0);
        self.0 += 1;
        token
    }
}
