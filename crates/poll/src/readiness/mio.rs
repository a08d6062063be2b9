//! Mio-based readiness backend using epoll/kqueue.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use ::mio::unix::SourceFd;
use ::mio::{Events, Poll};
use tracing::trace;

use crate::ensure;
use crate::error::BackendError;
use crate::readiness::{Handle, Interest, ReadinessBackend, Token, TokenSeq};

const EVENT_CAPACITY: usize = 1024;

/// Readiness backend built on `mio` (epoll on Linux, kqueue on BSD/macOS).
///
/// The kernel only accepts one registration per file descriptor, so every handle
/// is registered once with the union of its pending interests and re-registered
/// whenever that union changes. Kernel events are fanned out to the handle's
/// tokens in registration order.
pub struct MioBackend {
    poll: Poll,
    events: Events,
    /// pending `(token, interest)` pairs per handle, in registration order
    handles: HashMap<Handle, Vec<(Token, Interest)>>,
    tokens: HashMap<Token, Handle>,
    seq: TokenSeq,
}

impl MioBackend {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(EVENT_CAPACITY),
            handles: HashMap::new(),
            tokens: HashMap::new(),
            seq: TokenSeq::default(),
        })
    }

    /// Brings the kernel registration of `handle` in line with its pending interests.
    fn sync(&self, handle: Handle, previous: Option<::mio::Interest>) -> io::Result<()> {
        let registry = self.poll.registry();
        let source_token = ::mio::Token(handle_key(handle));
        let wanted = self.handles.get(&handle).and_then(|pending| union(pending));

        match (previous, wanted) {
            (None, Some(interest)) => registry.register(&mut SourceFd(&handle), source_token, interest),
            (Some(_), Some(interest)) => registry.reregister(&mut SourceFd(&handle), source_token, interest),
            (Some(_), None) => registry.deregister(&mut SourceFd(&handle)),
            (None, None) => Ok(()),
        }
    }
}

impl std::fmt::Debug for MioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MioBackend").field("handles", &self.handles).finish_non_exhaustive()
    }
}

impl ReadinessBackend for MioBackend {
    fn register(&mut self, handle: Handle, interest: Interest) -> Result<Token, BackendError> {
        let pending = self.handles.entry(handle).or_default();
        ensure!(!pending.iter().any(|(_, i)| *i == interest), BackendError::already_registered(handle, interest));

        let previous = union(pending);
        let token = self.seq.next();
        pending.push((token, interest));

        if let Err(e) = self.sync(handle, previous) {
            // roll back so the table never holds a registration the kernel refused
            if let Some(pending) = self.handles.get_mut(&handle) {
                pending.pop();
                if pending.is_empty() {
                    self.handles.remove(&handle);
                }
            }
            return Err(BackendError::io(e));
        }

        self.tokens.insert(token, handle);
        trace!(handle, ?interest, ?token, "mio registration added");
        Ok(token)
    }

    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Token>) -> io::Result<()> {
        ready.clear();

        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        }

        for event in &self.events {
            let Ok(handle) = Handle::try_from(event.token().0) else {
                continue;
            };
            let Some(pending) = self.handles.get(&handle) else {
                continue;
            };

            let failed = event.is_error() || event.is_read_closed() || event.is_write_closed();
            for (token, interest) in pending {
                let matched = failed
                    || (interest.is_readable() && event.is_readable())
                    || (interest.is_writable() && event.is_writable());
                if matched {
                    ready.push(*token);
                }
            }
        }

        Ok(())
    }

    fn deregister(&mut self, token: Token) -> Result<(), BackendError> {
        let handle = self.tokens.remove(&token).ok_or_else(|| BackendError::unknown_token(token))?;

        let previous = self.handles.get(&handle).and_then(|pending| union(pending));
        if let Some(pending) = self.handles.get_mut(&handle) {
            pending.retain(|(t, _)| *t != token);
            if pending.is_empty() {
                self.handles.remove(&handle);
            }
        }

        self.sync(handle, previous).map_err(BackendError::io)?;
        trace!(handle, ?token, "mio registration removed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mio"
    }
}

fn handle_key(handle: Handle) -> usize {
    // file descriptors handed to a backend are never negative
    usize::try_from(handle).unwrap_or(usize::MAX)
}

fn union(pending: &[(Token, Interest)]) -> Option<::mio::Interest> {
    let readable = pending.iter().any(|(_, i)| i.is_readable());
    let writable = pending.iter().any(|(_, i)| i.is_writable());
    match (readable, writable) {
        (true, true) => Some(::mio::Interest::READABLE | ::mio::Interest::WRITABLE),
        (true, false) => Some(::mio::Interest::READABLE),
        (false, true) => Some(::mio::Interest::WRITABLE),
        (false, false) => None,
    }
}
