//! Portable `poll(2)` backend.

use std::io;
use std::time::Duration;

use tracing::trace;

use crate::ensure;
use crate::error::BackendError;
use crate::readiness::{Handle, Interest, ReadinessBackend, Token, TokenSeq};

/// Revents that make a registration ready whatever its interest was.
const POLL_FAILURE: libc::c_short = libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;

#[derive(Debug)]
struct Registration {
    token: Token,
    handle: Handle,
    interest: Interest,
}

impl Registration {
    fn events(&self) -> libc::c_short {
        let mut events = 0;
        if self.interest.is_readable() {
            events |= libc::POLLIN;
        }
        if self.interest.is_writable() {
            events |= libc::POLLOUT;
        }
        events
    }
}

/// Readiness backend built on `poll(2)`.
///
/// Registrations are kept in registration order and every `wait` hands the whole
/// set to the kernel, one `pollfd` per registration. A handle registered for both
/// read and write interest separately simply appears twice.
#[derive(Debug, Default)]
pub struct PollBackend {
    registrations: Vec<Registration>,
    pollfds: Vec<libc::pollfd>,
    tokens: TokenSeq,
}

impl PollBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl ReadinessBackend for PollBackend {
    fn register(&mut self, handle: Handle, interest: Interest) -> Result<Token, BackendError> {
        let duplicated = self.registrations.iter().any(|r| r.handle == handle && r.interest == interest);
        ensure!(!duplicated, BackendError::already_registered(handle, interest));

        let token = self.tokens.next();
        self.registrations.push(Registration { token, handle, interest });
        trace!(handle, ?interest, ?token, "poll registration added");
        Ok(token)
    }

    fn wait(&mut self, timeout: Duration, ready: &mut Vec<Token>) -> io::Result<()> {
        ready.clear();

        self.pollfds.clear();
        self.pollfds.extend(self.registrations.iter().map(|r| libc::pollfd { fd: r.handle, events: r.events(), revents: 0 }));

        let nfds = libc::nfds_t::try_from(self.pollfds.len()).map_err(io::Error::other)?;

        // SAFETY: `pollfds` is a live, initialized buffer of exactly `nfds` entries and
        // the kernel only writes the `revents` field of each entry.
        let rc = unsafe { libc::poll(self.pollfds.as_mut_ptr(), nfds, timeout_millis(timeout)) };
        if rc < 0 {
            let e = io::Error::last_os_error();
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(e);
        }

        if rc == 0 {
            return Ok(());
        }

        for (pollfd, registration) in self.pollfds.iter().zip(&self.registrations) {
            if pollfd.revents & (pollfd.events | POLL_FAILURE) != 0 {
                ready.push(registration.token);
            }
        }

        Ok(())
    }

    fn deregister(&mut self, token: Token) -> Result<(), BackendError> {
        let index = self
            .registrations
            .iter()
            .position(|r| r.token == token)
            .ok_or_else(|| BackendError::unknown_token(token))?;
        // `remove` rather than `swap_remove` keeps the registration order intact
        let registration = self.registrations.remove(index);
        trace!(handle = registration.handle, ?token, "poll registration removed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "poll"
    }
}

/// Converts a timeout to `poll(2)` milliseconds, rounding sub-millisecond waits up so
/// a non-zero timeout never turns into a busy loop.
fn timeout_millis(timeout: Duration) -> libc::c_int {
    let millis = timeout.as_millis();
    let millis = if millis == 0 && !timeout.is_zero() { 1 } else { millis };
    libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn duplicate_registration_is_rejected() {
        let (a, _b) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();

        backend.register(a.as_raw_fd(), Interest::Read).unwrap();
        let result = backend.register(a.as_raw_fd(), Interest::Read);
        assert!(matches!(result, Err(BackendError::AlreadyRegistered { interest: Interest::Read, .. })));

        // another interest on the same handle is a separate registration
        backend.register(a.as_raw_fd(), Interest::Write).unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn timeout_yields_empty_set() {
        let (a, _b) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();
        backend.register(a.as_raw_fd(), Interest::Read).unwrap();

        let mut ready = vec![Token(42)];
        backend.wait(TIMEOUT, &mut ready).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn readable_socket_is_reported() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();
        let token = backend.register(a.as_raw_fd(), Interest::Read).unwrap();

        b.write_all(b"ping").unwrap();

        let mut ready = Vec::new();
        backend.wait(TIMEOUT, &mut ready).unwrap();
        assert_eq!(ready, vec![token]);
    }

    #[test]
    fn ready_tokens_follow_registration_order() {
        let (a, _a_peer) = UnixStream::pair().unwrap();
        let (b, _b_peer) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();

        // fresh sockets are writable right away
        let first = backend.register(b.as_raw_fd(), Interest::Write).unwrap();
        let second = backend.register(a.as_raw_fd(), Interest::Write).unwrap();
        let third = backend.register(a.as_raw_fd(), Interest::Both).unwrap();

        let mut ready = Vec::new();
        backend.wait(TIMEOUT, &mut ready).unwrap();
        assert_eq!(ready, vec![first, second, third]);
    }

    #[test]
    fn deregistered_token_is_not_reported() {
        let (a, mut b) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();
        let token = backend.register(a.as_raw_fd(), Interest::Read).unwrap();
        backend.deregister(token).unwrap();

        b.write_all(b"ping").unwrap();

        let mut ready = Vec::new();
        backend.wait(TIMEOUT, &mut ready).unwrap();
        assert!(ready.is_empty());
        assert!(matches!(backend.deregister(token), Err(BackendError::UnknownToken { .. })));
    }

    #[test]
    fn hang_up_wakes_reader() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut backend = PollBackend::new();
        let token = backend.register(a.as_raw_fd(), Interest::Read).unwrap();

        drop(b);

        let mut ready = Vec::new();
        backend.wait(TIMEOUT, &mut ready).unwrap();
        assert_eq!(ready, vec![token]);
    }

    #[test]
    fn sub_millisecond_timeout_rounds_up() {
        assert_eq!(timeout_millis(Duration::from_micros(10)), 1);
        assert_eq!(timeout_millis(Duration::ZERO), 0);
        assert_eq!(timeout_millis(Duration::from_millis(25)), 25);
    }
}
