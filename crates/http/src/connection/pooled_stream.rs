use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use micro_poll::{Interest, PendingWait, SocketPool};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::trace;

/// A non-blocking socket driven by a [`SocketPool`].
///
/// Reads and writes go straight to the socket. When the socket would block, the
/// stream registers a pool wait for the matching interest and suspends until the
/// pool reports readiness, so the task never blocks its thread.
///
/// `io` must already be in non-blocking mode.
///
/// # Type Parameters
///
/// * `S`: the socket, e.g. a `std::os::unix::net::UnixStream` or `std::net::TcpStream`
#[derive(Debug)]
pub struct PooledStream<S> {
    io: S,
    pool: Arc<SocketPool>,
    read_wait: Option<PendingWait>,
    write_wait: Option<PendingWait>,
}

impl<S> PooledStream<S> {
    pub fn new(io: S, pool: Arc<SocketPool>) -> Self {
        Self { io, pool, read_wait: None, write_wait: None }
    }

    pub fn get_ref(&self) -> &S {
        &self.io
    }

    pub fn pool(&self) -> &Arc<SocketPool> {
        &self.pool
    }

    /// Gives the socket back, cancelling any pending wait.
    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S> PooledStream<S>
where
    S: AsRawFd,
{
    /// Polls the pending wait for `interest`, registering a new one if there is none.
    fn poll_ready(&mut self, cx: &mut Context<'_>, interest: Interest) -> Poll<io::Result<()>> {
        let handle = self.io.as_raw_fd();
        let slot = if interest.is_readable() { &mut self.read_wait } else { &mut self.write_wait };
        let wait = slot.get_or_insert_with(|| {
            trace!(handle, ?interest, "socket would block, waiting on pool");
            self.pool.wait(handle, interest)
        });

        let outcome = ready!(Pin::new(wait).poll(cx));
        *slot = None;
        Poll::Ready(outcome.map_err(io::Error::other))
    }
}

impl<S> AsyncRead for PooledStream<S>
where
    S: Read + AsRawFd + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.read_wait.is_some() {
                ready!(this.poll_ready(cx, Interest::Read))?;
            }

            match this.io.read(buf.initialize_unfilled()) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    ready!(this.poll_ready(cx, Interest::Read))?;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Poll::Ready(Err(e)),
            }
        }
    }
}

impl<S> AsyncWrite for PooledStream<S>
where
    S: Write + AsRawFd + Unpin,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            if this.write_wait.is_some() {
                ready!(this.poll_ready(cx, Interest::Write))?;
            }

            match this.io.write(buf) {
                Ok(n) => return Poll::Ready(Ok(n)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    ready!(this.poll_ready(cx, Interest::Write))?;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Poll::Ready(Err(e)),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.get_mut().io.flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.poll_flush(cx)
    }
}
