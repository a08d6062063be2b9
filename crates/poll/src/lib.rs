//! Cooperative socket readiness pool
//!
//! This crate turns "wait until this socket is readable/writable" into a future that
//! many tasks can await while sharing one OS polling primitive and one loop thread,
//! instead of a thread per connection.
//!
//! # Architecture
//!
//! - [`readiness`]: the [`ReadinessBackend`] trait and its strategies
//!   ([`PollBackend`], [`MioBackend`]), selected once with [`BackendKind`]
//! - [`SocketPool`]: owns one backend, runs the loop, resumes suspended waiters
//! - [`PoolConfig`]: the poll interval and backend selection
//!
//! # Example
//!
//! ```no_run
//! use std::os::fd::AsRawFd;
//! use std::net::TcpStream;
//! use std::time::Duration;
//! use micro_poll::{BackendKind, Interest, PoolConfig, SocketPool};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PoolConfig::new(Duration::from_millis(5))?.backend(BackendKind::Mio);
//! let pool = SocketPool::new(config)?;
//!
//! let stream = TcpStream::connect("127.0.0.1:8080")?;
//! stream.set_nonblocking(true)?;
//! pool.wait(stream.as_raw_fd(), Interest::Write).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Platform
//!
//! Handles are raw file descriptors, so the crate targets unix platforms.

mod error;
mod pool;
pub mod readiness;

mod utils;
pub(crate) use utils::ensure;

pub use error::{BackendError, ConfigError, WaitError};
pub use pool::{PendingWait, PoolConfig, SocketPool, WaitId};
pub use readiness::{BackendKind, Handle, Interest, MioBackend, PollBackend, ReadinessBackend, Token};
