//! Byte sources backed by the socket pool.
//!
//! [`PooledStream`] adapts a non-blocking socket into `tokio::io::AsyncRead` and
//! `AsyncWrite`. Whenever the socket would block it parks on a
//! [`SocketPool`](micro_poll::SocketPool) wait instead, which makes it a ready-made
//! source for [`ChunkedBytes`](crate::codec::ChunkedBytes).

mod pooled_stream;

pub use pooled_stream::PooledStream;
