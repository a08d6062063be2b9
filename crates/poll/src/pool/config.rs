//! Socket pool construction parameters.

use std::time::Duration;

use crate::ensure;
use crate::error::ConfigError;
use crate::readiness::BackendKind;

/// Configuration of a [`SocketPool`](crate::SocketPool).
///
/// The poll interval bounds how long the pool loop blocks in one backend wait,
/// and therefore the worst-case latency before a newly queued wait or cancel is
/// applied. It is a liveness parameter, not a per-operation deadline.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use micro_poll::{BackendKind, PoolConfig};
///
/// let config = PoolConfig::new(Duration::from_millis(5)).unwrap().backend(BackendKind::Mio);
/// assert_eq!(config.interval(), Duration::from_millis(5));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    interval: Duration,
    backend: BackendKind,
}

impl PoolConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

    /// Creates a configuration with the given poll interval and the default backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, ConfigError> {
        ensure!(!interval.is_zero(), ConfigError::ZeroInterval);
        Ok(Self { interval, backend: BackendKind::default() })
    }

    /// Two-interval form kept for callers that still distinguish a poll interval from
    /// a loop interval.
    ///
    /// Both bounded the same wake latency, so they collapse into one interval: the
    /// smaller of the two. The result is identical to `PoolConfig::new(min)`.
    #[deprecated(note = "the poll and loop intervals were unified, use `PoolConfig::new`")]
    pub fn with_intervals(poll_interval: Duration, loop_interval: Duration) -> Result<Self, ConfigError> {
        Self::new(poll_interval.min(loop_interval))
    }

    /// Selects the readiness backend the pool is built with.
    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { interval: Self::DEFAULT_INTERVAL, backend: BackendKind::default() }
    }
}
