/// Body materialization threshold used unless overridden: 10 MiB.
pub const DEFAULT_MATERIALIZE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Chunk size of streamed bodies used unless overridden.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Per-decode body handling parameters.
///
/// Bodies whose declared length is at most `materialize_threshold` are pulled
/// eagerly into memory; larger ones are streamed in `chunk_size` pieces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    materialize_threshold: u64,
    chunk_size: usize,
    max_line_length: Option<usize>,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn with_materialize_threshold(mut self, threshold: u64) -> Self {
        self.materialize_threshold = threshold;
        self
    }

    /// Sets the streamed chunk size; zero is bumped to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bounds the start line and every header line, separator excluded.
    #[must_use]
    pub fn with_max_line_length(mut self, limit: usize) -> Self {
        self.max_line_length = Some(limit);
        self
    }

    pub fn materialize_threshold(&self) -> u64 {
        self.materialize_threshold
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_line_length(&self) -> Option<usize> {
        self.max_line_length
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { materialize_threshold: DEFAULT_MATERIALIZE_THRESHOLD, chunk_size: DEFAULT_CHUNK_SIZE, max_line_length: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.materialize_threshold(), 10_485_760);
        assert_eq!(config.chunk_size(), 4096);
        assert_eq!(config.max_line_length(), None);
    }

    #[test]
    fn line_limit_is_opt_in() {
        let config = DecoderConfig::new().with_chunk_size(16).with_max_line_length(8192);
        assert_eq!(config.max_line_length(), Some(8192));
        assert_eq!(config.chunk_size(), 16);
    }

    #[test]
    fn zero_chunk_size_is_bumped() {
        assert_eq!(DecoderConfig::new().with_chunk_size(0).chunk_size(), 1);
    }
}
