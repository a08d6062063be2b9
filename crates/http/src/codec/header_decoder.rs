//! Header section decoding.
//!
//! Header lines are pulled one at a time until the empty line that ends the
//! section. Each line is split on its first colon; name and value are trimmed and
//! the name is case-normalized by [`Headers`]. A repeated name replaces the
//! earlier value.
//!
//! Lines without any colon are skipped rather than rejected.

use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::ChunkedBytes;
use crate::protocol::{DecodeError, Headers};

/// Separator of every line in the message head.
pub(crate) const LINE_SEPARATOR: u8 = b'\n';

/// Pulls the next head line as text, with one trailing `\r` removed.
pub(crate) async fn next_text_line<R>(bytes: &mut ChunkedBytes<R>) -> Result<String, DecodeError>
where
    R: AsyncRead + Unpin,
{
    let line = bytes.next_line(LINE_SEPARATOR).await?;
    Ok(into_text(&line))
}

fn into_text(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HeaderDecoder;

impl HeaderDecoder {
    /// Pulls header lines up to and including the terminating empty line.
    pub(crate) async fn decode<R>(&self, bytes: &mut ChunkedBytes<R>) -> Result<Headers, DecodeError>
    where
        R: AsyncRead + Unpin,
    {
        let mut headers = Headers::new();
        loop {
            let line = next_text_line(bytes).await?;
            if line.is_empty() {
                return Ok(headers);
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    if let Some(previous) = headers.insert(name, value) {
                        trace!(name = name.trim(), previous = %previous, "header value overwritten");
                    }
                }
                None => trace!(line = %line, "dropping header line without colon"),
            }
        }
    }
}
