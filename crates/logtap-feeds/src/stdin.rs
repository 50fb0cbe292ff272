//! Stdin feed — splits a byte stream into lines and drops blank ones.
//!
//! Lines end at `\n`; a `\r` right before it is stripped as well. The last
//! line is yielded even without a trailing newline. Bytes are passed along
//! untouched, so non-UTF-8 input is not an error here.

use std::io;

use logtap_core::normalizer::is_blank;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Counters kept by a [`LineFeed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Every line read, blank or not.
    pub lines: u64,
    /// Lines dropped because they were empty or whitespace-only.
    pub blank: u64,
}

/// Lazy, finite sequence of non-blank lines. Not restartable: once
/// [`next_line`](LineFeed::next_line) returns `Ok(None)` the feed is done.
pub struct LineFeed<R> {
    reader: R,
    buf: Vec<u8>,
    stats: FeedStats,
}

impl LineFeed<BufReader<Stdin>> {
    /// Feed reading the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            stats: FeedStats::default(),
        }
    }

    /// Next non-blank line without its line terminator, or `None` at end of
    /// input.
    pub async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.stats.lines += 1;

            let line = trim_line_ending(&self.buf);
            if is_blank(line) {
                self.stats.blank += 1;
                tracing::trace!(line = self.stats.lines, "skipping blank line");
                continue;
            }
            return Ok(Some(line.to_vec()));
        }
    }

    pub fn stats(&self) -> FeedStats {
        self.stats
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
