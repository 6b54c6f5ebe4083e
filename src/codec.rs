//! Line-oriented gzip stream codec.
//!
//! Two halves, both incremental:
//!
//! - [`GzLineReader`] lazily decompresses a gzip file and yields one text
//!   line at a time; the whole stream is never materialized in memory.
//! - [`LineWriter`] writes newline-terminated lines into any [`Write`] sink
//!   (typically a [`GzEncoder`] or a child process's stdin), keeping a
//!   monotonic count of lines written and optionally flushing the sink after
//!   every Kth line.
//!
//! Neither half knows anything about records or transforms; they move lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Write};
use std::num::NonZeroU64;
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::trace;

/// Lazy line iterator over a gzip-compressed file.
///
/// Yields `io::Result<String>`; a truncated or malformed compressed stream
/// surfaces as an error from the iterator, which is always fatal for the
/// pipeline driving it.
pub struct GzLineReader {
    lines: Lines<BufReader<GzDecoder<BufReader<File>>>>,
}

impl GzLineReader {
    /// Open `path` and wrap it with incremental gzip decompression.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Self {
            lines: BufReader::new(decoder).lines(),
        })
    }
}

impl Iterator for GzLineReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

/// Counting, optionally periodically-flushing line writer.
///
/// The flush interval is 1-based: with `flush_every = K` the sink is flushed
/// after lines K, 2K, 3K, ... and never before the first full interval.
pub struct LineWriter<W: Write> {
    inner: W,
    written: u64,
    flush_every: Option<NonZeroU64>,
}

impl<W: Write> LineWriter<W> {
    /// A writer that never flushes until [`flush`](Self::flush) or drop of
    /// the underlying sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
            flush_every: None,
        }
    }

    /// A writer that flushes the sink after every `every` lines.
    /// `every = 0` disables periodic flushing.
    pub fn with_flush_every(inner: W, every: u64) -> Self {
        Self {
            inner,
            written: 0,
            flush_every: NonZeroU64::new(every),
        }
    }

    /// Write one line followed by the newline delimiter.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        if let Some(every) = self.flush_every
            && self.written % every.get() == 0
        {
            trace!(lines = self.written, "periodic flush");
            self.inner.flush()?;
        }
        Ok(())
    }

    /// Total lines written so far.
    pub fn lines_written(&self) -> u64 {
        self.written
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Unwrap the underlying sink, e.g. to finish a compression context.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Wrap `sink` with streaming gzip compression at the default level.
pub fn gz_encoder<W: Write>(sink: W) -> GzEncoder<W> {
    GzEncoder::new(sink, Compression::default())
}
