//! Pipeline strategies over a gzip NDJSON stream.
//!
//! Every strategy has the same observable contract: read a gzip-compressed,
//! newline-delimited JSON file, apply the injected [`RecordTransform`] to
//! each line, emit a gzip-compressed newline-delimited stream to the
//! configured [`OutputSink`], and report one overall result. Output line *i*
//! always corresponds to input line *i*; no strategy reorders records.
//!
//! - [`InProcessPipeline`] is the single-control-flow baseline: decompress,
//!   transform, and recompress all happen inside this process.
//! - [`PipedPipeline`] spawns external `gzip` processes for the codec stages
//!   and either pumps lines through the harness's own transform
//!   ([`PipedPipeline::run`]) or delegates the transform to an external
//!   filter tool wired process-to-process ([`PipedPipeline::run_external`]).
//!
//! The piped variants advance through an explicit lifecycle,
//! `Built → Running → Draining → Joined → {Success, Failed}`, observable via
//! [`PipedPipeline::state`] after a run. Joining every spawned stage before
//! reporting is part of the contract, on failure paths included.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::bounded;
use tracing::debug;

use crate::codec::{GzLineReader, LineWriter, gz_encoder};
use crate::error::{PipelineError, Result};
use crate::stage::{Stage, StageInput, StageOutput, StageSpec};
use crate::transform::RecordTransform;

/// Default flush interval for the pipe feeding the downstream compressor,
/// matching the original harness.
pub const DEFAULT_FLUSH_EVERY: u64 = 1000;

/// Bounded capacity of the in-harness channel between the upstream reader
/// and the downstream writer. Bounded so a stalled consumer applies
/// backpressure to the producer instead of buffering the whole stream.
const PUMP_CHANNEL_CAPACITY: usize = 1024;

/// Where the compressed output stream goes.
///
/// Benchmark runs discard the output; tests write to a file and decompress
/// it to verify content and ordering.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    #[default]
    Discard,
    File(PathBuf),
}

impl OutputSink {
    fn writer(&self) -> io::Result<Box<dyn Write>> {
        Ok(match self {
            OutputSink::Discard => Box::new(io::sink()),
            OutputSink::File(path) => Box::new(File::create(path)?),
        })
    }

    fn stage_output(&self) -> io::Result<StageOutput> {
        Ok(match self {
            OutputSink::Discard => StageOutput::Null,
            OutputSink::File(path) => StageOutput::File(File::create(path)?),
        })
    }
}

/// Lifecycle of a [`PipedPipeline`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// All stages spawned and pipes wired; no data has flowed yet.
    Built,
    /// Stages are producing; the harness pump (if any) is moving lines.
    Running,
    /// All lines forwarded; the parent's write end to the terminal stage is
    /// closed, signalling end-of-stream downstream.
    Draining,
    /// Every stage has been waited on and its exit code collected.
    Joined,
    /// Every stage exited zero and no I/O or transform error occurred.
    Success,
    /// A stage exited non-zero, or a fatal error aborted the invocation.
    Failed,
}

/// Baseline strategy: one process, one control flow, line by line.
pub struct InProcessPipeline<T: RecordTransform> {
    transform: T,
    output: OutputSink,
}

impl<T: RecordTransform> InProcessPipeline<T> {
    pub fn new(transform: T) -> Self {
        Self {
            transform,
            output: OutputSink::default(),
        }
    }

    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    /// Run the pipeline over `input`.
    ///
    /// Returns `Ok(true)` on a full successful run. Codec and transform
    /// failures propagate as errors; both file handles and the compression
    /// context are released on every exit path.
    pub fn run(&self, input: &Path) -> Result<bool> {
        let reader = GzLineReader::open(input)?;
        let mut writer = LineWriter::new(gz_encoder(self.output.writer()?));
        for (index, line) in reader.enumerate() {
            let line = line?;
            let projected =
                self.transform
                    .apply(&line)
                    .map_err(|source| PipelineError::Transform {
                        line: index as u64 + 1,
                        source,
                    })?;
            writer.write_line(&projected)?;
        }
        writer.into_inner().finish()?.flush()?;
        Ok(true)
    }
}

/// Multi-process strategy: gzip codec stages as separate OS processes.
pub struct PipedPipeline<T: RecordTransform> {
    transform: T,
    output: OutputSink,
    flush_every: u64,
    state: PipelineState,
}

impl<T: RecordTransform> PipedPipeline<T> {
    pub fn new(transform: T) -> Self {
        Self {
            transform,
            output: OutputSink::default(),
            flush_every: DEFAULT_FLUSH_EVERY,
            state: PipelineState::Built,
        }
    }

    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    /// Flush the compressor's stdin after every `every` lines. `0` disables
    /// periodic flushing.
    pub fn with_flush_every(mut self, every: u64) -> Self {
        self.flush_every = every;
        self
    }

    /// Lifecycle state reached by the most recent run.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Decompressor child → harness transform pump → compressor child.
    ///
    /// The pump runs on two scoped workers joined by a bounded channel: one
    /// reads and transforms lines from the decompressor's stdout, the other
    /// writes them into the compressor's stdin with periodic flushes. The
    /// two directions are scheduled independently, so a full write buffer on
    /// one side never starves a readable-but-unread buffer on the other —
    /// strictly alternating read/write deadlocks once OS pipe buffers fill.
    pub fn run(&mut self, input: &Path) -> Result<bool> {
        let outcome = self.run_pumped(input);
        self.finish(outcome)
    }

    /// Pure external chain: decompressor → `filter` → compressor, pipes
    /// wired process-to-process. The harness does no per-line work; it only
    /// spawns, wires, and joins.
    pub fn run_external(&mut self, input: &Path, filter: StageSpec) -> Result<bool> {
        let outcome = self.run_chained(input, filter);
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: Result<bool>) -> Result<bool> {
        self.state = match &outcome {
            Ok(true) => PipelineState::Success,
            Ok(false) | Err(_) => PipelineState::Failed,
        };
        debug!(state = ?self.state, "pipeline finished");
        outcome
    }

    fn run_pumped(&mut self, input: &Path) -> Result<bool> {
        let mut decompress = Stage::spawn(
            gzip_decompress(input),
            StageInput::Null,
            StageOutput::Piped,
        )?;
        let mut compress = Stage::spawn(
            gzip_compress(),
            StageInput::Piped,
            self.output.stage_output()?,
        )?;
        let upstream = decompress
            .take_stdout()
            .ok_or_else(|| missing_pipe("decompressor stdout"))?;
        let downstream = compress
            .take_stdin()
            .ok_or_else(|| missing_pipe("compressor stdin"))?;
        self.state = PipelineState::Built;

        let flush_every = self.flush_every;
        let transform = &self.transform;
        self.state = PipelineState::Running;
        let (read_result, write_result) = thread::scope(|scope| {
            let (tx, rx) = bounded::<String>(PUMP_CHANNEL_CAPACITY);
            let reader = scope.spawn(move || -> Result<()> {
                for (index, line) in BufReader::new(upstream).lines().enumerate() {
                    let line = line?;
                    let projected =
                        transform
                            .apply(&line)
                            .map_err(|source| PipelineError::Transform {
                                line: index as u64 + 1,
                                source,
                            })?;
                    if tx.send(projected).is_err() {
                        // Writer is gone; its own result carries the cause.
                        break;
                    }
                }
                // Returning drops `tx` (end-of-stream for the writer) and the
                // upstream pipe end. On the error path the latter makes the
                // decompressor die to EPIPE instead of blocking on a full
                // buffer that nobody will ever drain.
                Ok(())
            });
            let writer = scope.spawn(move || -> Result<()> {
                let mut out =
                    LineWriter::with_flush_every(BufWriter::new(downstream), flush_every);
                for line in rx {
                    out.write_line(&line)?;
                }
                out.flush()?;
                // Dropping `out` closes the compressor's stdin: end-of-stream.
                Ok(())
            });
            (reader.join(), writer.join())
        });
        let read_result = read_result.unwrap_or(Err(PipelineError::WorkerPanic));
        let write_result = write_result.unwrap_or(Err(PipelineError::WorkerPanic));
        self.state = PipelineState::Draining;

        // Both stages are joined before any result is reported, so no
        // invocation can leave a zombie behind, failure paths included.
        let decompress_code = decompress.wait();
        let compress_code = compress.wait();
        self.state = PipelineState::Joined;

        read_result?;
        let codes = [decompress_code?, compress_code?];
        if codes.iter().any(|&code| code != 0) {
            debug!(?codes, "stage exited non-zero");
            return Ok(false);
        }
        write_result?;
        Ok(true)
    }

    fn run_chained(&mut self, input: &Path, filter: StageSpec) -> Result<bool> {
        let mut decompress = Stage::spawn(
            gzip_decompress(input),
            StageInput::Null,
            StageOutput::Piped,
        )?;
        let upstream = decompress
            .take_stdout()
            .ok_or_else(|| missing_pipe("decompressor stdout"))?;
        let mut filter_stage = Stage::spawn(
            filter,
            StageInput::FromStage(upstream),
            StageOutput::Piped,
        )?;
        let filtered = filter_stage
            .take_stdout()
            .ok_or_else(|| missing_pipe("filter stdout"))?;
        let mut compress = Stage::spawn(
            gzip_compress(),
            StageInput::FromStage(filtered),
            self.output.stage_output()?,
        )?;
        self.state = PipelineState::Built;

        // The parent holds no pipe ends here: each intermediate descriptor
        // moved into the next child at spawn time and our copy was closed,
        // so end-of-stream propagates stage to stage unaided.
        self.state = PipelineState::Running;
        self.state = PipelineState::Draining;

        let codes = [
            decompress.wait()?,
            filter_stage.wait()?,
            compress.wait()?,
        ];
        self.state = PipelineState::Joined;
        if codes.iter().any(|&code| code != 0) {
            debug!(?codes, "stage exited non-zero");
            return Ok(false);
        }
        Ok(true)
    }
}

fn gzip_decompress(input: &Path) -> StageSpec {
    StageSpec::new(
        "gzip",
        ["-cd".to_string(), input.to_string_lossy().into_owned()],
    )
}

fn gzip_compress() -> StageSpec {
    StageSpec::new("gzip", ["-c"])
}

fn missing_pipe(what: &str) -> PipelineError {
    PipelineError::Codec(io::Error::other(format!("{what} was not piped")))
}
