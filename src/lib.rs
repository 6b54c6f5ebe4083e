//! # gzpipe
//!
//! A **streaming record-transform pipeline harness**: read a gzip-compressed,
//! newline-delimited JSON record stream, project one field out of every
//! record, and re-emit a gzip-compressed newline-delimited stream — measuring
//! how throughput changes with *where* the work runs and *how* bytes move
//! between stages.
//!
//! ## Strategies
//!
//! - [`InProcessPipeline`] — decompress, decode, project, re-encode, and
//!   re-compress inside one process, line by line. The baseline.
//! - [`PipedPipeline::run`] — decompression and compression as external
//!   `gzip` processes; the harness pumps transformed lines between them on
//!   independently scheduled workers so OS pipe backpressure on one side
//!   never deadlocks the other.
//! - [`PipedPipeline::run_external`] — the transform delegated to an
//!   external `jq` filter, all three stages wired pipe-to-pipe with no
//!   per-line work in the harness at all. Gated at selection time by
//!   [`external_filter_available`].
//!
//! All strategies preserve record order end-to-end and report a single
//! result: `Ok(true)` for a fully successful run, `Ok(false)` when a spawned
//! stage exits non-zero, `Err` for fatal codec/transform/spawn failures. A
//! malformed record is never skipped: a benchmark trial that masked a real
//! failure would corrupt the comparison between strategies.
//!
//! ## Quick start
//!
//! ```no_run
//! use gzpipe::{FieldProjection, InProcessPipeline, PipedPipeline};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = Path::new("events.json.gz");
//!
//! let ok = InProcessPipeline::new(FieldProjection::new("actor")).run(input)?;
//! assert!(ok);
//!
//! let mut piped = PipedPipeline::new(FieldProjection::new("actor"));
//! assert!(piped.run(input)?);
//! # Ok(())
//! # }
//! ```
//!
//! Strategy selection for a benchmark driver goes through
//! [`available_strategies`], which probes once for the optional external
//! filter tool and excludes strategies that cannot run on this machine.

pub mod codec;
pub mod error;
pub mod pipeline;
pub mod stage;
pub mod strategy;
pub mod transform;

pub use error::{PipelineError, Result, TransformError};
pub use pipeline::{
    DEFAULT_FLUSH_EVERY, InProcessPipeline, OutputSink, PipedPipeline, PipelineState,
};
pub use stage::{Stage, StageInput, StageOutput, StageSpec};
pub use strategy::{EXTERNAL_FILTER, Strategy, available_strategies, external_filter_available};
pub use transform::{FieldProjection, RecordTransform};
