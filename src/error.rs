//! Error taxonomy for pipeline invocations.
//!
//! Fatal errors abort the current invocation and propagate to the caller;
//! nothing is retried or silently swallowed. A non-zero exit status from a
//! spawned stage is *not* an error — it is an expected, measurable outcome
//! and surfaces as `Ok(false)` from the pipeline instead.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A fatal failure of one pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or truncated compressed input, or any I/O failure along the
    /// chain of pipes and files.
    #[error("compressed stream i/o error: {0}")]
    Codec(#[from] std::io::Error),

    /// A line failed to transform. Always fatal: in a whole-file benchmark a
    /// malformed record is a configuration bug, not a condition to mask.
    #[error("transform failed on line {line}: {source}")]
    Transform {
        /// 1-based input line number.
        line: u64,
        #[source]
        source: TransformError,
    },

    /// An external command could not be started at all.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A pump worker panicked. Treated as fatal rather than unwound further.
    #[error("pipeline worker thread panicked")]
    WorkerPanic,
}

/// Why a single record failed to transform.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid JSON record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("projected field `{0}` is absent")]
    MissingField(String),

    #[error("failed to encode projected value: {0}")]
    Encode(#[source] serde_json::Error),
}
