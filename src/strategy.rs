//! Strategy selection and the external-filter capability probe.
//!
//! The probe is a plain function returning a value consumed at selection
//! time; there is no process-wide cached flag. Callers that want
//! probe-once-decide-once semantics hold on to the returned
//! [`available_strategies`] list.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::Result;
use crate::pipeline::{InProcessPipeline, PipedPipeline};
use crate::stage::StageSpec;
use crate::transform::FieldProjection;

/// The optional external line-filter tool.
pub const EXTERNAL_FILTER: &str = "jq";

/// Probe whether the external filter tool can be executed on this machine.
///
/// Strategies that need it are excluded up front instead of erroring
/// mid-benchmark.
pub fn external_filter_available() -> bool {
    Command::new(EXTERNAL_FILTER)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// One way of running the record-transform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Single process, single control flow.
    InProcess,
    /// External gzip stages with the transform pumped by the harness.
    Piped,
    /// External gzip stages with the transform delegated to `jq`.
    PipedExternal,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::InProcess => "in_process",
            Strategy::Piped => "piped",
            Strategy::PipedExternal => "piped_external",
        }
    }

    /// Run this strategy over `input` with a fresh pipeline and discarded
    /// output: `Ok(true)` is a full successful run, `Ok(false)` a non-zero
    /// stage exit, `Err` a fatal codec/transform/spawn failure.
    pub fn run(&self, input: &Path, projection: &FieldProjection) -> Result<bool> {
        match self {
            Strategy::InProcess => InProcessPipeline::new(projection.clone()).run(input),
            Strategy::Piped => PipedPipeline::new(projection.clone()).run(input),
            Strategy::PipedExternal => {
                let filter = StageSpec::new(
                    EXTERNAL_FILTER,
                    ["-c".to_string(), projection.jq_filter()],
                );
                PipedPipeline::new(projection.clone()).run_external(input, filter)
            }
        }
    }
}

/// All strategies runnable on this machine, probing the external filter once.
pub fn available_strategies() -> Vec<Strategy> {
    let mut out = vec![Strategy::InProcess, Strategy::Piped];
    if external_filter_available() {
        out.push(Strategy::PipedExternal);
    } else {
        debug!(tool = EXTERNAL_FILTER, "external filter not found; strategy disabled");
    }
    out
}
