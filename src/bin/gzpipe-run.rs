//! CLI runner: time pipeline strategies over a gzip NDJSON file.
//!
//! Usage:
//!   gzpipe-run events.json.gz
//!   gzpipe-run events.json.gz --strategy piped --field actor --rounds 3
//!   gzpipe-run --list

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;

use gzpipe::{
    FieldProjection, OutputSink, PipedPipeline, Strategy, available_strategies,
    pipeline::DEFAULT_FLUSH_EVERY, stage::StageSpec, strategy::EXTERNAL_FILTER,
};

#[derive(Parser)]
#[command(name = "gzpipe-run", version, about = "Run and time gzip NDJSON pipeline strategies")]
struct Args {
    /// Gzip-compressed newline-delimited JSON input file.
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Strategy to run; defaults to every strategy available on this machine.
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Record field to project.
    #[arg(long, default_value = "actor")]
    field: String,

    /// Write the compressed output here instead of discarding it.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Flush the compressor's stdin after every N lines (piped strategy).
    #[arg(long, default_value_t = DEFAULT_FLUSH_EVERY)]
    flush_every: u64,

    /// Timing rounds per strategy.
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// List the strategies available on this machine and exit.
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gzpipe-run: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let strategies = available_strategies();
    if args.list {
        for strategy in &strategies {
            println!("{}", strategy.name());
        }
        return Ok(());
    }

    let input = args.input.as_deref().context("missing input file")?;
    let projection = FieldProjection::new(&args.field);
    let selected: Vec<Strategy> = match args.strategy {
        Some(strategy) => {
            if !strategies.contains(&strategy) {
                bail!("strategy `{}` needs `{EXTERNAL_FILTER}`, which is not installed", strategy.name());
            }
            vec![strategy]
        }
        None => strategies,
    };
    let output = match &args.output {
        Some(path) => OutputSink::File(path.clone()),
        None => OutputSink::Discard,
    };

    for strategy in selected {
        let mut total = Duration::ZERO;
        for round in 1..=args.rounds {
            let start = Instant::now();
            let ok = run_once(strategy, input, &projection, &output, args.flush_every)
                .with_context(|| format!("strategy `{}` round {round}", strategy.name()))?;
            let elapsed = start.elapsed();
            total += elapsed;
            if !ok {
                bail!("strategy `{}` reported failure (round {round})", strategy.name());
            }
            println!("{:>16}  round {round}: {elapsed:?}", strategy.name());
        }
        println!(
            "{:>16}  mean over {} round(s): {:?}",
            strategy.name(),
            args.rounds,
            total / args.rounds.max(1)
        );
    }
    Ok(())
}

fn run_once(
    strategy: Strategy,
    input: &std::path::Path,
    projection: &FieldProjection,
    output: &OutputSink,
    flush_every: u64,
) -> gzpipe::Result<bool> {
    match strategy {
        Strategy::InProcess => gzpipe::InProcessPipeline::new(projection.clone())
            .with_output(output.clone())
            .run(input),
        Strategy::Piped => PipedPipeline::new(projection.clone())
            .with_output(output.clone())
            .with_flush_every(flush_every)
            .run(input),
        Strategy::PipedExternal => {
            let filter = StageSpec::new(
                EXTERNAL_FILTER,
                ["-c".to_string(), projection.jq_filter()],
            );
            PipedPipeline::new(projection.clone())
                .with_output(output.clone())
                .run_external(input, filter)
        }
    }
}
