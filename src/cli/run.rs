use crate::cli::summary::{write_summary, RunSummary};
use crate::error::Result;
use crate::fileio::{create_file, open_file};
use crate::instrument::Instrumentation;
use crate::key::load_key;
use crate::pipeline::{
    Action, BlockTransform, ChunkBuffer, ChunkLayout, RunContext, RunTotals, StreamProcessor,
    StreamStatus, TwofishTransform,
};
use crate::tier::KeyTier;
use std::path::PathBuf;
use tracing::{info, warn};

/// Everything a run needs to know, defaults matching the bare command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// "encrypt" selects encryption; any other value decrypts
    pub action: String,
    pub key: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: PathBuf,
    pub log: PathBuf,
    pub layout: ChunkLayout,
    /// Optional JSON summary written after the run finalizes
    pub summary: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            action: "encrypt".into(),
            key: "default.key".into(),
            input: "input.txt".into(),
            output: "output.txt".into(),
            report: "report.csv".into(),
            log: "recent.log".into(),
            layout: ChunkLayout::default(),
            summary: None,
        }
    }
}

/// Result of a finished run
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub action: Action,
    pub tier: KeyTier,
    pub status: StreamStatus,
    pub totals: RunTotals,
    pub chunk_capacity: usize,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Run the harness with the Twofish primitive
pub fn start_process(options: &RunOptions) -> Result<RunOutcome> {
    start_process_with(options, TwofishTransform)
}

/// Run the harness with any block transform.
///
/// Files are acquired in order input, output, report, log, and each failure
/// is reported with the role of the file that could not be opened. Every
/// handle is released on every exit path once acquired.
pub fn start_process_with<T: BlockTransform>(
    options: &RunOptions,
    transform: T,
) -> Result<RunOutcome> {
    let mut input = open_file("input", &options.input)?;
    let mut output = create_file("output", &options.output)?;
    let sinks = Instrumentation::open(&options.report, &options.log)?;

    let action = Action::select(&options.action);
    info!(%action, input = %options.input.display(), "run started");

    let mut ctx = RunContext::new(sinks, ChunkBuffer::new(options.layout));
    write_banners(&mut ctx.sinks, options)?;

    let (key, tier) = match load_key(&options.key, &mut ctx.sinks) {
        Ok(loaded) => loaded,
        Err(e) => {
            ctx.sinks.log(format_args!("Process failed: {}", e))?;
            return Err(e);
        }
    };

    let processor = StreamProcessor::new(transform);
    let status =
        match processor.process(&mut ctx, action, &key, tier, &mut input, &mut output) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "stream failed");
                ctx.sinks.log(format_args!("Process failed: {}", e))?;
                return Err(e);
            }
        };

    match status {
        StreamStatus::Success => ctx.sinks.console_and_log(format_args!(
            "total duration: {:.9} s",
            ctx.totals.elapsed_seconds
        ))?,
        StreamStatus::Aborted => ctx.sinks.console_and_log("Process aborted.")?,
    }

    let outcome = RunOutcome {
        action,
        tier,
        status,
        totals: ctx.totals,
        chunk_capacity: ctx.chunk.capacity(),
    };

    drop(key);
    let RunContext { sinks, chunk, .. } = ctx;
    drop(chunk);
    drop(input);
    drop(output);
    sinks.close()?;
    info!(status = ?outcome.status, iterations = outcome.totals.iterations, "run finished");

    if let Some(path) = &options.summary {
        write_summary(path, &RunSummary::from_outcome(&outcome))?;
    }

    Ok(outcome)
}

fn write_banners(sinks: &mut Instrumentation, options: &RunOptions) -> Result<()> {
    let executing = format!(
        "Executing action \"{}\" on file {} with key in file {}.",
        options.action,
        options.input.display(),
        options.key.display()
    );
    let result_line = format!("Writing result to file {}.", options.output.display());

    sinks.report(&executing)?;
    sinks.report(&result_line)?;
    sinks.report(format_args!("Writing log to file {}.", options.log.display()))?;
    sinks.report_header()?;

    sinks.log(&executing)?;
    sinks.log(&result_line)?;
    sinks.log(format_args!("Writing report to file {}.", options.report.display()))
}
