use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use twofish_harness::cli::{start_process, RunOptions};
use twofish_harness::pipeline::{Action, ChunkLayout, DEFAULT_CHUNK_BLOCKS};

/// Version info from build.rs
const VERSION: &str = env!("HARNESS_VERSION");
const BUILD: &str = env!("HARNESS_BUILD");
const PROFILE: &str = env!("HARNESS_PROFILE");
const GIT_HASH: &str = env!("HARNESS_GIT_HASH");

/// Exit status for an unrecognized action (-1 as seen by the shell)
const INVALID_ACTION_EXIT: u8 = 255;

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "twofish-harness")]
#[command(about = "Encrypt or decrypt a file in fixed-size chunks and record timings", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Action to perform: encrypt or decrypt
    #[arg(default_value = "encrypt")]
    action: String,

    /// Key file; its length picks the key size
    #[arg(default_value = "default.key")]
    key_file: PathBuf,

    /// File to transform
    #[arg(default_value = "input.txt")]
    input_file: PathBuf,

    /// Destination of the transformed data
    #[arg(default_value = "output.txt")]
    output_file: PathBuf,

    /// CSV timing report
    #[arg(default_value = "report.csv")]
    report_file: PathBuf,

    /// Run log
    #[arg(default_value = "recent.log")]
    log_file: PathBuf,

    /// Blocks (of 32 bytes) per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_BLOCKS)]
    chunk_blocks: usize,

    /// Also write a JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("twofish-harness {}", get_version());
        return ExitCode::SUCCESS;
    }

    // Reject unknown actions before any file is touched
    if let Err(e) = cli.action.parse::<Action>() {
        println!("{}", e);
        return ExitCode::from(INVALID_ACTION_EXIT);
    }

    init_tracing();

    let layout = match ChunkLayout::new(cli.chunk_blocks) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        action: cli.action,
        key: cli.key_file,
        input: cli.input_file,
        output: cli.output_file,
        report: cli.report_file,
        log: cli.log_file,
        layout,
        summary: cli.summary,
    };

    match start_process(&options) {
        Ok(outcome) if outcome.is_success() => {
            println!("Success...");
            ExitCode::SUCCESS
        }
        // An aborted run is reported, not treated as a process failure
        Ok(_) => {
            println!("Failure...");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            println!("Failure...");
            ExitCode::FAILURE
        }
    }
}
