use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tlex::extract::{DEFAULT_MARGIN_SECS, ExtractWindow};
use tlex::scan::metadata::DEFAULT_MAX_METADATA_LINES;
use tlex::timeline::{Timeline, TimelineOptions};

#[derive(Parser)]
#[command(name = "tlex")]
#[command(about = "Time-window extraction for huge JSON event traces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print trace statistics (size, duration, line count, index shape)
    Stats {
        #[command(flatten)]
        trace: TraceArgs,
    },
    /// Extract a time window into a standalone JSON trace
    Extract {
        #[command(flatten)]
        trace: TraceArgs,

        /// Window start in seconds from the beginning of the trace
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Window length in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,

        /// Extra seconds scanned around the window to absorb index sparsity
        #[arg(long, default_value_t = DEFAULT_MARGIN_SECS)]
        margin: f64,
    },
    /// Check the cached index against its structural invariants
    Validate {
        #[command(flatten)]
        trace: TraceArgs,
    },
}

#[derive(Args)]
struct TraceArgs {
    /// Path to the trace file
    trace: PathBuf,

    /// Refresh statistics and index coverage if the trace has grown
    #[arg(long)]
    live: bool,

    /// Discard the cached summary and rebuild it from scratch
    #[arg(long)]
    force: bool,

    /// Approximate bytes between index entries
    #[arg(long)]
    bytes_per_index: Option<u64>,

    /// Approximate seconds between index entries
    #[arg(long)]
    secs_per_index: Option<f64>,

    /// Lines scanned from the head when collecting metadata events
    #[arg(long, default_value_t = DEFAULT_MAX_METADATA_LINES)]
    max_metadata_lines: u64,
}

impl TraceArgs {
    fn options(&self, needed_through_secs: Option<f64>) -> TimelineOptions {
        TimelineOptions {
            force_rebuild: self.force,
            live: self.live,
            bytes_per_index: self.bytes_per_index,
            secs_per_index: self.secs_per_index,
            max_metadata_lines: self.max_metadata_lines,
            needed_through_secs,
            quiet: false,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { trace } => {
            let timeline = Timeline::open(&trace.trace, trace.options(None))?;
            timeline.print_stats();
        }
        Commands::Extract {
            trace,
            start,
            duration,
            margin,
        } => {
            let window = ExtractWindow {
                start_secs: start,
                duration_secs: duration,
                margin_secs: margin,
            };
            let timeline = Timeline::open(&trace.trace, trace.options(Some(window.end_secs())))?;
            println!(
                "Extracting {}s to {}s from {}",
                window.start_secs,
                window.end_secs(),
                timeline.trace_path().display()
            );
            let outcome = timeline.extract(window, false)?;
            println!(
                "Extract complete: {} ({} records)",
                outcome.output_path.display(),
                outcome.matched
            );
        }
        Commands::Validate { trace } => {
            let timeline = Timeline::open(&trace.trace, trace.options(None))?;
            match timeline.validate_index() {
                Ok(()) => println!(
                    "Index is valid ({} entries)",
                    timeline.summary().index.len()
                ),
                Err(violation) => {
                    println!("Index is invalid: {violation}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
