//! Warmstart CLI: compile, cache and consume scripts from the command line.
//!
//! Provides `warmstart run` for executing a script, `warmstart cache` for
//! writing a code cache artifact, `warmstart consume` for running a script
//! from a previously written artifact, `warmstart inspect` for reading an
//! artifact header, and `warmstart demo` for a two-context round trip.

#![warn(missing_docs)]

mod cache;
mod demo;
mod inspect;
mod logging;
mod run;
mod session;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Warmstart: cross-context compiled-code cache.
#[derive(Parser, Debug)]
#[command(name = "warmstart", version, about = "Warmstart code cache toolkit")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `warmstart.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and run a script.
    Run {
        /// Script file.
        script: PathBuf,
    },
    /// Compile a script and write its code cache artifact.
    Cache(CacheArgs),
    /// Run a script from a code cache, compiling fresh if it is rejected.
    Consume(ConsumeArgs),
    /// Print the header of a code cache artifact.
    Inspect(InspectArgs),
    /// Produce a cache in one context and consume it in another.
    Demo,
}

/// Arguments for the `warmstart cache` subcommand.
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Script file.
    pub script: PathBuf,

    /// Artifact output path (default: the script path with `.wscc` appended).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `warmstart consume` subcommand.
#[derive(Parser, Debug)]
pub struct ConsumeArgs {
    /// Script file.
    pub script: PathBuf,

    /// Artifact to consume (default: the script path with `.wscc` appended).
    #[arg(short, long)]
    pub artifact: Option<PathBuf>,

    /// Fail instead of compiling fresh when the artifact is rejected.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `warmstart inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Artifact file.
    pub artifact: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Script to validate the artifact against.
    #[arg(long)]
    pub script: Option<PathBuf>,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    logging::init(&global);

    let result = match cli.command {
        Command::Run { ref script } => run::run(script, &global),
        Command::Cache(ref args) => cache::write(args, &global),
        Command::Consume(ref args) => cache::consume(args, &global),
        Command::Inspect(ref args) => inspect::run(args, &global),
        Command::Demo => demo::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
