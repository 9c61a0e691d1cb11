//! splicefs CLI
//!
//! Command-line tools for composing, walking and zipping files stored as
//! content-addressed blocks.
//!
//! # Commands
//!
//! - `put` - Store a file with the chunked importer
//! - `add` - Store a file split at the offsets listed in a splits file
//! - `concat` - Concatenate stored files
//! - `make-dir` / `add-to-dir` - Build directories from `name=cid` pairs
//! - `cat` - Write a file's content to stdout
//! - `show-ranges` - List a file's byte ranges
//! - `walk-dir` - List every file below a directory
//! - `stat` - Look up `<cid>/<path>`
//! - `zip-dir` - Build a ZIP archive of a directory without copying content

mod commands;
mod error;

use clap::{Parser, Subcommand, ValueEnum};
use commands::Context;
use error::CliResult;
use splicefs_codec::Cid;
use splicefs_core::{ChecksumMode, Config, ImportOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Compose, walk and zip content-addressed files.
#[derive(Parser)]
#[command(name = "splicefs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the block store directory
    #[arg(global = true, short, long, env = "SPLICEFS_STORE", default_value = ".splicefs")]
    store: PathBuf,

    /// Importer chunk size in bytes
    #[arg(global = true, long, conflicts_with = "chunker")]
    chunk_size: Option<usize>,

    /// Importer chunker, e.g. `size-262144`
    #[arg(global = true, long)]
    chunker: Option<String>,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    Text,
    /// One JSON document per result
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file with the chunked importer
    Put {
        /// File to store
        file: PathBuf,
    },

    /// Store a file split at the offsets in a splits file
    Add {
        /// Content file
        content: PathBuf,

        /// Split offsets: a JSON array, `{"offset": n}` lines, or comma-separated
        splits: PathBuf,
    },

    /// Concatenate files in order
    Concat {
        /// Files to join
        #[arg(required = true)]
        cids: Vec<Cid>,
    },

    /// Create a directory
    MakeDir {
        /// Entries as `name=cid`
        #[arg(value_parser = commands::dir::parse_entry)]
        entries: Vec<(String, Cid)>,
    },

    /// Add entries to a directory, printing the new directory
    AddToDir {
        /// Directory to extend
        dir: Cid,

        /// Entries as `name=cid`
        #[arg(required = true, value_parser = commands::dir::parse_entry)]
        entries: Vec<(String, Cid)>,
    },

    /// Write a file's content to stdout
    Cat {
        /// File to read
        cid: Cid,
    },

    /// List a file's byte ranges
    ShowRanges {
        /// File to inspect
        cid: Cid,

        /// Composite levels to descend
        #[arg(default_value_t = 1)]
        depth: usize,
    },

    /// List every file below a directory
    WalkDir {
        /// Directory to walk
        cid: Cid,

        /// Also list directories
        #[arg(short, long)]
        dirs: bool,

        /// Prefix for every printed path
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Look up `<cid>[/<path>]`
    Stat {
        /// Root identifier followed by an optional path
        path: String,
    },

    /// Build a ZIP archive of a directory
    ZipDir {
        /// Directory to archive
        cid: Cid,

        /// Write zero checksums instead of reading every file
        #[arg(long)]
        no_crc: bool,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", e.kind());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let import = match (&cli.chunker, cli.chunk_size) {
        (Some(chunker), _) => ImportOptions::from_chunker(chunker)?,
        (None, Some(size)) => ImportOptions::default().chunk_size(size),
        (None, None) => ImportOptions::default(),
    };
    import.validate()?;

    let mut ctx = Context {
        store: cli.store,
        config: Config::new().import(import),
        format: cli.format,
    };

    match cli.command {
        Commands::Put { file } => commands::add::put(&ctx, &file),
        Commands::Add { content, splits } => commands::add::run(&ctx, &content, &splits),
        Commands::Concat { cids } => commands::dir::concat(&ctx, &cids),
        Commands::MakeDir { entries } => commands::dir::make(&ctx, entries),
        Commands::AddToDir { dir, entries } => commands::dir::extend(&ctx, &dir, entries),
        Commands::Cat { cid } => commands::read::cat(&ctx, &cid),
        Commands::ShowRanges { cid, depth } => commands::read::show_ranges(&ctx, &cid, depth),
        Commands::WalkDir { cid, dirs, prefix } => commands::walk::run(&ctx, &cid, &prefix, dirs),
        Commands::Stat { path } => commands::walk::stat(&ctx, &path),
        Commands::ZipDir { cid, no_crc } => {
            if no_crc {
                ctx.config = ctx.config.checksum(ChecksumMode::Skip);
            }
            commands::zip::run(&ctx, &cid)
        }
        Commands::Version => {
            println!("splicefs CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("splicefs Core v{}", splicefs_core::VERSION);
            Ok(())
        }
    }
}
