//! OxiFlate CLI - zlib compression from the command line
//!
//! Compresses, decompresses, verifies and inspects zlib (RFC 1950) and raw
//! DEFLATE (RFC 1951) streams.

mod commands;
mod utils;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use oxiflate::Strategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxiflate")]
#[command(author, version, about = "Pure Rust zlib / DEFLATE compression utility")]
#[command(long_about = "
OxiFlate is a Pure Rust implementation of the zlib and DEFLATE formats.

Examples:
  oxiflate compress notes.txt
  oxiflate compress -l 9 --strategy filtered data.bin -o data.zz
  oxiflate compress --raw --window-bits 12 data.bin
  oxiflate decompress notes.txt.zz
  oxiflate test notes.txt.zz --json
  oxiflate info notes.txt.zz
  oxiflate completions bash
")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a zlib stream
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to <input>.zz)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compression level (0 = store, 9 = best)
        #[arg(short, long, default_value_t = 6, value_parser = clap::value_parser!(u8).range(0..=9))]
        level: u8,

        /// Match selection strategy
        #[arg(long, value_enum, default_value = "default")]
        strategy: StrategyArg,

        /// Base-two logarithm of the window size
        #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u8).range(8..=15))]
        window_bits: u8,

        /// Memory level for the match finder and symbol buffer
        #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=9))]
        mem_level: u8,

        /// Write raw DEFLATE without the zlib header and trailer
        #[arg(long)]
        raw: bool,

        /// Preset dictionary file
        #[arg(long)]
        dict: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decompress a zlib stream
    #[command(alias = "d")]
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Output file (defaults to the input without its .zz suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input is raw DEFLATE without the zlib header and trailer
        #[arg(long)]
        raw: bool,

        /// Preset dictionary file
        #[arg(long)]
        dict: Option<PathBuf>,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Decode a stream and verify its integrity
    #[command(alias = "t")]
    Test {
        /// File to test
        input: PathBuf,

        /// Input is raw DEFLATE without the zlib header and trailer
        #[arg(long)]
        raw: bool,

        /// Preset dictionary file
        #[arg(long)]
        dict: Option<PathBuf>,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Show the zlib header of a file without decompressing it
    #[command(alias = "i")]
    Info {
        /// File to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Match selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum StrategyArg {
    /// Lazy matching for general data
    #[default]
    Default,
    /// Favour literals for filtered numeric data
    Filtered,
    /// Huffman coding only, no string matching
    HuffmanOnly,
    /// Run-length matches only
    Rle,
    /// Fixed Huffman codes only
    Fixed,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Default => Strategy::Default,
            StrategyArg::Filtered => Strategy::Filtered,
            StrategyArg::HuffmanOnly => Strategy::HuffmanOnly,
            StrategyArg::Rle => Strategy::Rle,
            StrategyArg::Fixed => Strategy::Fixed,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            strategy,
            window_bits,
            mem_level,
            raw,
            dict,
            force,
            progress,
        } => {
            let options = commands::CompressOptions {
                level,
                strategy: strategy.into(),
                window_bits,
                mem_level,
                raw,
                dict,
                force,
                progress,
            };
            commands::cmd_compress(&input, output.as_deref(), &options)
        }
        Commands::Decompress {
            input,
            output,
            raw,
            dict,
            force,
            progress,
        } => commands::cmd_decompress(&input, output.as_deref(), raw, dict.as_deref(), force, progress),
        Commands::Test {
            input,
            raw,
            dict,
            json,
        } => commands::cmd_test(&input, raw, dict.as_deref(), json),
        Commands::Info { input, json } => commands::cmd_info(&input, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "oxiflate", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        log::debug!("command failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
