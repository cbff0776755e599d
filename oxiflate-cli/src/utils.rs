//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Suffix appended to compressed files.
pub const SUFFIX: &str = "zz";

/// Size of the chunks streamed between files and the codec.
pub const CHUNK: usize = 64 * 1024;

/// Start `env_logger` at a level chosen by the number of `-v` flags.
/// `RUST_LOG` takes precedence when set.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Create a byte-count progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Default output for `compress`: the input with `.zz` appended.
pub fn compressed_name(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".");
    name.push(SUFFIX);
    PathBuf::from(name)
}

/// Default output for `decompress`: the input with its `.zz` suffix
/// removed, or `.out` appended when there is none.
pub fn decompressed_name(input: &Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == SUFFIX => input.with_extension(""),
        _ => {
            let mut name = OsString::from(input.as_os_str());
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

/// Create `path` for writing, refusing to replace an existing file unless
/// `force` is set.
pub fn create_output(path: &Path, force: bool) -> Result<File, Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    Ok(File::create(path)?)
}

/// Read a preset dictionary file.
pub fn read_dictionary(path: Option<&Path>) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let dict = fs::read(path)?;
            log::info!("loaded {} byte dictionary from {}", dict.len(), path.display());
            Ok(Some(dict))
        }
        None => Ok(None),
    }
}

/// Space saved by compression, in percent.
pub fn space_savings(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        0.0
    } else {
        (1.0 - compressed as f64 / original as f64) * 100.0
    }
}
