//! Compress command implementation.

use crate::utils::{CHUNK, compressed_name, create_output, create_progress_bar, read_dictionary, space_savings};
use filetime::FileTime;
use oxiflate::{DeflateConfig, Strategy, ZlibEncoder};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Encoder parameters and output handling for `compress`.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub level: u8,
    pub strategy: Strategy,
    pub window_bits: u8,
    pub mem_level: u8,
    pub raw: bool,
    pub dict: Option<PathBuf>,
    pub force: bool,
    pub progress: bool,
}

impl CompressOptions {
    fn config(&self) -> DeflateConfig {
        let bits = i32::from(self.window_bits);
        let config = if self.raw {
            DeflateConfig::raw(self.level).with_window_bits(-bits)
        } else {
            DeflateConfig::new(self.level).with_window_bits(bits)
        };
        config
            .with_mem_level(self.mem_level)
            .with_strategy(self.strategy)
    }
}

pub fn cmd_compress(
    input: &Path,
    output: Option<&Path>,
    options: &CompressOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| compressed_name(input), Path::to_path_buf);
    let dict = read_dictionary(options.dict.as_deref())?;

    let mut source = File::open(input)?;
    let metadata = source.metadata()?;
    let config = options.config();
    log::debug!("compressing {} with {:?}", input.display(), config);

    let writer = BufWriter::new(create_output(&output, options.force)?);
    let mut encoder = ZlibEncoder::with_config(writer, config)?;
    if let Some(dict) = &dict {
        encoder.set_dictionary(dict)?;
    }

    let pb = create_progress_bar(metadata.len(), options.progress);
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }

    let total_in = encoder.total_in();
    let mut writer = encoder.finish()?;
    writer.flush()?;
    drop(writer);
    pb.finish_and_clear();

    filetime::set_file_mtime(&output, FileTime::from_last_modification_time(&metadata))?;

    let compressed = std::fs::metadata(&output)?.len();
    println!(
        "{} -> {} ({} -> {} bytes, {:.1}% saved)",
        input.display(),
        output.display(),
        total_in,
        compressed,
        space_savings(total_in, compressed)
    );

    Ok(())
}
