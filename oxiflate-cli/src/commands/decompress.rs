//! Decompress command implementation.

use crate::utils::{CHUNK, create_output, create_progress_bar, decompressed_name, read_dictionary};
use filetime::FileTime;
use oxiflate::{InflateConfig, ZlibDecoder};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Open a decoder over `input`, raw or zlib-wrapped, with an optional
/// preset dictionary.
pub(crate) fn open_decoder(
    input: &Path,
    raw: bool,
    dict: Option<&Path>,
) -> Result<ZlibDecoder<BufReader<File>>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(input)?);
    let config = if raw {
        InflateConfig::raw()
    } else {
        InflateConfig::new()
    };
    let decoder = match read_dictionary(dict)? {
        Some(dict) => ZlibDecoder::with_dictionary(reader, config, &dict)?,
        None => ZlibDecoder::with_config(reader, config)?,
    };
    Ok(decoder)
}

pub fn cmd_decompress(
    input: &Path,
    output: Option<&Path>,
    raw: bool,
    dict: Option<&Path>,
    force: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.map_or_else(|| decompressed_name(input), Path::to_path_buf);
    let metadata = std::fs::metadata(input)?;
    let mut decoder = open_decoder(input, raw, dict)?;

    let mut writer = BufWriter::new(create_output(&output, force)?);
    let pb = create_progress_bar(metadata.len(), progress);
    let mut buf = vec![0u8; CHUNK];
    let result = loop {
        match decoder.read(&mut buf) {
            Ok(0) => break Ok(()),
            Ok(n) => {
                if let Err(e) = writer.write_all(&buf[..n]) {
                    break Err(e);
                }
                pb.set_position(decoder.total_in());
            }
            Err(e) => break Err(e),
        }
    };
    pb.finish_and_clear();

    if let Err(e) = result {
        drop(writer);
        // Leave nothing half-written behind.
        let _ = std::fs::remove_file(&output);
        return Err(format!("{}: {}", input.display(), e).into());
    }
    writer.flush()?;
    drop(writer);

    filetime::set_file_mtime(&output, FileTime::from_last_modification_time(&metadata))?;

    if decoder.total_in() < metadata.len() {
        log::warn!(
            "{}: {} trailing bytes after the end of the stream",
            input.display(),
            metadata.len() - decoder.total_in()
        );
    }

    println!(
        "{} -> {} ({} -> {} bytes)",
        input.display(),
        output.display(),
        decoder.total_in(),
        decoder.total_out()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("oxiflate-cli-dec-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_decompress_corrupt_removes_output() {
        let input = scratch("corrupt.zz");
        let mut compressed = oxiflate::compress(&b"corrupted on disk ".repeat(100), 6).unwrap();
        let last = compressed.len() - 1;
        compressed[last] ^= 0xff;
        std::fs::write(&input, &compressed).unwrap();

        let output = scratch("corrupt.out");
        let err = cmd_decompress(&input, Some(&output), false, None, false, false).unwrap_err();
        assert!(err.to_string().contains("incorrect data check"));
        assert!(!output.exists());

        let _ = std::fs::remove_file(input);
    }

    #[test]
    fn test_decompress_with_dictionary() {
        let dict_path = scratch("dict");
        let dict = b"a shared vocabulary of words".to_vec();
        std::fs::write(&dict_path, &dict).unwrap();

        let data = b"words from a shared vocabulary";
        let input = scratch("dict.zz");
        std::fs::write(&input, oxiflate::compress_with_dictionary(data, 6, &dict).unwrap()).unwrap();

        let output = scratch("dict.out");
        assert!(cmd_decompress(&input, Some(&output), false, None, false, false).is_err());
        cmd_decompress(&input, Some(&output), false, Some(&dict_path), false, false).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), data);

        for path in [dict_path, input, output] {
            let _ = std::fs::remove_file(path);
        }
    }
}
