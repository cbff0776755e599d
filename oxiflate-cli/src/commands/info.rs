//! Info command implementation.

use oxiflate::ZlibHeader;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header fields of a zlib file.
#[derive(Debug, Serialize)]
pub struct HeaderInfo {
    pub file: String,
    pub size: u64,
    pub method: u8,
    pub window_bits: u8,
    pub window_size: usize,
    pub level: &'static str,
    pub dictionary_id: Option<String>,
}

/// Read and decode the header at the start of `input`.
pub fn read_header(input: &Path) -> Result<HeaderInfo, Box<dyn std::error::Error>> {
    let mut file = File::open(input)?;
    let size = file.metadata()?.len();

    let mut head = Vec::with_capacity(6);
    file.by_ref().take(6).read_to_end(&mut head)?;
    let header = ZlibHeader::parse(&head)?;

    Ok(HeaderInfo {
        file: input.display().to_string(),
        size,
        method: header.method,
        window_bits: header.window_bits,
        window_size: header.window_size(),
        level: header.level.name(),
        dictionary_id: header.dictionary_id.map(|id| format!("{:08x}", id)),
    })
}

pub fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let info = read_header(input)?;

    if json {
        println!("{}", serde_json::to_string(&info)?);
        return Ok(());
    }

    println!("zlib Stream Information");
    println!("=======================");
    println!("File: {}", info.file);
    println!("Size: {} bytes", info.size);
    println!("Method: {} (deflate)", info.method);
    println!("Window: {} bytes ({} bits)", info.window_size, info.window_bits);
    println!("Level hint: {}", info.level);
    match &info.dictionary_id {
        Some(id) => println!("Preset dictionary: required (Adler-32 {})", id),
        None => println!("Preset dictionary: none"),
    }

    Ok(())
}
