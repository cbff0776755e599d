//! Core traits and parameter types shared by the codec engines.

use crate::error::{OxiflateError, Result, Status};

/// Size of the scratch buffer used by the `*_all` driver loops.
const CHUNK: usize = 32768;

/// Flush mode for a single engine call.
///
/// The discriminants are the zlib flush values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub enum FlushMode {
    /// Buffer data for best compression.
    #[default]
    None = 0,
    /// Emit all pending output and an empty fixed block.
    Partial = 1,
    /// Emit all pending output and an empty stored block (`00 00 FF FF`).
    Sync = 2,
    /// Like `Sync`, and forget the history so decoding can restart here.
    Full = 3,
    /// Complete the stream.
    Finish = 4,
    /// Stop at the next block boundary.
    Block = 5,
    /// Decoder only: also stop after each block header.
    Trees = 6,
}

impl FlushMode {
    /// Ordering used to decide whether a repeated flush request without new
    /// input can make progress. `Block` ranks between `None` and `Partial`.
    pub fn rank(self) -> i32 {
        let value = self as i32;
        value * 2 - if value > 4 { 9 } else { 0 }
    }
}

/// Compression level (0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// No compression (stored blocks only).
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(6);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a custom compression level, clamped to 0-9.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// Parse a zlib-style level: `-1` selects the default, `0..=9` are taken
    /// as is, anything else is a stream error.
    pub fn from_zlib(level: i32) -> Result<Self> {
        match level {
            -1 => Ok(Self::DEFAULT),
            0..=9 => Ok(Self(level as u8)),
            _ => Err(OxiflateError::stream("invalid compression level")),
        }
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

/// A streaming decompressor.
pub trait Decompressor {
    /// Decompress from `input` into `output`.
    ///
    /// Returns (bytes consumed from input, bytes written to output, status).
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, Status)>;

    /// Reset the decompressor to its initial state.
    fn reset(&mut self);

    /// Check if the end of the stream has been reached.
    fn is_finished(&self) -> bool;

    /// Decompress a complete stream held in memory.
    ///
    /// A stream that needs a preset dictionary or ends early is a data error.
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; CHUNK];

        loop {
            let (consumed, produced, status) =
                self.decompress(&input[input_pos..], &mut buffer, FlushMode::None)?;
            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                Status::StreamEnd => return Ok(output),
                Status::NeedDict(_) => return Err(OxiflateError::data("need dictionary")),
                Status::BufError => return Err(OxiflateError::data("unexpected end of stream")),
                Status::Ok => continue,
            }
        }
    }
}

/// A streaming compressor.
pub trait Compressor {
    /// Compress from `input` into `output`.
    ///
    /// Returns (bytes consumed from input, bytes written to output, status).
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, Status)>;

    /// Reset the compressor to its initial state.
    fn reset(&mut self);

    /// Check if the stream has been completely written.
    fn is_finished(&self) -> bool;

    /// Compress all data at once and finish the stream.
    fn compress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; CHUNK];

        loop {
            let (consumed, produced, status) =
                self.compress(&input[input_pos..], &mut buffer, FlushMode::Finish)?;
            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                Status::StreamEnd => return Ok(output),
                Status::Ok => continue,
                Status::BufError | Status::NeedDict(_) => return Err(OxiflateError::buf()),
            }
        }
    }
}
