//! Compression parameters.

use oxiflate_core::error::{OxiflateError, Result};
use oxiflate_core::traits::CompressionLevel;

/// The only compression method defined by RFC 1950.
pub const DEFLATED: u8 = 8;

/// Largest window size exponent.
pub const MAX_WBITS: i32 = 15;

/// Default hash/buffer memory level.
pub const DEF_MEM_LEVEL: u8 = 8;

/// Largest memory level.
pub const MAX_MEM_LEVEL: u8 = 9;

/// Match selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Strategy {
    /// Normal LZ77 with lazy evaluation.
    #[default]
    Default = 0,
    /// Drop short matches, favouring Huffman coding of literals.
    Filtered = 1,
    /// No string matching at all.
    HuffmanOnly = 2,
    /// Only matches at distance one (run-length encoding).
    Rle = 3,
    /// Never emit dynamic Huffman blocks.
    Fixed = 4,
}

impl Strategy {
    /// Parse a zlib strategy value.
    pub fn from_zlib(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::Filtered),
            2 => Ok(Self::HuffmanOnly),
            3 => Ok(Self::Rle),
            4 => Ok(Self::Fixed),
            _ => Err(OxiflateError::stream("invalid strategy")),
        }
    }
}

/// Which block-building loop a level uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeflateFunc {
    Stored,
    Fast,
    Slow,
}

/// Per-level tuning.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Config {
    /// Reduce lazy search above this match length.
    pub(crate) good_length: u16,
    /// Do not perform lazy search above this match length. For the fast
    /// loop this is the longest match whose strings are all hashed.
    pub(crate) max_lazy: u16,
    /// Quit search above this match length.
    pub(crate) nice_length: u16,
    pub(crate) max_chain: u16,
    pub(crate) func: DeflateFunc,
}

const fn config(
    good_length: u16,
    max_lazy: u16,
    nice_length: u16,
    max_chain: u16,
    func: DeflateFunc,
) -> Config {
    Config {
        good_length,
        max_lazy,
        nice_length,
        max_chain,
        func,
    }
}

pub(crate) const CONFIGURATION_TABLE: [Config; 10] = [
    config(0, 0, 0, 0, DeflateFunc::Stored),
    config(4, 4, 8, 4, DeflateFunc::Fast),
    config(4, 5, 16, 8, DeflateFunc::Fast),
    config(4, 6, 32, 32, DeflateFunc::Fast),
    config(4, 4, 16, 16, DeflateFunc::Slow),
    config(8, 16, 32, 32, DeflateFunc::Slow),
    config(8, 16, 128, 128, DeflateFunc::Slow),
    config(8, 32, 128, 256, DeflateFunc::Slow),
    config(32, 128, 258, 1024, DeflateFunc::Slow),
    config(32, 258, 258, 4096, DeflateFunc::Slow),
];

/// Stream parameters for a [`Deflater`](super::Deflater).
///
/// `window_bits` follows the zlib convention: `8..=15` produces a zlib
/// stream with a `2^window_bits` window, `-8..=-15` produces raw DEFLATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateConfig {
    /// Compression level.
    pub level: CompressionLevel,
    /// Compression method; must be [`DEFLATED`].
    pub method: u8,
    /// Window size exponent, negative for raw DEFLATE.
    pub window_bits: i32,
    /// Memory used for the hash table and symbol buffer (1-9).
    pub mem_level: u8,
    /// Match selection strategy.
    pub strategy: Strategy,
}

impl DeflateConfig {
    /// zlib defaults at the given level.
    pub fn new(level: impl Into<CompressionLevel>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Raw DEFLATE with a 32 KiB window at the given level.
    pub fn raw(level: impl Into<CompressionLevel>) -> Self {
        Self {
            window_bits: -MAX_WBITS,
            ..Self::new(level)
        }
    }

    /// Set the window size exponent.
    pub fn with_window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Set the memory level.
    pub fn with_mem_level(mut self, mem_level: u8) -> Self {
        self.mem_level = mem_level;
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check the parameters and resolve them into `(wrap, w_bits)`, where
    /// `wrap` is 1 for the zlib wrapper and 0 for raw DEFLATE.
    pub(crate) fn resolve(&self) -> Result<(i8, u32)> {
        if self.method != DEFLATED {
            return Err(OxiflateError::stream("unsupported compression method"));
        }
        if !(1..=MAX_MEM_LEVEL).contains(&self.mem_level) {
            return Err(OxiflateError::stream("invalid memory level"));
        }
        let (wrap, bits) = match self.window_bits {
            -15..=-9 => (0, -self.window_bits),
            // 8 is only accepted with the zlib wrapper, upgraded to 9.
            8 => (1, 9),
            9..=15 => (1, self.window_bits),
            _ => return Err(OxiflateError::stream("invalid window size")),
        };
        Ok((wrap, bits as u32))
    }
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::DEFAULT,
            method: DEFLATED,
            window_bits: MAX_WBITS,
            mem_level: DEF_MEM_LEVEL,
            strategy: Strategy::Default,
        }
    }
}
