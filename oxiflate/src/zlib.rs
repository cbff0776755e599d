//! One-shot helpers for the zlib format.
//!
//! The zlib format (RFC 1950) wraps raw DEFLATE data with a two-byte header
//! and an Adler-32 checksum of the uncompressed data.
//!
//! # Format
//!
//! ```text
//! +---+---+=========+============+---+---+---+---+
//! |CMF|FLG|[DICTID] | compressed |    ADLER32    |
//! +---+---+=========+============+---+---+---+---+
//! ```
//!
//! - CMF: Compression Method and Flags
//!   - Bits 0-3: CM (Compression Method) - must be 8 for DEFLATE
//!   - Bits 4-7: CINFO (Compression Info) - log2(window size) - 8
//! - FLG: Flags
//!   - Bits 0-4: FCHECK - check bits so (CMF*256 + FLG) mod 31 == 0
//!   - Bit 5: FDICT - a four-byte dictionary id follows
//!   - Bits 6-7: FLEVEL - compression level hint (0-3)
//! - ADLER32: Adler-32 checksum of uncompressed data (big-endian)

use oxiflate_core::error::{OxiflateError, Result, Status};
use oxiflate_core::stream::Stream;
use oxiflate_core::traits::{Compressor, Decompressor, FlushMode};

use crate::deflate::{DEFLATED, DeflateConfig, Deflater};
use crate::inflate::Inflater;

pub use crate::deflate::compress_bound;

/// Maximum useful dictionary size for zlib (32KB).
pub const MAX_DICTIONARY_SIZE: usize = 32768;

/// FDICT flag in the FLG byte.
const FLAG_DICT: u8 = 0x20;

/// Compression level hint carried in the header's FLEVEL bits.
///
/// The hint is informational only; decompression ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ZlibLevel {
    /// Fastest compression.
    Fastest = 0,
    /// Fast compression.
    Fast = 1,
    /// Default compression.
    Default = 2,
    /// Maximum compression.
    Maximum = 3,
}

impl ZlibLevel {
    /// Decode the FLEVEL bits of an FLG byte.
    pub fn from_flags(flg: u8) -> Self {
        match flg >> 6 {
            0 => Self::Fastest,
            1 => Self::Fast,
            2 => Self::Default,
            _ => Self::Maximum,
        }
    }

    /// Human-readable name of the hint.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Fast => "fast",
            Self::Default => "default",
            Self::Maximum => "maximum",
        }
    }
}

/// A decoded zlib stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
    /// Compression method; always 8 (DEFLATE) for a valid header.
    pub method: u8,
    /// Base-two logarithm of the window size (8..=15).
    pub window_bits: u8,
    /// Compression level hint.
    pub level: ZlibLevel,
    /// Adler-32 of the preset dictionary, if one is required.
    pub dictionary_id: Option<u32>,
}

impl ZlibHeader {
    /// Parse the header at the start of `input`, validating it the same way
    /// the decompressor does.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let [cmf, flg, ..] = *input else {
            return Err(OxiflateError::data("incomplete header"));
        };

        if ((u16::from(cmf) << 8) | u16::from(flg)) % 31 != 0 {
            return Err(OxiflateError::data("incorrect header check"));
        }
        if cmf & 0x0f != DEFLATED {
            return Err(OxiflateError::data("unknown compression method"));
        }
        let cinfo = cmf >> 4;
        if cinfo > 7 {
            return Err(OxiflateError::data("invalid window size"));
        }

        let dictionary_id = if flg & FLAG_DICT != 0 {
            let id: [u8; 4] = input
                .get(2..6)
                .and_then(|bytes| bytes.try_into().ok())
                .ok_or(OxiflateError::data("incomplete header"))?;
            Some(u32::from_be_bytes(id))
        } else {
            None
        };

        Ok(Self {
            method: cmf & 0x0f,
            window_bits: cinfo + 8,
            level: ZlibLevel::from_flags(flg),
            dictionary_id,
        })
    }

    /// Window size in bytes.
    pub fn window_size(&self) -> usize {
        1 << self.window_bits
    }

    /// Length of the header including the dictionary id.
    pub fn len(&self) -> usize {
        if self.dictionary_id.is_some() { 6 } else { 2 }
    }

    /// Headers are never empty; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Compress data into a zlib stream at the given level (0-9, clamped).
///
/// # Example
///
/// ```
/// use oxiflate::zlib::{compress, uncompress};
///
/// let data = b"Hello, World! Hello, World!";
/// let compressed = compress(data, 6).unwrap();
/// let decompressed = uncompress(&compressed).unwrap();
/// assert_eq!(decompressed, data);
/// ```
pub fn compress(input: &[u8], level: u8) -> Result<Vec<u8>> {
    compress_with(input, DeflateConfig::new(level))
}

/// Compress data with full control over the stream parameters.
///
/// A raw configuration produces headerless DEFLATE data.
pub fn compress_with(input: &[u8], config: DeflateConfig) -> Result<Vec<u8>> {
    let mut deflater = Deflater::with_config(config)?;
    deflater.compress_all(input)
}

/// Compress data into a zlib stream primed with a preset dictionary.
///
/// The dictionary's Adler-32 is recorded in the header so the decompressor
/// can ask for the same dictionary.
///
/// # Example
///
/// ```
/// use oxiflate::zlib::{compress_with_dictionary, uncompress_with_dictionary};
///
/// let dict = b"common patterns and shared content";
/// let data = b"This text has common patterns that match the dictionary";
/// let compressed = compress_with_dictionary(data, 6, dict).unwrap();
/// let decompressed = uncompress_with_dictionary(&compressed, dict).unwrap();
/// assert_eq!(decompressed, data);
/// ```
pub fn compress_with_dictionary(input: &[u8], level: u8, dictionary: &[u8]) -> Result<Vec<u8>> {
    let mut deflater = Deflater::new(level)?;
    deflater.set_dictionary(dictionary)?;
    deflater.compress_all(input)
}

/// Decompress a complete zlib stream.
///
/// Fails with a data error if the stream is corrupt, truncated or needs a
/// preset dictionary.
pub fn uncompress(input: &[u8]) -> Result<Vec<u8>> {
    Inflater::new().decompress_all(input)
}

/// Decompress a zlib stream that may require a preset dictionary.
///
/// The dictionary is only supplied if the header asks for one; a mismatched
/// dictionary is a data error.
pub fn uncompress_with_dictionary(input: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Inflater::new();
    let mut output = Vec::with_capacity(input.len().saturating_mul(2));
    let mut buffer = vec![0u8; MAX_DICTIONARY_SIZE];
    let mut input_pos = 0;

    loop {
        let (consumed, produced, status) =
            inflater.decompress(&input[input_pos..], &mut buffer, FlushMode::None)?;
        input_pos += consumed;
        output.extend_from_slice(&buffer[..produced]);

        match status {
            Status::StreamEnd => return Ok(output),
            Status::NeedDict(id) => {
                log::debug!("supplying {} byte dictionary for id {:08x}", dictionary.len(), id);
                inflater.set_dictionary(dictionary)?;
            }
            Status::BufError => return Err(OxiflateError::data("unexpected end of stream")),
            Status::Ok => {}
        }
    }
}

/// Decompress a zlib stream into a caller-provided buffer.
///
/// Returns the bytes consumed from `input` and written to `output`. A stream
/// that does not fit is a buffer error; a stream that ends early or needs a
/// dictionary is a data error. An empty `output` only accepts a stream that
/// decodes to nothing.
pub fn uncompress_into(input: &[u8], output: &mut [u8]) -> Result<(usize, usize)> {
    let mut scratch = [0u8; 1];
    let empty = output.is_empty();
    let target: &mut [u8] = if empty { &mut scratch } else { output };

    let mut inflater = Inflater::new();
    let mut strm = Stream::new(input, target);
    loop {
        match inflater.inflate(&mut strm, FlushMode::None)? {
            Status::Ok => {}
            Status::StreamEnd => break,
            Status::NeedDict(_) => return Err(OxiflateError::data("need dictionary")),
            Status::BufError if strm.avail_out() == 0 => return Err(OxiflateError::buf()),
            Status::BufError => return Err(OxiflateError::data("unexpected end of stream")),
        }
    }

    if empty && strm.out_pos() != 0 {
        return Err(OxiflateError::buf());
    }
    let produced = if empty { 0 } else { strm.out_pos() };
    Ok((strm.in_pos(), produced))
}

/// Check whether a zlib stream needs a preset dictionary.
///
/// Returns the dictionary's Adler-32 id, or `None` if the header is invalid
/// or no dictionary is required.
pub fn zlib_requires_dictionary(input: &[u8]) -> Option<u32> {
    ZlibHeader::parse(input).ok()?.dictionary_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::Strategy;
    use oxiflate_core::adler32::Adler32;

    const HELLO: &[u8] = b"hello, hello!\0";
    const HELLO_ZLIB: [u8; 19] = [
        0x78, 0x9c, 0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0xd7, 0x51, 0xc8, 0x00, 0x51, 0x8a, 0x0c, 0x00,
        0x26, 0x06, 0x04, 0x96,
    ];

    #[test]
    fn test_zlib_header() {
        let compressed = compress(b"test", 6).unwrap();

        assert_eq!(compressed[0], 0x78);
        assert_eq!(compressed[1], 0x9c);
        let check = (u16::from(compressed[0]) << 8) | u16::from(compressed[1]);
        assert_eq!(check % 31, 0);
    }

    #[test]
    fn test_zlib_header_level_hints() {
        assert_eq!(compress(b"x", 1).unwrap()[1], 0x01);
        assert_eq!(compress(b"x", 4).unwrap()[1], 0x5e);
        assert_eq!(compress(b"x", 6).unwrap()[1], 0x9c);
        assert_eq!(compress(b"x", 9).unwrap()[1], 0xda);

        let header = ZlibHeader::parse(&compress(b"x", 9).unwrap()).unwrap();
        assert_eq!(header.level, ZlibLevel::Maximum);
        assert_eq!(header.window_size(), 32768);
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_zlib_known_vector() {
        assert_eq!(compress(HELLO, 6).unwrap(), HELLO_ZLIB);
        assert_eq!(uncompress(&HELLO_ZLIB).unwrap(), HELLO);
    }

    #[test]
    fn test_zlib_roundtrip_simple() {
        let data = b"Hello, World!";
        let compressed = compress(data, 6).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_zlib_roundtrip_repeated() {
        let data = b"ABCABCABCABCABCABCABCABCABCABCABCABCABCABCABCABC";
        let compressed = compress(data, 6).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(uncompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_zlib_roundtrip_empty() {
        let compressed = compress(&[], 6).unwrap();
        assert_eq!(compressed, [0x78, 0x9c, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert!(uncompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_zlib_roundtrip_large() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let compressed = compress(&data, 6).unwrap();
        assert!(compressed.len() <= compress_bound(data.len()));
        assert_eq!(uncompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_zlib_levels() {
        let data = b"The quick brown fox jumps over the lazy dog. ".repeat(20);
        for level in 0..=9 {
            let compressed = compress(&data, level).unwrap();
            assert_eq!(uncompress(&compressed).unwrap(), data, "level {}", level);
        }
    }

    #[test]
    fn test_zlib_level_0() {
        let data = b"stored";
        let compressed = compress(data, 0).unwrap();
        // header, stored block header (5), data, trailer
        assert_eq!(compressed.len(), 2 + 5 + data.len() + 4);
        assert_eq!(uncompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_zlib_level_clamped() {
        let data = b"clamp clamp clamp clamp";
        assert_eq!(compress(data, 12).unwrap(), compress(data, 9).unwrap());
    }

    #[test]
    fn test_zlib_strategies() {
        let data = b"aaaaaaaaaabbbbbbbbbbaaaaaaaaaa0123456789".repeat(10);
        for strategy in [
            Strategy::Default,
            Strategy::Filtered,
            Strategy::HuffmanOnly,
            Strategy::Rle,
            Strategy::Fixed,
        ] {
            let config = DeflateConfig::new(6).with_strategy(strategy);
            let compressed = compress_with(&data, config).unwrap();
            assert_eq!(uncompress(&compressed).unwrap(), data, "{:?}", strategy);
        }
    }

    #[test]
    fn test_zlib_checksum_verification() {
        let data = b"Hello, World!";
        let mut compressed = compress(data, 6).unwrap();

        let trailer = compressed.len() - 4;
        assert_eq!(
            u32::from_be_bytes(compressed[trailer..].try_into().unwrap()),
            Adler32::checksum(data)
        );

        let last = compressed.len() - 1;
        compressed[last] ^= 0xff;
        let err = uncompress(&compressed).unwrap_err();
        assert_eq!(err.message(), Some("incorrect data check"));
    }

    #[test]
    fn test_zlib_invalid_header() {
        let err = uncompress(&[0x08, 0x1d, 0x00, 0x00, 0x00, 0x01]).unwrap_err();
        assert_eq!(err.code(), -3);
        assert_eq!(
            ZlibHeader::parse(&[0x78, 0x9d]).unwrap_err().message(),
            Some("incorrect header check")
        );
        assert_eq!(
            ZlibHeader::parse(&[0x77, 0x09]).unwrap_err().message(),
            Some("unknown compression method")
        );
        assert_eq!(
            ZlibHeader::parse(&[0x88, 0x1c]).unwrap_err().message(),
            Some("invalid window size")
        );
    }

    #[test]
    fn test_zlib_too_short() {
        assert!(uncompress(&[0x78]).is_err());
        assert!(ZlibHeader::parse(&[0x78]).is_err());
        assert!(uncompress(&HELLO_ZLIB[..HELLO_ZLIB.len() - 2]).is_err());
    }

    #[test]
    fn test_uncompress_into() {
        let mut output = [0u8; 32];
        let (consumed, produced) = uncompress_into(&HELLO_ZLIB, &mut output).unwrap();
        assert_eq!(consumed, HELLO_ZLIB.len());
        assert_eq!(&output[..produced], HELLO);
    }

    #[test]
    fn test_uncompress_into_trailing_bytes() {
        let mut input = HELLO_ZLIB.to_vec();
        input.extend_from_slice(b"junk");
        let mut output = [0u8; 32];
        let (consumed, produced) = uncompress_into(&input, &mut output).unwrap();
        assert_eq!(consumed, HELLO_ZLIB.len());
        assert_eq!(produced, HELLO.len());
    }

    #[test]
    fn test_uncompress_into_small_output() {
        let mut output = [0u8; 4];
        let err = uncompress_into(&HELLO_ZLIB, &mut output).unwrap_err();
        assert!(matches!(err, OxiflateError::Buf));
    }

    #[test]
    fn test_uncompress_into_truncated() {
        let mut output = [0u8; 32];
        let err = uncompress_into(&HELLO_ZLIB[..10], &mut output).unwrap_err();
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn test_uncompress_into_empty_output() {
        let empty_stream = compress(&[], 6).unwrap();
        assert_eq!(uncompress_into(&empty_stream, &mut []).unwrap(), (8, 0));
        assert!(matches!(
            uncompress_into(&HELLO_ZLIB, &mut []).unwrap_err(),
            OxiflateError::Buf
        ));
    }

    #[test]
    fn test_zlib_dictionary_roundtrip() {
        let dict = b"Hello World";
        let data = b"Hello World Hello World";
        let compressed = compress_with_dictionary(data, 6, dict).unwrap();
        assert_eq!(uncompress_with_dictionary(&compressed, dict).unwrap(), data);
    }

    #[test]
    fn test_zlib_dictionary_header() {
        let dict = b"dictionary";
        let compressed = compress_with_dictionary(b"data", 6, dict).unwrap();

        assert_ne!(compressed[1] & FLAG_DICT, 0);
        let header = ZlibHeader::parse(&compressed).unwrap();
        assert_eq!(header.dictionary_id, Some(Adler32::checksum(dict)));
        assert_eq!(header.len(), 6);
    }

    #[test]
    fn test_zlib_requires_dictionary() {
        let dict = b"some dictionary";
        let with_dict = compress_with_dictionary(b"data", 6, dict).unwrap();
        let without = compress(b"data", 6).unwrap();

        assert_eq!(zlib_requires_dictionary(&with_dict), Some(Adler32::checksum(dict)));
        assert_eq!(zlib_requires_dictionary(&without), None);
        assert_eq!(zlib_requires_dictionary(&[0x78]), None);
    }

    #[test]
    fn test_zlib_dictionary_wrong_dict_error() {
        let compressed = compress_with_dictionary(b"data", 6, b"right").unwrap();
        let err = uncompress_with_dictionary(&compressed, b"wrong").unwrap_err();
        assert_eq!(err.message(), Some("incorrect dictionary"));
    }

    #[test]
    fn test_zlib_dictionary_no_dict_error() {
        let compressed = compress_with_dictionary(b"data", 6, b"dict").unwrap();
        let err = uncompress(&compressed).unwrap_err();
        assert_eq!(err.message(), Some("need dictionary"));

        let mut output = [0u8; 16];
        assert_eq!(uncompress_into(&compressed, &mut output).unwrap_err().code(), -3);
    }

    #[test]
    fn test_zlib_dictionary_better_compression() {
        let dict = b"The quick brown fox jumps over the lazy dog";
        let data = b"The quick brown fox jumps over the lazy cat";

        let plain = compress(data, 9).unwrap();
        let primed = compress_with_dictionary(data, 9, dict).unwrap();
        assert!(primed.len() < plain.len());
    }

    #[test]
    fn test_zlib_dictionary_empty_data() {
        let dict = b"dictionary";
        let compressed = compress_with_dictionary(&[], 6, dict).unwrap();
        assert!(uncompress_with_dictionary(&compressed, dict).unwrap().is_empty());
    }

    #[test]
    fn test_zlib_dictionary_large_dict() {
        let dict: Vec<u8> = (0..40_000u32).map(|i| (i % 97) as u8).collect();
        let data: Vec<u8> = dict[dict.len() - 1000..].to_vec();
        let compressed = compress_with_dictionary(&data, 6, &dict).unwrap();
        assert_eq!(uncompress_with_dictionary(&compressed, &dict).unwrap(), data);
    }

    #[test]
    fn test_uncompress_with_dictionary_without_request() {
        // A stream without FDICT ignores the dictionary.
        assert_eq!(uncompress_with_dictionary(&HELLO_ZLIB, b"unused").unwrap(), HELLO);
    }

    #[test]
    fn test_raw_deflate_roundtrip() {
        let data = b"raw deflate raw deflate raw deflate";
        let compressed = compress_with(data, DeflateConfig::raw(6)).unwrap();
        assert_ne!(compressed[0], 0x78);

        let mut inflater = Inflater::with_window_bits(-15).unwrap();
        assert_eq!(inflater.decompress_all(&compressed).unwrap(), data);
    }
}
