//! # OxiFlate
//!
//! Pure Rust implementation of the zlib format (RFC 1950) and the DEFLATE
//! compressed data format (RFC 1951).
//!
//! Both engines are resumable state machines: they accept input and output
//! buffers of any size, including a single byte, and pick up exactly where
//! they stopped on the next call.
//!
//! ## Features
//!
//! - **Compression** ([`Deflater`]): hash-chain LZ77 with greedy, lazy, RLE
//!   and Huffman-only strategies, levels 0-9
//!   - Stored, fixed and dynamic Huffman blocks, whichever is smallest
//!   - Flush modes for partial, sync and full flushes
//!   - Preset dictionaries, parameter changes mid-stream
//! - **Decompression** ([`Inflater`]): all DEFLATE block types
//!   - Two-level lookup tables with a fast path for the bulk of the data
//!   - Preset dictionaries, sync point recovery, random access marks
//! - **Helpers**: one-shot [`compress`]/[`uncompress`] and
//!   [`ZlibEncoder`]/[`ZlibDecoder`] adapters for [`std::io`]
//!
//! ## Example
//!
//! ```rust
//! use oxiflate::{compress, uncompress};
//!
//! // Compress data
//! let original = b"Hello, World! Hello, World!";
//! let compressed = compress(original, 6).unwrap();
//!
//! // Decompress data
//! let decompressed = uncompress(&compressed).unwrap();
//! assert_eq!(&decompressed, original);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxiflate::{Deflater, FlushMode, Inflater, Status, Stream};
//!
//! let mut deflater = Deflater::new(6).unwrap();
//! let mut compressed = vec![0u8; 64];
//! let mut strm = Stream::new(b"hello, hello!", &mut compressed);
//! assert_eq!(deflater.deflate(&mut strm, FlushMode::Finish).unwrap(), Status::StreamEnd);
//! let len = strm.out_pos();
//!
//! let mut inflater = Inflater::new();
//! let mut output = vec![0u8; 64];
//! let mut strm = Stream::new(&compressed[..len], &mut output);
//! assert_eq!(inflater.inflate(&mut strm, FlushMode::None).unwrap(), Status::StreamEnd);
//! assert_eq!(strm.written(), b"hello, hello!");
//! ```
//!
//! ## Compression Levels
//!
//! - Level 0: No compression (stored blocks)
//! - Level 1-3: Greedy matching
//! - Level 4-9: Lazy matching with longer chains (default is 6)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod deflate;
pub mod huffman;
pub mod inflate;
pub mod io;
pub(crate) mod lz77;
pub mod tables;
pub mod zlib;

// Re-exports
pub use deflate::{DataType, DeflateConfig, Deflater, Strategy, compress_bound};
pub use huffman::{HuffmanBuilder, HuffmanCode};
pub use inflate::{InflateConfig, Inflater};
pub use io::{ZlibDecoder, ZlibEncoder};
pub use oxiflate_core::{
    Adler32, CompressionLevel, Compressor, Decompressor, FlushMode, OxiflateError, Result,
    Status, Stream, adler32, adler32_combine,
};
pub use zlib::{
    ZlibHeader, ZlibLevel, compress, compress_with, compress_with_dictionary, uncompress,
    uncompress_into, uncompress_with_dictionary, zlib_requires_dictionary,
};
