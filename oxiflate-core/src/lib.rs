//! # OxiFlate Core
//!
//! Core components for the OxiFlate zlib codec.
//!
//! This crate provides the building blocks shared by the compression and
//! decompression engines:
//!
//! - [`stream`]: Input/output buffer cursors passed to every engine call
//! - [`bitstream`]: Resumable bit reader and pending-buffer bit writer
//! - [`ringbuffer`]: Circular history window for decompression
//! - [`adler32`]: Adler-32 checksum
//! - [`traits`]: Flush modes, compression levels and streaming traits
//! - [`error`]: Status codes and error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tools                                               │
//! │     oxiflate CLI, io::Read / io::Write adapters         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Deflater (LZ77 + Huffman), Inflater (state machine) │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     Stream, BitReader/BitWriter, SlidingWindow, Adler32 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxiflate_core::adler32::Adler32;
//! use oxiflate_core::Stream;
//!
//! let mut out = [0u8; 8];
//! let mut stream = Stream::new(b"Hello", &mut out);
//! let copied = stream.copy_through(5);
//! assert_eq!(copied, 5);
//! assert_eq!(Adler32::checksum(stream.written()), 0x058C01F5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adler32;
pub mod bitstream;
pub mod error;
pub mod ringbuffer;
pub mod stream;
pub mod traits;

// Re-exports for convenience
pub use adler32::{Adler32, adler32, adler32_combine};
pub use bitstream::{BitReader, BitWriter};
pub use error::{OxiflateError, Result, Status};
pub use ringbuffer::SlidingWindow;
pub use stream::Stream;
pub use traits::{CompressionLevel, Compressor, Decompressor, FlushMode};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{OxiflateError, Result, Status};
    pub use crate::stream::Stream;
    pub use crate::traits::{CompressionLevel, Compressor, Decompressor, FlushMode};
}
