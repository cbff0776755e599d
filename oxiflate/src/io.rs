//! [`Read`] and [`Write`] adapters over the streaming engines.
//!
//! Both adapters work in fixed-size chunks, so memory use does not depend on
//! the size of the data passing through them.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use oxiflate::io::{ZlibDecoder, ZlibEncoder};
//!
//! let mut encoder = ZlibEncoder::new(Vec::new(), 6).unwrap();
//! encoder.write_all(b"streamed through the encoder").unwrap();
//! let compressed = encoder.finish().unwrap();
//!
//! let mut decoder = ZlibDecoder::new(&compressed[..]);
//! let mut text = String::new();
//! decoder.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "streamed through the encoder");
//! ```

use std::io::{self, Read, Write};

use oxiflate_core::error::{Result, Status};
use oxiflate_core::stream::Stream;
use oxiflate_core::traits::FlushMode;

use crate::deflate::{DeflateConfig, Deflater};
use crate::inflate::{InflateConfig, Inflater};

/// Size of the intermediate buffers.
const CHUNK: usize = 16 * 1024;

/// Compresses everything written to it into an underlying writer.
///
/// Call [`finish`](Self::finish) to write the end of the stream and get the
/// writer back. Dropping an unfinished encoder finishes the stream on a
/// best-effort basis, ignoring errors.
pub struct ZlibEncoder<W: Write> {
    writer: Option<W>,
    deflater: Deflater,
    buffer: Vec<u8>,
    finished: bool,
}

impl<W: Write> ZlibEncoder<W> {
    /// Create a zlib encoder at `level` (0-9).
    pub fn new(writer: W, level: u8) -> Result<Self> {
        Self::with_config(writer, DeflateConfig::new(level))
    }

    /// Create an encoder from explicit parameters; a raw configuration
    /// writes headerless DEFLATE data.
    pub fn with_config(writer: W, config: DeflateConfig) -> Result<Self> {
        Ok(Self {
            writer: Some(writer),
            deflater: Deflater::with_config(config)?,
            buffer: vec![0u8; CHUNK],
            finished: false,
        })
    }

    /// Prime the stream with a preset dictionary. For a zlib stream this
    /// must happen before anything is written.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        self.deflater.set_dictionary(dictionary)
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> Option<&W> {
        self.writer.as_ref()
    }

    /// Uncompressed bytes accepted so far.
    pub fn total_in(&self) -> u64 {
        self.deflater.total_in()
    }

    /// Compressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.deflater.total_out()
    }

    /// Write the end of the stream and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.run(&[], FlushMode::Finish)?;
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("encoder already finished"))?;
        writer.flush()?;
        Ok(writer)
    }

    /// Feed `input` to the engine with `flush`, writing every full chunk of
    /// output. Returns the bytes consumed.
    fn run(&mut self, input: &[u8], flush: FlushMode) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }

        let mut consumed = 0;
        loop {
            let mut strm = Stream::new(&input[consumed..], &mut self.buffer);
            let status = self.deflater.deflate(&mut strm, flush)?;
            consumed += strm.in_pos();
            let produced = strm.out_pos();

            if let Some(writer) = self.writer.as_mut() {
                writer.write_all(&self.buffer[..produced])?;
            }

            match status {
                Status::StreamEnd => {
                    self.finished = true;
                    break;
                }
                Status::BufError => break,
                _ if produced < self.buffer.len() && consumed == input.len() => break,
                _ => {}
            }
        }
        Ok(consumed)
    }
}

impl<W: Write> Write for ZlibEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.finished {
            return Err(io::Error::other("write after end of stream"));
        }
        self.run(buf, FlushMode::None)
    }

    /// Complete all pending output with a sync flush, so everything written
    /// so far can be decoded.
    fn flush(&mut self) -> io::Result<()> {
        self.run(&[], FlushMode::Sync)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for ZlibEncoder<W> {
    fn drop(&mut self) {
        if self.writer.is_some() && !self.finished {
            let _ = self.run(&[], FlushMode::Finish);
        }
    }
}

/// Decompresses a zlib (or raw DEFLATE) stream read from an underlying
/// reader.
///
/// Reading stops at the end of the compressed stream; bytes after it are
/// left buffered and not returned.
pub struct ZlibDecoder<R: Read> {
    reader: R,
    inflater: Inflater,
    input: Vec<u8>,
    input_pos: usize,
    input_cap: usize,
    dictionary: Option<Vec<u8>>,
    eof: bool,
    done: bool,
}

impl<R: Read> ZlibDecoder<R> {
    /// Create a decoder for a zlib stream.
    pub fn new(reader: R) -> Self {
        Self::from_inflater(reader, Inflater::new())
    }

    /// Create a decoder from explicit parameters.
    pub fn with_config(reader: R, config: InflateConfig) -> Result<Self> {
        Ok(Self::from_inflater(reader, Inflater::with_config(config)?))
    }

    /// Create a decoder that supplies `dictionary` when the stream asks
    /// for one. For a raw stream the dictionary is installed up front.
    pub fn with_dictionary(reader: R, config: InflateConfig, dictionary: &[u8]) -> Result<Self> {
        let mut decoder = Self::with_config(reader, config)?;
        if config.window_bits < 0 {
            decoder.inflater.set_dictionary(dictionary)?;
        } else {
            decoder.dictionary = Some(dictionary.to_vec());
        }
        Ok(decoder)
    }

    fn from_inflater(reader: R, inflater: Inflater) -> Self {
        Self {
            reader,
            inflater,
            input: vec![0u8; CHUNK],
            input_pos: 0,
            input_cap: 0,
            dictionary: None,
            eof: false,
            done: false,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.inflater.total_in()
    }

    /// Decompressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.inflater.total_out()
    }

    /// Adler-32 of the data produced so far (zlib streams only).
    pub fn adler(&self) -> u32 {
        self.inflater.adler()
    }

    /// True once the end of the compressed stream has been reached.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Return the underlying reader. Input read ahead of the end of the
    /// stream is lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.input_pos == self.input_cap && !self.eof {
            self.input_cap = self.reader.read(&mut self.input)?;
            self.input_pos = 0;
            if self.input_cap == 0 {
                self.eof = true;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for ZlibDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.done {
            return Ok(0);
        }

        loop {
            self.fill()?;
            let mut strm = Stream::new(&self.input[self.input_pos..self.input_cap], buf);
            let status = self.inflater.inflate(&mut strm, FlushMode::None)?;
            self.input_pos += strm.in_pos();
            let produced = strm.out_pos();

            match status {
                Status::StreamEnd => {
                    self.done = true;
                    return Ok(produced);
                }
                Status::NeedDict(id) => {
                    let Some(dictionary) = self.dictionary.as_deref() else {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("stream needs a preset dictionary (id {:08x})", id),
                        ));
                    };
                    self.inflater.set_dictionary(dictionary)?;
                }
                Status::Ok | Status::BufError => {
                    if produced > 0 {
                        return Ok(produced);
                    }
                    if self.eof {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "compressed stream ended early",
                        ));
                    }
                }
            }
        }
    }
}
