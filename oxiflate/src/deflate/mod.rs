//! DEFLATE compression.
//!
//! [`Deflater`] is a resumable compressor in the shape of zlib's `deflate`.
//! Each call consumes what it can of the input, produces what fits in the
//! output, and keeps every bit of progress in the engine, so a stream can be
//! driven with buffers of any size, down to one byte at a time.
//!
//! Levels map to one of three block-building loops:
//! - **stored** (level 0): raw bytes in stored blocks
//! - **fast** (levels 1-3): greedy matching
//! - **slow** (levels 4-9): lazy matching
//!
//! The `HuffmanOnly` and `Rle` strategies replace the loop regardless of
//! level. Output is wrapped in the zlib format (RFC 1950) unless the stream
//! was configured for raw DEFLATE.

mod algorithm;
pub mod config;
pub(crate) mod trees;

use oxiflate_core::adler32::adler32;
use oxiflate_core::bitstream::BitWriter;
use oxiflate_core::error::{OxiflateError, Result, Status};
use oxiflate_core::stream::Stream;
use oxiflate_core::traits::{CompressionLevel, Compressor, FlushMode};

use crate::lz77::{Lz77Window, MatchLimits};
use crate::tables::MIN_MATCH;

pub use config::{DEFLATED, DeflateConfig, Strategy};
use config::{CONFIGURATION_TABLE, DeflateFunc};

/// zlib header flag: a preset dictionary id follows the header.
pub(crate) const PRESET_DICT: u16 = 0x20;

/// Best guess at the kind of data being compressed, made on the first block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Contains bytes that rarely appear in text.
    Binary = 0,
    /// Looks like ASCII or UTF-8 text.
    Text = 1,
    /// No block has been compressed yet.
    #[default]
    Unknown = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeflateStatus {
    /// Header not yet written.
    Init,
    Busy,
    /// A `Finish` flush has been requested.
    Finish,
}

/// Outcome of one run of a block-building loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockState {
    /// Need more input or more output space.
    NeedMore,
    /// Flush request handled: block closed.
    BlockDone,
    /// Last block started, output full.
    FinishStarted,
    /// Last block written.
    FinishDone,
}

/// Flush request of the previous call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastFlush {
    /// No call has been made since the last reset.
    Never,
    /// The output filled up; the next call must not report a buffer error.
    OutputFull,
    Mode(FlushMode),
}

impl LastFlush {
    fn rank(self) -> i32 {
        match self {
            LastFlush::Never => -4,
            LastFlush::OutputFull => -2,
            LastFlush::Mode(flush) => flush.rank(),
        }
    }
}

/// Streaming DEFLATE compressor.
///
/// # Example
///
/// ```rust
/// use oxiflate::Deflater;
/// use oxiflate_core::{FlushMode, Status, Stream};
///
/// let mut deflater = Deflater::new(6).unwrap();
/// let mut out = [0u8; 64];
/// let mut stream = Stream::new(b"hello, hello!\0", &mut out);
/// let status = deflater.deflate(&mut stream, FlushMode::Finish).unwrap();
/// assert_eq!(status, Status::StreamEnd);
/// assert_eq!(&stream.written()[..2], &[0x78, 0x9C]);
/// ```
#[derive(Debug, Clone)]
pub struct Deflater {
    status: DeflateStatus,
    /// 1 for the zlib wrapper, 0 for raw; negated once the trailer is out.
    wrap: i8,
    config: DeflateConfig,
    level: u8,
    strategy: Strategy,

    pub(crate) window: Lz77Window,
    pub(crate) block: trees::BlockBuilder,
    pub(crate) bits: BitWriter,
    pending_buf_size: usize,

    /// Length of the best match at the previous step.
    pub(crate) prev_length: usize,
    pub(crate) prev_match: usize,
    pub(crate) match_length: usize,
    /// A literal is pending from the previous step of the lazy loop.
    pub(crate) match_available: bool,

    pub(crate) max_lazy_match: usize,
    pub(crate) good_match: usize,
    pub(crate) nice_match: usize,
    pub(crate) max_chain_length: usize,

    last_flush: LastFlush,
    pub(crate) adler: u32,
    pub(crate) total_in: u64,
    total_out: u64,
    data_type: DataType,
    msg: Option<&'static str>,
}

impl Deflater {
    /// Create a zlib-wrapped compressor at `level` (0-9, clamped) with the
    /// default window, memory level and strategy.
    pub fn new(level: u8) -> Result<Self> {
        Self::with_config(DeflateConfig::new(level))
    }

    /// Create a compressor from explicit parameters.
    pub fn with_config(config: DeflateConfig) -> Result<Self> {
        let (wrap, w_bits) = config.resolve()?;
        let mem_level = u32::from(config.mem_level);
        let lit_bufsize = 1usize << (mem_level + 6);
        let pending_buf_size = lit_bufsize * 4;

        let window = Lz77Window::new(w_bits, mem_level)?;
        let block = trees::BlockBuilder::new(lit_bufsize)?;
        let mut bits = BitWriter::default();
        if !bits.try_reserve(pending_buf_size) {
            return Err(OxiflateError::mem());
        }

        let mut deflater = Self {
            status: DeflateStatus::Init,
            wrap,
            config,
            level: config.level.level(),
            strategy: config.strategy,
            window,
            block,
            bits,
            pending_buf_size,
            prev_length: MIN_MATCH - 1,
            prev_match: 0,
            match_length: MIN_MATCH - 1,
            match_available: false,
            max_lazy_match: 0,
            good_match: 0,
            nice_match: 0,
            max_chain_length: 0,
            last_flush: LastFlush::Never,
            adler: 1,
            total_in: 0,
            total_out: 0,
            data_type: DataType::Unknown,
            msg: None,
        };
        deflater.reset();
        Ok(deflater)
    }

    /// Return to the state right after construction, keeping parameters and
    /// allocations.
    pub fn reset(&mut self) {
        self.reset_keep();
        self.lm_init();
    }

    /// Everything but the match state.
    fn reset_keep(&mut self) {
        self.total_in = 0;
        self.total_out = 0;
        self.msg = None;
        self.data_type = DataType::Unknown;
        self.bits.reset();
        self.wrap = self.wrap.abs();
        self.status = DeflateStatus::Init;
        self.adler = 1;
        self.last_flush = LastFlush::Never;
        self.block.init_block();
    }

    fn lm_init(&mut self) {
        self.window.reset();
        self.apply_level_config();
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;
    }

    fn apply_level_config(&mut self) {
        let table = &CONFIGURATION_TABLE[usize::from(self.level)];
        self.max_lazy_match = usize::from(table.max_lazy);
        self.good_match = usize::from(table.good_length);
        self.nice_match = usize::from(table.nice_length);
        self.max_chain_length = usize::from(table.max_chain);
    }

    pub(crate) fn match_limits(&self) -> MatchLimits {
        MatchLimits {
            max_chain: self.max_chain_length,
            good_match: self.good_match,
            nice_match: self.nice_match,
        }
    }

    /// Compress as much as possible from `strm`'s input into its output.
    ///
    /// Returns `Status::StreamEnd` once a `Finish` flush has completed and
    /// every byte of output has been delivered, `Status::BufError` when no
    /// progress was possible (not fatal), and `Status::Ok` otherwise.
    pub fn deflate(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> Result<Status> {
        if flush == FlushMode::Trees {
            return Err(self.fail(OxiflateError::stream("invalid flush mode")));
        }
        if self.status == DeflateStatus::Finish && flush != FlushMode::Finish {
            return Err(self.fail(OxiflateError::stream("stream already finishing")));
        }
        if strm.avail_out() == 0 {
            return Ok(self.buf_error());
        }

        let old_flush = self.last_flush;
        self.last_flush = LastFlush::Mode(flush);

        // Drain output left over from the previous call first.
        if !self.bits.is_empty() {
            self.flush_pending(strm);
            if strm.avail_out() == 0 {
                // Make sure a repeated flush request after this is not
                // mistaken for one that cannot progress.
                self.last_flush = LastFlush::OutputFull;
                return Ok(Status::Ok);
            }
        } else if strm.avail_in() == 0
            && flush.rank() <= old_flush.rank()
            && flush != FlushMode::Finish
        {
            return Ok(self.buf_error());
        }

        if self.status == DeflateStatus::Finish && strm.avail_in() != 0 {
            return Ok(self.buf_error());
        }

        if self.status == DeflateStatus::Init && self.wrap == 0 {
            self.status = DeflateStatus::Busy;
        }
        if self.status == DeflateStatus::Init {
            self.write_zlib_header();
            self.status = DeflateStatus::Busy;
            self.flush_pending(strm);
            if !self.bits.is_empty() {
                self.last_flush = LastFlush::OutputFull;
                return Ok(Status::Ok);
            }
        }

        if strm.avail_in() != 0
            || self.window.lookahead != 0
            || (flush != FlushMode::None && self.status != DeflateStatus::Finish)
        {
            let bstate = match (self.level, self.strategy) {
                (0, _) => self.deflate_stored(strm, flush),
                (_, Strategy::HuffmanOnly) => self.deflate_huff(strm, flush),
                (_, Strategy::Rle) => self.deflate_rle(strm, flush),
                _ => match CONFIGURATION_TABLE[usize::from(self.level)].func {
                    DeflateFunc::Stored => self.deflate_stored(strm, flush),
                    DeflateFunc::Fast => self.deflate_fast(strm, flush),
                    DeflateFunc::Slow => self.deflate_slow(strm, flush),
                },
            };

            if matches!(bstate, BlockState::FinishStarted | BlockState::FinishDone) {
                self.status = DeflateStatus::Finish;
            }
            match bstate {
                BlockState::NeedMore | BlockState::FinishStarted => {
                    if strm.avail_out() == 0 {
                        self.last_flush = LastFlush::OutputFull;
                    }
                    // A flush that could not complete is retried on the next
                    // call; no buffer error is reported for it.
                    return Ok(Status::Ok);
                }
                BlockState::BlockDone => {
                    self.finish_flush_marker(flush);
                    self.flush_pending(strm);
                    if strm.avail_out() == 0 {
                        self.last_flush = LastFlush::OutputFull;
                        return Ok(Status::Ok);
                    }
                }
                BlockState::FinishDone => {}
            }
        }

        if flush != FlushMode::Finish {
            return Ok(Status::Ok);
        }
        if self.wrap <= 0 {
            return Ok(Status::StreamEnd);
        }

        self.bits.put_short_msb((self.adler >> 16) as u16);
        self.bits.put_short_msb(self.adler as u16);
        self.flush_pending(strm);
        // Write the trailer only once.
        self.wrap = -self.wrap;
        log::debug!(
            "deflate finished: {} bytes in, adler32 {:08x}",
            self.total_in,
            self.adler
        );
        if self.bits.is_empty() {
            Ok(Status::StreamEnd)
        } else {
            Ok(Status::Ok)
        }
    }

    /// Emit what a completed non-finish flush requires after its block.
    fn finish_flush_marker(&mut self, flush: FlushMode) {
        match flush {
            FlushMode::Partial => trees::align(&mut self.bits),
            FlushMode::Block => {}
            _ => {
                // Sync and Full: an empty stored block, `00 00 FF FF`.
                trees::stored_block(&mut self.bits, &[], false);
                if flush == FlushMode::Full {
                    self.window.clear_hash();
                    if self.window.lookahead == 0 {
                        self.window.strstart = 0;
                        self.window.block_start = 0;
                        self.window.insert = 0;
                    }
                    log::trace!("full flush: history forgotten");
                }
            }
        }
    }

    fn write_zlib_header(&mut self) {
        let w_bits = self.window.w_bits as u16;
        let mut header = (u16::from(DEFLATED) + ((w_bits - 8) << 4)) << 8;
        let level_flags: u16 = match (self.strategy, self.level) {
            (Strategy::HuffmanOnly | Strategy::Rle | Strategy::Fixed, _) | (_, 0..=1) => 0,
            (_, 2..=5) => 1,
            (_, 6) => 2,
            _ => 3,
        };
        header |= level_flags << 6;
        if self.window.strstart != 0 {
            header |= PRESET_DICT;
        }
        header += 31 - (header % 31);

        self.bits.put_short_msb(header);
        if self.window.strstart != 0 {
            self.bits.put_short_msb((self.adler >> 16) as u16);
            self.bits.put_short_msb(self.adler as u16);
        }
        self.adler = 1;
    }

    /// Move complete bytes from the bit buffer and copy as much pending
    /// output as fits.
    pub(crate) fn flush_pending(&mut self, strm: &mut Stream<'_>) {
        self.bits.flush_bits();
        let n = self.bits.flush_to(strm);
        self.total_out += n as u64;
    }

    /// Fill the LZ77 window from the input, keeping the checksum and the
    /// input total current.
    pub(crate) fn fill_window(&mut self, strm: &mut Stream<'_>) {
        let adler = if self.wrap == 1 {
            Some(&mut self.adler)
        } else {
            None
        };
        let read = self.window.fill_window(strm, adler);
        self.total_in += read as u64;
    }

    /// Close the current block: everything from `block_start` to `strstart`.
    pub(crate) fn flush_block_only(&mut self, strm: &mut Stream<'_>, last: bool) {
        let window = &self.window;
        let stored_len = (window.strstart as isize - window.block_start) as usize;
        let buf = if window.block_start >= 0 {
            let start = window.block_start as usize;
            Some(&window.window[start..start + stored_len])
        } else {
            None
        };
        self.block.flush_block(
            &mut self.bits,
            buf,
            stored_len,
            last,
            self.level,
            self.strategy,
            &mut self.data_type,
        );
        self.window.block_start = self.window.strstart as isize;
        self.flush_pending(strm);
    }

    /// [`flush_block_only`](Self::flush_block_only), then report whether the
    /// caller has to stop because the output is full.
    pub(crate) fn flush_block(&mut self, strm: &mut Stream<'_>, last: bool) -> Option<BlockState> {
        self.flush_block_only(strm, last);
        if strm.avail_out() == 0 {
            Some(if last {
                BlockState::FinishStarted
            } else {
                BlockState::NeedMore
            })
        } else {
            None
        }
    }

    fn buf_error(&mut self) -> Status {
        self.msg = Some("buffer error");
        Status::BufError
    }

    fn fail(&mut self, err: OxiflateError) -> OxiflateError {
        self.msg = err.message();
        err
    }

    /// Change the level and strategy mid-stream.
    ///
    /// If the block-building loop changes and data has already been
    /// processed, the current block is closed first with a `Block` flush.
    /// `Status::BufError` means that flush did not complete; call again with
    /// more output space.
    pub fn params(
        &mut self,
        strm: &mut Stream<'_>,
        level: CompressionLevel,
        strategy: Strategy,
    ) -> Result<Status> {
        let level = level.level();
        let func = CONFIGURATION_TABLE[usize::from(self.level)].func;
        let new_func = CONFIGURATION_TABLE[usize::from(level)].func;

        if (strategy != self.strategy || func != new_func) && self.last_flush != LastFlush::Never {
            self.deflate(strm, FlushMode::Block)?;
            let unprocessed = (self.window.strstart as isize - self.window.block_start) as usize
                + self.window.lookahead;
            if strm.avail_in() != 0 || unprocessed != 0 {
                return Ok(Status::BufError);
            }
        }

        if self.level != level {
            log::debug!("deflate level {} -> {}", self.level, level);
            self.level = level;
            self.apply_level_config();
        }
        self.strategy = strategy;
        Ok(Status::Ok)
    }

    /// Override the match-finder tuning of the current level.
    pub fn tune(&mut self, good_length: usize, max_lazy: usize, nice_length: usize, max_chain: usize) {
        self.good_match = good_length;
        self.max_lazy_match = max_lazy;
        self.nice_match = nice_length;
        self.max_chain_length = max_chain;
    }

    /// Upper bound on the compressed size of `source_len` bytes with these
    /// parameters, assuming a single `Finish` call.
    pub fn bound(&self, source_len: usize) -> usize {
        let wrap_len = match self.wrap {
            0 => 0,
            _ if self.window.strstart != 0 => 6 + 4,
            _ => 6,
        };
        if self.window.w_bits != 15 || self.window.hash_bits != 15 {
            let complen = source_len + ((source_len + 7) >> 3) + ((source_len + 63) >> 6) + 5;
            return complen + wrap_len;
        }
        compress_bound(source_len) - 6 + wrap_len
    }

    /// Bytes and bits of output that have not been delivered yet.
    pub fn pending(&self) -> (usize, u32) {
        (self.bits.pending_len(), self.bits.bits_valid())
    }

    /// Insert the low `bits` bits of `value` into the output bit stream.
    ///
    /// Used to splice a compressed stream into another. At most 16 bits.
    pub fn prime(&mut self, bits: u32, value: u32) -> Result<()> {
        if bits > 16 {
            return Err(self.fail(OxiflateError::stream("too many bits to prime")));
        }
        self.bits.prime(bits, value);
        Ok(())
    }

    /// Preset the compression dictionary.
    ///
    /// For a zlib stream this must happen before the first call to
    /// [`deflate`](Self::deflate); the dictionary's Adler-32 is recorded in
    /// the header. A raw stream accepts a dictionary at any point between
    /// calls, as long as all input so far has been consumed.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        if (self.wrap == 1 && self.status != DeflateStatus::Init)
            || self.status == DeflateStatus::Finish
            || self.wrap < 0
            || self.window.lookahead != 0
        {
            return Err(self.fail(OxiflateError::stream("dictionary set at the wrong time")));
        }

        if self.wrap == 1 {
            self.adler = adler32(self.adler, dictionary);
        }

        let w_size = self.window.w_size;
        let mut dictionary = dictionary;
        if dictionary.len() >= w_size {
            if self.wrap == 0 {
                self.window.clear_hash();
                self.window.strstart = 0;
                self.window.block_start = 0;
                self.window.insert = 0;
            }
            dictionary = &dictionary[dictionary.len() - w_size..];
        }

        self.window.load_dictionary(dictionary);
        let window = &mut self.window;
        window.strstart += window.lookahead;
        window.block_start = window.strstart as isize;
        window.insert = window.lookahead;
        window.lookahead = 0;
        self.match_length = MIN_MATCH - 1;
        self.prev_length = MIN_MATCH - 1;
        self.match_available = false;
        log::debug!("deflate dictionary set: {} bytes", dictionary.len());
        Ok(())
    }

    /// The current history, at most one window long.
    pub fn get_dictionary(&self) -> Vec<u8> {
        let window = &self.window;
        let end = window.strstart + window.lookahead;
        let len = end.min(window.w_size);
        window.window[end - len..end].to_vec()
    }

    /// Release the engine.
    ///
    /// Returns a data error if the stream was abandoned after compression
    /// started but before it finished.
    pub fn end(self) -> Result<()> {
        if self.status == DeflateStatus::Busy {
            return Err(OxiflateError::data("stream ended before it was finished"));
        }
        Ok(())
    }

    /// Total input bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total output bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Adler-32 of the input consumed so far (zlib streams only).
    pub fn adler(&self) -> u32 {
        self.adler
    }

    /// Binary/text guess made on the first compressed block.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Message of the last error or buffer error.
    pub fn message(&self) -> Option<&'static str> {
        self.msg
    }

    /// Parameters the engine was created with.
    pub fn config(&self) -> &DeflateConfig {
        &self.config
    }

    /// Current level.
    pub fn level(&self) -> CompressionLevel {
        CompressionLevel::new(self.level)
    }

    /// Current strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl Compressor for Deflater {
    fn compress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, Status)> {
        let mut strm = Stream::new(input, output);
        let status = self.deflate(&mut strm, flush)?;
        Ok((strm.in_pos(), strm.out_pos(), status))
    }

    fn reset(&mut self) {
        Deflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.status == DeflateStatus::Finish && self.wrap <= 0 && self.bits.is_empty()
    }
}

/// Upper bound on the zlib-wrapped compressed size of `source_len` bytes at
/// default parameters.
pub fn compress_bound(source_len: usize) -> usize {
    source_len + (source_len >> 12) + (source_len >> 14) + (source_len >> 25) + 13
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deflate_all(deflater: &mut Deflater, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; compress_bound(input.len()) + 64];
        let mut strm = Stream::new(input, &mut out);
        let status = deflater.deflate(&mut strm, FlushMode::Finish).unwrap();
        assert_eq!(status, Status::StreamEnd);
        let n = strm.out_pos();
        out.truncate(n);
        out
    }

    #[test]
    fn test_hello_vector() {
        let mut deflater = Deflater::new(6).unwrap();
        let out = deflate_all(&mut deflater, b"hello, hello!\0");
        assert_eq!(
            out,
            [
                0x78, 0x9C, 0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0xD7, 0x51, 0xC8, 0x00, 0x51, 0x8A,
                0x0C, 0x00, 0x26, 0x06, 0x04, 0x96
            ]
        );
        assert_eq!(deflater.adler(), 0x2606_0496);
        assert_eq!(deflater.total_in(), 14);
        assert_eq!(deflater.total_out(), 19);
        assert_eq!(deflater.data_type(), DataType::Binary);
    }

    #[test]
    fn test_empty_input() {
        let mut deflater = Deflater::new(6).unwrap();
        let out = deflate_all(&mut deflater, b"");
        assert_eq!(out, [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_header_level_flags() {
        for (level, header) in [(0u8, 0x7801u16), (1, 0x7801), (2, 0x785E), (6, 0x789C), (9, 0x78DA)] {
            let mut deflater = Deflater::new(level).unwrap();
            let out = deflate_all(&mut deflater, b"abc");
            assert_eq!(u16::from_be_bytes([out[0], out[1]]), header, "level {level}");
        }
    }

    #[test]
    fn test_stored_level_zero() {
        let mut deflater = Deflater::new(0).unwrap();
        let out = deflate_all(&mut deflater, b"abc");
        assert_eq!(&out[2..10], &[0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c']);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut deflater = Deflater::new(6).unwrap();
        let first = deflate_all(&mut deflater, b"data");
        let mut out = [0u8; 16];
        let mut strm = Stream::new(&[], &mut out);
        let status = deflater.deflate(&mut strm, FlushMode::Finish).unwrap();
        assert_eq!(status, Status::StreamEnd);
        assert_eq!(strm.out_pos(), 0);
        assert!(!first.is_empty());
        assert!(Compressor::is_finished(&deflater));
    }

    #[test]
    fn test_zero_output_space_is_buf_error() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 0];
        let mut strm = Stream::new(b"abc", &mut out);
        assert_eq!(
            deflater.deflate(&mut strm, FlushMode::None).unwrap(),
            Status::BufError
        );
        assert_eq!(deflater.message(), Some("buffer error"));
    }

    #[test]
    fn test_repeated_flush_without_input_is_buf_error() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 64];
        let mut strm = Stream::new(b"abc", &mut out);
        assert_eq!(deflater.deflate(&mut strm, FlushMode::Sync).unwrap(), Status::Ok);
        let mut out = [0u8; 64];
        let mut strm = Stream::new(&[], &mut out);
        assert_eq!(
            deflater.deflate(&mut strm, FlushMode::Sync).unwrap(),
            Status::BufError
        );
    }

    #[test]
    fn test_sync_flush_marker() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 64];
        let mut strm = Stream::new(b"abc", &mut out);
        deflater.deflate(&mut strm, FlushMode::Sync).unwrap();
        assert!(strm.written().ends_with(&[0x00, 0x00, 0xFF, 0xFF]));
        assert_eq!(deflater.pending(), (0, 0));
    }

    #[test]
    fn test_trees_flush_rejected() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 16];
        let mut strm = Stream::new(b"abc", &mut out);
        let err = deflater.deflate(&mut strm, FlushMode::Trees).unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn test_none_after_finish_is_stream_error() {
        let mut deflater = Deflater::new(6).unwrap();
        deflate_all(&mut deflater, b"abc");
        let mut out = [0u8; 16];
        let mut strm = Stream::new(&[], &mut out);
        assert!(deflater.deflate(&mut strm, FlushMode::None).is_err());
    }

    #[test]
    fn test_dictionary_header() {
        let mut deflater = Deflater::new(6).unwrap();
        deflater.set_dictionary(b"hello").unwrap();
        let out = deflate_all(&mut deflater, b"hello");
        assert_eq!(u16::from_be_bytes([out[0], out[1]]) & PRESET_DICT, PRESET_DICT);
        assert_eq!(u16::from_be_bytes([out[0], out[1]]) % 31, 0);
        let dict_id = u32::from_be_bytes([out[2], out[3], out[4], out[5]]);
        assert_eq!(dict_id, adler32(1, b"hello"));
        assert_eq!(deflater.get_dictionary(), b"hellohello");
    }

    #[test]
    fn test_dictionary_after_start_rejected() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 64];
        let mut strm = Stream::new(b"abc", &mut out);
        deflater.deflate(&mut strm, FlushMode::None).unwrap();
        assert!(deflater.set_dictionary(b"xyz").is_err());
    }

    #[test]
    fn test_end_mid_stream_is_data_error() {
        let mut deflater = Deflater::new(6).unwrap();
        let mut out = [0u8; 64];
        let mut strm = Stream::new(b"abc", &mut out);
        deflater.deflate(&mut strm, FlushMode::None).unwrap();
        assert_eq!(deflater.end().unwrap_err().code(), -3);

        let fresh = Deflater::new(6).unwrap();
        assert!(fresh.end().is_ok());
    }

    #[test]
    fn test_bound_covers_output() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        for level in [0u8, 1, 6, 9] {
            let mut deflater = Deflater::new(level).unwrap();
            let bound = deflater.bound(data.len());
            let out = deflate_all(&mut deflater, &data);
            assert!(out.len() <= bound, "level {level}: {} > {bound}", out.len());
        }
        assert_eq!(compress_bound(0), 13);
    }

    #[test]
    fn test_prime_limits() {
        let mut deflater = Deflater::new(6).unwrap();
        assert!(deflater.prime(17, 0).is_err());
        deflater.prime(3, 0b101).unwrap();
        assert_eq!(deflater.pending(), (0, 3));
    }

    #[test]
    fn test_reset_reproduces_output() {
        let mut deflater = Deflater::new(9).unwrap();
        let first = deflate_all(&mut deflater, b"reset me, reset me, reset me");
        deflater.reset();
        let second = deflate_all(&mut deflater, b"reset me, reset me, reset me");
        assert_eq!(first, second);
    }
}
