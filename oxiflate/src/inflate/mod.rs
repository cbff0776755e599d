//! Streaming DEFLATE and zlib decompression.
//!
//! [`Inflater`] is a resumable state machine. Each call to
//! [`Inflater::inflate`] runs states until input or output space runs out,
//! the stream ends, or an error is found, and everything needed to pick up
//! again (partial bit buffer, in-flight match length and distance, decoding
//! tables) lives in the `Inflater` itself. Decoding can therefore be
//! suspended at any bit and resumed with the next chunk of input.
//!
//! ```text
//! Head -> [DictId -> Dict] -> Type -> Stored -> CopyStart -> Copy -> Type
//!                               |  -> Table -> LenLens -> CodeLens -> LenStart
//!                               |  -> LenStart (fixed)
//!                               |     LenStart -> Len -> LenExt -> Dist -> DistExt -> Match -> Len
//!                               |                    \-> Lit -> Len
//!                               |                    \-> Type (end of block)
//!                               \-> Check -> Done (after the last block)
//! ```

mod fast;
pub(crate) mod inftrees;

use oxiflate_core::adler32::adler32;
use oxiflate_core::bitstream::BitReader;
use oxiflate_core::error::{OxiflateError, Result, Status};
use oxiflate_core::ringbuffer::SlidingWindow;
use oxiflate_core::stream::Stream;
use oxiflate_core::traits::{Decompressor, FlushMode};

use crate::deflate::DEFLATED;
use crate::deflate::config::MAX_WBITS;
use crate::tables::CODE_LENGTH_ORDER;
use inftrees::{
    Code, CodeType, ENOUGH, FIXED_DISTBITS, FIXED_LENBITS, OP_END_OF_BLOCK, OP_INVALID,
    fixed_tables, inflate_table,
};

/// Expect a zlib header and trailer.
const WRAP_ZLIB: u8 = 1;
/// Validate the Adler-32 trailer.
const WRAP_CHECK: u8 = 4;

/// Zeros for lenient back-references past the start of the history.
const ZEROS: [u8; 258] = [0; 258];

/// Decoder state. Order matters: everything from `Check` on has finished
/// with the compressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Mode {
    /// zlib header.
    Head,
    /// Dictionary id following the header.
    DictId,
    /// Waiting for the caller to supply the dictionary.
    Dict,
    /// Block boundary; honours `Block` and `Trees` flushes.
    Type,
    /// Block header.
    TypeDo,
    /// Stored block lengths.
    Stored,
    CopyStart,
    /// Stored block data.
    Copy,
    /// Dynamic block table sizes.
    Table,
    /// Code-length code lengths.
    LenLens,
    /// Literal/length and distance code lengths.
    CodeLens,
    LenStart,
    /// Literal/length symbol.
    Len,
    LenExt,
    /// Distance symbol.
    Dist,
    DistExt,
    /// Copying a back-reference.
    Match,
    /// Writing a literal.
    Lit,
    /// Adler-32 trailer.
    Check,
    Done,
    Bad,
    Mem,
    /// Between a failed `sync` and a successful one.
    Sync,
}

/// Why the state loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leave {
    /// Out of input or output space, or a flush asked to stop here.
    Suspend,
    StreamEnd,
    NeedDict,
    Bad,
    Mem,
    /// Called while a sync search is unfinished.
    Misuse,
}

/// Outcome of one state step; `Err` leaves the state loop.
type Step = std::result::Result<(), Leave>;

/// A decoding table, either one of the fixed ones or one built for the
/// current block at an offset into the table storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableRef {
    FixedLen,
    FixedDist,
    Dynamic(usize),
}

impl TableRef {
    fn resolve(self, codes: &[Code]) -> &[Code] {
        match self {
            TableRef::FixedLen => &fixed_tables().lencode,
            TableRef::FixedDist => &fixed_tables().distcode,
            TableRef::Dynamic(offset) => &codes[offset..],
        }
    }
}

/// Decompression parameters.
///
/// `window_bits` is `8..=15` for a zlib stream whose window may be at most
/// `2^window_bits` bytes, `0` to accept whatever the zlib header declares, or
/// `-8..=-15` for raw DEFLATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateConfig {
    /// Window size exponent, negative for raw DEFLATE.
    pub window_bits: i32,
}

impl InflateConfig {
    /// zlib stream with a window of up to 32 KiB.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw DEFLATE with a 32 KiB window.
    pub fn raw() -> Self {
        Self {
            window_bits: -MAX_WBITS,
        }
    }

    /// Set the window size exponent.
    pub fn with_window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = window_bits;
        self
    }

    /// Resolve into `(wrap, wbits)`.
    fn resolve(&self) -> Result<(u8, u32)> {
        let (wrap, bits) = if self.window_bits < 0 {
            if self.window_bits < -MAX_WBITS {
                return Err(OxiflateError::stream("invalid window size"));
            }
            (0, -self.window_bits)
        } else {
            (WRAP_ZLIB | WRAP_CHECK, self.window_bits)
        };
        if bits != 0 && !(8..=MAX_WBITS).contains(&bits) {
            return Err(OxiflateError::stream("invalid window size"));
        }
        Ok((wrap, bits as u32))
    }
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            window_bits: MAX_WBITS,
        }
    }
}

/// Streaming zlib / raw DEFLATE decompressor.
///
/// # Example
///
/// ```rust
/// use oxiflate::Inflater;
/// use oxiflate_core::{FlushMode, Status, Stream};
///
/// let compressed = [
///     0x78, 0x9C, 0xCB, 0x48, 0xCD, 0xC9, 0xC9, 0xD7, 0x51, 0xC8, 0x00, 0x51, 0x8A, 0x0C,
///     0x00, 0x26, 0x06, 0x04, 0x96,
/// ];
/// let mut output = [0u8; 64];
/// let mut inflater = Inflater::new();
/// let mut stream = Stream::new(&compressed, &mut output);
/// let status = inflater.inflate(&mut stream, FlushMode::Finish).unwrap();
/// assert_eq!(status, Status::StreamEnd);
/// assert_eq!(stream.written(), b"hello, hello!\0");
/// ```
#[derive(Debug, Clone)]
pub struct Inflater {
    mode: Mode,
    /// Processing the last block.
    last: bool,
    /// `WRAP_*` flags.
    wrap: u8,
    /// A preset dictionary has been loaded.
    havedict: bool,
    /// A zlib header has been read.
    header_seen: bool,
    /// Running Adler-32 of the output, or the dictionary id while waiting
    /// for a dictionary.
    check: u32,
    total_in: u64,
    total_out: u64,
    /// Window size exponent; zero until a zlib header supplies it.
    wbits: u32,
    window: SlidingWindow,
    bits: BitReader,

    /// Literal or match length, or remaining stored bytes.
    length: usize,
    /// Match distance.
    offset: usize,
    /// Extra bits still to read for `length` or `offset`.
    extra: u32,

    lencode: TableRef,
    distcode: TableRef,
    lenbits: u32,
    distbits: u32,

    /// Dynamic block table sizes and progress.
    ncode: usize,
    nlen: usize,
    ndist: usize,
    have: usize,
    lens: [u16; 320],
    work: [u16; 288],
    codes: Vec<Code>,

    /// Reject distances beyond the history.
    sane: bool,
    /// Bits consumed by the current symbol, -1 at a block boundary.
    back: i32,
    /// Initial length of the current match.
    was: usize,
    /// Output position up to which totals and the check value are current.
    out_mark: usize,
    msg: Option<&'static str>,
}

impl Inflater {
    /// Create a decompressor for a zlib stream with a window of up to 32 KiB.
    pub fn new() -> Self {
        Self::build(WRAP_ZLIB | WRAP_CHECK, MAX_WBITS as u32)
    }

    /// Create a decompressor with the given parameters.
    pub fn with_config(config: InflateConfig) -> Result<Self> {
        let (wrap, wbits) = config.resolve()?;
        Ok(Self::build(wrap, wbits))
    }

    /// Create a decompressor with the given window size exponent.
    pub fn with_window_bits(window_bits: i32) -> Result<Self> {
        Self::with_config(InflateConfig::new().with_window_bits(window_bits))
    }

    fn build(wrap: u8, wbits: u32) -> Self {
        let mut inflater = Self {
            mode: Mode::Head,
            last: false,
            wrap,
            havedict: false,
            header_seen: false,
            check: 1,
            total_in: 0,
            total_out: 0,
            wbits,
            window: SlidingWindow::new(),
            bits: BitReader::new(),
            length: 0,
            offset: 0,
            extra: 0,
            lencode: TableRef::Dynamic(0),
            distcode: TableRef::Dynamic(0),
            lenbits: 0,
            distbits: 0,
            ncode: 0,
            nlen: 0,
            ndist: 0,
            have: 0,
            lens: [0; 320],
            work: [0; 288],
            codes: vec![Code::default(); ENOUGH],
            sane: true,
            back: -1,
            was: 0,
            out_mark: 0,
            msg: None,
        };
        inflater.reset();
        inflater
    }

    /// Start a new stream with the same parameters, dropping the history.
    pub fn reset(&mut self) {
        self.window.reset();
        self.total_in = 0;
        self.total_out = 0;
        self.msg = None;
        self.check = 1;
        self.mode = Mode::Head;
        self.last = false;
        self.havedict = false;
        self.header_seen = false;
        self.bits.clear();
        self.lencode = TableRef::Dynamic(0);
        self.distcode = TableRef::Dynamic(0);
        self.sane = true;
        self.back = -1;
    }

    /// Start a new stream with a different window size or wrapping.
    ///
    /// The history buffer is freed if the window size changes.
    pub fn reset_with_window_bits(&mut self, window_bits: i32) -> Result<()> {
        let (wrap, wbits) = InflateConfig::new()
            .with_window_bits(window_bits)
            .resolve()?;
        if self.window.size() != 0 && self.wbits != wbits {
            self.window.release();
        }
        self.wrap = wrap;
        self.wbits = wbits;
        self.reset();
        Ok(())
    }

    /// Decompress as much as possible from `strm`.
    ///
    /// Returns `StreamEnd` once the whole stream including its trailer has
    /// been decoded, `NeedDict` when the stream requires a preset dictionary
    /// (call [`set_dictionary`](Self::set_dictionary) and then call again),
    /// and `BufError` if no progress was possible, or if `Finish` was given
    /// and the stream did not end. Corrupt input is a data error.
    ///
    /// `Block` stops at the next block boundary and `Trees` additionally
    /// stops once a block's header and code tables have been read.
    pub fn inflate(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> Result<Status> {
        if self.mode == Mode::Type {
            self.mode = Mode::TypeDo;
        }
        let in_start = strm.in_pos();
        self.out_mark = strm.out_pos();

        let leave = loop {
            if let Err(leave) = self.step(strm, flush) {
                break leave;
            }
        };

        let out_pos = strm.out_pos();
        let keep_history = self.mode < Mode::Bad
            && (self.mode < Mode::Check || flush != FlushMode::Finish);
        if (self.window.size() != 0 || (out_pos != self.out_mark && keep_history))
            && self
                .window
                .update(self.wbits, &strm.written()[self.out_mark..])
                .is_err()
        {
            self.mode = Mode::Mem;
            return Err(OxiflateError::mem());
        }

        let consumed = strm.in_pos() - in_start;
        let produced = out_pos - self.out_mark;
        self.total_in += consumed as u64;
        self.total_out += produced as u64;
        if self.wrap & WRAP_CHECK != 0 && produced > 0 {
            self.check = adler32(self.check, &strm.written()[self.out_mark..]);
        }
        self.out_mark = out_pos;

        match leave {
            Leave::Suspend => {
                if (consumed == 0 && produced == 0) || flush == FlushMode::Finish {
                    Ok(Status::BufError)
                } else {
                    Ok(Status::Ok)
                }
            }
            Leave::StreamEnd => Ok(Status::StreamEnd),
            Leave::NeedDict => Ok(Status::NeedDict(self.check)),
            Leave::Bad => Err(OxiflateError::data(
                self.msg.unwrap_or("invalid compressed data"),
            )),
            Leave::Mem => Err(OxiflateError::mem()),
            Leave::Misuse => Err(OxiflateError::stream("sync point not found yet")),
        }
    }

    /// Run the current state once.
    fn step(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> Step {
        match self.mode {
            Mode::Head => {
                if self.wrap == 0 {
                    self.mode = Mode::TypeDo;
                    return Ok(());
                }
                need(&mut self.bits, strm, 16)?;
                let cmf = self.bits.bits(8);
                let flg = self.bits.bits(16) >> 8;
                if ((cmf << 8) + flg) % 31 != 0 {
                    return self.bad("incorrect header check");
                }
                if cmf & 0x0f != u32::from(DEFLATED) {
                    return self.bad("unknown compression method");
                }
                let len = (cmf >> 4) + 8;
                if self.wbits == 0 {
                    self.wbits = len;
                }
                if len > MAX_WBITS as u32 || len > self.wbits {
                    return self.bad("invalid window size");
                }
                self.header_seen = true;
                self.check = 1;
                self.bits.clear();
                self.mode = if flg & 0x20 != 0 {
                    Mode::DictId
                } else {
                    Mode::Type
                };
                log::trace!("zlib header: window {} bytes", 1u32 << len);
                Ok(())
            }
            Mode::DictId => {
                need(&mut self.bits, strm, 32)?;
                self.check = self.bits.bits(32).swap_bytes();
                self.bits.clear();
                self.mode = Mode::Dict;
                Ok(())
            }
            Mode::Dict => {
                if !self.havedict {
                    log::debug!("stream needs dictionary {:08x}", self.check);
                    return Err(Leave::NeedDict);
                }
                self.check = 1;
                self.mode = Mode::Type;
                Ok(())
            }
            Mode::Type => {
                if matches!(flush, FlushMode::Block | FlushMode::Trees) {
                    return Err(Leave::Suspend);
                }
                // Stay at the boundary until the block header bits are held.
                if !self.last {
                    need(&mut self.bits, strm, 3)?;
                }
                self.mode = Mode::TypeDo;
                Ok(())
            }
            Mode::TypeDo => {
                if self.last {
                    self.bits.byte_align();
                    self.mode = Mode::Check;
                    return Ok(());
                }
                need(&mut self.bits, strm, 3)?;
                self.last = self.bits.bits(1) == 1;
                self.bits.drop_bits(1);
                let kind = self.bits.bits(2);
                self.bits.drop_bits(2);
                match kind {
                    0 => {
                        log::trace!("stored block{}", if self.last { " (last)" } else { "" });
                        self.mode = Mode::Stored;
                    }
                    1 => {
                        log::trace!("fixed block{}", if self.last { " (last)" } else { "" });
                        self.lencode = TableRef::FixedLen;
                        self.lenbits = FIXED_LENBITS;
                        self.distcode = TableRef::FixedDist;
                        self.distbits = FIXED_DISTBITS;
                        self.mode = Mode::LenStart;
                        if flush == FlushMode::Trees {
                            return Err(Leave::Suspend);
                        }
                    }
                    2 => {
                        log::trace!("dynamic block{}", if self.last { " (last)" } else { "" });
                        self.mode = Mode::Table;
                    }
                    _ => return self.bad("invalid block type"),
                }
                Ok(())
            }
            Mode::Stored => {
                self.bits.byte_align();
                need(&mut self.bits, strm, 32)?;
                let lengths = self.bits.bits(32);
                if lengths & 0xffff != (lengths >> 16) ^ 0xffff {
                    return self.bad("invalid stored block lengths");
                }
                self.length = (lengths & 0xffff) as usize;
                self.bits.clear();
                self.mode = Mode::CopyStart;
                if flush == FlushMode::Trees {
                    return Err(Leave::Suspend);
                }
                Ok(())
            }
            Mode::CopyStart => {
                self.mode = Mode::Copy;
                Ok(())
            }
            Mode::Copy => {
                if self.length > 0 {
                    let copied = strm.copy_through(self.length);
                    if copied == 0 {
                        return Err(Leave::Suspend);
                    }
                    self.length -= copied;
                    return Ok(());
                }
                self.mode = Mode::Type;
                Ok(())
            }
            Mode::Table => {
                need(&mut self.bits, strm, 14)?;
                self.nlen = self.bits.bits(5) as usize + 257;
                self.bits.drop_bits(5);
                self.ndist = self.bits.bits(5) as usize + 1;
                self.bits.drop_bits(5);
                self.ncode = self.bits.bits(4) as usize + 4;
                self.bits.drop_bits(4);
                if self.nlen > 286 || self.ndist > 30 {
                    return self.bad("too many length or distance symbols");
                }
                self.have = 0;
                self.mode = Mode::LenLens;
                Ok(())
            }
            Mode::LenLens => {
                while self.have < self.ncode {
                    need(&mut self.bits, strm, 3)?;
                    self.lens[CODE_LENGTH_ORDER[self.have]] = self.bits.bits(3) as u16;
                    self.bits.drop_bits(3);
                    self.have += 1;
                }
                while self.have < CODE_LENGTH_ORDER.len() {
                    self.lens[CODE_LENGTH_ORDER[self.have]] = 0;
                    self.have += 1;
                }

                let Some(info) = inflate_table(
                    CodeType::Codes,
                    &self.lens[..CODE_LENGTH_ORDER.len()],
                    &mut self.codes,
                    7,
                    &mut self.work,
                ) else {
                    return self.bad("invalid code lengths set");
                };
                self.lencode = TableRef::Dynamic(0);
                self.lenbits = info.bits;
                self.have = 0;
                self.mode = Mode::CodeLens;
                Ok(())
            }
            Mode::CodeLens => {
                let total = self.nlen + self.ndist;
                while self.have < total {
                    let table = self.lencode.resolve(&self.codes);
                    let Some(here) = peek(&mut self.bits, strm, table, self.lenbits) else {
                        return Err(Leave::Suspend);
                    };
                    let here_bits = u32::from(here.bits);
                    if here.val < 16 {
                        self.bits.drop_bits(here_bits);
                        self.lens[self.have] = here.val;
                        self.have += 1;
                        continue;
                    }

                    let (len, copy) = match here.val {
                        16 => {
                            need(&mut self.bits, strm, here_bits + 2)?;
                            self.bits.drop_bits(here_bits);
                            if self.have == 0 {
                                return self.bad("invalid bit length repeat");
                            }
                            let copy = 3 + self.bits.bits(2);
                            self.bits.drop_bits(2);
                            (self.lens[self.have - 1], copy)
                        }
                        17 => {
                            need(&mut self.bits, strm, here_bits + 3)?;
                            self.bits.drop_bits(here_bits);
                            let copy = 3 + self.bits.bits(3);
                            self.bits.drop_bits(3);
                            (0, copy)
                        }
                        _ => {
                            need(&mut self.bits, strm, here_bits + 7)?;
                            self.bits.drop_bits(here_bits);
                            let copy = 11 + self.bits.bits(7);
                            self.bits.drop_bits(7);
                            (0, copy)
                        }
                    };
                    let copy = copy as usize;
                    if self.have + copy > total {
                        return self.bad("invalid bit length repeat");
                    }
                    self.lens[self.have..self.have + copy].fill(len);
                    self.have += copy;
                }

                if self.lens[256] == 0 {
                    return self.bad("invalid code -- missing end-of-block");
                }

                let Some(info) = inflate_table(
                    CodeType::Lens,
                    &self.lens[..self.nlen],
                    &mut self.codes,
                    9,
                    &mut self.work,
                ) else {
                    return self.bad("invalid literal/lengths set");
                };
                self.lencode = TableRef::Dynamic(0);
                self.lenbits = info.bits;
                let next = info.used;

                let Some(info) = inflate_table(
                    CodeType::Dists,
                    &self.lens[self.nlen..total],
                    &mut self.codes[next..],
                    6,
                    &mut self.work,
                ) else {
                    return self.bad("invalid distances set");
                };
                self.distcode = TableRef::Dynamic(next);
                self.distbits = info.bits;

                self.mode = Mode::LenStart;
                if flush == FlushMode::Trees {
                    return Err(Leave::Suspend);
                }
                Ok(())
            }
            Mode::LenStart => {
                self.mode = Mode::Len;
                Ok(())
            }
            Mode::Len => {
                if strm.avail_in() >= 6 && strm.avail_out() >= 258 {
                    self.inflate_fast(strm);
                    if self.mode == Mode::Type {
                        self.back = -1;
                    }
                    return Ok(());
                }

                self.back = 0;
                let table = self.lencode.resolve(&self.codes);
                let Some((here, used)) = decode(&mut self.bits, strm, table, self.lenbits) else {
                    return Err(Leave::Suspend);
                };
                self.back += used as i32;
                self.length = usize::from(here.val);

                if here.op == 0 {
                    self.mode = Mode::Lit;
                } else if here.op & OP_END_OF_BLOCK != 0 {
                    self.back = -1;
                    self.mode = Mode::Type;
                } else if here.op & OP_INVALID != 0 {
                    return self.bad("invalid literal/length code");
                } else {
                    self.extra = u32::from(here.op & 15);
                    self.mode = Mode::LenExt;
                }
                Ok(())
            }
            Mode::LenExt => {
                if self.extra != 0 {
                    need(&mut self.bits, strm, self.extra)?;
                    self.length += self.bits.bits(self.extra) as usize;
                    self.bits.drop_bits(self.extra);
                    self.back += self.extra as i32;
                }
                self.was = self.length;
                self.mode = Mode::Dist;
                Ok(())
            }
            Mode::Dist => {
                let table = self.distcode.resolve(&self.codes);
                let Some((here, used)) = decode(&mut self.bits, strm, table, self.distbits) else {
                    return Err(Leave::Suspend);
                };
                self.back += used as i32;
                if here.op & OP_INVALID != 0 {
                    return self.bad("invalid distance code");
                }
                self.offset = usize::from(here.val);
                self.extra = u32::from(here.op & 15);
                self.mode = Mode::DistExt;
                Ok(())
            }
            Mode::DistExt => {
                if self.extra != 0 {
                    need(&mut self.bits, strm, self.extra)?;
                    self.offset += self.bits.bits(self.extra) as usize;
                    self.bits.drop_bits(self.extra);
                    self.back += self.extra as i32;
                }
                self.mode = Mode::Match;
                Ok(())
            }
            Mode::Match => {
                if strm.avail_out() == 0 {
                    return Err(Leave::Suspend);
                }
                let Some(copied) = copy_piece(
                    &self.window,
                    self.sane,
                    strm,
                    self.out_mark,
                    self.offset,
                    self.length,
                ) else {
                    return self.bad("invalid distance too far back");
                };
                self.length -= copied;
                if self.length == 0 {
                    self.mode = Mode::Len;
                }
                Ok(())
            }
            Mode::Lit => {
                if strm.avail_out() == 0 {
                    return Err(Leave::Suspend);
                }
                strm.push(self.length as u8);
                self.mode = Mode::Len;
                Ok(())
            }
            Mode::Check => {
                if self.wrap != 0 {
                    need(&mut self.bits, strm, 32)?;
                    let out = strm.out_pos() - self.out_mark;
                    self.total_out += out as u64;
                    if self.wrap & WRAP_CHECK != 0 && out > 0 {
                        self.check = adler32(self.check, &strm.written()[self.out_mark..]);
                    }
                    self.out_mark = strm.out_pos();
                    if self.wrap & WRAP_CHECK != 0 && self.bits.bits(32).swap_bytes() != self.check {
                        return self.bad("incorrect data check");
                    }
                    self.bits.clear();
                }
                log::debug!("end of stream after {} bytes", self.total_out);
                self.mode = Mode::Done;
                Ok(())
            }
            Mode::Done => Err(Leave::StreamEnd),
            Mode::Bad => Err(Leave::Bad),
            Mode::Mem => Err(Leave::Mem),
            Mode::Sync => Err(Leave::Misuse),
        }
    }

    /// Enter the error state with `msg`.
    fn fail(&mut self, msg: &'static str) {
        log::debug!("corrupt input: {msg}");
        self.msg = Some(msg);
        self.mode = Mode::Bad;
    }

    fn bad(&mut self, msg: &'static str) -> Step {
        self.fail(msg);
        Ok(())
    }

    /// Load a preset dictionary.
    ///
    /// For a zlib stream this is only allowed after `inflate` returned
    /// `NeedDict`, and the dictionary must match the id the stream asked
    /// for. A raw stream accepts a dictionary at any time.
    pub fn set_dictionary(&mut self, dictionary: &[u8]) -> Result<()> {
        if self.wrap != 0 && self.mode != Mode::Dict {
            return Err(OxiflateError::stream("no dictionary expected"));
        }
        if self.mode == Mode::Dict && adler32(1, dictionary) != self.check {
            return Err(OxiflateError::data("incorrect dictionary"));
        }
        if self.window.update(self.wbits, dictionary).is_err() {
            self.mode = Mode::Mem;
            return Err(OxiflateError::mem());
        }
        self.havedict = true;
        log::debug!("loaded {} byte dictionary", dictionary.len());
        Ok(())
    }

    /// The history currently held, oldest byte first.
    pub fn get_dictionary(&self) -> Vec<u8> {
        self.window.contents()
    }

    /// Insert up to 16 bits ahead of the input.
    ///
    /// A negative `bits` discards everything already buffered instead.
    pub fn prime(&mut self, bits: i32, value: u32) -> Result<()> {
        if bits < 0 {
            self.bits.clear();
            return Ok(());
        }
        let bits = bits as u32;
        if bits > 16 || self.bits.available() + bits > 32 {
            return Err(OxiflateError::stream("too many bits to prime"));
        }
        self.bits.push_bits(bits, value);
        Ok(())
    }

    /// Skip input until just past a full flush marker (`00 00 FF FF`).
    ///
    /// Returns `BufError` if there is nothing to search. If the marker was
    /// not found all of the input has been consumed and a data error is
    /// returned; call again with more input to continue the search. Once
    /// found, decoding resumes at the next block with the history dropped
    /// and the trailer check disabled.
    pub fn sync(&mut self, strm: &mut Stream<'_>) -> Result<Status> {
        if strm.avail_in() == 0 && self.bits.available() < 8 {
            return Ok(Status::BufError);
        }

        if self.mode != Mode::Sync {
            self.mode = Mode::Sync;
            self.bits.byte_align();
            let mut held = [0u8; 8];
            let mut len = 0;
            while self.bits.available() >= 8 {
                held[len] = self.bits.bits(8) as u8;
                self.bits.drop_bits(8);
                len += 1;
            }
            self.have = 0;
            sync_search(&mut self.have, &held[..len]);
        }

        let len = sync_search(&mut self.have, strm.remaining_input());
        strm.advance_in(len);
        self.total_in += len as u64;

        if self.have != 4 {
            return Err(OxiflateError::data("no sync point found"));
        }

        if self.header_seen {
            self.wrap &= !WRAP_CHECK;
        } else {
            self.wrap = 0;
        }
        let header_seen = self.header_seen;
        let (total_in, total_out) = (self.total_in, self.total_out);
        self.reset();
        self.total_in = total_in;
        self.total_out = total_out;
        self.header_seen = header_seen;
        self.mode = Mode::Type;
        log::debug!("resynchronised at input offset {total_in}");
        Ok(Status::Ok)
    }

    /// Whether decoding stopped exactly at the start of a stored block's
    /// data, the point a full flush leaves behind.
    pub fn is_sync_point(&self) -> bool {
        self.mode == Mode::Stored && self.bits.available() == 0
    }

    /// Allow (`true`) or reject (`false`, the default) back-references
    /// reaching beyond the available history. Allowed ones produce zeros
    /// for the missing bytes.
    pub fn undermine(&mut self, subvert: bool) {
        self.sane = !subvert;
    }

    /// Position within the current symbol, for building access points.
    ///
    /// The upper bits are the number of bits consumed of the current code,
    /// or -1 at a block boundary. The low 16 bits are the bytes remaining in
    /// a stored block, or the bytes already copied of a match.
    pub fn mark(&self) -> i64 {
        let within = match self.mode {
            Mode::Copy => self.length,
            Mode::Match => self.was - self.length,
            _ => 0,
        };
        (i64::from(self.back) << 16) + within as i64
    }

    /// Decoder position flags: the number of unused bits held, plus 64 in
    /// the last block, 128 at a block boundary, and 256 right after a block
    /// header (in `Trees` mode).
    pub fn data_type(&self) -> i32 {
        let mut value = self.bits.available() as i32;
        if self.last {
            value += 64;
        }
        if self.mode == Mode::Type {
            value += 128;
        }
        if matches!(self.mode, Mode::LenStart | Mode::CopyStart) {
            value += 256;
        }
        value
    }

    /// Release the decompressor.
    pub fn end(self) -> Result<()> {
        Ok(())
    }

    /// Total compressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Total bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Adler-32 of the output so far, or the requested dictionary id after
    /// `NeedDict`.
    pub fn adler(&self) -> u32 {
        self.check
    }

    /// Message for the last data error.
    pub fn message(&self) -> Option<&'static str> {
        self.msg
    }

    /// Whether the end of the stream has been reached.
    pub fn is_done(&self) -> bool {
        self.mode == Mode::Done
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for Inflater {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: FlushMode,
    ) -> Result<(usize, usize, Status)> {
        let mut strm = Stream::new(input, output);
        let status = self.inflate(&mut strm, flush)?;
        Ok((strm.in_pos(), strm.out_pos(), status))
    }

    fn reset(&mut self) {
        Inflater::reset(self);
    }

    fn is_finished(&self) -> bool {
        self.is_done()
    }
}

/// Ensure `n` bits are buffered or suspend.
#[inline]
fn need(bits: &mut BitReader, strm: &mut Stream<'_>, n: u32) -> Step {
    if bits.need_bits(strm, n) {
        Ok(())
    } else {
        Err(Leave::Suspend)
    }
}

/// Look up the next code in a single-level table without consuming it.
fn peek(bits: &mut BitReader, strm: &mut Stream<'_>, table: &[Code], root: u32) -> Option<Code> {
    loop {
        let here = table[bits.bits(root) as usize];
        if u32::from(here.bits) <= bits.available() {
            return Some(here);
        }
        if !bits.pull_byte(strm) {
            return None;
        }
    }
}

/// Decode and consume the next code, following a sub-table link. Returns
/// the entry and the number of bits it took.
fn decode(
    bits: &mut BitReader,
    strm: &mut Stream<'_>,
    table: &[Code],
    root: u32,
) -> Option<(Code, u32)> {
    let mut here = peek(bits, strm, table, root)?;
    let mut used = 0;
    if here.is_link() {
        let link = here;
        let link_bits = u32::from(link.bits);
        loop {
            let index = usize::from(link.val)
                + (bits.bits(link_bits + u32::from(link.op)) >> link_bits) as usize;
            here = table[index];
            if link_bits + u32::from(here.bits) <= bits.available() {
                break;
            }
            if !bits.pull_byte(strm) {
                return None;
            }
        }
        bits.drop_bits(link_bits);
        used = link_bits;
    }
    bits.drop_bits(u32::from(here.bits));
    Some((here, used + u32::from(here.bits)))
}

/// Copy the first contiguous piece of a `len` byte match `dist` bytes back,
/// returning how many bytes were written.
///
/// Bytes produced since `out_mark` are still in the output buffer; older
/// ones come from the window. Returns `None` if the match reaches past the
/// history and `sane` is set; otherwise the missing bytes are zeros.
fn copy_piece(
    window: &SlidingWindow,
    sane: bool,
    strm: &mut Stream<'_>,
    out_mark: usize,
    dist: usize,
    len: usize,
) -> Option<usize> {
    let produced = strm.out_pos() - out_mark;
    if dist <= produced {
        let n = len.min(strm.avail_out());
        strm.copy_back(dist, n);
        return Some(n);
    }

    let back = dist - produced;
    if back > window.have() {
        if sane {
            return None;
        }
        let n = (back - window.have()).min(len);
        return Some(strm.write(&ZEROS[..n]));
    }
    let from = window.source(back);
    Some(strm.write(&from[..from.len().min(len)]))
}

/// Advance the full flush marker search over `buf`; `got` counts the marker
/// bytes matched so far. Returns the bytes examined.
fn sync_search(got: &mut usize, buf: &[u8]) -> usize {
    let mut next = 0;
    while next < buf.len() && *got < 4 {
        let want = if *got < 2 { 0x00 } else { 0xff };
        if buf[next] == want {
            *got += 1;
        } else if buf[next] != 0 {
            *got = 0;
        } else {
            *got = 4 - *got;
        }
        next += 1;
    }
    next
}
