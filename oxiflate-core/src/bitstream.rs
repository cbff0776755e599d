//! Resumable bit-level I/O for the DEFLATE bit order.
//!
//! DEFLATE packs bits LSB-first within bytes. Both halves of the codec work
//! on buffers supplied one call at a time, so neither type here owns a
//! reader or writer:
//!
//! - [`BitReader`] is a bit accumulator fed one byte at a time from a
//!   [`Stream`]. It never blocks: when input runs out it reports failure and
//!   keeps whatever bits it already holds for the next call.
//! - [`BitWriter`] stages bits in a 16-bit buffer and spills whole bytes into
//!   an owned pending buffer, which is drained into a [`Stream`]'s output as
//!   space allows.
//!
//! # Example
//!
//! ```
//! use oxiflate_core::bitstream::{BitReader, BitWriter};
//! use oxiflate_core::Stream;
//!
//! let mut writer = BitWriter::with_capacity(16);
//! writer.send_bits(0b101, 3);
//! writer.send_bits(0b1100, 4);
//! writer.windup();
//!
//! let mut out = [0u8; 0];
//! let mut stream = Stream::new(writer.pending(), &mut out);
//! let mut reader = BitReader::new();
//! assert!(reader.need_bits(&mut stream, 7));
//! assert_eq!(reader.bits(3), 0b101);
//! reader.drop_bits(3);
//! assert_eq!(reader.bits(4), 0b1100);
//! ```

use crate::stream::Stream;

/// Width of the writer's staging buffer in bits.
const BUF_SIZE: u32 = 16;

/// Bit accumulator for decoding.
///
/// Bits enter at the top of `hold` and are consumed from the bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitReader {
    hold: u64,
    bits: u32,
}

impl BitReader {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits currently held.
    #[inline]
    pub fn available(&self) -> u32 {
        self.bits
    }

    /// The raw accumulator.
    #[inline]
    pub fn hold(&self) -> u64 {
        self.hold
    }

    /// Discard all held bits.
    #[inline]
    pub fn clear(&mut self) {
        self.hold = 0;
        self.bits = 0;
    }

    /// Append one byte above the held bits.
    #[inline]
    pub fn add_byte(&mut self, byte: u8) {
        self.hold |= u64::from(byte) << self.bits;
        self.bits += 8;
    }

    /// Pull one byte from the stream. Returns false when input is exhausted.
    #[inline]
    pub fn pull_byte(&mut self, stream: &mut Stream<'_>) -> bool {
        match stream.read_byte() {
            Some(byte) => {
                self.add_byte(byte);
                true
            }
            None => false,
        }
    }

    /// Ensure at least `n` bits are held, pulling bytes as needed.
    ///
    /// Returns false if the input ran out first; bytes already pulled stay
    /// in the accumulator.
    #[inline]
    pub fn need_bits(&mut self, stream: &mut Stream<'_>, n: u32) -> bool {
        while self.bits < n {
            if !self.pull_byte(stream) {
                return false;
            }
        }
        true
    }

    /// The low `n` held bits, without consuming them.
    #[inline]
    pub fn bits(&self, n: u32) -> u32 {
        (self.hold & ((1u64 << n) - 1)) as u32
    }

    /// Consume `n` bits.
    #[inline]
    pub fn drop_bits(&mut self, n: u32) {
        debug_assert!(n <= self.bits);
        self.hold >>= n;
        self.bits -= n;
    }

    /// Discard bits up to the next byte boundary.
    #[inline]
    pub fn byte_align(&mut self) {
        let partial = self.bits & 7;
        self.drop_bits(partial);
    }

    /// Insert `n` bits of `value` above the held bits.
    ///
    /// Used to prime a decoder with bits from outside the stream.
    pub fn push_bits(&mut self, n: u32, value: u32) {
        debug_assert!(n <= 16 && self.bits + n <= 32);
        let value = u64::from(value) & ((1u64 << n) - 1);
        self.hold |= value << self.bits;
        self.bits += n;
    }

    /// Return whole unconsumed bytes to the stream and drop them from the
    /// accumulator, leaving only the partial byte.
    pub fn return_unused(&mut self, stream: &mut Stream<'_>) {
        let len = self.bits >> 3;
        stream.rewind_in(len as usize);
        self.bits -= len << 3;
        self.hold &= (1u64 << self.bits) - 1;
    }
}

/// Bit writer with an owned pending output buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    pending: Vec<u8>,
    pending_out: usize,
    bi_buf: u16,
    bi_valid: u32,
}

impl BitWriter {
    /// Create a writer whose pending buffer starts with `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Reserve pending space up front, reporting allocation failure.
    pub fn try_reserve(&mut self, capacity: usize) -> bool {
        match self.pending.try_reserve_exact(capacity) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("cannot allocate {} byte pending buffer: {}", capacity, e);
                false
            }
        }
    }

    /// Discard all pending bytes and bits.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pending_out = 0;
        self.bi_buf = 0;
        self.bi_valid = 0;
    }

    /// Write the low `length` bits of `value`. `length` is at most 16.
    #[inline]
    pub fn send_bits(&mut self, value: u32, length: u32) {
        debug_assert!(length <= BUF_SIZE);
        let value = value & ((1u32 << length) - 1);
        if self.bi_valid > BUF_SIZE - length {
            let joined = u32::from(self.bi_buf) | (value << self.bi_valid);
            self.put_short(joined as u16);
            self.bi_buf = (value >> (BUF_SIZE - self.bi_valid)) as u16;
            self.bi_valid += length;
            self.bi_valid -= BUF_SIZE;
        } else {
            self.bi_buf |= (value << self.bi_valid) as u16;
            self.bi_valid += length;
        }
    }

    /// Append a byte to the pending buffer, bypassing the bit buffer.
    #[inline]
    pub fn put_byte(&mut self, byte: u8) {
        self.pending.push(byte);
    }

    /// Append a 16-bit value LSB first.
    #[inline]
    pub fn put_short(&mut self, value: u16) {
        self.pending.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a 16-bit value MSB first, as the zlib wrapper fields require.
    #[inline]
    pub fn put_short_msb(&mut self, value: u16) {
        self.pending.extend_from_slice(&value.to_be_bytes());
    }

    /// Append raw bytes to the pending buffer.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Move complete bytes from the bit buffer to the pending buffer,
    /// keeping at most 7 bits staged.
    pub fn flush_bits(&mut self) {
        if self.bi_valid == 16 {
            self.put_short(self.bi_buf);
            self.bi_buf = 0;
            self.bi_valid = 0;
        } else if self.bi_valid >= 8 {
            self.put_byte(self.bi_buf as u8);
            self.bi_buf >>= 8;
            self.bi_valid -= 8;
        }
    }

    /// Flush the bit buffer, padding the last byte with zero bits.
    pub fn windup(&mut self) {
        if self.bi_valid > 8 {
            self.put_short(self.bi_buf);
        } else if self.bi_valid > 0 {
            self.put_byte(self.bi_buf as u8);
        }
        self.bi_buf = 0;
        self.bi_valid = 0;
    }

    /// Number of staged bits not yet in the pending buffer.
    #[inline]
    pub fn bits_valid(&self) -> u32 {
        self.bi_valid
    }

    /// Number of pending bytes not yet copied out.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.pending_out
    }

    /// Returns true when no pending bytes are waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// Pending bytes not yet copied out.
    pub fn pending(&self) -> &[u8] {
        &self.pending[self.pending_out..]
    }

    /// Copy as many pending bytes as fit into the stream's output.
    ///
    /// Returns the number of bytes copied.
    pub fn flush_to(&mut self, stream: &mut Stream<'_>) -> usize {
        let n = stream.write(&self.pending[self.pending_out..]);
        self.pending_out += n;
        if self.pending_out == self.pending.len() {
            self.pending.clear();
            self.pending_out = 0;
        }
        n
    }

    /// Insert `bits` bits of `value` into the bit stream, spilling full
    /// bytes to the pending buffer as needed.
    pub fn prime(&mut self, mut bits: u32, mut value: u32) {
        while bits > 0 {
            let put = (BUF_SIZE - self.bi_valid).min(bits);
            let chunk = value & ((1u32 << put) - 1);
            self.bi_buf |= (chunk << self.bi_valid) as u16;
            self.bi_valid += put;
            self.flush_bits();
            value >>= put;
            bits -= put;
        }
    }
}
