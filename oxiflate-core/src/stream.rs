//! Buffer-to-buffer stream cursor.
//!
//! A [`Stream`] pairs a borrowed input slice with a borrowed output slice and
//! tracks how far each has been consumed or filled. The engines take a
//! `&mut Stream` on every call and advance the cursors as they make progress;
//! the caller reads the positions back afterwards to learn how many bytes
//! were consumed and produced.
//!
//! ```rust
//! use oxiflate_core::Stream;
//!
//! let input = b"abc";
//! let mut output = [0u8; 4];
//! let mut stream = Stream::new(input, &mut output);
//! assert_eq!(stream.read_byte(), Some(b'a'));
//! stream.write(b"xy");
//! assert_eq!(stream.avail_in(), 2);
//! assert_eq!(stream.avail_out(), 2);
//! ```

/// Input and output cursors for one engine call.
#[derive(Debug)]
pub struct Stream<'a> {
    input: &'a [u8],
    next_in: usize,
    output: &'a mut [u8],
    next_out: usize,
}

impl<'a> Stream<'a> {
    /// Create a stream over the given buffers with both cursors at zero.
    pub fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self {
            input,
            next_in: 0,
            output,
            next_out: 0,
        }
    }

    /// Bytes of input not yet consumed.
    #[inline]
    pub fn avail_in(&self) -> usize {
        self.input.len() - self.next_in
    }

    /// Bytes of output space not yet filled.
    #[inline]
    pub fn avail_out(&self) -> usize {
        self.output.len() - self.next_out
    }

    /// Bytes consumed from the input so far.
    #[inline]
    pub fn in_pos(&self) -> usize {
        self.next_in
    }

    /// Bytes written to the output so far.
    #[inline]
    pub fn out_pos(&self) -> usize {
        self.next_out
    }

    /// The whole input slice, independent of the cursor.
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Unconsumed input.
    #[inline]
    pub fn remaining_input(&self) -> &'a [u8] {
        &self.input[self.next_in..]
    }

    /// Output produced so far.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.output[..self.next_out]
    }

    /// Consume one input byte.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = *self.input.get(self.next_in)?;
        self.next_in += 1;
        Some(byte)
    }

    /// Copy as much input as fits into `buf`, returning the count.
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.avail_in());
        buf[..n].copy_from_slice(&self.input[self.next_in..self.next_in + n]);
        self.next_in += n;
        n
    }

    /// Mark `n` input bytes as consumed.
    #[inline]
    pub fn advance_in(&mut self, n: usize) {
        debug_assert!(n <= self.avail_in());
        self.next_in += n;
    }

    /// Hand `n` consumed input bytes back to the caller.
    #[inline]
    pub fn rewind_in(&mut self, n: usize) {
        debug_assert!(n <= self.next_in);
        self.next_in -= n;
    }

    /// Append one byte to the output. The caller checks `avail_out` first.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.output[self.next_out] = byte;
        self.next_out += 1;
    }

    /// Copy as much of `bytes` as fits into the output, returning the count.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.avail_out());
        self.output[self.next_out..self.next_out + n].copy_from_slice(&bytes[..n]);
        self.next_out += n;
        n
    }

    /// Copy up to `len` input bytes straight to the output, returning the count.
    pub fn copy_through(&mut self, len: usize) -> usize {
        let n = len.min(self.avail_in()).min(self.avail_out());
        self.output[self.next_out..self.next_out + n]
            .copy_from_slice(&self.input[self.next_in..self.next_in + n]);
        self.next_in += n;
        self.next_out += n;
        n
    }

    /// Append `len` bytes copied from `dist` bytes back in the output.
    ///
    /// Overlapping copies replicate the pattern byte by byte, as LZ77
    /// back-references require. The caller guarantees `dist <= out_pos()`
    /// and `len <= avail_out()`.
    pub fn copy_back(&mut self, dist: usize, len: usize) {
        let start = self.next_out;
        if dist >= len {
            self.output.copy_within(start - dist..start - dist + len, start);
        } else {
            for i in start..start + len {
                self.output[i] = self.output[i - dist];
            }
        }
        self.next_out += len;
    }
}
