//! LZ77 sliding window and match finder for the compressor.
//!
//! The window holds `2 * w_size` bytes. New input is appended after the
//! current position; once the position reaches the upper half, the upper half
//! is copied down and every stored position is rebased. Strings of
//! `MIN_MATCH` bytes are indexed in hash chains: `head` maps a hash to the
//! most recent position, `prev` links each position to the previous one with
//! the same hash. Position 0 doubles as the chain terminator, so a match
//! against the very first byte of the stream is never found.

use oxiflate_core::adler32::adler32;
use oxiflate_core::error::{OxiflateError, Result};
use oxiflate_core::stream::Stream;

use crate::tables::{MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};

/// Chain terminator.
pub(crate) const NIL: u16 = 0;

/// Search limits for one [`Lz77Window::longest_match`] call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MatchLimits {
    /// Maximum number of chain links to follow.
    pub(crate) max_chain: usize,
    /// Quarter the chain when the previous match is at least this long.
    pub(crate) good_match: usize,
    /// Stop searching as soon as a match this long is found.
    pub(crate) nice_match: usize,
}

/// Compressor history window with hash chains.
#[derive(Debug, Clone)]
pub(crate) struct Lz77Window {
    /// Input history, `2 * w_size` bytes.
    pub(crate) window: Vec<u8>,
    pub(crate) w_size: usize,
    pub(crate) w_bits: u32,
    w_mask: usize,
    prev: Vec<u16>,
    head: Vec<u16>,
    /// Rolling hash of the string being inserted.
    pub(crate) ins_h: usize,
    pub(crate) hash_bits: u32,
    hash_mask: usize,
    hash_shift: u32,
    /// Start of the string to be processed.
    pub(crate) strstart: usize,
    /// Start of the current block; negative after a slide moved it out of
    /// the window.
    pub(crate) block_start: isize,
    /// Valid bytes ahead of `strstart`.
    pub(crate) lookahead: usize,
    /// Bytes at the end of the history not yet inserted in the hash chains.
    pub(crate) insert: usize,
    /// Start of the best match found by the last search.
    pub(crate) match_start: usize,
}

impl Lz77Window {
    /// Allocate a window of `2^w_bits` bytes and a hash table of
    /// `2^(mem_level + 7)` entries.
    pub(crate) fn new(w_bits: u32, mem_level: u32) -> Result<Self> {
        let w_size = 1usize << w_bits;
        let hash_bits = mem_level + 7;
        let hash_size = 1usize << hash_bits;

        let window = zeroed::<u8>(2 * w_size)?;
        let prev = zeroed::<u16>(w_size)?;
        let head = zeroed::<u16>(hash_size)?;

        Ok(Self {
            window,
            w_size,
            w_bits,
            w_mask: w_size - 1,
            prev,
            head,
            ins_h: 0,
            hash_bits,
            hash_mask: hash_size - 1,
            hash_shift: (hash_bits + MIN_MATCH as u32 - 1) / MIN_MATCH as u32,
            strstart: 0,
            block_start: 0,
            lookahead: 0,
            insert: 0,
            match_start: 0,
        })
    }

    /// Largest distance a match may reach back.
    #[inline]
    pub(crate) fn max_dist(&self) -> usize {
        self.w_size - MIN_LOOKAHEAD
    }

    /// Total size of the window buffer.
    #[inline]
    pub(crate) fn window_size(&self) -> usize {
        2 * self.w_size
    }

    /// Forget every hash chain.
    pub(crate) fn clear_hash(&mut self) {
        self.head.fill(NIL);
    }

    /// Rewind to an empty window.
    pub(crate) fn reset(&mut self) {
        self.clear_hash();
        self.strstart = 0;
        self.block_start = 0;
        self.lookahead = 0;
        self.insert = 0;
        self.match_start = 0;
        self.ins_h = 0;
    }

    #[inline]
    fn update_hash(&self, h: usize, c: u8) -> usize {
        ((h << self.hash_shift) ^ c as usize) & self.hash_mask
    }

    /// Seed the rolling hash with the two bytes at `pos`.
    #[inline]
    pub(crate) fn prime_hash(&mut self, pos: usize) {
        self.ins_h = self.window[pos] as usize;
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + 1]);
    }

    /// Insert the string starting at `pos` and return the previous head of
    /// its chain. The rolling hash must already cover `pos..pos + 2`.
    #[inline]
    pub(crate) fn insert_string(&mut self, pos: usize) -> u16 {
        self.ins_h = self.update_hash(self.ins_h, self.window[pos + MIN_MATCH - 1]);
        let head = self.head[self.ins_h];
        self.prev[pos & self.w_mask] = head;
        self.head[self.ins_h] = pos as u16;
        head
    }

    /// Rebase every chain entry after the window moved down by `w_size`.
    pub(crate) fn slide_hash(&mut self) {
        let w_size = self.w_size as u16;
        for entry in self.head.iter_mut().chain(self.prev.iter_mut()) {
            *entry = entry.saturating_sub(w_size);
        }
    }

    /// Read input until at least `MIN_LOOKAHEAD` bytes are available or the
    /// input is exhausted, sliding the window when the position nears its
    /// end.
    ///
    /// `adler`, when given, is updated over the bytes read. Returns the number
    /// of input bytes consumed.
    pub(crate) fn fill_window(&mut self, strm: &mut Stream<'_>, mut adler: Option<&mut u32>) -> usize {
        let w_size = self.w_size;
        let mut consumed = 0;

        loop {
            let mut more = self.window_size() - self.lookahead - self.strstart;

            if self.strstart >= w_size + self.max_dist() {
                self.window.copy_within(w_size..2 * w_size - more, 0);
                self.match_start = self.match_start.saturating_sub(w_size);
                self.strstart -= w_size;
                self.block_start -= w_size as isize;
                self.insert = self.insert.min(self.strstart);
                self.slide_hash();
                more += w_size;
            }

            if strm.avail_in() == 0 {
                break;
            }

            let start = self.strstart + self.lookahead;
            let n = strm.read_into(&mut self.window[start..start + more]);
            if let Some(adler) = adler.as_deref_mut() {
                *adler = adler32(*adler, &self.window[start..start + n]);
            }
            consumed += n;
            self.lookahead += n;

            // Hash the bytes left over from before this read, now that enough
            // bytes follow them.
            if self.lookahead + self.insert >= MIN_MATCH {
                let mut pos = self.strstart - self.insert;
                self.prime_hash(pos);
                while self.insert > 0 {
                    self.insert_string(pos);
                    pos += 1;
                    self.insert -= 1;
                    if self.lookahead + self.insert < MIN_MATCH {
                        break;
                    }
                }
            }

            if self.lookahead >= MIN_LOOKAHEAD || strm.avail_in() == 0 {
                break;
            }
        }
        consumed
    }

    /// Follow the hash chain from `cur_match` and return the length of the
    /// longest match for the string at `strstart`, recording its start in
    /// `match_start`.
    ///
    /// Only matches longer than `prev_length` are considered, and ties keep
    /// the most recent candidate. The result never exceeds `lookahead`.
    pub(crate) fn longest_match(
        &mut self,
        mut cur_match: usize,
        prev_length: usize,
        limits: &MatchLimits,
    ) -> usize {
        let scan = self.strstart;
        let mut chain_length = limits.max_chain;
        let mut best_len = prev_length;
        let nice_match = limits.nice_match.min(self.lookahead);
        let limit = self.strstart.saturating_sub(self.max_dist());
        let strend = (scan + MAX_MATCH).min(self.window.len());
        let window = &self.window[..];

        if prev_length >= limits.good_match {
            chain_length >>= 2;
        }

        loop {
            let candidate = cur_match;
            // Cheap rejection first: the byte that would extend the best
            // match, the one before it, then the first two bytes.
            let promising = window[candidate + best_len] == window[scan + best_len]
                && window[candidate + best_len - 1] == window[scan + best_len - 1]
                && window[candidate] == window[scan]
                && window[candidate + 1] == window[scan + 1];

            if promising {
                let len = 2 + window[scan + 2..strend]
                    .iter()
                    .zip(&window[candidate + 2..])
                    .take_while(|(a, b)| a == b)
                    .count();

                if len > best_len {
                    self.match_start = candidate;
                    best_len = len;
                    if len >= nice_match {
                        break;
                    }
                }
            }

            cur_match = self.prev[cur_match & self.w_mask] as usize;
            if cur_match <= limit || chain_length <= 1 {
                break;
            }
            chain_length -= 1;
        }

        best_len.min(self.lookahead)
    }

    /// Load a preset dictionary into the window and index every string in it.
    ///
    /// Expects an empty lookahead; the caller moves `strstart` past the
    /// loaded bytes afterwards.
    pub(crate) fn load_dictionary(&mut self, dictionary: &[u8]) {
        let mut out = [0u8; 0];
        let mut strm = Stream::new(dictionary, &mut out);
        self.fill_window(&mut strm, None);
        while self.lookahead >= MIN_MATCH {
            let mut pos = self.strstart;
            let count = self.lookahead - (MIN_MATCH - 1);
            for _ in 0..count {
                self.insert_string(pos);
                pos += 1;
            }
            self.strstart = pos;
            self.lookahead = MIN_MATCH - 1;
            self.fill_window(&mut strm, None);
        }
    }
}

fn zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| OxiflateError::mem())?;
    buf.resize(len, T::default());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: MatchLimits = MatchLimits {
        max_chain: 4096,
        good_match: 32,
        nice_match: 258,
    };

    fn loaded(data: &[u8]) -> Lz77Window {
        let mut window = Lz77Window::new(15, 8).unwrap();
        let mut out = [0u8; 0];
        let mut strm = Stream::new(data, &mut out);
        let read = window.fill_window(&mut strm, None);
        assert_eq!(read, data.len().min(window.window_size()));
        window
    }

    /// Insert every string before `upto`, leaving `strstart` at `upto`.
    fn index_until(window: &mut Lz77Window, upto: usize) -> u16 {
        window.prime_hash(0);
        let mut head = NIL;
        for pos in 0..=upto {
            head = window.insert_string(pos);
        }
        window.strstart = upto;
        window.lookahead -= upto;
        head
    }

    #[test]
    fn test_fill_window_reads_and_checksums() {
        let mut window = Lz77Window::new(9, 1).unwrap();
        let data = vec![7u8; 100];
        let mut adler = 1u32;
        let mut out = [0u8; 0];
        let mut strm = Stream::new(&data, &mut out);
        let read = window.fill_window(&mut strm, Some(&mut adler));
        assert_eq!(read, 100);
        assert_eq!(window.lookahead, 100);
        assert_eq!(adler, adler32(1, &data));
    }

    #[test]
    fn test_longest_match_finds_repeat() {
        let data = b"hello, hello!\0";
        let mut window = loaded(data);
        let head = index_until(&mut window, 8);
        // The chain head for "ell" is position 1.
        assert_eq!(head, 1);
        let len = window.longest_match(head as usize, MIN_MATCH - 1, &LIMITS);
        assert_eq!(len, 4);
        assert_eq!(window.match_start, 1);
    }

    #[test]
    fn test_position_zero_is_never_matched() {
        let data = b"abcabc";
        let mut window = loaded(data);
        let head = index_until(&mut window, 3);
        assert_eq!(head, NIL);
    }

    #[test]
    fn test_match_clamped_to_lookahead() {
        let data = b"xabcdabcd";
        let mut window = loaded(data);
        let head = index_until(&mut window, 5);
        assert_eq!(head, 1);
        let len = window.longest_match(head as usize, MIN_MATCH - 1, &LIMITS);
        assert_eq!(len, 4);
        assert_eq!(len, window.lookahead);
    }

    #[test]
    fn test_slide_hash_rebases_positions() {
        let mut window = Lz77Window::new(9, 1).unwrap();
        window.head[3] = 700;
        window.head[4] = 100;
        window.prev[5] = 600;
        window.slide_hash();
        assert_eq!(window.head[3], 700 - 512);
        assert_eq!(window.head[4], NIL);
        assert_eq!(window.prev[5], 600 - 512);
    }

    #[test]
    fn test_window_slides_on_long_input() {
        let mut window = Lz77Window::new(9, 1).unwrap();
        let data: Vec<u8> = (0..4000u32).map(|i| (i * 7 % 256) as u8).collect();
        let mut out = [0u8; 0];
        let mut strm = Stream::new(&data, &mut out);
        window.fill_window(&mut strm, None);
        assert_eq!(window.lookahead, 1024);

        // Pretend everything up to the slide point was processed.
        window.strstart = window.w_size + window.max_dist();
        window.lookahead = 1024 - window.strstart;
        window.block_start = window.strstart as isize;
        window.fill_window(&mut strm, None);
        assert_eq!(window.strstart, window.max_dist());
        assert_eq!(window.block_start, window.max_dist() as isize);
        assert!(window.lookahead >= MIN_LOOKAHEAD);
    }

    #[test]
    fn test_load_dictionary_indexes_strings() {
        let mut window = Lz77Window::new(15, 8).unwrap();
        window.load_dictionary(b"the quick brown fox");
        assert_eq!(window.strstart + window.lookahead, 19);
        assert_eq!(window.lookahead, MIN_MATCH - 1);
    }
}
