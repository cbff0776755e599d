//! Block-building loops, one per level family and special strategy.
//!
//! Each loop runs until it needs more input (or output space) or until the
//! requested flush has been handled, and reports which through
//! [`BlockState`].

use oxiflate_core::stream::Stream;
use oxiflate_core::traits::FlushMode;

use super::config::Strategy;
use super::{BlockState, Deflater};
use crate::lz77::NIL;
use crate::tables::{MAX_MATCH, MIN_LOOKAHEAD, MIN_MATCH};

/// Matches of length 3 are discarded if their distance exceeds this.
const TOO_FAR: usize = 4096;

impl Deflater {
    /// Copy input into stored blocks, without compression.
    pub(super) fn deflate_stored(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> BlockState {
        // Stored blocks are limited to 0xffff bytes and must fit in the
        // pending buffer along with their 5-byte header.
        let max_block_size = 0xffff.min(self.pending_buf_size - 5) as isize;

        loop {
            if self.window.lookahead <= 1 {
                self.fill_window(strm);
                if self.window.lookahead == 0 {
                    if flush == FlushMode::None {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            let window = &mut self.window;
            window.strstart += window.lookahead;
            window.lookahead = 0;

            let max_start = window.block_start + max_block_size;
            if window.strstart as isize >= max_start {
                window.lookahead = (window.strstart as isize - max_start) as usize;
                window.strstart = max_start as usize;
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }

            // Flush before the block start would slide out of the window.
            let window = &self.window;
            if (window.strstart as isize - window.block_start) as usize >= window.max_dist() {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.window.insert = 0;
        let pending = self.window.strstart as isize > self.window.block_start;
        self.finish_block(strm, flush, pending)
    }

    /// Greedy matching: take the longest match at each position and never
    /// look further ahead.
    pub(super) fn deflate_fast(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> BlockState {
        loop {
            if self.window.lookahead < MIN_LOOKAHEAD {
                self.fill_window(strm);
                if self.window.lookahead < MIN_LOOKAHEAD && flush == FlushMode::None {
                    return BlockState::NeedMore;
                }
                if self.window.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = NIL;
            if self.window.lookahead >= MIN_MATCH {
                hash_head = self.window.insert_string(self.window.strstart);
            }

            let strstart = self.window.strstart;
            if hash_head != NIL && strstart - usize::from(hash_head) <= self.window.max_dist() {
                let limits = self.match_limits();
                self.match_length =
                    self.window
                        .longest_match(usize::from(hash_head), self.prev_length, &limits);
            }

            let bflush;
            if self.match_length >= MIN_MATCH {
                let window = &mut self.window;
                bflush = self
                    .block
                    .tally_dist(window.strstart - window.match_start, self.match_length - MIN_MATCH);
                window.lookahead -= self.match_length;

                // Hash every string of a short match; skip the long ones.
                if self.match_length <= self.max_lazy_match && window.lookahead >= MIN_MATCH {
                    for _ in 1..self.match_length {
                        window.strstart += 1;
                        window.insert_string(window.strstart);
                    }
                    window.strstart += 1;
                } else {
                    window.strstart += self.match_length;
                    window.prime_hash(window.strstart);
                }
                self.match_length = 0;
            } else {
                let window = &mut self.window;
                bflush = self.block.tally_lit(window.window[window.strstart]);
                window.lookahead -= 1;
                window.strstart += 1;
            }

            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.window.insert = self.window.strstart.min(MIN_MATCH - 1);
        let pending = self.block.has_symbols();
        self.finish_block(strm, flush, pending)
    }

    /// Lazy matching: a match is only emitted once the next position has
    /// been checked for a longer one.
    pub(super) fn deflate_slow(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> BlockState {
        loop {
            if self.window.lookahead < MIN_LOOKAHEAD {
                self.fill_window(strm);
                if self.window.lookahead < MIN_LOOKAHEAD && flush == FlushMode::None {
                    return BlockState::NeedMore;
                }
                if self.window.lookahead == 0 {
                    break;
                }
            }

            let mut hash_head = NIL;
            if self.window.lookahead >= MIN_MATCH {
                hash_head = self.window.insert_string(self.window.strstart);
            }

            self.prev_length = self.match_length;
            self.prev_match = self.window.match_start;
            self.match_length = MIN_MATCH - 1;

            let strstart = self.window.strstart;
            if hash_head != NIL
                && self.prev_length < self.max_lazy_match
                && strstart - usize::from(hash_head) <= self.window.max_dist()
            {
                let limits = self.match_limits();
                self.match_length =
                    self.window
                        .longest_match(usize::from(hash_head), self.prev_length, &limits);

                if self.match_length <= 5
                    && (self.strategy == Strategy::Filtered
                        || (self.match_length == MIN_MATCH
                            && strstart - self.window.match_start > TOO_FAR))
                {
                    // Not worth a match: a literal is likely cheaper.
                    self.match_length = MIN_MATCH - 1;
                }
            }

            if self.prev_length >= MIN_MATCH && self.match_length <= self.prev_length {
                // The previous match is at least as good: emit it.
                let window = &mut self.window;
                let max_insert = window.strstart + window.lookahead - MIN_MATCH;
                let bflush = self.block.tally_dist(
                    window.strstart - 1 - self.prev_match,
                    self.prev_length - MIN_MATCH,
                );

                // Insert the strings covered by the match. strstart - 1 and
                // strstart are already in the chains.
                window.lookahead -= self.prev_length - 1;
                for _ in 0..self.prev_length - 2 {
                    window.strstart += 1;
                    if window.strstart <= max_insert {
                        window.insert_string(window.strstart);
                    }
                }
                self.prev_length = 0;
                self.match_available = false;
                self.match_length = MIN_MATCH - 1;
                window.strstart += 1;

                if bflush {
                    if let Some(state) = self.flush_block(strm, false) {
                        return state;
                    }
                }
            } else if self.match_available {
                // No better match here: emit the previous byte as a literal.
                let window = &self.window;
                let bflush = self.block.tally_lit(window.window[window.strstart - 1]);
                if bflush {
                    self.flush_block_only(strm, false);
                }
                self.window.strstart += 1;
                self.window.lookahead -= 1;
                if strm.avail_out() == 0 {
                    return BlockState::NeedMore;
                }
            } else {
                // Wait one step before deciding.
                self.match_available = true;
                self.window.strstart += 1;
                self.window.lookahead -= 1;
            }
        }

        debug_assert!(flush != FlushMode::None, "no flush?");
        if self.match_available {
            let window = &self.window;
            self.block.tally_lit(window.window[window.strstart - 1]);
            self.match_available = false;
        }

        self.window.insert = self.window.strstart.min(MIN_MATCH - 1);
        let pending = self.block.has_symbols();
        self.finish_block(strm, flush, pending)
    }

    /// Run-length encoding: only matches at distance one.
    pub(super) fn deflate_rle(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> BlockState {
        loop {
            // Keep a full match length ahead so runs are not cut short.
            if self.window.lookahead <= MAX_MATCH {
                self.fill_window(strm);
                if self.window.lookahead <= MAX_MATCH && flush == FlushMode::None {
                    return BlockState::NeedMore;
                }
                if self.window.lookahead == 0 {
                    break;
                }
            }

            self.match_length = 0;
            let window = &self.window;
            if window.lookahead >= MIN_MATCH && window.strstart > 0 {
                let scan = window.strstart;
                let prev = window.window[scan - 1];
                let end = (scan + MAX_MATCH).min(window.window.len());
                let run = window.window[scan..end]
                    .iter()
                    .take_while(|&&byte| byte == prev)
                    .count();
                if run >= MIN_MATCH {
                    self.match_length = run.min(window.lookahead);
                }
            }

            let bflush;
            if self.match_length >= MIN_MATCH {
                bflush = self.block.tally_dist(1, self.match_length - MIN_MATCH);
                self.window.lookahead -= self.match_length;
                self.window.strstart += self.match_length;
                self.match_length = 0;
            } else {
                let window = &mut self.window;
                bflush = self.block.tally_lit(window.window[window.strstart]);
                window.lookahead -= 1;
                window.strstart += 1;
            }

            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.window.insert = 0;
        let pending = self.block.has_symbols();
        self.finish_block(strm, flush, pending)
    }

    /// Literals only; the Huffman coding does all the work.
    pub(super) fn deflate_huff(&mut self, strm: &mut Stream<'_>, flush: FlushMode) -> BlockState {
        loop {
            if self.window.lookahead == 0 {
                self.fill_window(strm);
                if self.window.lookahead == 0 {
                    if flush == FlushMode::None {
                        return BlockState::NeedMore;
                    }
                    break;
                }
            }

            self.match_length = 0;
            let window = &mut self.window;
            let bflush = self.block.tally_lit(window.window[window.strstart]);
            window.lookahead -= 1;
            window.strstart += 1;

            if bflush {
                if let Some(state) = self.flush_block(strm, false) {
                    return state;
                }
            }
        }

        self.window.insert = 0;
        let pending = self.block.has_symbols();
        self.finish_block(strm, flush, pending)
    }

    /// Common tail of every loop once input is exhausted under a flush:
    /// close the last block on `Finish`, otherwise close the current block
    /// if it holds anything.
    fn finish_block(&mut self, strm: &mut Stream<'_>, flush: FlushMode, pending: bool) -> BlockState {
        if flush == FlushMode::Finish {
            return self
                .flush_block(strm, true)
                .unwrap_or(BlockState::FinishDone);
        }
        if pending {
            if let Some(state) = self.flush_block(strm, false) {
                return state;
            }
        }
        BlockState::BlockDone
    }
}
