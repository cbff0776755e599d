//! Block assembly: symbol buffering, block type selection and emission.
//!
//! Literals and matches are tallied into a symbol buffer while their
//! frequencies accumulate in the dynamic trees. When a block is closed the
//! trees are built and the cheapest of the three encodings is written:
//! stored, static trees or dynamic trees.

use oxiflate_core::bitstream::BitWriter;

use super::DataType;
use super::config::Strategy;
use crate::huffman::{Heap, TreeDesc, TreeNode, TreeStats};
use crate::tables::{
    BL_CODES, CODE_LENGTH_ORDER, D_CODES, DISTANCE_BASE, DISTANCE_EXTRA_BITS, DYN_TREES,
    END_BLOCK, HEAP_SIZE, L_CODES, LENGTH_BASE, LENGTH_CODE, LENGTH_EXTRA_BITS, LITERALS,
    MIN_MATCH, REP_3_6, REPZ_3_10, REPZ_11_138, STATIC_BL_DESC, STATIC_D_DESC, STATIC_DTREE,
    STATIC_L_DESC, STATIC_LTREE, STATIC_TREES, STORED_BLOCK, d_code,
};

/// Per-block symbol buffer and dynamic trees.
#[derive(Debug, Clone)]
pub(crate) struct BlockBuilder {
    l_desc: TreeDesc,
    d_desc: TreeDesc,
    bl_desc: TreeDesc,
    heap: Heap,
    stats: TreeStats,
    /// Three bytes per symbol: distance low, distance high, literal or
    /// length minus `MIN_MATCH`. A zero distance marks a literal.
    sym_buf: Vec<u8>,
    sym_next: usize,
    sym_end: usize,
}

impl BlockBuilder {
    /// A builder holding up to `lit_bufsize - 1` symbols per block.
    pub(crate) fn new(lit_bufsize: usize) -> oxiflate_core::Result<Self> {
        let mut sym_buf = Vec::new();
        sym_buf
            .try_reserve_exact(lit_bufsize * 3)
            .map_err(|_| oxiflate_core::OxiflateError::mem())?;
        sym_buf.resize(lit_bufsize * 3, 0);

        let mut builder = Self {
            l_desc: TreeDesc::new(HEAP_SIZE, &STATIC_L_DESC),
            d_desc: TreeDesc::new(2 * D_CODES + 1, &STATIC_D_DESC),
            bl_desc: TreeDesc::new(2 * BL_CODES + 1, &STATIC_BL_DESC),
            heap: Heap::new(HEAP_SIZE),
            stats: TreeStats::default(),
            sym_buf,
            sym_next: 0,
            sym_end: (lit_bufsize - 1) * 3,
        };
        builder.init_block();
        Ok(builder)
    }

    /// Start a new block.
    pub(crate) fn init_block(&mut self) {
        self.l_desc.clear_freqs();
        self.d_desc.clear_freqs();
        self.bl_desc.clear_freqs();
        self.l_desc.dyn_tree[END_BLOCK].set_freq(1);
        self.stats.opt_len = 0;
        self.stats.static_len = 0;
        self.sym_next = 0;
    }

    /// Whether the current block holds any symbol.
    #[inline]
    pub(crate) fn has_symbols(&self) -> bool {
        self.sym_next != 0
    }

    /// Record a literal. Returns true when the block must be flushed.
    #[inline]
    pub(crate) fn tally_lit(&mut self, c: u8) -> bool {
        self.sym_buf[self.sym_next] = 0;
        self.sym_buf[self.sym_next + 1] = 0;
        self.sym_buf[self.sym_next + 2] = c;
        self.sym_next += 3;
        self.l_desc.dyn_tree[c as usize].bump_freq();
        self.sym_next == self.sym_end
    }

    /// Record a match of `len + MIN_MATCH` bytes at distance `dist`.
    /// Returns true when the block must be flushed.
    #[inline]
    pub(crate) fn tally_dist(&mut self, dist: usize, len: usize) -> bool {
        self.sym_buf[self.sym_next] = dist as u8;
        self.sym_buf[self.sym_next + 1] = (dist >> 8) as u8;
        self.sym_buf[self.sym_next + 2] = len as u8;
        self.sym_next += 3;
        self.l_desc.dyn_tree[LENGTH_CODE[len] as usize + LITERALS + 1].bump_freq();
        self.d_desc.dyn_tree[d_code(dist - 1)].bump_freq();
        self.sym_next == self.sym_end
    }

    /// Close the current block and write it.
    ///
    /// `buf` holds the block's input bytes when they are still in the window,
    /// which makes a stored block possible. `level == 0` forces one.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn flush_block(
        &mut self,
        bits: &mut BitWriter,
        buf: Option<&[u8]>,
        stored_len: usize,
        last: bool,
        level: u8,
        strategy: Strategy,
        data_type: &mut DataType,
    ) {
        let mut max_blindex = 0;
        let (opt_lenb, static_lenb);

        if level > 0 {
            if *data_type == DataType::Unknown {
                *data_type = self.detect_data_type();
            }
            self.l_desc.build(&mut self.heap, &mut self.stats);
            self.d_desc.build(&mut self.heap, &mut self.stats);
            max_blindex = self.build_bl_tree();

            let dynamic = (self.stats.opt_len + 3 + 7) >> 3;
            static_lenb = (self.stats.static_len + 3 + 7) >> 3;
            opt_lenb = if static_lenb <= dynamic || strategy == Strategy::Fixed {
                static_lenb
            } else {
                dynamic
            };
            log::trace!(
                "block: lit {} dist {} opt {} static {} stored {}",
                self.l_desc.max_code,
                self.d_desc.max_code,
                self.stats.opt_len,
                self.stats.static_len,
                stored_len
            );
        } else {
            opt_lenb = stored_len + 5;
            static_lenb = opt_lenb;
        }

        let last_bit = u32::from(last);
        match buf {
            Some(buf) if stored_len + 4 <= opt_lenb => {
                log::trace!("stored block, {stored_len} bytes, last {last}");
                stored_block(bits, buf, last);
            }
            _ if static_lenb == opt_lenb => {
                log::trace!("static block, last {last}");
                bits.send_bits((STATIC_TREES << 1) + last_bit, 3);
                self.compress_block(bits, &STATIC_LTREE, &STATIC_DTREE);
            }
            _ => {
                log::trace!("dynamic block, last {last}");
                bits.send_bits((DYN_TREES << 1) + last_bit, 3);
                self.send_all_trees(
                    bits,
                    self.l_desc.max_code + 1,
                    self.d_desc.max_code + 1,
                    max_blindex + 1,
                );
                self.compress_block(bits, &self.l_desc.dyn_tree, &self.d_desc.dyn_tree);
            }
        }

        self.init_block();
        if last {
            bits.windup();
        }
    }

    /// Build the code-length tree and return the index in
    /// `CODE_LENGTH_ORDER` of the last code length to transmit.
    fn build_bl_tree(&mut self) -> usize {
        scan_tree(
            &mut self.l_desc.dyn_tree,
            self.l_desc.max_code,
            &mut self.bl_desc.dyn_tree,
        );
        scan_tree(
            &mut self.d_desc.dyn_tree,
            self.d_desc.max_code,
            &mut self.bl_desc.dyn_tree,
        );
        self.bl_desc.build(&mut self.heap, &mut self.stats);

        // At least four code lengths are always sent.
        let mut max_blindex = BL_CODES - 1;
        while max_blindex >= 3 {
            if self.bl_desc.dyn_tree[CODE_LENGTH_ORDER[max_blindex]].len() != 0 {
                break;
            }
            max_blindex -= 1;
        }
        self.stats.opt_len = self
            .stats
            .opt_len
            .wrapping_add(3 * (max_blindex + 1) + 5 + 5 + 4);
        max_blindex
    }

    fn send_all_trees(&self, bits: &mut BitWriter, lcodes: usize, dcodes: usize, blcodes: usize) {
        bits.send_bits((lcodes - 257) as u32, 5);
        bits.send_bits((dcodes - 1) as u32, 5);
        bits.send_bits((blcodes - 4) as u32, 4);
        for &symbol in &CODE_LENGTH_ORDER[..blcodes] {
            bits.send_bits(u32::from(self.bl_desc.dyn_tree[symbol].len()), 3);
        }
        send_tree(bits, &self.l_desc.dyn_tree, lcodes - 1, &self.bl_desc.dyn_tree);
        send_tree(bits, &self.d_desc.dyn_tree, dcodes - 1, &self.bl_desc.dyn_tree);
    }

    /// Emit the buffered symbols with the given trees, then end-of-block.
    fn compress_block(&self, bits: &mut BitWriter, ltree: &[TreeNode], dtree: &[TreeNode]) {
        for sym in self.sym_buf[..self.sym_next].chunks_exact(3) {
            let dist = usize::from(sym[0]) | usize::from(sym[1]) << 8;
            let lc = usize::from(sym[2]);

            if dist == 0 {
                send_code(bits, lc, ltree);
                continue;
            }

            let code = LENGTH_CODE[lc] as usize;
            send_code(bits, code + LITERALS + 1, ltree);
            let extra = u32::from(LENGTH_EXTRA_BITS[code]);
            if extra != 0 {
                let base = usize::from(LENGTH_BASE[code]) - MIN_MATCH;
                bits.send_bits((lc - base) as u32, extra);
            }

            let dist = dist - 1;
            let code = d_code(dist);
            send_code(bits, code, dtree);
            let extra = u32::from(DISTANCE_EXTRA_BITS[code]);
            if extra != 0 {
                let base = usize::from(DISTANCE_BASE[code]) - 1;
                bits.send_bits((dist - base) as u32, extra);
            }
        }
        send_code(bits, END_BLOCK, ltree);
    }

    /// Guess whether the block is text: any control character other than
    /// tab, line feed, carriage return and a few legacy ones means binary.
    fn detect_data_type(&self) -> DataType {
        let tree = &self.l_desc.dyn_tree;
        let mut block_mask: u32 = 0xf3ff_c07f;
        for node in &tree[..32] {
            if block_mask & 1 != 0 && node.freq() != 0 {
                return DataType::Binary;
            }
            block_mask >>= 1;
        }
        if tree[9].freq() != 0 || tree[10].freq() != 0 || tree[13].freq() != 0 {
            return DataType::Text;
        }
        if tree[32..LITERALS].iter().any(|node| node.freq() != 0) {
            return DataType::Text;
        }
        DataType::Binary
    }
}

/// Write a stored block holding `buf`.
pub(crate) fn stored_block(bits: &mut BitWriter, buf: &[u8], last: bool) {
    bits.send_bits((STORED_BLOCK << 1) + u32::from(last), 3);
    bits.windup();
    let len = buf.len() as u16;
    bits.put_short(len);
    bits.put_short(!len);
    bits.put_bytes(buf);
}

/// Write an empty static block, which lets the decoder catch up on every
/// complete symbol without the byte alignment of a stored block.
pub(crate) fn align(bits: &mut BitWriter) {
    bits.send_bits(STATIC_TREES << 1, 3);
    send_code(bits, END_BLOCK, &STATIC_LTREE);
    bits.flush_bits();
}

#[inline]
fn send_code(bits: &mut BitWriter, symbol: usize, tree: &[TreeNode]) {
    let node = tree[symbol];
    bits.send_bits(u32::from(node.code()), u32::from(node.len()));
}

/// Run-length parameters following a code length of `curlen` when the next
/// one is `nextlen`: (max_count, min_count).
#[inline]
fn run_limits(curlen: u16, nextlen: u16) -> (usize, usize) {
    if nextlen == 0 {
        (138, 3)
    } else if curlen == nextlen {
        (6, 3)
    } else {
        (7, 4)
    }
}

/// Count the code-length symbols needed to send `tree`, accumulating their
/// frequencies in `bl_tree`.
fn scan_tree(tree: &mut [TreeNode], max_code: usize, bl_tree: &mut [TreeNode]) {
    let mut prevlen: i32 = -1;
    let mut nextlen = tree[0].len();
    let mut count = 0;
    let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

    // Guard so the last run always ends.
    tree[max_code + 1].set_len(0xffff);

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = tree[n + 1].len();
        count += 1;
        if count < max_count && curlen == nextlen {
            continue;
        } else if count < min_count {
            bl_tree[usize::from(curlen)].add_freq(count as u16);
        } else if curlen != 0 {
            if i32::from(curlen) != prevlen {
                bl_tree[usize::from(curlen)].bump_freq();
            }
            bl_tree[REP_3_6].bump_freq();
        } else if count <= 10 {
            bl_tree[REPZ_3_10].bump_freq();
        } else {
            bl_tree[REPZ_11_138].bump_freq();
        }
        count = 0;
        prevlen = i32::from(curlen);
        (max_count, min_count) = run_limits(curlen, nextlen);
    }
}

/// Send `tree` run-length encoded with the code-length code `bl_tree`.
/// Relies on the guard written by [`scan_tree`].
fn send_tree(bits: &mut BitWriter, tree: &[TreeNode], max_code: usize, bl_tree: &[TreeNode]) {
    let mut prevlen: i32 = -1;
    let mut nextlen = tree[0].len();
    let mut count = 0;
    let (mut max_count, mut min_count) = if nextlen == 0 { (138, 3) } else { (7, 4) };

    for n in 0..=max_code {
        let curlen = nextlen;
        nextlen = tree[n + 1].len();
        count += 1;
        if count < max_count && curlen == nextlen {
            continue;
        } else if count < min_count {
            for _ in 0..count {
                send_code(bits, usize::from(curlen), bl_tree);
            }
        } else if curlen != 0 {
            if i32::from(curlen) != prevlen {
                send_code(bits, usize::from(curlen), bl_tree);
                count -= 1;
            }
            send_code(bits, REP_3_6, bl_tree);
            bits.send_bits((count - 3) as u32, 2);
        } else if count <= 10 {
            send_code(bits, REPZ_3_10, bl_tree);
            bits.send_bits((count - 3) as u32, 3);
        } else {
            send_code(bits, REPZ_11_138, bl_tree);
            bits.send_bits((count - 11) as u32, 7);
        }
        count = 0;
        prevlen = i32::from(curlen);
        (max_count, min_count) = run_limits(curlen, nextlen);
    }
}

// Keep the node count in step with the alphabet sizes.
const _: () = assert!(HEAP_SIZE == 2 * L_CODES + 1);
