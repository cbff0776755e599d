//! Huffman tree construction for DEFLATE compression.
//!
//! DEFLATE uses length-limited canonical Huffman codes. Trees are built from
//! symbol frequencies with a binary min-heap, code lengths are capped at the
//! alphabet's limit with the zlib overflow redistribution, and codes are
//! assigned canonically and stored bit-reversed, ready for LSB-first output.
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)
//!
//! The engine drives [`build_tree`] directly on its per-block trees;
//! [`HuffmanBuilder`] wraps the same algorithm for standalone use.

use crate::tables::MAX_BITS;

/// Index of the root of the heap.
const SMALLEST: usize = 1;

/// One node of a Huffman tree.
///
/// Like zlib, each half does double duty: `fc` holds the frequency while the
/// tree is built and the code afterwards; `dl` holds the parent index while
/// the tree is built and the code length afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeNode {
    fc: u16,
    dl: u16,
}

impl TreeNode {
    /// A node with all fields zero.
    pub const ZERO: Self = Self { fc: 0, dl: 0 };

    pub(crate) const fn new(fc: u16, dl: u16) -> Self {
        Self { fc, dl }
    }

    /// The (bit-reversed) code of a finished tree.
    #[inline]
    pub fn code(&self) -> u16 {
        self.fc
    }

    /// The code length of a finished tree.
    #[inline]
    pub fn len(&self) -> u16 {
        self.dl
    }

    #[inline]
    pub(crate) fn freq(&self) -> u16 {
        self.fc
    }

    #[inline]
    pub(crate) fn set_freq(&mut self, freq: u16) {
        self.fc = freq;
    }

    #[inline]
    pub(crate) fn bump_freq(&mut self) {
        self.fc += 1;
    }

    #[inline]
    pub(crate) fn add_freq(&mut self, count: u16) {
        self.fc += count;
    }

    #[inline]
    pub(crate) fn set_len(&mut self, len: u16) {
        self.dl = len;
    }
}

/// Static description of an alphabet.
#[derive(Debug)]
pub(crate) struct StaticTreeDesc<'a> {
    /// Fixed-code equivalent, or empty for the code-length alphabet.
    pub(crate) static_tree: &'a [TreeNode],
    /// Extra bits per symbol, starting at `extra_base`.
    pub(crate) extra_bits: &'a [u8],
    pub(crate) extra_base: usize,
    /// Number of symbols.
    pub(crate) elems: usize,
    pub(crate) max_length: u16,
}

/// A dynamic tree together with its alphabet.
#[derive(Debug, Clone)]
pub(crate) struct TreeDesc {
    pub(crate) dyn_tree: Vec<TreeNode>,
    /// Largest symbol with a nonzero frequency.
    pub(crate) max_code: usize,
    pub(crate) stat_desc: &'static StaticTreeDesc<'static>,
}

impl TreeDesc {
    pub(crate) fn new(nodes: usize, stat_desc: &'static StaticTreeDesc<'static>) -> Self {
        Self {
            dyn_tree: vec![TreeNode::ZERO; nodes],
            max_code: 0,
            stat_desc,
        }
    }

    /// Zero the frequencies of every symbol.
    pub(crate) fn clear_freqs(&mut self) {
        let elems = self.stat_desc.elems;
        for node in &mut self.dyn_tree[..elems] {
            node.set_freq(0);
        }
    }

    /// Build the tree from its frequencies; see [`build_tree`].
    pub(crate) fn build(&mut self, heap: &mut Heap, stats: &mut TreeStats) {
        self.max_code = build_tree(&mut self.dyn_tree, self.stat_desc, heap, stats);
    }
}

/// Bit-cost accumulators and the length histogram produced by tree building.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeStats {
    pub(crate) bl_count: [u16; MAX_BITS + 1],
    /// Bits for the block with the dynamic trees. Wraps transiently, as the
    /// filler-node adjustment subtracts before the lengths add back.
    pub(crate) opt_len: usize,
    /// Bits for the block with the static trees.
    pub(crate) static_len: usize,
}

/// Min-heap of tree nodes plus the depth tie-breaker.
///
/// Slots `1..=len` hold the heap; slots `max..` collect the nodes in the
/// order they were combined, which is the order lengths are assigned in.
#[derive(Debug, Clone)]
pub(crate) struct Heap {
    heap: Vec<usize>,
    depth: Vec<u8>,
    len: usize,
    max: usize,
}

impl Heap {
    /// A heap for alphabets of up to `(size - 1) / 2` symbols.
    pub(crate) fn new(size: usize) -> Self {
        Self {
            heap: vec![0; size],
            depth: vec![0; size],
            len: 0,
            max: size,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    fn smaller(&self, tree: &[TreeNode], n: usize, m: usize) -> bool {
        let (fn_, fm) = (tree[n].freq(), tree[m].freq());
        fn_ < fm || (fn_ == fm && self.depth[n] <= self.depth[m])
    }

    /// Restore the heap property by moving node `k` down.
    fn pqdownheap(&mut self, tree: &[TreeNode], mut k: usize) {
        let v = self.heap[k];
        let mut j = k << 1;
        while j <= self.len {
            if j < self.len && self.smaller(tree, self.heap[j + 1], self.heap[j]) {
                j += 1;
            }
            if self.smaller(tree, v, self.heap[j]) {
                break;
            }
            self.heap[k] = self.heap[j];
            k = j;
            j <<= 1;
        }
        self.heap[k] = v;
    }

    /// Remove and return the least frequent node.
    fn pqremove(&mut self, tree: &[TreeNode]) -> usize {
        let top = self.heap[SMALLEST];
        self.heap[SMALLEST] = self.heap[self.len];
        self.len -= 1;
        self.pqdownheap(tree, SMALLEST);
        top
    }
}

/// Reverse the low `len` bits of `code`. `len` is 1..=15.
#[inline]
pub const fn bi_reverse(code: u16, len: u16) -> u16 {
    code.reverse_bits() >> (16 - len)
}

/// Build a length-limited Huffman tree over `tree[..stat.elems]`.
///
/// On entry the leaves carry frequencies. On return every leaf carries its
/// code length and bit-reversed code, `stats.bl_count` holds the length
/// histogram, and `opt_len`/`static_len` have been increased by the cost of
/// coding the symbols with this tree and with the static tree. Returns the
/// largest symbol with a nonzero frequency.
///
/// At least two codes are always produced, since the format cannot express
/// a one-code tree; a missing second symbol gets frequency 1.
pub(crate) fn build_tree(
    tree: &mut [TreeNode],
    stat: &StaticTreeDesc<'_>,
    heap: &mut Heap,
    stats: &mut TreeStats,
) -> usize {
    let stree = stat.static_tree;
    let elems = stat.elems;
    let mut max_code: isize = -1;

    heap.len = 0;
    heap.max = heap.capacity();

    for n in 0..elems {
        if tree[n].freq() != 0 {
            heap.len += 1;
            heap.heap[heap.len] = n;
            max_code = n as isize;
            heap.depth[n] = 0;
        } else {
            tree[n].set_len(0);
        }
    }

    while heap.len < 2 {
        let node = if max_code < 2 {
            max_code += 1;
            max_code as usize
        } else {
            0
        };
        heap.len += 1;
        heap.heap[heap.len] = node;
        tree[node].set_freq(1);
        heap.depth[node] = 0;
        stats.opt_len = stats.opt_len.wrapping_sub(1);
        if !stree.is_empty() {
            stats.static_len = stats.static_len.wrapping_sub(usize::from(stree[node].len()));
        }
    }
    let max_code = max_code as usize;

    for n in (1..=heap.len / 2).rev() {
        heap.pqdownheap(tree, n);
    }

    let mut node = elems;
    loop {
        let n = heap.pqremove(tree);
        let m = heap.heap[SMALLEST];

        heap.max -= 1;
        heap.heap[heap.max] = n;
        heap.max -= 1;
        heap.heap[heap.max] = m;

        let freq = tree[n].freq() + tree[m].freq();
        tree[node].set_freq(freq);
        heap.depth[node] = heap.depth[n].max(heap.depth[m]) + 1;
        tree[n].dl = node as u16;
        tree[m].dl = node as u16;

        heap.heap[SMALLEST] = node;
        node += 1;
        heap.pqdownheap(tree, SMALLEST);

        if heap.len < 2 {
            break;
        }
    }

    heap.max -= 1;
    heap.heap[heap.max] = heap.heap[SMALLEST];

    gen_bitlen(tree, max_code, stat, heap, stats);
    gen_codes(tree, max_code, &stats.bl_count);
    max_code
}

/// Assign code lengths from the combined tree, enforcing `max_length`.
fn gen_bitlen(
    tree: &mut [TreeNode],
    max_code: usize,
    stat: &StaticTreeDesc<'_>,
    heap: &Heap,
    stats: &mut TreeStats,
) {
    let stree = stat.static_tree;
    let extra = stat.extra_bits;
    let base = stat.extra_base;
    let max_length = stat.max_length;
    let size = heap.capacity();

    stats.bl_count.fill(0);

    // The root has length zero; each node is one deeper than its parent.
    // Parents precede children in heap order, so parents are finished first.
    tree[heap.heap[heap.max]].dl = 0;

    let mut overflow: i32 = 0;
    for h in heap.max + 1..size {
        let n = heap.heap[h];
        let mut bits = tree[tree[n].dl as usize].dl + 1;
        if bits > max_length {
            bits = max_length;
            overflow += 1;
        }
        tree[n].dl = bits;

        if n > max_code {
            continue; // not a leaf
        }

        stats.bl_count[bits as usize] += 1;
        let xbits = if n >= base { usize::from(extra[n - base]) } else { 0 };
        let f = usize::from(tree[n].freq());
        stats.opt_len = stats.opt_len.wrapping_add(f * (bits as usize + xbits));
        if !stree.is_empty() {
            stats.static_len = stats
                .static_len
                .wrapping_add(f * (usize::from(stree[n].len()) + xbits));
        }
    }

    if overflow == 0 {
        return;
    }
    log::trace!("bit length overflow: {overflow} codes over {max_length} bits");

    let max_length = max_length as usize;
    loop {
        let mut bits = max_length - 1;
        while stats.bl_count[bits] == 0 {
            bits -= 1;
        }
        // Move one leaf down the tree and its overflowing sibling up.
        stats.bl_count[bits] -= 1;
        stats.bl_count[bits + 1] += 2;
        stats.bl_count[max_length] -= 1;
        overflow -= 2;
        if overflow <= 0 {
            break;
        }
    }

    // Reassign lengths from the least frequent leaf upwards.
    let mut h = size;
    for bits in (1..=max_length).rev() {
        let mut n = stats.bl_count[bits];
        while n != 0 {
            h -= 1;
            let m = heap.heap[h];
            if m > max_code {
                continue;
            }
            let len = usize::from(tree[m].dl);
            if len != bits {
                let f = usize::from(tree[m].freq());
                stats.opt_len = stats.opt_len.wrapping_add(bits * f).wrapping_sub(len * f);
                tree[m].dl = bits as u16;
            }
            n -= 1;
        }
    }
}

/// Assign canonical codes to `tree[..=max_code]` from their lengths.
pub(crate) fn gen_codes(tree: &mut [TreeNode], max_code: usize, bl_count: &[u16; MAX_BITS + 1]) {
    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + u32::from(bl_count[bits - 1])) << 1;
        next_code[bits] = code;
    }

    for node in &mut tree[..=max_code] {
        let len = node.dl;
        if len == 0 {
            continue;
        }
        node.fc = bi_reverse(next_code[len as usize] as u16, len);
        next_code[len as usize] += 1;
    }
}

/// A canonical Huffman code: per-symbol lengths and bit-reversed codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Code length of each symbol; zero for unused symbols.
    pub lengths: Vec<u8>,
    /// Bit-reversed code of each symbol, ready for LSB-first output.
    pub codes: Vec<u16>,
}

impl HuffmanCode {
    /// Total bits needed to code `frequencies` with this code.
    pub fn cost(&self, frequencies: &[u32]) -> u64 {
        self.lengths
            .iter()
            .zip(frequencies)
            .map(|(&len, &f)| u64::from(len) * u64::from(f))
            .sum()
    }
}

/// Builder for creating length-limited Huffman codes from frequencies.
///
/// This is a standalone entry point to the tree builder the deflate engine
/// uses for its dynamic blocks, for callers that want DEFLATE-compatible
/// canonical codes of their own (for example to estimate block cost or to
/// emit custom code-length tables). The engine itself works on its
/// per-block trees directly and does not go through this type.
///
/// # Example
///
/// ```
/// use oxiflate::HuffmanBuilder;
///
/// let mut builder = HuffmanBuilder::new(4, 15);
/// builder.add_count(0, 10);
/// builder.add_count(1, 5);
/// builder.add_count(2, 1);
/// let code = builder.build();
/// assert_eq!(code.lengths, [1, 2, 2, 0]);
/// assert_eq!(code.cost(&[10, 5, 1, 0]), 22);
/// ```
#[derive(Debug, Clone)]
pub struct HuffmanBuilder {
    frequencies: Vec<u32>,
    max_length: u8,
}

impl HuffmanBuilder {
    /// Create a new Huffman builder.
    ///
    /// Alphabets have at least two symbols; `max_length` is clamped to 1-15.
    pub fn new(alphabet_size: usize, max_length: u8) -> Self {
        Self {
            frequencies: vec![0; alphabet_size.max(2)],
            max_length: max_length.clamp(1, MAX_BITS as u8),
        }
    }

    /// Add a symbol occurrence.
    pub fn add(&mut self, symbol: u16) {
        self.add_count(symbol, 1);
    }

    /// Add multiple occurrences of a symbol.
    pub fn add_count(&mut self, symbol: u16, count: u32) {
        if let Some(f) = self.frequencies.get_mut(symbol as usize) {
            *f = f.saturating_add(count);
        }
    }

    /// The accumulated frequencies.
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    /// Build the code.
    ///
    /// Symbols with zero frequency get length zero, except that at least two
    /// symbols always receive a code.
    pub fn build(&self) -> HuffmanCode {
        let n = self.frequencies.len();
        let mut tree = vec![TreeNode::ZERO; 2 * n + 1];

        // Node frequencies are 16 bits; scale large totals down, keeping
        // every used symbol at least at 1.
        let total: u64 = self.frequencies.iter().map(|&f| u64::from(f)).sum();
        let shift = (0..32)
            .find(|&s| (total >> s) + n as u64 <= u64::from(u16::MAX))
            .unwrap_or(32);
        for (node, &f) in tree.iter_mut().zip(&self.frequencies) {
            if f != 0 {
                node.set_freq(((u64::from(f) >> shift).max(1)) as u16);
            }
        }

        // The length limit cannot be lower than the used alphabet allows.
        let used = self.frequencies.iter().filter(|&&f| f != 0).count().max(2);
        let mut max_length = u16::from(self.max_length);
        while (1usize << max_length) < used {
            max_length += 1;
        }

        let stat = StaticTreeDesc {
            static_tree: &[],
            extra_bits: &[],
            extra_base: n,
            elems: n,
            max_length,
        };
        let mut heap = Heap::new(2 * n + 1);
        let mut stats = TreeStats::default();
        build_tree(&mut tree, &stat, &mut heap, &mut stats);

        HuffmanCode {
            lengths: tree[..n].iter().map(|node| node.len() as u8).collect(),
            codes: tree[..n]
                .iter()
                .map(|node| if node.len() == 0 { 0 } else { node.code() })
                .collect(),
        }
    }

    /// Build code lengths from frequencies.
    ///
    /// Returns an array where `result[i]` is the code length for symbol `i`.
    pub fn build_lengths(&self) -> Vec<u8> {
        self.build().lengths
    }
}
