//! Constant tables for DEFLATE (RFC 1951).
//!
//! Everything here is computed at compile time: the length/distance code
//! maps used by the encoder, the extra-bit tables shared by both directions,
//! and the static Huffman trees with their codes already bit-reversed for
//! LSB-first output.

use crate::huffman::{StaticTreeDesc, TreeNode, bi_reverse};

/// Maximum code length of any Huffman code.
pub const MAX_BITS: usize = 15;
/// Maximum code length of the code-length alphabet.
pub const MAX_BL_BITS: usize = 7;
/// Number of literal byte symbols.
pub const LITERALS: usize = 256;
/// Number of length codes, not counting end-of-block.
pub const LENGTH_CODES: usize = 29;
/// Literal/length alphabet size used by the encoder.
pub const L_CODES: usize = LITERALS + 1 + LENGTH_CODES;
/// Distance alphabet size.
pub const D_CODES: usize = 30;
/// Code-length alphabet size.
pub const BL_CODES: usize = 19;
/// Node storage for the largest tree, leaves plus internal nodes.
pub const HEAP_SIZE: usize = 2 * L_CODES + 1;
/// End-of-block symbol.
pub const END_BLOCK: usize = 256;

/// Repeat previous length 3-6 times (2 extra bits).
pub const REP_3_6: usize = 16;
/// Repeat a zero length 3-10 times (3 extra bits).
pub const REPZ_3_10: usize = 17;
/// Repeat a zero length 11-138 times (7 extra bits).
pub const REPZ_11_138: usize = 18;

/// Shortest match.
pub const MIN_MATCH: usize = 3;
/// Longest match.
pub const MAX_MATCH: usize = 258;
/// Lookahead kept available so a match never runs past the input.
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Block type: stored.
pub const STORED_BLOCK: u32 = 0;
/// Block type: fixed Huffman codes.
pub const STATIC_TREES: u32 = 1;
/// Block type: dynamic Huffman codes.
pub const DYN_TREES: u32 = 2;

/// Length code base values (RFC 1951 Section 3.2.5).
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Distance code base values (RFC 1951 Section 3.2.5).
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Number of extra bits for each code-length code.
pub const BL_EXTRA_BITS: [u8; 19] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

/// Order of code length codes in dynamic block header (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Length code (0-28) for each match length minus `MIN_MATCH`.
pub const LENGTH_CODE: [u8; 256] = build_length_code();

/// Distance code for distances 0..256, then for `256 + (dist >> 7)`.
pub const DIST_CODE: [u8; 512] = build_dist_code();

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub const FIXED_LITLEN_LENGTHS: [u8; 288] = fixed_litlen_lengths();

/// Fixed distance code lengths: all 30 codes use 5 bits.
pub const FIXED_DISTANCE_LENGTHS: [u8; 30] = [5; 30];

/// Static literal/length tree (codes reversed).
pub static STATIC_LTREE: [TreeNode; L_CODES + 2] = static_tree(FIXED_LITLEN_LENGTHS);

/// Static distance tree (codes reversed).
pub static STATIC_DTREE: [TreeNode; D_CODES] = static_tree(FIXED_DISTANCE_LENGTHS);

pub(crate) static STATIC_L_DESC: StaticTreeDesc<'static> = StaticTreeDesc {
    static_tree: &STATIC_LTREE,
    extra_bits: &LENGTH_EXTRA_BITS,
    extra_base: LITERALS + 1,
    elems: L_CODES,
    max_length: MAX_BITS as u16,
};

pub(crate) static STATIC_D_DESC: StaticTreeDesc<'static> = StaticTreeDesc {
    static_tree: &STATIC_DTREE,
    extra_bits: &DISTANCE_EXTRA_BITS,
    extra_base: 0,
    elems: D_CODES,
    max_length: MAX_BITS as u16,
};

pub(crate) static STATIC_BL_DESC: StaticTreeDesc<'static> = StaticTreeDesc {
    static_tree: &[],
    extra_bits: &BL_EXTRA_BITS,
    extra_base: 0,
    elems: BL_CODES,
    max_length: MAX_BL_BITS as u16,
};

/// Distance code for a match distance minus one.
#[inline]
pub fn d_code(dist: usize) -> usize {
    if dist < 256 {
        DIST_CODE[dist] as usize
    } else {
        DIST_CODE[256 + (dist >> 7)] as usize
    }
}

const fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    let mut n = 0;
    while n < 288 {
        lengths[n] = match n {
            0..=143 => 8,
            144..=255 => 9,
            256..=279 => 7,
            _ => 8,
        };
        n += 1;
    }
    lengths
}

const fn build_length_code() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut length = 0;
    let mut code = 0;
    while code < LENGTH_CODES - 1 {
        let mut n = 0;
        while n < (1 << LENGTH_EXTRA_BITS[code]) {
            table[length] = code as u8;
            length += 1;
            n += 1;
        }
        code += 1;
    }
    // Length 258 has its own code, overriding the last slot of code 27.
    table[length - 1] = code as u8;
    table
}

const fn build_dist_code() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut dist = 0;
    let mut code = 0;
    while code < 16 {
        let mut n = 0;
        while n < (1 << DISTANCE_EXTRA_BITS[code]) {
            table[dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    dist >>= 7;
    while code < D_CODES {
        let mut n = 0;
        while n < (1 << (DISTANCE_EXTRA_BITS[code] - 7)) {
            table[256 + dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    table
}

const fn static_tree<const N: usize>(lengths: [u8; N]) -> [TreeNode; N] {
    let mut bl_count = [0u32; MAX_BITS + 1];
    let mut n = 0;
    while n < N {
        bl_count[lengths[n] as usize] += 1;
        n += 1;
    }

    let mut next_code = [0u32; MAX_BITS + 1];
    let mut code = 0u32;
    let mut bits = 1;
    while bits <= MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
        bits += 1;
    }

    let mut tree = [TreeNode::ZERO; N];
    let mut n = 0;
    while n < N {
        let len = lengths[n] as usize;
        tree[n] = TreeNode::new(bi_reverse(next_code[len] as u16, len as u16), len as u16);
        next_code[len] += 1;
        n += 1;
    }
    tree
}
