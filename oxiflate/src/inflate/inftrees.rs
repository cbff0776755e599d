//! Decoding tables for canonical Huffman codes.
//!
//! A table is indexed by the next `root` bits of input (LSB first). Codes no
//! longer than `root` are replicated across every index sharing their
//! prefix. Longer codes get a second-level sub-table hanging off the entry
//! for their first `root` bits, sized to fit the longest code under that
//! prefix.
//!
//! Each entry is a [`Code`] whose `op` tells the decoder what it found:
//!
//! | `op`             | meaning                                         |
//! |------------------|-------------------------------------------------|
//! | `0`              | literal, `val` is the byte                      |
//! | `16 + extra`     | length or distance base `val`, `extra` bits follow |
//! | `1..=15`         | sub-table of `2^op` entries at offset `val`     |
//! | `96`             | end of block                                    |
//! | `64`             | invalid code                                    |

use std::sync::OnceLock;

use crate::tables::{
    DISTANCE_BASE, DISTANCE_EXTRA_BITS, FIXED_LITLEN_LENGTHS, LENGTH_BASE, LENGTH_EXTRA_BITS,
    MAX_BITS,
};

/// Table space for the largest literal/length table with a 9-bit root.
pub(crate) const ENOUGH_LENS: usize = 852;
/// Table space for the largest distance table with a 6-bit root.
pub(crate) const ENOUGH_DISTS: usize = 592;
/// Table space for one block's worth of tables.
pub(crate) const ENOUGH: usize = ENOUGH_LENS + ENOUGH_DISTS;

/// Operation values with a fixed meaning.
pub(crate) const OP_LITERAL: u8 = 0;
pub(crate) const OP_BASE: u8 = 16;
pub(crate) const OP_END_OF_BLOCK: u8 = 32;
pub(crate) const OP_INVALID: u8 = 64;

/// One decoding table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Code {
    /// What the entry decodes to; see the module docs.
    pub(crate) op: u8,
    /// Bits consumed by this entry.
    pub(crate) bits: u8,
    /// Literal, base value or sub-table offset.
    pub(crate) val: u16,
}

impl Code {
    const INVALID: Self = Self {
        op: OP_INVALID,
        bits: 1,
        val: 0,
    };

    /// Whether this entry points at a second-level table.
    #[inline]
    pub(crate) fn is_link(&self) -> bool {
        self.op != 0 && self.op & 0xf0 == 0
    }
}

/// The alphabet a table is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeType {
    /// Code-length code of a dynamic block header.
    Codes,
    /// Literal/length code.
    Lens,
    /// Distance code.
    Dists,
}

/// Size of a freshly built table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableInfo {
    /// Index width of the first-level table.
    pub(crate) bits: u32,
    /// Entries used, including sub-tables.
    pub(crate) used: usize,
}

/// Build a decoding table for the code described by `lens` into `table`.
///
/// `root` is the preferred first-level index width; it is clamped to the
/// shortest and longest code lengths present. `work` needs room for one
/// entry per symbol.
///
/// Returns `None` for an over-subscribed code, and for an incomplete one
/// unless it is a literal/length or distance code consisting of a single
/// one-bit code. A code with no symbols at all yields a table that decodes
/// every input as invalid.
pub(crate) fn inflate_table(
    kind: CodeType,
    lens: &[u16],
    table: &mut [Code],
    root: u32,
    work: &mut [u16],
) -> Option<TableInfo> {
    let mut count = [0u16; MAX_BITS + 1];
    for &len in lens {
        count[usize::from(len)] += 1;
    }

    let max = match (1..=MAX_BITS).rev().find(|&len| count[len] != 0) {
        Some(max) => max,
        None => {
            table[0] = Code::INVALID;
            table[1] = Code::INVALID;
            return Some(TableInfo { bits: 1, used: 2 });
        }
    };
    let min = (1..max).find(|&len| count[len] != 0).unwrap_or(max);
    let root = (root as usize).min(max).max(min);

    let mut left: i32 = 1;
    for &n in &count[1..] {
        left <<= 1;
        left -= i32::from(n);
        if left < 0 {
            return None;
        }
    }
    if left > 0 && (kind == CodeType::Codes || max != 1) {
        return None;
    }

    // Sort symbols by length, then by symbol value.
    let mut offs = [0u16; MAX_BITS + 1];
    for len in 1..MAX_BITS {
        offs[len + 1] = offs[len] + count[len];
    }
    for (sym, &len) in lens.iter().enumerate() {
        if len != 0 {
            work[usize::from(offs[usize::from(len)])] = sym as u16;
            offs[usize::from(len)] += 1;
        }
    }

    let entry = |sym: u16, bits: u8| -> Code {
        let (op, val) = match kind {
            CodeType::Codes => (OP_LITERAL, sym),
            CodeType::Lens => match sym {
                0..=255 => (OP_LITERAL, sym),
                256 => (OP_END_OF_BLOCK | OP_INVALID, 0),
                _ => match usize::from(sym - 257) {
                    i if i < LENGTH_BASE.len() => (OP_BASE + LENGTH_EXTRA_BITS[i], LENGTH_BASE[i]),
                    _ => (OP_INVALID, 0),
                },
            },
            CodeType::Dists => match usize::from(sym) {
                i if i < DISTANCE_BASE.len() => {
                    (OP_BASE + DISTANCE_EXTRA_BITS[i], DISTANCE_BASE[i])
                }
                _ => (OP_INVALID, 0),
            },
        };
        Code { op, bits, val }
    };

    let mut huff: usize = 0;
    let mut sym = 0;
    let mut len = min;
    let mut next = 0;
    let mut curr = root;
    let mut drop = 0;
    let mut low = usize::MAX;
    let mut used = 1usize << root;
    let mask = used - 1;

    let too_big = |used: usize| {
        (kind == CodeType::Lens && used > ENOUGH_LENS)
            || (kind == CodeType::Dists && used > ENOUGH_DISTS)
    };
    if too_big(used) {
        return None;
    }

    loop {
        let here = entry(work[sym], (len - drop) as u8);

        // Replicate the entry across every index sharing this prefix.
        let incr = 1usize << (len - drop);
        let size = 1usize << curr;
        let mut fill = size;
        loop {
            fill -= incr;
            table[next + (huff >> drop) + fill] = here;
            if fill == 0 {
                break;
            }
        }

        // Increment the bit-reversed code.
        let mut incr = 1usize << (len - 1);
        while huff & incr != 0 {
            incr >>= 1;
        }
        if incr != 0 {
            huff &= incr - 1;
            huff += incr;
        } else {
            huff = 0;
        }

        sym += 1;
        count[len] -= 1;
        if count[len] == 0 {
            if len == max {
                break;
            }
            len = usize::from(lens[usize::from(work[sym])]);
        }

        // Start a new sub-table when the root prefix changes.
        if len > root && huff & mask != low {
            if drop == 0 {
                drop = root;
            }
            next += size;

            curr = len - drop;
            let mut left = 1i32 << curr;
            while curr + drop < max {
                left -= i32::from(count[curr + drop]);
                if left <= 0 {
                    break;
                }
                curr += 1;
                left <<= 1;
            }

            used += 1 << curr;
            if too_big(used) {
                return None;
            }

            low = huff & mask;
            table[low] = Code {
                op: curr as u8,
                bits: root as u8,
                val: next as u16,
            };
        }
    }

    // An incomplete code has exactly one entry left to fill.
    if huff != 0 {
        table[next + huff] = Code {
            op: OP_INVALID,
            bits: (len - drop) as u8,
            val: 0,
        };
    }

    Some(TableInfo {
        bits: root as u32,
        used,
    })
}

/// Decoding tables for fixed Huffman blocks.
pub(crate) struct FixedTables {
    pub(crate) lencode: [Code; 512],
    pub(crate) distcode: [Code; 32],
}

/// Index width of the fixed literal/length table.
pub(crate) const FIXED_LENBITS: u32 = 9;
/// Index width of the fixed distance table.
pub(crate) const FIXED_DISTBITS: u32 = 5;

/// The fixed tables, built on first use.
pub(crate) fn fixed_tables() -> &'static FixedTables {
    static TABLES: OnceLock<FixedTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut work = [0u16; 288];
        let mut tables = FixedTables {
            lencode: [Code::default(); 512],
            distcode: [Code::default(); 32],
        };

        let lens: Vec<u16> = FIXED_LITLEN_LENGTHS.iter().map(|&l| u16::from(l)).collect();
        let info = inflate_table(
            CodeType::Lens,
            &lens,
            &mut tables.lencode,
            FIXED_LENBITS,
            &mut work,
        )
        .expect("fixed literal/length code is complete");
        debug_assert_eq!(info.bits, FIXED_LENBITS);

        // All 32 distance symbols, so the code is complete; 30 and 31 decode
        // as invalid.
        let lens = [5u16; 32];
        inflate_table(
            CodeType::Dists,
            &lens,
            &mut tables.distcode,
            FIXED_DISTBITS,
            &mut work,
        )
        .expect("fixed distance code is complete");

        tables
    })
}
