//! Decoding loop for when input and output space are plentiful.
//!
//! With at least 6 input bytes and 258 bytes of output space available, one
//! length/distance pair can always be decoded and copied in full, so the
//! loop skips the per-state suspension checks of the main state machine and
//! refills the bit buffer two bytes at a time.

use oxiflate_core::bitstream::BitReader;
use oxiflate_core::stream::Stream;

use super::inftrees::{OP_BASE, OP_END_OF_BLOCK, OP_INVALID};
use super::{Inflater, Mode, copy_piece};

/// Input needed for one literal/length plus distance with extra bits.
const INPUT_MARGIN: usize = 6;
/// Output needed for the longest match.
const OUTPUT_MARGIN: usize = 258;

/// Pull two bytes if fewer than 15 bits are held.
#[inline]
fn refill(bits: &mut BitReader, strm: &mut Stream<'_>) {
    if bits.available() < 15 {
        bits.pull_byte(strm);
        bits.pull_byte(strm);
    }
}

impl Inflater {
    /// Decode symbols until the end of the block, an error, or the margins
    /// run out. Leaves `mode` at `Len`, `Type` or `Bad`.
    pub(super) fn inflate_fast(&mut self, strm: &mut Stream<'_>) {
        let lcode = self.lencode.resolve(&self.codes);
        let dcode = self.distcode.resolve(&self.codes);
        let lmask = self.lenbits;
        let dmask = self.distbits;
        let bits = &mut self.bits;
        let mut error = None;

        'symbols: loop {
            refill(bits, strm);
            let mut here = lcode[bits.bits(lmask) as usize];

            loop {
                bits.drop_bits(u32::from(here.bits));
                let op = here.op;

                if op == 0 {
                    strm.push(here.val as u8);
                    break;
                }

                if op & OP_BASE != 0 {
                    let mut len = usize::from(here.val);
                    let extra = u32::from(op & 15);
                    if extra != 0 {
                        if bits.available() < extra {
                            bits.pull_byte(strm);
                        }
                        len += bits.bits(extra) as usize;
                        bits.drop_bits(extra);
                    }

                    refill(bits, strm);
                    let mut here = dcode[bits.bits(dmask) as usize];
                    loop {
                        bits.drop_bits(u32::from(here.bits));
                        let op = here.op;

                        if op & OP_BASE != 0 {
                            let mut dist = usize::from(here.val);
                            let extra = u32::from(op & 15);
                            while bits.available() < extra {
                                bits.pull_byte(strm);
                            }
                            dist += bits.bits(extra) as usize;
                            bits.drop_bits(extra);

                            while len > 0 {
                                let window = &self.window;
                                let Some(copied) =
                                    copy_piece(window, self.sane, strm, self.out_mark, dist, len)
                                else {
                                    error = Some("invalid distance too far back");
                                    break 'symbols;
                                };
                                len -= copied;
                            }
                            break;
                        }

                        if op & OP_INVALID == 0 {
                            // Second-level table.
                            let index = usize::from(here.val) + bits.bits(u32::from(op)) as usize;
                            here = dcode[index];
                            continue;
                        }

                        error = Some("invalid distance code");
                        break 'symbols;
                    }
                    break;
                }

                if op & OP_INVALID == 0 {
                    let index = usize::from(here.val) + bits.bits(u32::from(op)) as usize;
                    here = lcode[index];
                    continue;
                }

                if op & OP_END_OF_BLOCK != 0 {
                    self.mode = Mode::Type;
                    break 'symbols;
                }

                error = Some("invalid literal/length code");
                break 'symbols;
            }

            if strm.avail_in() < INPUT_MARGIN || strm.avail_out() < OUTPUT_MARGIN {
                break;
            }
        }

        // Hand back whole bytes that were pulled but not used.
        bits.return_unused(strm);

        if let Some(msg) = error {
            self.fail(msg);
        }
    }
}
