//! Circular history window for DEFLATE decompression.
//!
//! Back-references may reach up to `2^wbits` bytes into the past, across
//! calls. The decoder copies matches straight out of the caller's output
//! buffer while the referenced bytes were produced in the current call, and
//! out of this window otherwise. The window is only brought up to date at the
//! end of each call, with whatever that call produced.
//!
//! Storage is allocated lazily the first time output needs to be retained,
//! so a stream decoded in a single call never allocates it.

use crate::error::{OxiflateError, Result};

/// Largest window supported by the format (32 KiB).
pub const MAX_WINDOW: usize = 1 << 15;

/// Circular output history.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    buffer: Vec<u8>,
    /// Window size in use; zero until the first update after a reset.
    wsize: usize,
    /// Valid bytes of history, at most `wsize`.
    whave: usize,
    /// Write position; wraps at `wsize`.
    wnext: usize,
}

impl SlidingWindow {
    /// Create an empty, unallocated window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Window size in use, or zero if nothing has been retained yet.
    #[inline]
    pub fn size(&self) -> usize {
        self.wsize
    }

    /// Number of valid history bytes.
    #[inline]
    pub fn have(&self) -> usize {
        self.whave
    }

    /// Current write position.
    #[inline]
    pub fn next(&self) -> usize {
        self.wnext
    }

    /// Raw storage, `size()` bytes long once in use.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer[..self.wsize]
    }

    /// Forget the history but keep the allocation.
    pub fn reset(&mut self) {
        self.wsize = 0;
        self.whave = 0;
        self.wnext = 0;
    }

    /// Forget the history and free the allocation.
    pub fn release(&mut self) {
        self.reset();
        self.buffer = Vec::new();
    }

    /// Append the tail of `produced` to the history.
    ///
    /// `wbits` selects the window size if storage has not been set up yet.
    /// Only the last `2^wbits` bytes of `produced` are retained.
    pub fn update(&mut self, wbits: u32, produced: &[u8]) -> Result<()> {
        let size = 1usize << wbits;
        if self.buffer.len() < size {
            self.buffer
                .try_reserve_exact(size - self.buffer.len())
                .map_err(|e| {
                    log::warn!("cannot allocate {} byte history window: {}", size, e);
                    OxiflateError::mem()
                })?;
            self.buffer.resize(size, 0);
        }
        if self.wsize == 0 {
            log::trace!("history window of {} bytes", size);
            self.wsize = size;
            self.wnext = 0;
            self.whave = 0;
        }

        let wsize = self.wsize;
        let mut copy = produced.len();
        if copy >= wsize {
            self.buffer[..wsize].copy_from_slice(&produced[copy - wsize..]);
            self.wnext = 0;
            self.whave = wsize;
            return Ok(());
        }

        let dist = (wsize - self.wnext).min(copy);
        let start = produced.len() - copy;
        self.buffer[self.wnext..self.wnext + dist].copy_from_slice(&produced[start..start + dist]);
        copy -= dist;
        if copy > 0 {
            self.buffer[..copy].copy_from_slice(&produced[produced.len() - copy..]);
            self.wnext = copy;
            self.whave = wsize;
        } else {
            self.wnext += dist;
            if self.wnext == wsize {
                self.wnext = 0;
            }
            if self.whave < wsize {
                self.whave += dist;
            }
        }
        Ok(())
    }

    /// Contiguous history starting `back` bytes before the write position.
    ///
    /// The slice stops at the physical end of storage, so a copy that wraps
    /// needs a second call. The caller guarantees `back <= have()`.
    pub fn source(&self, back: usize) -> &[u8] {
        debug_assert!(back <= self.whave);
        if back > self.wnext {
            let from = self.wsize - (back - self.wnext);
            &self.buffer[from..self.wsize]
        } else {
            &self.buffer[self.wnext - back..self.wnext]
        }
    }

    /// The valid history in stream order, oldest byte first.
    pub fn contents(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.whave);
        if self.whave == 0 {
            return out;
        }
        let older = self.whave - self.wnext;
        out.extend_from_slice(&self.buffer[self.wsize - older..self.wsize]);
        out.extend_from_slice(&self.buffer[..self.wnext]);
        out
    }
}
