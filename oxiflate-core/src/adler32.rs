//! Adler-32 checksum (RFC 1950).
//!
//! Both engines consume the checksum through the free function [`adler32`],
//! which folds more bytes into a running value. [`Adler32`] wraps the same
//! computation for incremental use outside the engines.

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(ADLER_MOD-1) fits in 32 bits.
const NMAX: usize = 5552;

/// Fold `data` into the running checksum `adler`.
///
/// The initial value of a fresh checksum is `1`.
pub fn adler32(adler: u32, data: &[u8]) -> u32 {
    let mut a = adler & 0xffff;
    let mut b = adler >> 16;

    for chunk in data.chunks(NMAX) {
        for &byte in chunk {
            a += u32::from(byte);
            b += a;
        }
        a %= ADLER_MOD;
        b %= ADLER_MOD;
    }

    (b << 16) | a
}

/// Combine the checksums of two adjacent byte sequences.
///
/// `len2` is the length of the second sequence.
pub fn adler32_combine(adler1: u32, adler2: u32, len2: u64) -> u32 {
    let base = u64::from(ADLER_MOD);
    let rem = len2 % base;
    let mut sum1 = u64::from(adler1 & 0xffff);
    let mut sum2 = (rem * sum1) % base;
    sum1 += u64::from(adler2 & 0xffff) + base - 1;
    sum2 += u64::from(adler1 >> 16) + u64::from(adler2 >> 16) + base - rem;

    if sum1 >= base {
        sum1 -= base;
    }
    if sum1 >= base {
        sum1 -= base;
    }
    if sum2 >= base << 1 {
        sum2 -= base << 1;
    }
    if sum2 >= base {
        sum2 -= base;
    }

    (sum1 | (sum2 << 16)) as u32
}

/// Incremental Adler-32 calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32 {
    value: u32,
}

impl Adler32 {
    /// Create a new Adler-32 calculator.
    pub fn new() -> Self {
        Self { value: 1 }
    }

    /// Resume from a previously computed checksum.
    pub fn from_checksum(value: u32) -> Self {
        Self { value }
    }

    /// Update the checksum with more data.
    pub fn update(&mut self, data: &[u8]) {
        self.value = adler32(self.value, data);
    }

    /// Return the checksum of all data seen so far.
    pub fn finish(&self) -> u32 {
        self.value
    }

    /// Compute Adler-32 checksum of data in one shot.
    pub fn checksum(data: &[u8]) -> u32 {
        adler32(1, data)
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}
