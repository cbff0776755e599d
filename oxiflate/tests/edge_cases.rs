//! Edge case tests for zlib and raw DEFLATE streams.

use oxiflate::{
    Adler32, Decompressor, DeflateConfig, Deflater, FlushMode, InflateConfig, Inflater, Status,
    Strategy, Stream, compress, compress_with, uncompress,
};

const STRATEGIES: [Strategy; 5] = [
    Strategy::Default,
    Strategy::Filtered,
    Strategy::HuffmanOnly,
    Strategy::Rle,
    Strategy::Fixed,
];

/// Deterministic xorshift bytes.
fn random_bytes(len: usize, mut state: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn raw_deflate(input: &[u8], level: u8) -> Vec<u8> {
    compress_with(input, DeflateConfig::raw(level)).unwrap()
}

fn raw_inflate(input: &[u8]) -> Vec<u8> {
    Inflater::with_config(InflateConfig::raw())
        .unwrap()
        .decompress_all(input)
        .unwrap()
}

#[test]
fn test_empty_input() {
    let input = b"";
    let compressed = compress(input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);

    // A raw empty stream is a single empty fixed block.
    assert_eq!(raw_deflate(input, 6), [0x03, 0x00]);
}

#[test]
fn test_single_byte() {
    let input = b"A";
    let compressed = compress(input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_single_byte_raw_is_fixed_block() {
    assert_eq!(raw_deflate(b"a", 6), [0x4b, 0x04, 0x00]);
    assert_eq!(raw_inflate(&[0x4b, 0x04, 0x00]), b"a");
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 1000];
    let compressed = compress(&input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
    // All zeros should compress very well
    assert!(compressed.len() < input.len() / 10);
}

#[test]
fn test_all_same_byte() {
    let input = vec![255u8; 5000];
    let compressed = compress(&input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
    // Repeated byte should compress extremely well
    assert!(compressed.len() < input.len() / 20);
}

#[test]
fn test_max_match_length() {
    // Runs long enough for maximum length (258 byte) matches.
    let input = vec![42u8; 258 * 10];

    let compressed = compress(&input, 9).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_all_literals() {
    // A sequence with no repeated 3-byte string.
    let input = random_bytes(4096, 0x1234_5678);

    for level in [1, 6, 9] {
        let compressed = compress(&input, level).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), input, "level {}", level);
    }
}

#[test]
fn test_alternating_pattern() {
    let input: Vec<u8> = (0..1000).map(|i| if i % 2 == 0 { b'A' } else { b'B' }).collect();

    let compressed = compress(&input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_large_input() {
    // Test with 1MB of data
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut input: Vec<u8> = pattern.iter().copied().cycle().take(1024 * 1024).collect();
    input[500_000] = b'!';

    let compressed = compress(&input, 5).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed.len(), 1024 * 1024);
    assert_eq!(decompressed, input);
}

#[test]
fn test_large_random_all_levels() {
    let input = random_bytes(1_100_000, 0xdead_beef);
    let checksum = Adler32::checksum(&input);

    for level in 0..=9 {
        let compressed = compress(&input, level).unwrap();
        let mut inflater = Inflater::new();
        let decompressed = inflater.decompress_all(&compressed).unwrap();
        assert!(decompressed == input, "level {}", level);
        assert_eq!(inflater.adler(), checksum, "level {}", level);
    }
}

#[test]
fn test_large_mixed_all_levels_and_strategies() {
    // Random stretches between long repetitive runs, a little over 1 MiB.
    let text = b"The quick brown fox jumps over the lazy dog. ";
    let mut input = Vec::with_capacity(1_200_000);
    let mut seed = 1u32;
    while input.len() < 1_100_000 {
        input.extend(random_bytes(40_000, seed));
        input.extend(text.iter().copied().cycle().take(60_000));
        input.extend(std::iter::repeat_n(seed as u8, 20_000));
        seed += 1;
    }

    for strategy in STRATEGIES {
        for level in 0..=9 {
            let config = DeflateConfig::new(level).with_strategy(strategy);
            let compressed = compress_with(&input, config).unwrap();
            let decompressed = uncompress(&compressed).unwrap();
            assert!(
                decompressed == input,
                "level {} strategy {:?}",
                level,
                strategy
            );
        }
    }
}

#[test]
fn test_incremental_pattern() {
    let mut input = Vec::new();
    for i in 0..256 {
        for _ in 0..10 {
            input.push(i as u8);
        }
    }

    for level in [1, 6] {
        let compressed = compress(&input, level).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), input);
    }
}

#[test]
fn test_compression_levels() {
    let input = b"Hello, world! This is a test of DEFLATE compression with various levels.";

    for level in 0..=9 {
        let compressed = compress(input, level).unwrap();
        let decompressed = uncompress(&compressed).unwrap();
        assert_eq!(decompressed, input, "Level {} failed", level);

        // Level 0 should be larger (stored blocks)
        if level == 0 {
            assert!(compressed.len() > input.len());
        }
    }
}

#[test]
fn test_binary_data() {
    // Binary data with all byte values
    let input: Vec<u8> = (0..=255).cycle().take(5000).collect();

    let compressed = compress(&input, 6).unwrap();
    let decompressed = uncompress(&compressed).unwrap();
    assert_eq!(decompressed, input);
}

#[test]
fn test_long_distance_match() {
    // A match at the far edge of the 32 KiB window.
    let mut input = vec![0u8; 32768];
    let pattern = b"PATTERN_TO_MATCH";
    input[0..pattern.len()].copy_from_slice(pattern);
    input[32768 - pattern.len()..32768].copy_from_slice(pattern);

    for level in [1, 9] {
        let compressed = compress(&input, level).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), input);
    }
}

#[test]
fn test_stored_block_boundaries() {
    // Level 0 splits input into stored blocks of at most 65535 bytes.
    for len in [65534, 65535, 65536, 3 * 65535 + 1] {
        let input: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
        let compressed = compress(&input, 0).unwrap();
        assert!(compressed.len() > input.len());
        assert_eq!(uncompress(&compressed).unwrap(), input, "len {}", len);
    }
}

#[test]
fn test_small_windows() {
    let input: Vec<u8> = (0..20_000u32).map(|i| (i % 300 % 251) as u8).collect();
    for window_bits in 9..=15 {
        let config = DeflateConfig::new(6).with_window_bits(window_bits);
        let compressed = compress_with(&input, config).unwrap();
        assert_eq!(compressed[0] >> 4, (window_bits - 8) as u8);

        let mut inflater = Inflater::with_window_bits(window_bits).unwrap();
        assert_eq!(inflater.decompress_all(&compressed).unwrap(), input);
    }
}

#[test]
fn test_window_bits_8_promoted() {
    let config = DeflateConfig::new(6).with_window_bits(8);
    let compressed = compress_with(b"promoted to nine", config).unwrap();
    assert_eq!(compressed[0], 0x18);
    assert_eq!(uncompress(&compressed).unwrap(), b"promoted to nine");

    let raw = DeflateConfig::raw(6).with_window_bits(-8);
    assert!(compress_with(b"x", raw).is_err());
}

#[test]
fn test_window_larger_than_allowed() {
    let compressed = compress(b"needs a 32k window", 6).unwrap();
    let mut inflater = Inflater::with_window_bits(10).unwrap();
    let err = inflater.decompress_all(&compressed).unwrap_err();
    assert_eq!(err.message(), Some("invalid window size"));
}

#[test]
fn test_mem_levels() {
    let input = b"memory level memory level memory level ".repeat(200);
    for mem_level in 1..=9 {
        let config = DeflateConfig::new(6).with_mem_level(mem_level);
        let compressed = compress_with(&input, config).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), input, "mem level {}", mem_level);
    }
    assert!(compress_with(b"x", DeflateConfig::new(6).with_mem_level(0)).is_err());
    assert!(compress_with(b"x", DeflateConfig::new(6).with_mem_level(10)).is_err());
}

#[test]
fn test_gzip_window_bits_rejected() {
    assert!(Deflater::with_config(DeflateConfig::new(6).with_window_bits(31)).is_err());
    assert!(Inflater::with_window_bits(31).is_err());
    assert!(Inflater::with_window_bits(-16).is_err());
}

#[test]
fn test_bound_holds_for_incompressible_data() {
    let mut state = 0x9e37_79b9u32;
    let input: Vec<u8> = (0..100_000)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();

    let mut deflater = Deflater::new(9).unwrap();
    let bound = deflater.bound(input.len());
    let mut output = vec![0u8; bound];
    let mut strm = Stream::new(&input, &mut output);
    let status = deflater.deflate(&mut strm, FlushMode::Finish).unwrap();
    assert_eq!(status, Status::StreamEnd);
    assert!(strm.out_pos() <= bound);
}

#[test]
fn test_total_counts() {
    let input = b"count the bytes in and out".repeat(50);
    let mut deflater = Deflater::new(6).unwrap();
    let compressed = oxiflate::Compressor::compress_all(&mut deflater, &input).unwrap();
    assert_eq!(deflater.total_in(), input.len() as u64);
    assert_eq!(deflater.total_out(), compressed.len() as u64);

    let mut inflater = Inflater::new();
    let output = inflater.decompress_all(&compressed).unwrap();
    assert_eq!(output, input);
    assert_eq!(inflater.total_in(), compressed.len() as u64);
    assert_eq!(inflater.total_out(), input.len() as u64);
    assert_eq!(inflater.adler(), deflater.adler());
}
