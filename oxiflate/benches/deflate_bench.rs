//! Performance benchmarks for compression
//!
//! This benchmark suite evaluates:
//! - Throughput (MB/s) per compression level
//! - Sensitivity to data patterns at the default level
//! - The special strategies (filtered, Huffman-only, RLE, fixed)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiflate::{DeflateConfig, Strategy, compress, compress_with};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

/// Generate test data patterns for benchmarking
mod test_data {
    /// Random data - incompressible
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Long runs of a few byte values
    pub fn runs(size: usize) -> Vec<u8> {
        (0..size).map(|i| ((i / 97) % 4) as u8).collect()
    }

    /// Text-like data with varied words
    pub fn text_like(size: usize) -> Vec<u8> {
        let words: [&[u8]; 8] = [
            b"the ", b"quick ", b"brown ", b"fox ", b"jumps ", b"over ", b"lazy ", b"dog. ",
        ];
        let mut data = Vec::with_capacity(size);
        let mut seed: u32 = 12345;
        while data.len() < size {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            data.extend_from_slice(words[(seed >> 16) as usize % words.len()]);
        }
        data.truncate(size);
        data
    }
}

const SIZE: usize = 256 * 1024;

/// Benchmark every compression level on text
fn bench_deflate_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate_levels");
    let data = test_data::text_like(SIZE);
    group.throughput(Throughput::Bytes(SIZE as u64));

    for level in 0..=9u8 {
        group.bench_with_input(BenchmarkId::from_parameter(level), &data, |b, data| {
            b.iter(|| black_box(compress(black_box(data), level)));
        });
    }

    group.finish();
}

/// Benchmark the default level across data patterns
fn bench_deflate_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate_patterns");

    let patterns: [(&str, PatternGenerator); 3] = [
        ("random", test_data::random as PatternGenerator),
        ("runs", test_data::runs as PatternGenerator),
        ("text", test_data::text_like as PatternGenerator),
    ];

    for (pattern_name, generator) in patterns {
        let data = generator(SIZE);
        group.throughput(Throughput::Bytes(SIZE as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(pattern_name),
            &data,
            |b, data| {
                b.iter(|| black_box(compress(black_box(data), 6)));
            },
        );
    }

    group.finish();
}

/// Benchmark the strategies at the default level
fn bench_deflate_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate_strategies");
    let data = test_data::text_like(SIZE);
    group.throughput(Throughput::Bytes(SIZE as u64));

    let strategies = [
        ("default", Strategy::Default),
        ("filtered", Strategy::Filtered),
        ("huffman_only", Strategy::HuffmanOnly),
        ("rle", Strategy::Rle),
        ("fixed", Strategy::Fixed),
    ];

    for (name, strategy) in strategies {
        let config = DeflateConfig::new(6).with_strategy(strategy);
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| black_box(compress_with(black_box(data), config)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_deflate_levels,
    bench_deflate_patterns,
    bench_deflate_strategies
);
criterion_main!(benches);
