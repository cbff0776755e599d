//! Malformed input: every defect must surface as a data error, never as a
//! panic, and full flush points must allow decoding to resume.

use oxiflate::{
    Decompressor, DeflateConfig, Deflater, FlushMode, InflateConfig, Inflater, OxiflateError,
    Status, Stream, compress, uncompress,
};

/// LSB-first bit packer for hand-made DEFLATE blocks.
#[derive(Default)]
struct BitPacker {
    out: Vec<u8>,
    acc: u64,
    count: u32,
}

impl BitPacker {
    fn put(&mut self, value: u32, len: u32) -> &mut Self {
        self.acc |= u64::from(value) << self.count;
        self.count += len;
        while self.count >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.count -= 8;
        }
        self
    }

    fn finish(&mut self) -> Vec<u8> {
        if self.count > 0 {
            self.out.push(self.acc as u8);
        }
        // Padding so the decoder never runs out of input first.
        self.out.extend_from_slice(&[0u8; 8]);
        std::mem::take(&mut self.out)
    }
}

fn raw_inflate(input: &[u8]) -> Result<Vec<u8>, OxiflateError> {
    Inflater::with_config(InflateConfig::raw())
        .unwrap()
        .decompress_all(input)
}

fn data_error(input: &[u8]) -> &'static str {
    match raw_inflate(input) {
        Err(OxiflateError::Data { message }) => message,
        other => panic!("expected a data error, got {:?}", other),
    }
}

/// Header of a final dynamic block.
fn dynamic_header(bits: &mut BitPacker, hlit: u32, hdist: u32, hclen: u32) {
    bits.put(1, 1).put(2, 2).put(hlit, 5).put(hdist, 5).put(hclen, 4);
}

#[test]
fn test_over_subscribed_code_lengths() {
    let mut bits = BitPacker::default();
    dynamic_header(&mut bits, 0, 0, 15);
    for _ in 0..19 {
        bits.put(1, 3);
    }
    assert_eq!(data_error(&bits.finish()), "invalid code lengths set");
}

#[test]
fn test_incomplete_code_lengths() {
    let mut bits = BitPacker::default();
    dynamic_header(&mut bits, 0, 0, 15);
    bits.put(2, 3);
    for _ in 1..19 {
        bits.put(0, 3);
    }
    assert_eq!(data_error(&bits.finish()), "invalid code lengths set");
}

#[test]
fn test_too_many_symbols() {
    let mut bits = BitPacker::default();
    dynamic_header(&mut bits, 30, 0, 0);
    assert_eq!(data_error(&bits.finish()), "too many length or distance symbols");
}

#[test]
fn test_repeat_without_previous_length() {
    // Code length alphabet {0, 16}, one bit each: 0 -> "0", 16 -> "1".
    let mut bits = BitPacker::default();
    dynamic_header(&mut bits, 0, 0, 15);
    for position in 0..19 {
        // Order starts 16, 17, 18, 0.
        let len = if position == 0 || position == 3 { 1 } else { 0 };
        bits.put(len, 3);
    }
    bits.put(1, 1).put(0, 2);
    assert_eq!(data_error(&bits.finish()), "invalid bit length repeat");
}

#[test]
fn test_missing_end_of_block() {
    // Code length alphabet {1, 18}, one bit each: 1 -> "0", 18 -> "1".
    let mut bits = BitPacker::default();
    dynamic_header(&mut bits, 0, 0, 14);
    for position in 0..18 {
        // Symbol 18 is third in the order, symbol 1 is last.
        let len = if position == 2 || position == 17 { 1 } else { 0 };
        bits.put(len, 3);
    }
    // Literals 0 and 1 get length 1, the other 255 literal/length codes
    // (end-of-block included) get zero, then one distance code.
    bits.put(0, 1).put(0, 1);
    bits.put(1, 1).put(138 - 11, 7);
    bits.put(1, 1).put(117 - 11, 7);
    bits.put(0, 1);
    assert_eq!(data_error(&bits.finish()), "invalid code -- missing end-of-block");
}

#[test]
fn test_invalid_stored_lengths() {
    assert_eq!(
        data_error(&[0x01, 0x05, 0x00, 0x00, 0x00]),
        "invalid stored block lengths"
    );
}

#[test]
fn test_invalid_block_type() {
    assert_eq!(data_error(&[0x07, 0x00]), "invalid block type");
}

#[test]
fn test_distance_too_far_back() {
    let mut inflater = Inflater::with_config(InflateConfig::raw()).unwrap();
    let err = inflater.decompress_all(&[0x03, 0x02]).unwrap_err();
    assert_eq!(err.message(), Some("invalid distance too far back"));
    assert_eq!(inflater.message(), Some("invalid distance too far back"));
}

#[test]
fn test_errors_are_sticky() {
    let mut inflater = Inflater::with_config(InflateConfig::raw()).unwrap();
    let mut out = [0u8; 16];
    let mut strm = Stream::new(&[0x07, 0x00], &mut out);
    assert!(inflater.inflate(&mut strm, FlushMode::None).is_err());

    let mut strm = Stream::new(&[0x03, 0x00], &mut out);
    assert!(inflater.inflate(&mut strm, FlushMode::None).is_err());
}

#[test]
fn test_every_truncation_fails() {
    let compressed = compress(&b"truncate me at every position ".repeat(20), 6).unwrap();
    for len in 0..compressed.len() {
        let err = uncompress(&compressed[..len]).unwrap_err();
        assert_eq!(err.code(), -3, "prefix {}", len);
    }
}

#[test]
fn test_bit_flips_never_panic() {
    let data = b"flip every bit and see what happens to the decoder".repeat(8);
    for level in [0, 1, 9] {
        let compressed = compress(&data, level).unwrap();
        for index in 0..compressed.len() {
            for bit in 0..8 {
                let mut damaged = compressed.clone();
                damaged[index] ^= 1 << bit;
                if let Ok(output) = uncompress(&damaged) {
                    // A flip the checksum cannot see must not change the data.
                    assert_eq!(output, data);
                }
            }
        }
    }
}

#[test]
fn test_trailer_mismatch() {
    let mut compressed = compress(b"checked data", 6).unwrap();
    let at = compressed.len() - 3;
    compressed[at] ^= 0x10;
    let err = uncompress(&compressed).unwrap_err();
    assert_eq!(err.message(), Some("incorrect data check"));
}

/// Three parts separated by full flushes; returns the stream and the end
/// offset of each flush marker.
fn flushed_stream(parts: &[&[u8]; 3]) -> (Vec<u8>, [usize; 2]) {
    let mut deflater = Deflater::with_config(DeflateConfig::new(6)).unwrap();
    let mut out = vec![0u8; 4096];
    let mut marks = [0usize; 2];
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        let flush = if i == 2 { FlushMode::Finish } else { FlushMode::Full };
        let mut strm = Stream::new(part, &mut out[pos..]);
        deflater.deflate(&mut strm, flush).unwrap();
        assert_eq!(strm.in_pos(), part.len());
        pos += strm.out_pos();
        if i < 2 {
            marks[i] = pos;
        }
    }
    out.truncate(pos);
    (out, marks)
}

const PARTS: [&[u8]; 3] = [
    b"The first part of the stream, ahead of any damage. ",
    b"The second part is where the stream gets damaged. ",
    b"The third part comes after the next full flush point.",
];

#[test]
fn test_full_flush_markers() {
    let (stream, marks) = flushed_stream(&PARTS);
    for mark in marks {
        assert_eq!(&stream[mark - 4..mark], &[0x00, 0x00, 0xff, 0xff]);
    }
    assert_eq!(uncompress(&stream).unwrap(), PARTS.concat());
}

#[test]
fn test_sync_recovers_after_corruption() {
    let (mut stream, marks) = flushed_stream(&PARTS);
    // BFINAL set and block type 3: an invalid block right after the first
    // flush point.
    stream[marks[0]] = 0xff;

    let mut inflater = Inflater::new();
    let mut out = vec![0u8; 1024];
    let mut strm = Stream::new(&stream, &mut out);
    let err = inflater.inflate(&mut strm, FlushMode::None).unwrap_err();
    assert_eq!(err.message(), Some("invalid block type"));
    assert_eq!(strm.written(), PARTS[0]);

    assert_eq!(inflater.sync(&mut strm).unwrap(), Status::Ok);
    assert_eq!(strm.in_pos(), marks[1]);
    assert_eq!(
        inflater.inflate(&mut strm, FlushMode::None).unwrap(),
        Status::StreamEnd
    );
    assert_eq!(strm.written(), [PARTS[0], PARTS[2]].concat());
}

#[test]
fn test_sync_from_middle_of_stream() {
    let (stream, marks) = flushed_stream(&PARTS);

    let mut inflater = Inflater::new();
    let mut out = vec![0u8; 1024];
    let mut strm = Stream::new(&stream[5..], &mut out);
    assert_eq!(inflater.sync(&mut strm).unwrap(), Status::Ok);
    assert_eq!(strm.in_pos() + 5, marks[0]);

    // Without a header the trailer is not checked and is left unread.
    assert_eq!(
        inflater.inflate(&mut strm, FlushMode::None).unwrap(),
        Status::StreamEnd
    );
    assert_eq!(strm.written(), [PARTS[1], PARTS[2]].concat());
}

#[test]
fn test_sync_without_marker() {
    let compressed = compress(b"no flush points in here", 6).unwrap();

    let mut inflater = Inflater::new();
    let mut out = vec![0u8; 64];
    let mut strm = Stream::new(&compressed[3..], &mut out);
    let err = inflater.sync(&mut strm).unwrap_err();
    assert_eq!(err.message(), Some("no sync point found"));
    assert_eq!(strm.avail_in(), 0);

    let mut strm = Stream::new(&[], &mut out);
    assert_eq!(inflater.sync(&mut strm).unwrap(), Status::BufError);
}

#[test]
fn test_is_sync_point() {
    let (stream, marks) = flushed_stream(&PARTS);

    let mut inflater = Inflater::new();
    let mut out = vec![0u8; 1024];
    // Input ends right before the empty stored block's length fields.
    let mut strm = Stream::new(&stream[..marks[0] - 4], &mut out);
    inflater.inflate(&mut strm, FlushMode::None).unwrap();
    assert_eq!(strm.written(), PARTS[0]);
    assert!(inflater.is_sync_point());

    let mut strm = Stream::new(&stream[marks[0] - 4..marks[0]], &mut out);
    inflater.inflate(&mut strm, FlushMode::None).unwrap();
    assert!(!inflater.is_sync_point());
    assert_ne!(inflater.data_type() & 128, 0);
}

#[test]
fn test_undermine_fills_with_zeros() {
    let mut inflater = Inflater::with_config(InflateConfig::raw()).unwrap();
    inflater.undermine(true);
    // Length 3 at distance 1 with no history, then end-of-block.
    let output = inflater.decompress_all(&[0x03, 0x02, 0x00]);
    assert_eq!(output.unwrap(), [0, 0, 0]);
}
