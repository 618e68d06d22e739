//! End-to-end decoding of real `.xz` fixtures.

use ruxz_core::crc::Crc32;
use ruxz_xz::{XzError, decompress, decompress_with_progress, text::best_effort_text};

const HELLO: &[u8] = include_bytes!("data/hello.xz");
const HW2: &[u8] = include_bytes!("data/hw2.xz");
const HW2_CRC64: &[u8] = include_bytes!("data/hw2-crc64.xz");
const HW4_BLOCKS: &[u8] = include_bytes!("data/hw4-blocks.xz");
const TWO_STREAMS: &[u8] = include_bytes!("data/two-streams.xz");
const FOX: &[u8] = include_bytes!("data/fox.xz");
const FOX_TXT: &[u8] = include_bytes!("data/fox.txt");
const FOX_LZMA2: &[u8] = include_bytes!("data/fox.lzma2");
const FOX_LZMA1: &[u8] = include_bytes!("data/fox.lzma1");

#[test]
fn test_single_block() {
    assert_eq!(decompress(HELLO).unwrap(), b"hello world\n");
}

#[test]
fn test_two_lines() {
    assert_eq!(decompress(HW2).unwrap(), b"hello world\nhello world\n");
}

#[test]
fn test_crc64_stream_flags() {
    assert_eq!(decompress(HW2_CRC64).unwrap(), b"hello world\nhello world\n");
}

#[test]
fn test_multiple_blocks() {
    let out = decompress(HW4_BLOCKS).unwrap();
    assert_eq!(out, b"hello world\n".repeat(4));
}

#[test]
fn test_concatenated_streams() {
    let out = decompress(TWO_STREAMS).unwrap();
    assert_eq!(out, b"hello world\nhello world\n");
}

#[test]
fn test_compressed_text() {
    let out = decompress(FOX).unwrap();
    assert_eq!(out, FOX_TXT);
    let text = best_effort_text(&out).unwrap();
    assert!(text.starts_with("the quick brown fox"));
}

#[test]
fn test_stream_header_crc_flip() {
    let mut data = HELLO.to_vec();
    data[8] ^= 0xFF;
    assert!(matches!(
        decompress(&data).unwrap_err(),
        XzError::CrcMismatch { .. }
    ));
}

#[test]
fn test_block_header_crc_flip() {
    // Bytes 28..32 hold the block header CRC-32 of this fixture
    let mut data = HELLO.to_vec();
    data[29] ^= 0xFF;
    assert!(matches!(
        decompress(&data).unwrap_err(),
        XzError::CrcMismatch { .. }
    ));
}

#[test]
fn test_invalid_lzma2_control_byte() {
    // Byte 32 is the first LZMA2 control byte of this fixture
    let mut data = HELLO.to_vec();
    data[32] = 0x7F;
    assert!(matches!(
        decompress(&data).unwrap_err(),
        XzError::MalformedContainer { .. }
    ));
}

#[test]
fn test_truncated_input() {
    assert!(decompress(&HELLO[..40]).is_err());
    assert!(decompress(&FOX[..FOX.len() / 2]).is_err());
}

#[test]
fn test_garbage_after_stream() {
    let mut data = HELLO.to_vec();
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]); // valid stream padding
    assert_eq!(decompress(&data).unwrap(), b"hello world\n");

    data.extend_from_slice(b"junk");
    assert!(decompress(&data).is_err());
}

#[test]
fn test_match_distance_at_output_position() {
    // Synthetic single-block stream: "ab" uncompressed, then an LZMA chunk
    // whose first operation is a new match decoding position slot 2 —
    // distance 2 with only two bytes of output behind it.
    let payload: &[u8] = &[
        0x01, 0x00, 0x01, b'a', b'b', //
        0xC0, 0x00, 0x01, 0x00, 0x05, 0x5D, //
        0x00, 0x80, 0x1F, 0xFC, 0x00, 0x00,
    ];

    let mut data = Vec::new();
    data.extend_from_slice(&[0xFD, b'7', b'z', b'X', b'Z', 0x00]);
    data.extend_from_slice(&[0x00, 0x01]);
    data.extend_from_slice(&Crc32::compute(&[0x00, 0x01]).to_le_bytes());

    let header = [0x02, 0x00, 0x21, 0x01, 0x00, 0x00, 0x00, 0x00];
    data.extend_from_slice(&header);
    data.extend_from_slice(&Crc32::compute(&header).to_le_bytes());
    data.extend_from_slice(payload);

    assert!(matches!(
        decompress(&data).unwrap_err(),
        XzError::CorruptedStream { offset: 2, .. }
    ));
}

#[test]
fn test_progress_reports() {
    let mut seen = Vec::new();
    let out = decompress_with_progress(FOX, |frac| seen.push(frac)).unwrap();
    assert_eq!(out, FOX_TXT);

    assert_eq!(*seen.last().unwrap(), 1.0);
    for pair in seen.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    for &frac in &seen {
        assert!((0.0..=1.0).contains(&frac));
    }
}

#[test]
fn test_raw_lzma2_payload() {
    let out = ruxz_lzma::decode_lzma2(FOX_LZMA2, 1 << 26).unwrap();
    assert_eq!(out, FOX_TXT);
}

#[test]
fn test_raw_lzma_chunk() {
    // LZMA stream with an end marker and default properties
    let out = ruxz_lzma::decompress_raw(FOX_LZMA1, 1 << 26, None).unwrap();
    assert_eq!(out, FOX_TXT);
}
