//! XZ container parsing.
//!
//! An XZ file is a sequence of streams, each one:
//!
//! ```text
//! stream header | block* | index | stream footer
//! ```
//!
//! Every block carries its own header (filter chain, optional sizes) and an
//! LZMA2 payload. Structural CRC-32 values over the stream header and block
//! headers are verified; per-block check values and the index/footer CRCs
//! are consumed but not recomputed.

use std::time::{Duration, Instant};

use ruxz_core::crc::Crc32;
use ruxz_core::cursor::ByteCursor;
use ruxz_core::error::{Result, XzError};
use ruxz_lzma::lzma2::{Lzma2Decoder, dict_size_from_props};

const STREAM_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
const FOOTER_MAGIC: [u8; 2] = [b'Y', b'Z'];

/// Filter id of the LZMA2 filter, the only one this decoder accepts.
const FILTER_LZMA2: u64 = 0x21;

/// Progress callbacks fire at most once per this many LZMA2 chunks...
const PROGRESS_CHUNK_INTERVAL: u64 = 1000;
/// ...unless this much wall time has passed since the last report.
const PROGRESS_TIME_INTERVAL: Duration = Duration::from_millis(200);

/// Integrity check declared by the stream flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckType {
    Crc32,
    Crc64,
}

impl CheckType {
    fn from_flags(flags: [u8; 2]) -> Result<Self> {
        if flags[0] != 0 || flags[1] & 0xF0 != 0 {
            return Err(XzError::malformed("reserved stream flag bits"));
        }
        match flags[1] {
            0x01 => Ok(Self::Crc32),
            0x04 => Ok(Self::Crc64),
            id => Err(XzError::unsupported(format!("check type {id:#04x}"))),
        }
    }

    /// Size of the check value stored after each block.
    fn size(self) -> usize {
        match self {
            Self::Crc32 => 4,
            Self::Crc64 => 8,
        }
    }
}

/// Parsed block header.
#[derive(Debug)]
struct BlockHeader {
    compressed_size: Option<u64>,
    uncompressed_size: Option<u64>,
    dict_size: u32,
}

/// Parse a block header. `size_byte` (already consumed, nonzero) encodes
/// the CRC-covered header length as `size_byte * 4`; the 4-byte CRC-32
/// follows that region.
fn parse_block_header(cursor: &mut ByteCursor<'_>, size_byte: u8) -> Result<BlockHeader> {
    let rest = cursor.read_bytes(size_byte as usize * 4 - 1)?;
    let declared = cursor.read_u32le()?;

    let mut crc = Crc32::new();
    crc.update(&[size_byte]);
    crc.update(rest);
    let computed = crc.finalize();
    if computed != declared {
        return Err(XzError::crc_mismatch(declared, computed));
    }

    let mut hdr = ByteCursor::new(rest);
    let flags = hdr.read_u8()?;
    if flags & 0x3C != 0 {
        return Err(XzError::malformed("reserved block flag bits"));
    }
    if flags & 0x03 != 0 {
        return Err(XzError::unsupported("multiple filters in block"));
    }

    let compressed_size = if flags & 0x40 != 0 {
        Some(hdr.read_multibyte()?)
    } else {
        None
    };
    let uncompressed_size = if flags & 0x80 != 0 {
        Some(hdr.read_multibyte()?)
    } else {
        None
    };

    let filter_id = hdr.read_multibyte()?;
    if filter_id != FILTER_LZMA2 {
        return Err(XzError::unsupported(format!("filter {filter_id:#04x}")));
    }
    if hdr.read_multibyte()? != 1 {
        return Err(XzError::malformed("LZMA2 filter property size"));
    }
    let dict_size = dict_size_from_props(hdr.read_u8()?)?;

    while !hdr.is_empty() {
        if hdr.read_u8()? != 0 {
            return Err(XzError::malformed("nonzero block header padding"));
        }
    }

    Ok(BlockHeader {
        compressed_size,
        uncompressed_size,
        dict_size,
    })
}

/// Throttled progress reporter shared across blocks of all streams.
struct Progress<'p> {
    callback: &'p mut dyn FnMut(f64),
    chunks_since_report: u64,
    last_report: Instant,
    decoded_done: u64,
    declared_done: u64,
    known: bool,
    high_water: f64,
}

impl<'p> Progress<'p> {
    fn new(callback: &'p mut dyn FnMut(f64)) -> Self {
        Self {
            callback,
            chunks_since_report: 0,
            last_report: Instant::now(),
            decoded_done: 0,
            declared_done: 0,
            known: true,
            high_water: 0.0,
        }
    }

    /// Called once per LZMA2 chunk of the current block.
    fn on_chunk(&mut self, block_decoded: u64, block_declared: Option<u64>) {
        self.chunks_since_report += 1;
        if self.chunks_since_report < PROGRESS_CHUNK_INTERVAL
            && self.last_report.elapsed() < PROGRESS_TIME_INTERVAL
        {
            return;
        }
        self.chunks_since_report = 0;
        self.last_report = Instant::now();

        // Fractions are only meaningful while every block so far declared
        // its uncompressed size.
        if !self.known {
            return;
        }
        let Some(declared) = block_declared else {
            return;
        };
        let total = self.declared_done + declared;
        if total == 0 {
            return;
        }

        let frac = ((self.decoded_done + block_decoded) as f64 / total as f64).min(1.0);
        if frac > self.high_water {
            self.high_water = frac;
            (self.callback)(frac);
        }
    }

    fn block_done(&mut self, decoded: u64, declared: Option<u64>) {
        self.decoded_done += decoded;
        match declared {
            Some(d) => self.declared_done += d,
            None => self.known = false,
        }
    }

    fn finished(&mut self) {
        (self.callback)(1.0);
    }
}

/// Decode every stream in `data`, concatenating their outputs.
pub(crate) fn decode_buffer(
    data: &[u8],
    on_progress: Option<&mut dyn FnMut(f64)>,
) -> Result<Vec<u8>> {
    let mut cursor = ByteCursor::new(data);
    let mut out = Vec::new();
    let mut progress = on_progress.map(Progress::new);

    loop {
        decode_stream(&mut cursor, &mut out, &mut progress)?;

        // Stream padding: zero bytes in 4-byte units between streams.
        let mut pad = 0usize;
        while cursor.peek_u8() == Some(0) {
            cursor.read_u8()?;
            pad += 1;
        }
        if pad % 4 != 0 {
            return Err(XzError::malformed("stream padding not a multiple of four"));
        }
        if cursor.is_empty() {
            break;
        }
    }

    if let Some(p) = progress.as_mut() {
        p.finished();
    }
    Ok(out)
}

fn decode_stream(
    cursor: &mut ByteCursor<'_>,
    out: &mut Vec<u8>,
    progress: &mut Option<Progress<'_>>,
) -> Result<()> {
    let magic = cursor.read_bytes(6)?;
    if magic != STREAM_MAGIC {
        return Err(XzError::invalid_magic(STREAM_MAGIC, magic));
    }

    let flag_bytes = cursor.read_bytes(2)?;
    let stream_flags = [flag_bytes[0], flag_bytes[1]];
    let check = CheckType::from_flags(stream_flags)?;

    let declared = cursor.read_u32le()?;
    let computed = Crc32::compute(&stream_flags);
    if computed != declared {
        return Err(XzError::crc_mismatch(declared, computed));
    }

    let mut blocks = 0u64;
    loop {
        // A zero where the next block header size would be starts the index.
        let lead = cursor.read_u8()?;
        if lead == 0 {
            break;
        }
        let header = parse_block_header(cursor, lead)?;
        decode_block(cursor, &header, check, out, progress)?;
        blocks += 1;
    }

    parse_index(cursor, blocks)?;
    parse_footer(cursor, stream_flags)
}

fn decode_block(
    cursor: &mut ByteCursor<'_>,
    header: &BlockHeader,
    check: CheckType,
    out: &mut Vec<u8>,
    progress: &mut Option<Progress<'_>>,
) -> Result<()> {
    let payload_start = cursor.position();
    let declared = header.uncompressed_size;

    let mut decoder = Lzma2Decoder::new(header.dict_size);
    decoder.run(cursor, |d| {
        if let Some(p) = progress.as_mut() {
            p.on_chunk(d.total_out(), declared);
        }
    })?;

    let consumed = (cursor.position() - payload_start) as u64;
    if let Some(expected) = header.compressed_size {
        if expected != consumed {
            return Err(XzError::malformed("block compressed size mismatch"));
        }
    }
    let produced = decoder.total_out();
    if let Some(expected) = declared {
        if expected != produced {
            return Err(XzError::malformed("block uncompressed size mismatch"));
        }
    }

    let mut decoded = decoder.finish();
    out.append(&mut decoded);

    cursor.read_zero_padding(4)?;
    // Check value: consumed, sized by the stream flags, not verified.
    cursor.read_bytes(check.size())?;

    if let Some(p) = progress.as_mut() {
        p.block_done(produced, declared);
    }
    Ok(())
}

/// Structural parse of the index. The leading zero byte has already been
/// consumed by the block loop.
fn parse_index(cursor: &mut ByteCursor<'_>, blocks: u64) -> Result<()> {
    let count = cursor.read_multibyte()?;
    if count != blocks {
        return Err(XzError::malformed("index record count mismatch"));
    }
    for _ in 0..count {
        cursor.read_multibyte()?; // unpadded size
        cursor.read_multibyte()?; // uncompressed size
    }
    cursor.read_zero_padding(4)?;
    cursor.read_u32le()?; // index CRC-32, not recomputed
    Ok(())
}

fn parse_footer(cursor: &mut ByteCursor<'_>, stream_flags: [u8; 2]) -> Result<()> {
    cursor.read_u32le()?; // footer CRC-32, not recomputed
    cursor.read_u32le()?; // backward size
    let flags = cursor.read_bytes(2)?;
    if flags != stream_flags {
        return Err(XzError::malformed("stream footer flags mismatch"));
    }
    let magic = cursor.read_bytes(2)?;
    if magic != FOOTER_MAGIC {
        return Err(XzError::invalid_magic(FOOTER_MAGIC, magic));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_type_from_flags() {
        assert_eq!(CheckType::from_flags([0, 0x01]).unwrap(), CheckType::Crc32);
        assert_eq!(CheckType::from_flags([0, 0x04]).unwrap(), CheckType::Crc64);
        assert_eq!(CheckType::Crc32.size(), 4);
        assert_eq!(CheckType::Crc64.size(), 8);

        // SHA-256 is a valid check id we do not implement
        assert!(matches!(
            CheckType::from_flags([0, 0x0A]),
            Err(XzError::UnsupportedFeature { .. })
        ));
        assert!(matches!(
            CheckType::from_flags([0x01, 0x01]),
            Err(XzError::MalformedContainer { .. })
        ));
        assert!(matches!(
            CheckType::from_flags([0, 0xF1]),
            Err(XzError::MalformedContainer { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let err = decode_buffer(b"PK\x03\x04 not xz", None).unwrap_err();
        assert!(matches!(err, XzError::InvalidMagic { .. }));
    }

    #[test]
    fn test_truncated_header() {
        let err = decode_buffer(&STREAM_MAGIC, None).unwrap_err();
        assert!(matches!(err, XzError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_header_crc_mismatch() {
        let mut data = Vec::new();
        data.extend_from_slice(&STREAM_MAGIC);
        data.extend_from_slice(&[0x00, 0x01]);
        data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let err = decode_buffer(&data, None).unwrap_err();
        assert!(matches!(err, XzError::CrcMismatch { .. }));
    }

    #[test]
    fn test_mid_block_dictionary_reset() {
        // Two dictionary-resetting uncompressed chunks inside one block:
        // the declared uncompressed size counts both, resets included.
        let payload = [
            0x01, 0x00, 0x01, b'a', b'b', //
            0x01, 0x00, 0x01, b'c', b'd', //
            0x00,
        ];

        let mut data = Vec::new();
        data.extend_from_slice(&STREAM_MAGIC);
        data.extend_from_slice(&[0x00, 0x01]);
        data.extend_from_slice(&Crc32::compute(&[0x00, 0x01]).to_le_bytes());

        // Block header: both sizes declared, LZMA2 filter, 4 KiB dictionary
        let header = [0x02, 0xC0, payload.len() as u8, 0x04, 0x21, 0x01, 0x00, 0x00];
        data.extend_from_slice(&header);
        data.extend_from_slice(&Crc32::compute(&header).to_le_bytes());

        data.extend_from_slice(&payload);
        data.push(0x00); // block padding to a 4-byte boundary
        data.extend_from_slice(&[0u8; 4]); // check value, not verified

        // Index: one record, padding already aligned, CRC not recomputed
        data.extend_from_slice(&[0x00, 0x01, 0x1B, 0x04]);
        data.extend_from_slice(&[0u8; 4]);

        // Footer: CRC not recomputed, backward size, flags, magic
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0x00, 0x01]);
        data.extend_from_slice(&FOOTER_MAGIC);

        assert_eq!(decode_buffer(&data, None).unwrap(), b"abcd");
    }

    #[test]
    fn test_block_header_rejects_foreign_filter() {
        // Header bytes: flags 0x00, filter id 0x03 (delta), props size 0x01,
        // distance 0x01, padding; size byte 2 covers 8 bytes.
        let body = [0x00, 0x03, 0x01, 0x01, 0x00, 0x00, 0x00];
        let mut crc = Crc32::new();
        crc.update(&[0x02]);
        crc.update(&body);
        let mut data = body.to_vec();
        data.extend_from_slice(&crc.finalize().to_le_bytes());

        let mut cursor = ByteCursor::new(&data);
        let err = parse_block_header(&mut cursor, 0x02).unwrap_err();
        assert!(matches!(err, XzError::UnsupportedFeature { .. }));
    }
}
