//! LZMA2 chunk framing.
//!
//! LZMA2 wraps raw LZMA chunks in a lightweight framing layer. Each chunk
//! starts with a control byte:
//!
//! - `0x00`: end of the LZMA2 stream
//! - `0x01` / `0x02`: uncompressed chunk (`0x01` also resets the dictionary)
//! - `0x80..=0xFF`: LZMA chunk; bits 5-6 select how much decoder state is
//!   reset before the chunk (nothing, state, state + properties, or
//!   everything including the dictionary)
//! - anything else: malformed

use ruxz_core::cursor::ByteCursor;
use ruxz_core::error::{Result, XzError};

use crate::decoder::ChunkDecoder;
use crate::model::LzmaProps;

/// Decoder for a sequence of LZMA2 chunks.
#[derive(Debug)]
pub struct Lzma2Decoder {
    decoder: ChunkDecoder,
    props: Option<LzmaProps>,
    chunks: u64,
}

impl Lzma2Decoder {
    /// Create a decoder with the given dictionary size.
    pub fn new(dict_size: u32) -> Self {
        Self {
            decoder: ChunkDecoder::new(dict_size, LzmaProps::default()),
            props: None,
            chunks: 0,
        }
    }

    /// Number of chunks decoded so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Total bytes of output produced so far.
    pub fn total_out(&self) -> u64 {
        self.decoder.total_out()
    }

    /// Decode chunks until the end-of-stream control byte, invoking
    /// `on_chunk` after each chunk.
    pub fn run(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        mut on_chunk: impl FnMut(&Self),
    ) -> Result<()> {
        loop {
            let control = cursor.read_u8()?;

            match control {
                0x00 => break,
                0x01 | 0x02 => {
                    let size = cursor.read_u16be()? as usize + 1;
                    if control == 0x01 {
                        self.decoder.reset_dictionary();
                    }
                    // An uncompressed chunk invalidates the LZMA state.
                    self.decoder.reset_state();
                    let data = cursor.read_bytes(size)?;
                    self.decoder.write_uncompressed(data);
                }
                0x03..=0x7F => {
                    return Err(XzError::malformed("invalid LZMA2 control byte"));
                }
                _ => {
                    let unpack_size =
                        (((control as u64 & 0x1F) << 16) | cursor.read_u16be()? as u64) + 1;
                    let pack_size = cursor.read_u16be()? as usize + 1;
                    let reset = (control >> 5) & 0x03;

                    if reset >= 2 {
                        let byte = cursor.read_u8()?;
                        let props = LzmaProps::from_byte(byte)
                            .ok_or_else(|| XzError::malformed("invalid LZMA properties"))?;
                        self.decoder.set_props(props);
                        self.props = Some(props);
                    } else if self.props.is_none() {
                        return Err(XzError::malformed(
                            "LZMA2 chunk before any properties chunk",
                        ));
                    }

                    if reset >= 1 {
                        self.decoder.reset_state();
                    }
                    if reset == 3 {
                        self.decoder.reset_dictionary();
                    }

                    let payload = cursor.read_bytes(pack_size)?;
                    let mut chunk_cursor = ByteCursor::new(payload);
                    self.decoder.decode_chunk(&mut chunk_cursor, Some(unpack_size))?;
                }
            }

            self.chunks += 1;
            on_chunk(self);
        }

        Ok(())
    }

    /// Flush and take the decoded output.
    pub fn finish(&mut self) -> Vec<u8> {
        self.decoder.finish()
    }
}

/// Decode a complete LZMA2 stream.
pub fn decode_lzma2(data: &[u8], dict_size: u32) -> Result<Vec<u8>> {
    let mut decoder = Lzma2Decoder::new(dict_size);
    let mut cursor = ByteCursor::new(data);
    decoder.run(&mut cursor, |_| {})?;
    Ok(decoder.finish())
}

/// Decode the XZ encoding of an LZMA2 dictionary size: `2 | (bits & 1)`
/// shifted by `bits / 2 + 11`, with 40 meaning 4 GiB.
pub fn dict_size_from_props(props: u8) -> Result<u32> {
    if props & 0xC0 != 0 {
        return Err(XzError::malformed("reserved bits in LZMA2 dictionary size"));
    }
    let bits = props & 0x3F;
    if bits > 40 {
        return Err(XzError::malformed("invalid LZMA2 dictionary size"));
    }
    if bits == 40 {
        return Err(XzError::unsupported("4 GiB LZMA2 dictionary"));
    }
    Ok((2 | (bits as u32 & 1)) << (bits / 2 + 11))
}
