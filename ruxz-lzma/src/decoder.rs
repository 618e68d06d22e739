//! LZMA chunk decoder.
//!
//! Decodes a single LZMA-compressed chunk: a fresh range-coder init followed
//! by a sequence of literal/match operations, optionally terminated by the
//! end-of-stream distance marker. State, probability models, repeat-distance
//! cache and dictionary survive across chunks so LZMA2 can resume or reset
//! them selectively.

use ruxz_core::cursor::ByteCursor;
use ruxz_core::error::{Result, XzError};

use crate::model::{
    DIST_ALIGN_BITS, DIST_SLOT_BITS, END_POS_MODEL_INDEX, LEN_HIGH_BITS, LEN_LOW_BITS,
    LEN_LOW_SYMBOLS, LEN_MID_BITS, LEN_MID_SYMBOLS, LengthModel, LzmaModel, LzmaProps,
    MATCH_LEN_MIN, State,
};
use crate::range_coder::RangeDecoder;
use crate::window::OutputWindow;

/// Minimum dictionary allocation, regardless of the declared size.
const MIN_DICT_ALLOC: u32 = 4096;

/// Distance value that marks the end of an LZMA stream.
const END_MARKER_DIST: u32 = u32::MAX;

/// Stateful decoder for LZMA chunks sharing one dictionary.
#[derive(Debug)]
pub struct ChunkDecoder {
    model: LzmaModel,
    state: State,
    reps: [u32; 4],
    /// Position base for pos_state, literal contexts and the distance
    /// check. Restarts at zero on a dictionary reset; cumulative output
    /// is tracked by the window.
    pos: u64,
    dict_size_check: u32,
    window: OutputWindow,
}

impl ChunkDecoder {
    /// Create a decoder with the given dictionary size and properties.
    pub fn new(dict_size: u32, props: LzmaProps) -> Self {
        let dict_size_check = dict_size.max(1);
        Self {
            model: LzmaModel::new(props),
            state: State::new(),
            reps: [0; 4],
            pos: 0,
            dict_size_check,
            window: OutputWindow::new(dict_size_check.max(MIN_DICT_ALLOC)),
        }
    }

    /// Replace the LZMA properties, rebuilding the literal model.
    pub fn set_props(&mut self, props: LzmaProps) {
        self.model = LzmaModel::new(props);
    }

    /// Reset the state machine, probability models and repeat distances.
    pub fn reset_state(&mut self) {
        self.state = State::new();
        self.reps = [0; 4];
        self.model.reset();
    }

    /// Forget all dictionary history.
    pub fn reset_dictionary(&mut self) {
        self.window.reset();
        self.pos = 0;
    }

    /// Append literal bytes from an uncompressed chunk.
    pub fn write_uncompressed(&mut self, data: &[u8]) {
        self.window.put_bytes(data);
        self.pos += data.len() as u64;
    }

    /// Flush the window and take all output produced so far.
    pub fn finish(&mut self) -> Vec<u8> {
        self.window.take_output()
    }

    /// Total bytes decoded across all chunks, dictionary resets included.
    pub fn total_out(&self) -> u64 {
        self.window.produced()
    }

    /// Decode one LZMA chunk from `cursor`.
    ///
    /// With `unpack_size` set, decoding stops once exactly that many bytes
    /// have been produced; an end marker before that point or any overshoot
    /// is corruption. With `None` the chunk must end with the marker.
    pub fn decode_chunk(&mut self, cursor: &mut ByteCursor<'_>, unpack_size: Option<u64>) -> Result<()> {
        let start = self.pos;
        let target = unpack_size.map(|n| start + n);

        let mut rc = RangeDecoder::new(cursor).map_err(|e| self.as_corruption(e))?;

        loop {
            if let Some(target) = target {
                if self.pos >= target {
                    break;
                }
            }

            let ended = match self.decode_op(&mut rc) {
                Ok(ended) => ended,
                Err(e) => return Err(self.as_corruption(e)),
            };

            if ended {
                if let Some(target) = target {
                    if self.pos != target {
                        return Err(XzError::corrupted(
                            self.total_out(),
                            "end marker before declared chunk size",
                        ));
                    }
                }
                break;
            }

            if let Some(target) = target {
                if self.pos > target {
                    return Err(XzError::corrupted(
                        self.total_out(),
                        "match overruns declared chunk size",
                    ));
                }
            }

            if target.is_none() && rc.is_input_empty() {
                return Err(XzError::corrupted(
                    self.total_out(),
                    "stream ended without end marker",
                ));
            }
        }

        Ok(())
    }

    /// Decode a single operation. Returns `true` on the end marker.
    fn decode_op(&mut self, rc: &mut RangeDecoder<'_, '_>) -> Result<bool> {
        let pos_state = (self.pos as usize) & self.model.props.pos_state_mask();
        let state = self.state.value();

        if rc.decode_bit(&mut self.model.is_match[state][pos_state])? == 0 {
            self.decode_literal(rc)?;
            return Ok(false);
        }

        let len;
        if rc.decode_bit(&mut self.model.is_rep[state])? == 1 {
            // Repeat match: pick one of the four cached distances.
            if self.pos == 0 {
                return Err(XzError::corrupted(
                    self.total_out(),
                    "repeat match at dictionary start",
                ));
            }

            if rc.decode_bit(&mut self.model.is_rep_g0[state])? == 0 {
                if rc.decode_bit(&mut self.model.is_rep0_long[state][pos_state])? == 0 {
                    // Short rep: a single byte at rep0.
                    self.state.update_short_rep();
                    let byte = self.window.get_byte(self.reps[0]);
                    self.window.put_byte(byte);
                    self.pos += 1;
                    return Ok(false);
                }
            } else {
                let dist;
                if rc.decode_bit(&mut self.model.is_rep_g1[state])? == 0 {
                    dist = self.reps[1];
                } else {
                    if rc.decode_bit(&mut self.model.is_rep_g2[state])? == 0 {
                        dist = self.reps[2];
                    } else {
                        dist = self.reps[3];
                        self.reps[3] = self.reps[2];
                    }
                    self.reps[2] = self.reps[1];
                }
                self.reps[1] = self.reps[0];
                self.reps[0] = dist;
            }

            len = MATCH_LEN_MIN + decode_length(rc, &mut self.model.rep_len, pos_state)?;
            self.state.update_long_rep();
        } else {
            // New match: rotate the distance cache and decode a fresh one.
            self.reps[3] = self.reps[2];
            self.reps[2] = self.reps[1];
            self.reps[1] = self.reps[0];

            len = MATCH_LEN_MIN + decode_length(rc, &mut self.model.match_len, pos_state)?;
            self.state.update_match();

            let dist = self.decode_distance(rc, len)?;
            if dist == END_MARKER_DIST {
                return Ok(true);
            }
            self.reps[0] = dist;
        }

        let dist = self.reps[0];
        if dist as u64 >= self.pos || dist >= self.dict_size_check {
            return Err(XzError::corrupted(
                self.total_out(),
                "match distance exceeds window",
            ));
        }

        self.window.copy_block(dist, len);
        self.pos += len as u64;
        Ok(false)
    }

    fn decode_literal(&mut self, rc: &mut RangeDecoder<'_, '_>) -> Result<()> {
        let prev_byte = if self.pos == 0 { 0 } else { self.window.get_byte(0) };
        let ctx = self.model.literal.context(self.pos, prev_byte);
        let probs = &mut self.model.literal.probs[ctx];

        let mut symbol = 1usize;
        if self.state.is_literal() {
            while symbol < 0x100 {
                symbol = (symbol << 1) | rc.decode_bit(&mut probs[symbol])? as usize;
            }
        } else {
            // After a match the matched byte steers the model until the
            // decoded bit diverges from it.
            let mut match_byte = self.window.get_byte(self.reps[0]) as usize;
            while symbol < 0x100 {
                match_byte <<= 1;
                let match_bit = match_byte & 0x100;
                let bit =
                    rc.decode_bit(&mut probs[0x100 + match_bit + symbol])? as usize;
                symbol = (symbol << 1) | bit;
                if match_bit != bit << 8 {
                    while symbol < 0x100 {
                        symbol = (symbol << 1) | rc.decode_bit(&mut probs[symbol])? as usize;
                    }
                    break;
                }
            }
        }

        self.window.put_byte((symbol & 0xFF) as u8);
        self.pos += 1;
        self.state.update_literal();
        Ok(())
    }

    fn decode_distance(&mut self, rc: &mut RangeDecoder<'_, '_>, len: u32) -> Result<u32> {
        let len_state = ((len - MATCH_LEN_MIN).min(3)) as usize;
        let slot = rc.decode_bit_tree(&mut self.model.distance.slot[len_state], DIST_SLOT_BITS)?;

        if slot < 4 {
            return Ok(slot);
        }

        let num_direct = (slot >> 1) - 1;
        let mut dist = (2 | (slot & 1)) << num_direct;

        if slot < END_POS_MODEL_INDEX {
            // Slots 4..14 draw their low bits from the shared position
            // models; node 1 of each sub-tree sits at index dist - slot.
            let offset = (dist - slot) as usize;
            dist |= rc.decode_bit_tree_reverse_at(
                &mut self.model.distance.pos_decoders,
                offset,
                num_direct,
            )?;
        } else {
            dist |= rc.decode_direct_bits(num_direct - DIST_ALIGN_BITS)? << DIST_ALIGN_BITS;
            dist |= rc.decode_bit_tree_reverse(&mut self.model.distance.align, DIST_ALIGN_BITS)?;
        }

        Ok(dist)
    }

    fn as_corruption(&self, err: XzError) -> XzError {
        match err {
            XzError::UnexpectedEof { .. } => {
                XzError::corrupted(self.total_out(), "input exhausted during bit decode")
            }
            other => other,
        }
    }
}

/// Decode a length symbol (0-based; add [`MATCH_LEN_MIN`] for the real length).
fn decode_length(
    rc: &mut RangeDecoder<'_, '_>,
    model: &mut LengthModel,
    pos_state: usize,
) -> Result<u32> {
    if rc.decode_bit(&mut model.choice)? == 0 {
        return rc.decode_bit_tree(&mut model.low[pos_state], LEN_LOW_BITS);
    }
    if rc.decode_bit(&mut model.choice2)? == 0 {
        let sym = rc.decode_bit_tree(&mut model.mid[pos_state], LEN_MID_BITS)?;
        return Ok(LEN_LOW_SYMBOLS as u32 + sym);
    }
    let sym = rc.decode_bit_tree(&mut model.high, LEN_HIGH_BITS)?;
    Ok((LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32 + sym)
}

/// Decode a raw LZMA chunk (range-coder payload only, default properties).
pub fn decompress_raw(data: &[u8], dict_size: u32, unpack_size: Option<u64>) -> Result<Vec<u8>> {
    let mut decoder = ChunkDecoder::new(dict_size, LzmaProps::default());
    let mut cursor = ByteCursor::new(data);
    decoder.decode_chunk(&mut cursor, unpack_size)?;
    Ok(decoder.finish())
}
