//! Adaptive binary range decoder.
//!
//! The range decoder narrows a 32-bit interval per decoded bit, driven by
//! 11-bit adaptive probability estimates (2048 = certainty of bit 0). After
//! every decode the interval is renormalized: whenever the top byte of
//! `range` becomes zero, one input byte is shifted into `code` and `range`
//! is shifted left by 8, so `range` never reaches zero.

use ruxz_core::cursor::ByteCursor;
use ruxz_core::error::Result;

/// Number of bits in the probability model.
pub const PROB_BITS: u32 = 11;

/// Initial probability (50%).
pub const PROB_INIT: u16 = 1 << (PROB_BITS - 1);

/// Maximum probability value (exclusive bound).
pub const PROB_MAX: u16 = 1 << PROB_BITS;

/// Number of bits to shift for probability adaptation.
pub const MOVE_BITS: u32 = 5;

/// Renormalization threshold: top byte of `range` must stay nonzero.
const TOP_VALUE: u32 = 1 << 24;

/// Range decoder over a borrowed byte cursor.
#[derive(Debug)]
pub struct RangeDecoder<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    range: u32,
    code: u32,
}

impl<'c, 'a> RangeDecoder<'c, 'a> {
    /// Create a new range decoder, consuming the 5 initialization bytes.
    ///
    /// The first byte is shifted out of the 32-bit `code` again, so its
    /// value does not matter, but it is still consumed.
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Result<Self> {
        let mut code = 0u32;
        for _ in 0..5 {
            code = (code << 8) | cursor.read_u8()? as u32;
        }

        Ok(Self {
            cursor,
            range: 0xFFFF_FFFF,
            code,
        })
    }

    /// Whether the underlying input has been fully consumed.
    pub fn is_input_empty(&self) -> bool {
        self.cursor.is_empty()
    }

    #[inline]
    fn normalize(&mut self) -> Result<()> {
        if self.range < TOP_VALUE {
            self.code = (self.code << 8) | self.cursor.read_u8()? as u32;
            self.range <<= 8;
        }
        Ok(())
    }

    /// Decode a single bit with the given adaptive probability.
    pub fn decode_bit(&mut self, prob: &mut u16) -> Result<u32> {
        let bound = (self.range >> PROB_BITS) * (*prob as u32);

        let bit = if self.code < bound {
            self.range = bound;
            *prob += (PROB_MAX - *prob) >> MOVE_BITS;
            0
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob -= *prob >> MOVE_BITS;
            1
        };

        self.normalize()?;
        Ok(bit)
    }

    /// Decode a single bit with fixed 50% probability.
    pub fn decode_direct_bit(&mut self) -> Result<u32> {
        self.range >>= 1;
        self.code = self.code.wrapping_sub(self.range);

        let bit = if (self.code as i32) < 0 {
            self.code = self.code.wrapping_add(self.range);
            0
        } else {
            1
        };

        self.normalize()?;
        Ok(bit)
    }

    /// Decode `count` unmodeled bits, MSB first.
    pub fn decode_direct_bits(&mut self, count: u32) -> Result<u32> {
        let mut result = 0u32;
        for _ in 0..count {
            result = (result << 1) | self.decode_direct_bit()?;
        }
        Ok(result)
    }

    /// Decode a bit-tree symbol, MSB first.
    pub fn decode_bit_tree(&mut self, probs: &mut [u16], num_bits: u32) -> Result<u32> {
        let mut m = 1usize;

        for _ in 0..num_bits {
            let bit = self.decode_bit(&mut probs[m])?;
            m = (m << 1) | bit as usize;
        }

        Ok((m as u32) - (1 << num_bits))
    }

    /// Decode a bit-tree symbol, emitting bits LSB first.
    pub fn decode_bit_tree_reverse(&mut self, probs: &mut [u16], num_bits: u32) -> Result<u32> {
        self.decode_bit_tree_reverse_at(probs, 1, num_bits)
    }

    /// Reverse bit-tree decode over a shared probability slice, with the
    /// tree's node 1 mapped to `probs[offset]`.
    pub fn decode_bit_tree_reverse_at(
        &mut self,
        probs: &mut [u16],
        offset: usize,
        num_bits: u32,
    ) -> Result<u32> {
        let mut result = 0u32;
        let mut m = 1usize;

        for i in 0..num_bits {
            let bit = self.decode_bit(&mut probs[offset + m - 1])?;
            m = (m << 1) | bit as usize;
            result |= bit << i;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder_over<'c, 'a>(cur: &'c mut ByteCursor<'a>) -> RangeDecoder<'c, 'a> {
        RangeDecoder::new(cur).unwrap()
    }

    #[test]
    fn test_init_consumes_five_bytes() {
        let data = [0x00, 0x12, 0x34, 0x56, 0x78, 0xAA];
        let mut cur = ByteCursor::new(&data);
        let rc = decoder_over(&mut cur);
        assert_eq!(rc.code, 0x12345678);
        assert_eq!(rc.range, 0xFFFF_FFFF);
        assert_eq!(rc.cursor.remaining(), 1);
    }

    #[test]
    fn test_first_init_byte_ignored() {
        let a = [0x00, 0x12, 0x34, 0x56, 0x78];
        let b = [0xFF, 0x12, 0x34, 0x56, 0x78];
        let mut ca = ByteCursor::new(&a);
        let mut cb = ByteCursor::new(&b);
        assert_eq!(decoder_over(&mut ca).code, decoder_over(&mut cb).code);
    }

    #[test]
    fn test_probability_update_bounds_and_step() {
        // All-ones input drives every decode to bit 1
        let data = [0xFF; 64];
        let mut cur = ByteCursor::new(&data);
        let mut rc = decoder_over(&mut cur);

        let mut prob = PROB_INIT;
        for _ in 0..100 {
            let before = prob;
            let bit = rc.decode_bit(&mut prob).unwrap();
            assert_eq!(bit, 1);
            assert_eq!(prob, before - (before >> MOVE_BITS));
            assert!(prob < PROB_MAX);
        }
    }

    #[test]
    fn test_probability_moves_toward_zero_bit() {
        // Code 0 stays below every bound, so every decode yields bit 0
        let mut data = vec![0u8; 5];
        data.extend_from_slice(&[0u8; 64]);
        let mut cur = ByteCursor::new(&data);
        let mut rc = decoder_over(&mut cur);

        let mut prob = PROB_INIT;
        for _ in 0..100 {
            let before = prob;
            let bit = rc.decode_bit(&mut prob).unwrap();
            assert_eq!(bit, 0);
            assert_eq!(prob, before + ((PROB_MAX - before) >> MOVE_BITS));
            assert!(prob < PROB_MAX);
        }
    }

    #[test]
    fn test_exhaustion_mid_decode_fails() {
        // Exactly the 5 init bytes and nothing to renormalize from
        let data = [0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut cur = ByteCursor::new(&data);
        let mut rc = decoder_over(&mut cur);

        let mut prob = PROB_INIT;
        let mut result = Ok(0);
        for _ in 0..64 {
            result = rc.decode_bit(&mut prob);
            if result.is_err() {
                break;
            }
        }
        assert!(result.is_err());
    }

    #[test]
    fn test_direct_bits_msb_first() {
        // code starts exactly at the halfway point of the interval: the
        // first direct bit is 1, every following bit lands in the low half.
        let data = [0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut cur = ByteCursor::new(&data);
        let mut rc = decoder_over(&mut cur);
        assert_eq!(rc.decode_direct_bits(4).unwrap(), 0b1000);
    }

    #[test]
    fn test_bit_tree_all_one_bits() {
        let data = [0xFF; 32];
        let mut cur = ByteCursor::new(&data);
        let mut rc = decoder_over(&mut cur);
        let mut probs = [PROB_INIT; 1 << 6];
        // every modeled bit decodes to 1, walking to the last leaf
        assert_eq!(rc.decode_bit_tree(&mut probs, 6).unwrap(), 63);
    }
}
