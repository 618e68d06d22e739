//! LZMA probability models.
//!
//! LZMA keeps context-dependent probability models for:
//! - Literal decoding (context = previous byte + position)
//! - Match length decoding
//! - Distance decoding
//! - State machine transitions
//!
//! Every table entry is an 11-bit estimate of the probability that the next
//! bit in its context is 0, initialized to 1024 (50%).

use crate::range_coder::PROB_INIT;

/// Maximum number of position states (`pb` is at most 4).
pub const POS_STATES_MAX: usize = 1 << 4;

/// Number of states in the LZMA state machine.
pub const NUM_STATES: usize = 12;

/// Number of bits for low length coding.
pub const LEN_LOW_BITS: u32 = 3;
/// Number of bits for mid length coding.
pub const LEN_MID_BITS: u32 = 3;
/// Number of bits for high length coding.
pub const LEN_HIGH_BITS: u32 = 8;

/// Number of low length symbols.
pub const LEN_LOW_SYMBOLS: usize = 1 << LEN_LOW_BITS;
/// Number of mid length symbols.
pub const LEN_MID_SYMBOLS: usize = 1 << LEN_MID_BITS;
/// Number of high length symbols.
pub const LEN_HIGH_SYMBOLS: usize = 1 << LEN_HIGH_BITS;

/// Minimum match length.
pub const MATCH_LEN_MIN: u32 = 2;

/// Number of distance slots.
pub const DIST_SLOTS: usize = 64;
/// Bits in a distance slot symbol.
pub const DIST_SLOT_BITS: u32 = 6;

/// Number of alignment bits for distance decoding.
pub const DIST_ALIGN_BITS: u32 = 4;
/// Size of the alignment table.
pub const DIST_ALIGN_SIZE: usize = 1 << DIST_ALIGN_BITS;

/// First slot that switches from modeled to direct distance bits.
pub const END_POS_MODEL_INDEX: u32 = 14;

/// Number of distances covered entirely by the position models.
pub const FULL_DISTANCES: usize = 128;

/// Size of the shared position-model array for slots 4..14.
pub const NUM_POS_MODELS: usize = FULL_DISTANCES - END_POS_MODEL_INDEX as usize;

/// LZMA state machine state (0..=11), encoding recent operation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State(u8);

impl State {
    /// Initial state.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Get the state value.
    pub fn value(self) -> usize {
        self.0 as usize
    }

    /// States below 7 mean the previous operation was a literal.
    pub fn is_literal(self) -> bool {
        self.0 < 7
    }

    /// Update state after a literal.
    pub fn update_literal(&mut self) {
        self.0 = match self.0 {
            0..=3 => 0,
            4..=9 => self.0 - 3,
            _ => self.0 - 6,
        };
    }

    /// Update state after a new match.
    pub fn update_match(&mut self) {
        self.0 = if self.0 < 7 { 7 } else { 10 };
    }

    /// Update state after a single-byte rep0 repeat.
    pub fn update_short_rep(&mut self) {
        self.0 = if self.0 < 7 { 9 } else { 11 };
    }

    /// Update state after a rep match with a decoded length.
    pub fn update_long_rep(&mut self) {
        self.0 = if self.0 < 7 { 8 } else { 11 };
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// LZMA properties (lc, lp, pb).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzmaProps {
    /// Literal context bits.
    pub lc: u32,
    /// Literal position bits.
    pub lp: u32,
    /// Position bits.
    pub pb: u32,
}

impl LzmaProps {
    /// Create new properties.
    pub fn new(lc: u32, lp: u32, pb: u32) -> Self {
        Self { lc, lp, pb }
    }

    /// Parse from a properties byte (`lc + lp * 9 + pb * 45`).
    pub fn from_byte(byte: u8) -> Option<Self> {
        let lc = byte as u32 % 9;
        let remainder = byte as u32 / 9;
        let lp = remainder % 5;
        let pb = remainder / 5;

        if lc > 8 || lp > 4 || pb > 4 {
            return None;
        }

        Some(Self { lc, lp, pb })
    }

    /// Mask applied to the output position to get the position state.
    pub fn pos_state_mask(&self) -> usize {
        (1 << self.pb) - 1
    }

    /// Number of literal contexts.
    pub fn num_literal_contexts(&self) -> usize {
        1 << (self.lc + self.lp)
    }
}

impl Default for LzmaProps {
    fn default() -> Self {
        // lc=3, lp=0, pb=2 is the conventional default
        Self { lc: 3, lp: 0, pb: 2 }
    }
}

/// Length decoder model: 2 choice bits plus low/mid/high bit-trees.
#[derive(Debug, Clone)]
pub struct LengthModel {
    /// Choice bit (low vs mid+high).
    pub choice: u16,
    /// Choice2 bit (mid vs high).
    pub choice2: u16,
    /// Low length probabilities (per position state).
    pub low: [[u16; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
    /// Mid length probabilities (per position state).
    pub mid: [[u16; LEN_MID_SYMBOLS]; POS_STATES_MAX],
    /// High length probabilities (shared).
    pub high: [u16; LEN_HIGH_SYMBOLS],
}

impl LengthModel {
    /// Create a new length model.
    pub fn new() -> Self {
        Self {
            choice: PROB_INIT,
            choice2: PROB_INIT,
            low: [[PROB_INIT; LEN_LOW_SYMBOLS]; POS_STATES_MAX],
            mid: [[PROB_INIT; LEN_MID_SYMBOLS]; POS_STATES_MAX],
            high: [PROB_INIT; LEN_HIGH_SYMBOLS],
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        self.choice = PROB_INIT;
        self.choice2 = PROB_INIT;
        for arr in &mut self.low {
            arr.fill(PROB_INIT);
        }
        for arr in &mut self.mid {
            arr.fill(PROB_INIT);
        }
        self.high.fill(PROB_INIT);
    }
}

impl Default for LengthModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Literal decoder model: one 0x300-entry table per literal context.
#[derive(Debug, Clone)]
pub struct LiteralModel {
    /// Probability tables, indexed by literal context.
    pub probs: Vec<[u16; 0x300]>,
    lc: u32,
    pos_mask: u64,
}

impl LiteralModel {
    /// Create a new literal model for the given properties.
    pub fn new(props: LzmaProps) -> Self {
        Self {
            probs: vec![[PROB_INIT; 0x300]; props.num_literal_contexts()],
            lc: props.lc,
            pos_mask: (1 << props.lp) - 1,
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        for table in &mut self.probs {
            table.fill(PROB_INIT);
        }
    }

    /// Literal context index for the given output position and previous byte.
    pub fn context(&self, pos: u64, prev_byte: u8) -> usize {
        let low_pos = (pos & self.pos_mask) as usize;
        (low_pos << self.lc) + ((prev_byte as usize) >> (8 - self.lc as usize))
    }
}

/// Distance decoder model.
#[derive(Debug, Clone)]
pub struct DistanceModel {
    /// Distance slot bit-trees, one per length category.
    pub slot: [[u16; DIST_SLOTS]; 4],
    /// Shared position models for slots 4..14.
    pub pos_decoders: [u16; NUM_POS_MODELS],
    /// Alignment bit-tree for slots >= 14.
    pub align: [u16; DIST_ALIGN_SIZE],
}

impl DistanceModel {
    /// Create a new distance model.
    pub fn new() -> Self {
        Self {
            slot: [[PROB_INIT; DIST_SLOTS]; 4],
            pos_decoders: [PROB_INIT; NUM_POS_MODELS],
            align: [PROB_INIT; DIST_ALIGN_SIZE],
        }
    }

    /// Reset the model.
    pub fn reset(&mut self) {
        for tree in &mut self.slot {
            tree.fill(PROB_INIT);
        }
        self.pos_decoders.fill(PROB_INIT);
        self.align.fill(PROB_INIT);
    }
}

impl Default for DistanceModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete LZMA model containing all probability tables.
#[derive(Debug, Clone)]
pub struct LzmaModel {
    /// LZMA properties the model was built with.
    pub props: LzmaProps,

    /// Is-match probabilities, indexed by (state, pos_state).
    pub is_match: [[u16; POS_STATES_MAX]; NUM_STATES],
    /// Is-rep probabilities.
    pub is_rep: [u16; NUM_STATES],
    /// Is-rep-g0 probabilities.
    pub is_rep_g0: [u16; NUM_STATES],
    /// Is-rep-g1 probabilities.
    pub is_rep_g1: [u16; NUM_STATES],
    /// Is-rep-g2 probabilities.
    pub is_rep_g2: [u16; NUM_STATES],
    /// Is-rep0-long probabilities, indexed by (state, pos_state).
    pub is_rep0_long: [[u16; POS_STATES_MAX]; NUM_STATES],

    /// Match length model.
    pub match_len: LengthModel,
    /// Rep match length model.
    pub rep_len: LengthModel,

    /// Literal model.
    pub literal: LiteralModel,

    /// Distance model.
    pub distance: DistanceModel,
}

impl LzmaModel {
    /// Create a new model with all probabilities at their initial value.
    pub fn new(props: LzmaProps) -> Self {
        Self {
            props,
            is_match: [[PROB_INIT; POS_STATES_MAX]; NUM_STATES],
            is_rep: [PROB_INIT; NUM_STATES],
            is_rep_g0: [PROB_INIT; NUM_STATES],
            is_rep_g1: [PROB_INIT; NUM_STATES],
            is_rep_g2: [PROB_INIT; NUM_STATES],
            is_rep0_long: [[PROB_INIT; POS_STATES_MAX]; NUM_STATES],
            match_len: LengthModel::new(),
            rep_len: LengthModel::new(),
            literal: LiteralModel::new(props),
            distance: DistanceModel::new(),
        }
    }

    /// Reset all probabilities to their initial values.
    pub fn reset(&mut self) {
        for row in &mut self.is_match {
            row.fill(PROB_INIT);
        }
        self.is_rep.fill(PROB_INIT);
        self.is_rep_g0.fill(PROB_INIT);
        self.is_rep_g1.fill(PROB_INIT);
        self.is_rep_g2.fill(PROB_INIT);
        for row in &mut self.is_rep0_long {
            row.fill(PROB_INIT);
        }
        self.match_len.reset();
        self.rep_len.reset();
        self.literal.reset();
        self.distance.reset();
    }
}
