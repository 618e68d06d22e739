//! Error types for ruxz operations.
//!
//! Decode failures fall into three groups: container-structure problems
//! (bad magic, reserved bits, structural CRC mismatches), entropy-coded
//! payload corruption detected mid-decode, and well-formed input that uses
//! a feature this decoder does not implement. All of them are fatal for the
//! stream that raised them; nothing is retried.

use thiserror::Error;

/// The main error type for ruxz operations.
#[derive(Debug, Error)]
pub enum XzError {
    /// Invalid magic bytes in the stream header or footer.
    #[error("invalid magic: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Structurally invalid container data.
    #[error("malformed container: {message}")]
    MalformedContainer {
        /// Description of the structural violation.
        message: String,
    },

    /// Structural CRC-32 mismatch (stream header or block header).
    #[error("CRC mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Expected CRC value from the container.
        expected: u32,
        /// Computed CRC value from the data.
        computed: u32,
    },

    /// Corrupted compressed payload.
    #[error("corrupted stream at output offset {offset}: {message}")]
    CorruptedStream {
        /// Uncompressed output offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Well-formed input that uses a feature this decoder does not support.
    #[error("unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The unsupported feature.
        feature: String,
    },

    /// Unexpected end of the input buffer.
    #[error("unexpected end of input: needed {needed} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        needed: usize,
    },
}

/// Result type alias for ruxz operations.
pub type Result<T> = std::result::Result<T, XzError>;

impl XzError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed container error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedContainer {
            message: message.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create a corrupted stream error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedStream {
            offset,
            message: message.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(needed: usize) -> Self {
        Self::UnexpectedEof { needed }
    }
}
