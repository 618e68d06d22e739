//! # ruxz LZMA
//!
//! LZMA and LZMA2 decoding for the ruxz XZ decoder.
//!
//! The codec is split along the layers of the format itself:
//!
//! - [`range_coder`]: adaptive binary range decoder
//! - [`model`]: probability models and the LZMA state machine
//! - [`window`]: circular dictionary and output accumulator
//! - [`decoder`]: single-chunk LZMA decoding
//! - [`lzma2`]: LZMA2 chunk framing over the chunk decoder
//!
//! ## Example
//!
//! ```
//! use ruxz_lzma::lzma2::decode_lzma2;
//!
//! // Minimal LZMA2 stream: one uncompressed chunk, then end-of-stream.
//! let stream = [0x01, 0x00, 0x04, b'h', b'e', b'l', b'l', b'o', 0x00];
//! assert_eq!(decode_lzma2(&stream, 1 << 16).unwrap(), b"hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decoder;
pub mod lzma2;
pub mod model;
pub mod range_coder;
pub mod window;

pub use decoder::{ChunkDecoder, decompress_raw};
pub use lzma2::{Lzma2Decoder, decode_lzma2, dict_size_from_props};
pub use model::LzmaProps;
