//! # ruxz XZ
//!
//! Decoder for the XZ container format (LZMA2 filter only).
//!
//! The input is a complete in-memory buffer holding one or more XZ streams;
//! the output is the concatenated decompressed payload. Structural CRC-32
//! values (stream header, block headers) are verified; per-block check
//! values are parsed but not recomputed.
//!
//! ## Example
//!
//! ```
//! let data = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/hello.xz"));
//! let out = ruxz_xz::decompress(data)?;
//! assert_eq!(out, b"hello world\n");
//! assert_eq!(ruxz_xz::text::best_effort_text(&out), Some("hello world\n"));
//! # Ok::<(), ruxz_xz::XzError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod container;
pub mod text;

pub use ruxz_core::error::{Result, XzError};

/// Decompress every XZ stream in `data`, concatenating their outputs.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    container::decode_buffer(data, None)
}

/// Decompress with a throttled progress callback.
///
/// `on_progress` receives fractions in `[0.0, 1.0]`, at most once per 1000
/// LZMA2 chunks or 200 ms, and a final `1.0` on success. Intermediate
/// fractions are only reported while every block decoded so far declared
/// its uncompressed size in its header; otherwise only the final `1.0`
/// arrives.
pub fn decompress_with_progress(data: &[u8], mut on_progress: impl FnMut(f64)) -> Result<Vec<u8>> {
    container::decode_buffer(data, Some(&mut on_progress))
}
