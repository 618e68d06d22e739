//! # ruxz Core
//!
//! Core components for the ruxz XZ/LZMA2 decoder.
//!
//! This crate provides the building blocks shared by the codec and
//! container layers:
//!
//! - [`cursor`]: forward-only byte cursor over an immutable input buffer
//! - [`crc`]: CRC-32 and CRC-64 checksums used by the XZ container
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! ruxz is a layered decoder:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ ruxz-xz: XZ container                        │
//! │     stream/block/index parsing, text pass    │
//! ├──────────────────────────────────────────────┤
//! │ ruxz-lzma: codec                             │
//! │     range decoder, models, LZMA2 framing     │
//! ├──────────────────────────────────────────────┤
//! │ ruxz-core (this crate)                       │
//! │     ByteCursor, CRC, errors                  │
//! └──────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crc;
pub mod cursor;
pub mod error;

// Re-exports for convenience
pub use crc::{Crc32, Crc64};
pub use cursor::ByteCursor;
pub use error::{Result, XzError};
