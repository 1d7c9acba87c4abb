//!
//! Lossy differential audio codec used for compressed WAVE payloads in
//! MoPaQ-style archives. Supported operations are:
//!  - [`encode_adpcm`]: compress interleaved 16-bit samples (1 or 2 channels)
//!  - [`decode_adpcm`]: reconstruct samples from a compressed stream
//!  - [`decode_adpcm_v1`]: best-effort decoder for the older stream variant
//!
//! All operations work on caller-owned byte buffers, allocate nothing and
//! never panic on malformed or truncated input. Truncation on either side is
//! a normal early return: the functions report how many bytes were written,
//! and the caller compares that against the expected length.
//!

#![no_std]

#![forbid(
    unsafe_code,
    clippy::panic,
    clippy::exit,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unimplemented,
    clippy::todo,
    clippy::unreachable,
)]
#![deny(
    clippy::cast_ptr_alignment,
    clippy::char_lit_as_u8,
    clippy::unnecessary_cast,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
)]
#![allow(clippy::manual_range_contains)]

mod cursor;

mod adpcm;
pub use adpcm::{decode_adpcm, encode_adpcm};

mod adpcm_v1;
pub use adpcm_v1::decode_adpcm_v1;

/// Error values.
#[derive(Debug)]
pub enum Error {
    /// Invalid number of channels (only 1 or 2 are supported).
    InvalidChannels,

    /// Quality level outside the supported range 2..=7.
    InvalidQuality,

    /// Compressed stream header is malformed.
    InvalidHeader,
}
