//! Legacy picture container decoder.
//!
//! Handles both header generations, bitmap and pixmap blocks (plain,
//! PackBits and direct-color), and skips clip regions and comments. Vector
//! drawing opcodes are treated as zero-length no-ops.

mod decode;
mod header;
mod opcode;
mod pixmap;

pub use header::{ExtendedHeader, Generation, PictInfo, Rect};
pub use opcode::Opcode;

pub(crate) use decode::{DecodeOptions, decode_picture_with};

/// Bytes of platform-reserved data ahead of the picture in a standalone file.
pub const PLATFORM_PREFIX_LEN: usize = 512;

/// Controls how strictly the decoder validates input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permissiveness {
    /// Reject any deviation: an unexpected extended header opcode or
    /// version, multi-component indexed pixmaps, color table indices out of
    /// range, row strides too small for the block width, and compressed rows
    /// that decode short.
    Strict,

    /// Default behavior. Zero-fill short rows and ignore stray color table
    /// entries; everything else is an error.
    #[default]
    Standard,

    /// Also accept a stream that ends without an end-of-picture opcode once
    /// an image has been decoded, and clamp a row's declared length to the
    /// bytes that remain.
    Permissive,
}
