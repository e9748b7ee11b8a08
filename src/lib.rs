//! # zenpict
//!
//! Legacy picture (PICT) decoder and single-layer PSD encoder sharing one
//! PackBits codec and one multi-depth pixel surface.
//!
//! ## Supported input
//!
//! - Version 1 and version 2 pictures, with or without the 512-byte prefix
//! - 1-bit bitmaps, 1/2/4/8-bit indexed pixmaps with inline color tables
//! - 16-bit (x-5-5-5) and 32-bit (RGB or ARGB) direct pixmaps
//! - Raw and PackBits rows, clip regions, comments, mask regions
//! - Pictures split into several same-shape bands
//!
//! ## Output
//!
//! Version-1 layered image files in bitmap, grayscale, indexed or RGB mode,
//! raw or PackBits-compressed with a per-row length table.
//!
//! ## Non-Goals
//!
//! - Vector drawing opcodes (lines, polygons, text). They are skipped.
//! - Reading layered image files, or writing more than one layer
//! - Color management
//!
//! ## Usage
//!
//! ```no_run
//! use zenpict::{DecodeRequest, EncodeRequest, PictInfo, Unstoppable};
//!
//! let data: &[u8] = &[]; // your picture bytes
//!
//! // Probe without decoding
//! let info = PictInfo::from_bytes(data)?;
//! println!("{}x{} {:?}", info.width(), info.height(), info.generation);
//!
//! let surface = DecodeRequest::new(data).decode(Unstoppable)?;
//! let psd = EncodeRequest::new()
//!     .with_compression(true)
//!     .encode(&surface, Unstoppable)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod cursor;
mod decode;
mod encode;
mod error;
mod limits;
mod pixel;
mod progress;
mod surface;

pub mod packbits;
pub mod packing;
pub mod pict;
pub mod psd;

pub use cursor::{ByteReader, ByteWriter};
pub use decode::DecodeRequest;
pub use encode::EncodeRequest;
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{DecodeError, EncodeError, RleError, SurfaceError};
pub use limits::Limits;
pub use pict::{Generation, Permissiveness, PictInfo};
pub use pixel::{Channel, ChannelMasks, ColorDescriptor, Rgb};
pub use progress::{NoProgress, Progress};
pub use psd::ColorMode;
pub use surface::PixelSurface;

/// Decode a standalone picture file from the reader's position.
///
/// The reader must sit at the start of the 512-byte platform prefix. On
/// success it is left just past the end-of-picture opcode.
pub fn decode_picture(reader: &mut ByteReader<'_>) -> Result<PixelSurface, DecodeError> {
    reader.skip(pict::PLATFORM_PREFIX_LEN)?;
    pict::decode_picture_with(reader, pict::DecodeOptions::default(), &Unstoppable)
}

/// Write `surface` as a layered image at the writer's cursor.
pub fn encode_layered_image(
    surface: &PixelSurface,
    writer: &mut ByteWriter,
    compress: bool,
) -> Result<(), EncodeError> {
    psd::encode_layered(surface, writer, compress, &NoProgress, &Unstoppable)
}

/// Decode a standalone picture file with default settings.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<PixelSurface, DecodeError> {
    DecodeRequest::new(data).decode(stop)
}

/// Encode a surface as a layered image file.
pub fn encode(surface: &PixelSurface, compress: bool, stop: impl Stop) -> Result<alloc::vec::Vec<u8>, EncodeError> {
    EncodeRequest::new().with_compression(compress).encode(surface, stop)
}
