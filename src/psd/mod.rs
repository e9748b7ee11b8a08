//! Layered image writer.
//!
//! Produces a single-layer version-1 file: header, color-mode table, two
//! empty resource sections and the merged image data, raw or PackBits.

mod encode;

pub(crate) use encode::encode_layered;

use crate::error::EncodeError;
use crate::pixel::{Channel, ColorDescriptor};
use crate::surface::PixelSurface;

/// Largest width or height a version-1 file can describe.
pub const MAX_DIMENSION: u32 = 30_000;

/// Color mode code written to the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Bitmap = 0,
    Grayscale = 1,
    Indexed = 2,
    Rgb = 3,
}

impl ColorMode {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Bits per channel sample in the file.
    pub fn depth(self) -> u16 {
        match self {
            Self::Bitmap => 1,
            _ => 8,
        }
    }

    /// Channels written, in file order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::Rgb => &Channel::RGB,
            _ => &[Channel::Gray],
        }
    }

    /// Bytes in one stored row of one channel.
    pub fn row_bytes(self, width: u32) -> usize {
        match self {
            Self::Bitmap => (width as usize).div_ceil(8),
            _ => width as usize,
        }
    }
}

/// Pick the file color mode for a surface.
///
/// Indexed surfaces need a palette of 2 to 256 entries. Grayscale surfaces
/// (equal channel masks) become bitmaps at 1 bit per pixel and 8-bit gray
/// otherwise; any other direct color is written as RGB.
pub fn classify(surface: &PixelSurface) -> Result<ColorMode, EncodeError> {
    match surface.color_descriptor() {
        ColorDescriptor::Indexed { palette } => {
            if !(2..=256).contains(&palette.len()) {
                return Err(EncodeError::PreconditionViolation(alloc::format!(
                    "palette has {} entries, need 2..=256",
                    palette.len()
                )));
            }
            Ok(ColorMode::Indexed)
        }
        ColorDescriptor::Direct { masks } if masks.is_gray() => {
            if surface.bits_per_pixel() == 1 {
                Ok(ColorMode::Bitmap)
            } else {
                Ok(ColorMode::Grayscale)
            }
        }
        ColorDescriptor::Direct { .. } => Ok(ColorMode::Rgb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{ChannelMasks, Rgb};

    #[test]
    fn classification() {
        let cases = [
            (1, ColorDescriptor::direct(ChannelMasks::gray(1)), ColorMode::Bitmap),
            (4, ColorDescriptor::direct(ChannelMasks::gray(4)), ColorMode::Grayscale),
            (8, ColorDescriptor::direct(ChannelMasks::gray(8)), ColorMode::Grayscale),
            (16, ColorDescriptor::direct(ChannelMasks::RGB555), ColorMode::Rgb),
            (32, ColorDescriptor::direct(ChannelMasks::ARGB8888), ColorMode::Rgb),
            (
                2,
                ColorDescriptor::indexed(alloc::vec![Rgb::BLACK, Rgb::WHITE, Rgb::new(1, 2, 3)]),
                ColorMode::Indexed,
            ),
        ];
        for (bpp, color, mode) in cases {
            let s = PixelSurface::allocate(3, 3, bpp, color).unwrap();
            assert_eq!(classify(&s).unwrap(), mode, "{bpp} bpp");
        }
    }

    #[test]
    fn mode_geometry() {
        assert_eq!(ColorMode::Bitmap.row_bytes(9), 2);
        assert_eq!(ColorMode::Rgb.row_bytes(9), 9);
        assert_eq!(ColorMode::Rgb.channels().len(), 3);
        assert_eq!(ColorMode::Indexed.depth(), 8);
        assert_eq!(ColorMode::Bitmap.code(), 0);
    }
}
