use alloc::vec::Vec;

use crate::error::SurfaceError;

/// One component plane of a surface.
///
/// Indexed and grayscale surfaces have a single [`Channel::Gray`] plane;
/// direct-color surfaces have red, green and blue planes, plus alpha for
/// four-component images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The only plane of an indexed or grayscale surface.
    Gray,
    Alpha,
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Output order for three-channel color: red, green, blue.
    pub const RGB: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
    /// Plane order of a four-component surface.
    pub const ARGB: [Channel; 4] = [Channel::Alpha, Channel::Red, Channel::Green, Channel::Blue];
}

/// Palette entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Bit layout of each channel within the nominal pixel word.
///
/// When red, green and blue masks are equal the surface is grayscale and
/// has one plane; otherwise the masks must be disjoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelMasks {
    pub alpha: u32,
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    /// Grayscale with `bits` significant bits.
    pub const fn gray(bits: u8) -> Self {
        let m = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
        Self {
            alpha: 0,
            red: m,
            green: m,
            blue: m,
        }
    }

    /// 16-bit x-5-5-5 direct color.
    pub const RGB555: Self = Self {
        alpha: 0,
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
    };

    /// 24-bit (or 32-bit with an unused top byte) direct color.
    pub const RGB888: Self = Self {
        alpha: 0,
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    /// 32-bit direct color with alpha in the top byte.
    pub const ARGB8888: Self = Self {
        alpha: 0xFF00_0000,
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    pub fn is_gray(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha != 0
    }

    /// Number of planes a surface with these masks stores.
    pub fn channel_count(&self) -> usize {
        if self.is_gray() {
            1
        } else if self.has_alpha() {
            4
        } else {
            3
        }
    }

    pub(crate) fn validate(&self, bits_per_pixel: u8) -> Result<(), SurfaceError> {
        let word = if bits_per_pixel >= 32 {
            u32::MAX
        } else {
            (1u32 << bits_per_pixel) - 1
        };
        let all = self.alpha | self.red | self.green | self.blue;
        if self.red == 0 || all & !word != 0 {
            return Err(SurfaceError::DescriptorMismatch { bits_per_pixel });
        }
        if self.is_gray() {
            if self.alpha != 0 {
                return Err(SurfaceError::OverlappingMasks);
            }
            return Ok(());
        }
        let masks = [self.alpha, self.red, self.green, self.blue];
        for (i, a) in masks.iter().enumerate() {
            for b in &masks[i + 1..] {
                if a & b != 0 {
                    return Err(SurfaceError::OverlappingMasks);
                }
            }
        }
        Ok(())
    }

    /// Position and width of a mask's contiguous bit range.
    pub(crate) fn field(mask: u32) -> (u32, u32) {
        if mask == 0 {
            return (0, 0);
        }
        let shift = mask.trailing_zeros();
        let bits = (mask >> shift).trailing_ones();
        (shift, bits)
    }
}

/// How sample values map to color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorDescriptor {
    /// Samples are palette indices.
    Indexed { palette: Vec<Rgb> },
    /// Samples are channel values laid out by the masks.
    Direct { masks: ChannelMasks },
}

impl ColorDescriptor {
    pub fn indexed(palette: Vec<Rgb>) -> Self {
        Self::Indexed { palette }
    }

    pub fn direct(masks: ChannelMasks) -> Self {
        Self::Direct { masks }
    }

    /// Fixed two-entry black and white table.
    pub fn black_and_white() -> Self {
        Self::Indexed {
            palette: alloc::vec![Rgb::BLACK, Rgb::WHITE],
        }
    }

    pub fn channel_count(&self) -> usize {
        match self {
            Self::Indexed { .. } => 1,
            Self::Direct { masks } => masks.channel_count(),
        }
    }

    /// Channels in plane order.
    pub fn channels(&self) -> &'static [Channel] {
        match self.channel_count() {
            1 => &[Channel::Gray],
            3 => &Channel::RGB,
            _ => &Channel::ARGB,
        }
    }

    pub(crate) fn validate(&self, bits_per_pixel: u8) -> Result<(), SurfaceError> {
        match self {
            Self::Indexed { palette } => {
                if !(2..=256).contains(&palette.len()) {
                    return Err(SurfaceError::PaletteSize(palette.len()));
                }
                if bits_per_pixel > 8 {
                    return Err(SurfaceError::DescriptorMismatch { bits_per_pixel });
                }
                Ok(())
            }
            Self::Direct { masks } => {
                masks.validate(bits_per_pixel)?;
                let ok = if masks.is_gray() {
                    bits_per_pixel <= 8
                } else {
                    bits_per_pixel >= 16
                };
                if ok {
                    Ok(())
                } else {
                    Err(SurfaceError::DescriptorMismatch { bits_per_pixel })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts() {
        assert_eq!(ChannelMasks::gray(1).channel_count(), 1);
        assert_eq!(ChannelMasks::RGB555.channel_count(), 3);
        assert_eq!(ChannelMasks::ARGB8888.channel_count(), 4);
        assert_eq!(ColorDescriptor::black_and_white().channel_count(), 1);
    }

    #[test]
    fn mask_fields() {
        assert_eq!(ChannelMasks::field(0x7C00), (10, 5));
        assert_eq!(ChannelMasks::field(0x00FF_0000), (16, 8));
        assert_eq!(ChannelMasks::field(0), (0, 0));
    }

    #[test]
    fn overlapping_masks_rejected() {
        let masks = ChannelMasks {
            alpha: 0,
            red: 0xFF00,
            green: 0x0FF0,
            blue: 0x000F,
        };
        assert_eq!(masks.validate(16), Err(SurfaceError::OverlappingMasks));
        assert!(ChannelMasks::RGB555.validate(16).is_ok());
    }

    #[test]
    fn masks_must_fit_word() {
        assert_eq!(
            ChannelMasks::RGB888.validate(16),
            Err(SurfaceError::DescriptorMismatch { bits_per_pixel: 16 })
        );
        assert!(ChannelMasks::gray(4).validate(4).is_ok());
    }

    #[test]
    fn palette_size_bounds() {
        let one = ColorDescriptor::indexed(alloc::vec![Rgb::BLACK]);
        assert_eq!(one.validate(8), Err(SurfaceError::PaletteSize(1)));
        assert!(ColorDescriptor::black_and_white().validate(1).is_ok());
    }
}
