//! Multi-depth raster store.
//!
//! Samples live in one byte plane per channel, one byte per pixel whatever
//! the nominal depth: sub-byte samples are kept expanded and only compacted
//! when a packed view is requested. 16-bit direct color is the exception and
//! is kept as packed x-5-5-5 words.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::SurfaceError;
use crate::packing::{self, SampleBits};
use crate::pixel::{Channel, ChannelMasks, ColorDescriptor};

const SUPPORTED_DEPTHS: [u8; 7] = [1, 2, 4, 8, 16, 24, 32];

#[derive(Clone, Debug, PartialEq, Eq)]
enum Storage {
    Planes(Vec<Vec<u8>>),
    Words(Vec<u16>),
}

/// A fixed-size image with a color descriptor and per-channel planes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    bits_per_pixel: u8,
    color: ColorDescriptor,
    storage: Storage,
}

impl PixelSurface {
    /// Allocate a zero-filled surface.
    ///
    /// `bits_per_pixel` must be one of 1, 2, 4, 8, 16, 24 or 32 and agree
    /// with `color`: indexed and grayscale surfaces are at most 8 bits deep,
    /// direct color at least 16.
    pub fn allocate(
        width: u32,
        height: u32,
        bits_per_pixel: u8,
        color: ColorDescriptor,
    ) -> Result<Self, SurfaceError> {
        if !SUPPORTED_DEPTHS.contains(&bits_per_pixel) {
            return Err(SurfaceError::UnsupportedDepth(bits_per_pixel));
        }
        color.validate(bits_per_pixel)?;
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or(SurfaceError::InvalidDimensions { width, height })?;

        let storage = if bits_per_pixel == 16 {
            Storage::Words(vec![0u16; pixels])
        } else {
            let planes = (0..color.channel_count())
                .map(|_| vec![0u8; pixels])
                .collect();
            Storage::Planes(planes)
        };

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            color,
            storage,
        })
    }

    /// Bytes [`allocate`](Self::allocate) would reserve for this shape.
    pub fn allocation_size(width: u32, height: u32, bits_per_pixel: u8, channels: usize) -> u64 {
        let pixels = u64::from(width) * u64::from(height);
        if bits_per_pixel == 16 {
            pixels * 2
        } else {
            pixels * channels as u64
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn color_descriptor(&self) -> &ColorDescriptor {
        &self.color
    }

    pub fn channel_count(&self) -> usize {
        self.color.channel_count()
    }

    /// Channels in plane order.
    pub fn channels(&self) -> &'static [Channel] {
        self.color.channels()
    }

    /// Whether samples are stored as packed 16-bit words.
    pub fn is_packed_words(&self) -> bool {
        matches!(self.storage, Storage::Words(_))
    }

    fn check_row(&self, row: u32) -> Result<core::ops::Range<usize>, SurfaceError> {
        if row >= self.height {
            return Err(SurfaceError::RowOutOfRange {
                row,
                height: self.height,
            });
        }
        let w = self.width as usize;
        let start = row as usize * w;
        Ok(start..start + w)
    }

    fn plane_index(&self, channel: Channel) -> Result<usize, SurfaceError> {
        self.channels()
            .iter()
            .position(|&c| c == channel)
            .ok_or(SurfaceError::MissingChannel(channel))
    }

    /// Whole plane for `channel`, row-major.
    pub fn plane(&self, channel: Channel) -> Result<&[u8], SurfaceError> {
        let idx = self.plane_index(channel)?;
        match &self.storage {
            Storage::Planes(planes) => Ok(&planes[idx]),
            Storage::Words(_) => Err(SurfaceError::PackedStorage),
        }
    }

    pub fn channel_row(&self, channel: Channel, row: u32) -> Result<&[u8], SurfaceError> {
        let range = self.check_row(row)?;
        Ok(&self.plane(channel)?[range])
    }

    pub fn channel_row_mut(&mut self, channel: Channel, row: u32) -> Result<&mut [u8], SurfaceError> {
        let range = self.check_row(row)?;
        let idx = self.plane_index(channel)?;
        match &mut self.storage {
            Storage::Planes(planes) => Ok(&mut planes[idx][range]),
            Storage::Words(_) => Err(SurfaceError::PackedStorage),
        }
    }

    /// Overwrite one row of one channel. `data` must be exactly `width` bytes.
    pub fn set_channel_row(&mut self, channel: Channel, row: u32, data: &[u8]) -> Result<(), SurfaceError> {
        let dst = self.channel_row_mut(channel, row)?;
        if dst.len() != data.len() {
            return Err(SurfaceError::RowLength {
                expected: dst.len(),
                actual: data.len(),
            });
        }
        dst.copy_from_slice(data);
        Ok(())
    }

    /// One row of packed 16-bit words.
    pub fn word_row(&self, row: u32) -> Result<&[u16], SurfaceError> {
        let range = self.check_row(row)?;
        match &self.storage {
            Storage::Words(words) => Ok(&words[range]),
            Storage::Planes(_) => Err(SurfaceError::PlanarStorage),
        }
    }

    pub fn set_word_row(&mut self, row: u32, data: &[u16]) -> Result<(), SurfaceError> {
        let range = self.check_row(row)?;
        let words = match &mut self.storage {
            Storage::Words(words) => words,
            Storage::Planes(_) => return Err(SurfaceError::PlanarStorage),
        };
        let dst = &mut words[range];
        if dst.len() != data.len() {
            return Err(SurfaceError::RowLength {
                expected: dst.len(),
                actual: data.len(),
            });
        }
        dst.copy_from_slice(data);
        Ok(())
    }

    /// Compact a single-plane row to its nominal depth.
    ///
    /// Writes `ceil(width * bits_per_pixel / 8)` bytes into `out` and returns
    /// that count. 8-bit surfaces are copied as-is.
    pub fn packed_row(&self, row: u32, out: &mut [u8]) -> Result<usize, SurfaceError> {
        let bits = SampleBits::from_bits(self.bits_per_pixel)
            .ok_or(SurfaceError::UnsupportedDepth(self.bits_per_pixel))?;
        let src = self.channel_row(Channel::Gray, row)?;
        let len = bits.packed_len(src.len());
        let actual = out.len();
        let dst = out.get_mut(..len).ok_or(SurfaceError::RowLength {
            expected: len,
            actual,
        })?;
        packing::compact(bits, src, dst);
        Ok(len)
    }

    /// Extract one 8-bit color channel of a row, whatever the storage.
    ///
    /// Palette indices are looked up, grayscale is replicated into red,
    /// green and blue, packed words are split by their masks, and narrow
    /// fields are scaled to the full 0..=255 range. `out` must hold at least
    /// `width` bytes.
    pub fn rgb_channel_row(&self, channel: Channel, row: u32, out: &mut [u8]) -> Result<(), SurfaceError> {
        let w = self.width as usize;
        let actual = out.len();
        let out = out.get_mut(..w).ok_or(SurfaceError::RowLength {
            expected: w,
            actual,
        })?;
        if channel == Channel::Gray {
            return Err(SurfaceError::MissingChannel(channel));
        }

        match (&self.color, &self.storage) {
            (ColorDescriptor::Indexed { palette }, Storage::Planes(_)) => {
                if channel == Channel::Alpha {
                    return Err(SurfaceError::MissingChannel(channel));
                }
                let src = self.channel_row(Channel::Gray, row)?;
                for (o, &idx) in out.iter_mut().zip(src) {
                    let entry = palette.get(idx as usize).copied().unwrap_or_default();
                    *o = match channel {
                        Channel::Red => entry.r,
                        Channel::Green => entry.g,
                        _ => entry.b,
                    };
                }
            }
            (ColorDescriptor::Direct { masks }, Storage::Planes(_)) if masks.is_gray() => {
                if channel == Channel::Alpha {
                    return Err(SurfaceError::MissingChannel(channel));
                }
                out.copy_from_slice(self.channel_row(Channel::Gray, row)?);
                packing::promote_to_8bit(self.bits_per_pixel, out);
            }
            (ColorDescriptor::Direct { masks }, Storage::Planes(_)) => {
                let (_, bits) = ChannelMasks::field(mask_of(masks, channel));
                out.copy_from_slice(self.channel_row(channel, row)?);
                if bits < 8 {
                    for o in out.iter_mut() {
                        *o = packing::scale_to_8bit(u32::from(*o), bits);
                    }
                }
            }
            (ColorDescriptor::Direct { masks }, Storage::Words(_)) => {
                let mask = mask_of(masks, channel);
                if mask == 0 {
                    return Err(SurfaceError::MissingChannel(channel));
                }
                let (shift, bits) = ChannelMasks::field(mask);
                let src = self.word_row(row)?;
                for (o, &word) in out.iter_mut().zip(src) {
                    *o = packing::scale_to_8bit((u32::from(word) & mask) >> shift, bits);
                }
            }
            (ColorDescriptor::Indexed { .. }, Storage::Words(_)) => {
                return Err(SurfaceError::PackedStorage);
            }
        }
        Ok(())
    }

    /// Compose an interleaved RGB8 buffer, row-major.
    pub fn to_rgb8(&self) -> Result<Vec<u8>, SurfaceError> {
        let w = self.width as usize;
        let mut out = vec![0u8; w * self.height as usize * 3];
        let mut scratch = vec![0u8; w];
        for row in 0..self.height {
            let dst = &mut out[row as usize * w * 3..][..w * 3];
            for (c, &channel) in Channel::RGB.iter().enumerate() {
                self.rgb_channel_row(channel, row, &mut scratch)?;
                for (px, &v) in dst.chunks_exact_mut(3).zip(&scratch) {
                    px[c] = v;
                }
            }
        }
        Ok(out)
    }

    /// Compose typed RGB8 pixels, row-major.
    #[cfg(feature = "rgb")]
    pub fn to_rgb_pixels(&self) -> Result<Vec<rgb::RGB8>, SurfaceError> {
        let bytes = self.to_rgb8()?;
        Ok(bytes
            .chunks_exact(3)
            .map(|p| rgb::RGB8::new(p[0], p[1], p[2]))
            .collect())
    }

    /// Compose an [`imgref::ImgVec`] of RGB8 pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec(&self) -> Result<imgref::ImgVec<rgb::RGB8>, SurfaceError> {
        Ok(imgref::ImgVec::new(
            self.to_rgb_pixels()?,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Whether `other` could be written into this surface row for row.
    pub(crate) fn same_layout(&self, width: u32, bits_per_pixel: u8, color: &ColorDescriptor) -> bool {
        self.width == width && self.bits_per_pixel == bits_per_pixel && &self.color == color
    }
}

fn mask_of(masks: &ChannelMasks, channel: Channel) -> u32 {
    match channel {
        Channel::Alpha => masks.alpha,
        Channel::Red => masks.red,
        Channel::Green => masks.green,
        Channel::Blue => masks.blue,
        Channel::Gray => masks.red,
    }
}
