//! Bitmap and pixmap block descriptors.

use alloc::vec;
use alloc::vec::Vec;

use crate::cursor::ByteReader;
use crate::error::DecodeError;
use crate::pixel::{ChannelMasks, ColorDescriptor, Rgb};

use super::Permissiveness;
use super::header::Rect;

/// Row stride bits; the top two bits of `rowBytes` are flags.
const ROW_BYTES_MASK: u16 = 0x3FFF;
/// Color table flag: entry indices are implicit and sequential.
const CTAB_SEQUENTIAL: u16 = 0x8000;
const MAX_PALETTE: usize = 256;

/// Layout of one image block, parsed fresh for every block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockDescriptor {
    pub bounds: Rect,
    /// Stored row stride with the flag bits masked off.
    pub row_bytes: usize,
    pub pixel_size: u8,
    pub component_count: u16,
    pub color: ColorDescriptor,
    /// Plain 1-bit bitmap, stored with 0 = white.
    pub bilevel: bool,
}

impl BlockDescriptor {
    pub fn width(&self) -> u32 {
        self.bounds.width()
    }

    pub fn height(&self) -> u32 {
        self.bounds.height()
    }

    /// Rows are PackBits-compressed with a length prefix.
    pub fn is_compressed(&self) -> bool {
        self.row_bytes >= 8 || self.pixel_size == 32
    }

    /// Width of the per-row length prefix of a compressed row.
    pub fn length_field_bytes(&self) -> usize {
        if self.row_bytes > 250 { 2 } else { 1 }
    }

    /// Bytes a row decompresses to.
    pub fn unpacked_row_len(&self) -> usize {
        let w = self.width() as usize;
        match self.pixel_size {
            16 => w * 2,
            24 | 32 => w * usize::from(self.component_count),
            _ => self.row_bytes,
        }
    }
}

/// Parse a plain bitmap after its `rowBytes` word.
pub(crate) fn read_bitmap(r: &mut ByteReader<'_>, row_bytes: u16) -> Result<BlockDescriptor, DecodeError> {
    let bounds = Rect::read(r)?;
    Ok(BlockDescriptor {
        bounds,
        row_bytes: usize::from(row_bytes & ROW_BYTES_MASK),
        pixel_size: 1,
        component_count: 1,
        color: ColorDescriptor::direct(ChannelMasks::gray(1)),
        bilevel: true,
    })
}

/// Parse an indexed pixmap and its color table after its `rowBytes` word.
pub(crate) fn read_indexed(
    r: &mut ByteReader<'_>,
    row_bytes: u16,
    permissiveness: Permissiveness,
) -> Result<BlockDescriptor, DecodeError> {
    let bounds = Rect::read(r)?;
    // version, packType, packSize, hRes, vRes, pixelType
    r.skip(2 + 2 + 4 + 4 + 4 + 2)?;
    let pixel_size = r.read_u16()?;
    let component_count = r.read_u16()?;
    // cmpSize, planeBytes, pmTable, reserved
    r.skip(2 + 4 + 4 + 4)?;

    let pixel_size = match pixel_size {
        1 | 2 | 4 | 8 => pixel_size as u8,
        other => {
            return Err(DecodeError::UnsupportedPixelFormat(alloc::format!(
                "indexed pixmap with {other} bits per pixel"
            )));
        }
    };
    if component_count != 1 && permissiveness == Permissiveness::Strict {
        return Err(DecodeError::UnsupportedPixelFormat(alloc::format!(
            "indexed pixmap with {component_count} components"
        )));
    }

    let palette = read_color_table(r, permissiveness)?;
    Ok(BlockDescriptor {
        bounds,
        row_bytes: usize::from(row_bytes & ROW_BYTES_MASK),
        pixel_size,
        component_count: 1,
        color: ColorDescriptor::indexed(palette),
        bilevel: false,
    })
}

/// Parse a direct-color pixmap, which starts with a base address.
pub(crate) fn read_direct(r: &mut ByteReader<'_>) -> Result<BlockDescriptor, DecodeError> {
    let _base_addr = r.read_u32()?;
    let row_bytes = r.read_u16()?;
    let bounds = Rect::read(r)?;
    let _version = r.read_u16()?;
    let pack_type = r.read_u16()?;
    let _pack_size = r.read_u32()?;
    // hRes, vRes, pixelType
    r.skip(4 + 4 + 2)?;
    let pixel_size = r.read_u16()?;
    let component_count = r.read_u16()?;
    let _component_size = r.read_u16()?;
    // planeBytes, pmTable, reserved
    r.skip(4 + 4 + 4)?;

    log::trace!(
        "direct pixmap: pixel size {pixel_size}, {component_count} components, pack type {pack_type}"
    );

    let (pixel_size, masks) = match (pixel_size, component_count) {
        (16, _) => (16, ChannelMasks::RGB555),
        (32, 3) => (32, ChannelMasks::RGB888),
        (32, 4) => (32, ChannelMasks::ARGB8888),
        (size, count) => {
            return Err(DecodeError::UnsupportedPixelFormat(alloc::format!(
                "direct pixmap with {size} bits per pixel and {count} components"
            )));
        }
    };

    Ok(BlockDescriptor {
        bounds,
        row_bytes: usize::from(row_bytes & ROW_BYTES_MASK),
        pixel_size,
        component_count: if pixel_size == 16 { 1 } else { component_count },
        color: ColorDescriptor::direct(masks),
        bilevel: false,
    })
}

/// Read a color table, keeping the high byte of each 16-bit component.
fn read_color_table(r: &mut ByteReader<'_>, permissiveness: Permissiveness) -> Result<Vec<Rgb>, DecodeError> {
    let _seed = r.read_u32()?;
    let flags = r.read_u16()?;
    let count = usize::from(r.read_u16()?) + 1;
    if count > MAX_PALETTE {
        return Err(DecodeError::InvalidData(alloc::format!(
            "color table has {count} entries"
        )));
    }

    let mut palette = vec![Rgb::BLACK; count];
    for i in 0..count {
        let index = r.read_u16()?;
        let red = r.read_u16()?;
        let green = r.read_u16()?;
        let blue = r.read_u16()?;
        let index = if flags & CTAB_SEQUENTIAL != 0 {
            i
        } else {
            usize::from(index)
        };
        let entry = Rgb::new((red >> 8) as u8, (green >> 8) as u8, (blue >> 8) as u8);
        match palette.get_mut(index) {
            Some(slot) => *slot = entry,
            None if permissiveness == Permissiveness::Strict => {
                return Err(DecodeError::InvalidData(alloc::format!(
                    "color table index {index} out of range for {count} entries"
                )));
            }
            None => log::warn!("ignoring color table entry with index {index}"),
        }
    }

    if palette.len() < 2 {
        palette.push(Rgb::BLACK);
    }
    Ok(palette)
}
