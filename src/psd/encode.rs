//! Section writer for the layered image format.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::cursor::ByteWriter;
use crate::error::EncodeError;
use crate::packbits;
use crate::packing::{self, SampleBits};
use crate::pixel::{Channel, ColorDescriptor};
use crate::progress::{self, Progress};
use crate::surface::PixelSurface;

use super::{ColorMode, MAX_DIMENSION, classify};

const SIGNATURE: &[u8; 4] = b"8BPS";
const VERSION: u16 = 1;
const PALETTE_ENTRIES: usize = 256;
const HEADER_LEN: usize = 26;

const COMPRESSION_RAW: u16 = 0;
const COMPRESSION_PACKBITS: u16 = 1;

/// Write `surface` at the writer's cursor.
///
/// Nothing is written when the surface is rejected up front. If a later
/// step fails the writer is truncated back to where it started.
pub(crate) fn encode_layered(
    surface: &PixelSurface,
    out: &mut ByteWriter,
    compress: bool,
    progress: &dyn Progress,
    stop: &dyn Stop,
) -> Result<(), EncodeError> {
    let mode = classify(surface)?;
    let (width, height) = (surface.width(), surface.height());
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(EncodeError::PreconditionViolation(alloc::format!(
            "{width}x{height} exceeds the {MAX_DIMENSION} pixel limit"
        )));
    }

    let row_bytes = mode.row_bytes(width);
    let rows = mode
        .channels()
        .len()
        .checked_mul(height as usize)
        .ok_or(EncodeError::DimensionsTooLarge { width, height })?;
    let payload = rows
        .checked_mul(row_bytes)
        .ok_or(EncodeError::DimensionsTooLarge { width, height })?;

    log::debug!(
        "layered image {width}x{height}, {mode:?}, {}",
        if compress { "packbits" } else { "raw" }
    );

    let start = out.tell();
    out.reserve(HEADER_LEN + 4 + PALETTE_ENTRIES * 3 + 8 + 2 + payload);

    let mut writer = SectionWriter {
        out: &mut *out,
        surface,
        mode,
        rows,
        line: vec![0u8; row_bytes],
        progress,
        stop,
    };
    let result = writer.write_all(compress);
    if result.is_err() {
        out.truncate(start);
    }
    result
}

struct SectionWriter<'w, 's> {
    out: &'w mut ByteWriter,
    surface: &'s PixelSurface,
    mode: ColorMode,
    /// Channel rows in the image data section.
    rows: usize,
    line: Vec<u8>,
    progress: &'s dyn Progress,
    stop: &'s dyn Stop,
}

impl SectionWriter<'_, '_> {
    fn write_all(&mut self, compress: bool) -> Result<(), EncodeError> {
        self.write_header();
        self.write_color_mode_data();
        // image resources, layer and mask information
        self.out.write_u32(0);
        self.out.write_u32(0);
        if compress {
            self.write_packbits()
        } else {
            self.write_raw()
        }
    }

    fn write_header(&mut self) {
        let mode = self.mode;
        self.out.write_bytes(SIGNATURE);
        self.out.write_u16(VERSION);
        self.out.write_zeros(6);
        self.out.write_u16(mode.channels().len() as u16);
        self.out.write_u32(self.surface.height());
        self.out.write_u32(self.surface.width());
        self.out.write_u16(mode.depth());
        self.out.write_u16(mode.code());
    }

    /// Palette as 256 reds, 256 greens, 256 blues, zero padded.
    fn write_color_mode_data(&mut self) {
        let palette = match (self.mode, self.surface.color_descriptor()) {
            (ColorMode::Indexed, ColorDescriptor::Indexed { palette }) => palette,
            _ => {
                self.out.write_u32(0);
                return;
            }
        };
        self.out.write_u32((PALETTE_ENTRIES * 3) as u32);
        let mut table = [0u8; PALETTE_ENTRIES * 3];
        for (i, entry) in palette.iter().take(PALETTE_ENTRIES).enumerate() {
            table[i] = entry.r;
            table[PALETTE_ENTRIES + i] = entry.g;
            table[2 * PALETTE_ENTRIES + i] = entry.b;
        }
        self.out.write_bytes(&table);
    }

    /// Fill `self.line` with one channel row in file layout.
    fn fill_line(&mut self, channel: Channel, row: u32) -> Result<(), EncodeError> {
        let line = &mut self.line;
        match self.mode {
            ColorMode::Indexed => {
                line.copy_from_slice(self.surface.channel_row(Channel::Gray, row)?);
            }
            ColorMode::Grayscale => {
                line.copy_from_slice(self.surface.channel_row(Channel::Gray, row)?);
                packing::promote_to_8bit(self.surface.bits_per_pixel(), line);
            }
            ColorMode::Bitmap => {
                let samples = self.surface.channel_row(Channel::Gray, row)?;
                packing::compact(SampleBits::One, samples, line);
                // surface 0 = black, file 0 = white
                packing::invert(line);
                mask_padding_bits(line, self.surface.width());
            }
            ColorMode::Rgb => self.surface.rgb_channel_row(channel, row, line)?,
        }
        Ok(())
    }

    fn each_row(
        &mut self,
        mut f: impl FnMut(&mut Self, usize, Channel, u32) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        let height = self.surface.height();
        let mut index = 0;
        for &channel in self.mode.channels() {
            for row in 0..height {
                if row % 16 == 0 {
                    self.stop.check()?;
                }
                self.fill_line(channel, row)?;
                f(self, index, channel, row)?;
                index += 1;
            }
        }
        Ok(())
    }

    fn write_raw(&mut self) -> Result<(), EncodeError> {
        self.out.write_u16(COMPRESSION_RAW);
        let rows = self.rows as u32;
        self.each_row(|w, index, _, _| {
            w.out.write_bytes(&w.line);
            w.progress.report(progress::row_fraction(index as u32, rows));
            Ok(())
        })
    }

    /// Dry-run every row for the length table, then encode for real.
    fn write_packbits(&mut self) -> Result<(), EncodeError> {
        let mut scratch = Vec::with_capacity(packbits::max_encoded_len(self.line.len()));

        let mut lengths = Vec::with_capacity(self.rows);
        self.each_row(|w, _, channel, row| {
            let n = packbits::encoded_len(&w.line, &mut scratch);
            let n = u16::try_from(n).map_err(|_| {
                EncodeError::PreconditionViolation(alloc::format!(
                    "{channel:?} row {row} compresses to {n} bytes"
                ))
            })?;
            lengths.push(n);
            Ok(())
        })?;

        self.out.write_u16(COMPRESSION_PACKBITS);
        for &n in &lengths {
            self.out.write_u16(n);
        }

        let rows = self.rows as u32;
        self.each_row(|w, index, channel, row| {
            scratch.clear();
            let n = packbits::encode_into(&w.line, &mut scratch);
            let expected = lengths.get(index).map_or(0, |&l| usize::from(l));
            if n != expected {
                return Err(EncodeError::InconsistentCompression {
                    channel,
                    row,
                    expected,
                    actual: n,
                });
            }
            w.out.write_bytes(&scratch);
            w.progress.report(progress::row_fraction(index as u32, rows));
            Ok(())
        })
    }
}

/// Clear the bits past `width` in the last byte of a bitmap row.
fn mask_padding_bits(line: &mut [u8], width: u32) {
    let used = width % 8;
    if used != 0 {
        if let Some(last) = line.last_mut() {
            *last &= 0xFFu8 << (8 - used);
        }
    }
}

#[cfg(test)]
mod tests {
    use enough::{StopReason, Unstoppable};

    use super::*;
    use crate::pixel::ChannelMasks;
    use crate::progress::NoProgress;

    struct Cancelled;

    impl Stop for Cancelled {
        fn check(&self) -> Result<(), StopReason> {
            Err(StopReason::Cancelled)
        }
    }

    fn encode(surface: &PixelSurface, compress: bool) -> Result<Vec<u8>, EncodeError> {
        let mut w = ByteWriter::new();
        encode_layered(surface, &mut w, compress, &NoProgress, &Unstoppable)?;
        Ok(w.into_inner())
    }

    #[test]
    fn bitmap_rows_are_packed_and_inverted() {
        let mut s = PixelSurface::allocate(10, 1, 1, ColorDescriptor::direct(ChannelMasks::gray(1))).unwrap();
        // white, black, white...
        let row: Vec<u8> = (0..10).map(|i| if i % 2 == 0 { 0xFF } else { 0 }).collect();
        s.set_channel_row(Channel::Gray, 0, &row).unwrap();
        let out = encode(&s, false).unwrap();
        assert_eq!(u16::from_be_bytes([out[22], out[23]]), 1, "depth");
        assert_eq!(u16::from_be_bytes([out[24], out[25]]), 0, "bitmap mode");
        // header, empty color table, two empty sections, compression flag
        let data = &out[HEADER_LEN + 4 + 8 + 2..];
        assert_eq!(data, &[0b0101_0101, 0b0100_0000]);
    }

    #[test]
    fn gray_is_promoted() {
        let mut s = PixelSurface::allocate(3, 1, 4, ColorDescriptor::direct(ChannelMasks::gray(4))).unwrap();
        s.set_channel_row(Channel::Gray, 0, &[0x0, 0x8, 0xF]).unwrap();
        let out = encode(&s, false).unwrap();
        assert_eq!(&out[out.len() - 3..], &[0x00, 0x88, 0xFF]);
    }

    #[test]
    fn rgb_from_words_in_channel_order() {
        let mut s = PixelSurface::allocate(2, 1, 16, ColorDescriptor::direct(ChannelMasks::RGB555)).unwrap();
        s.set_word_row(0, &[0x7C00, 0x03E0]).unwrap();
        let out = encode(&s, false).unwrap();
        assert_eq!(u16::from_be_bytes([out[12], out[13]]), 3, "channels");
        assert_eq!(&out[out.len() - 6..], &[0xFF, 0x00, 0x00, 0xFF, 0x00, 0x00]);
    }

    #[test]
    fn length_table_matches_payload() {
        let mut s = PixelSurface::allocate(40, 3, 8, ColorDescriptor::direct(ChannelMasks::gray(8))).unwrap();
        for row in 0..3u32 {
            let line: Vec<u8> = (0..40).map(|i| if i < 20 { row as u8 } else { i as u8 }).collect();
            s.set_channel_row(Channel::Gray, row, &line).unwrap();
        }
        let out = encode(&s, true).unwrap();
        let flag_at = HEADER_LEN + 4 + 8;
        assert_eq!(u16::from_be_bytes([out[flag_at], out[flag_at + 1]]), 1);
        let table = &out[flag_at + 2..flag_at + 2 + 6];
        let total: usize = table
            .chunks_exact(2)
            .map(|c| usize::from(u16::from_be_bytes([c[0], c[1]])))
            .sum();
        assert_eq!(out.len() - (flag_at + 2 + 6), total);
    }

    #[test]
    fn oversized_surface_writes_nothing() {
        let s = PixelSurface::allocate(30_001, 1, 8, ColorDescriptor::direct(ChannelMasks::gray(8))).unwrap();
        let mut w = ByteWriter::new();
        w.write_bytes(b"keep");
        let err = encode_layered(&s, &mut w, true, &NoProgress, &Unstoppable);
        assert!(matches!(err, Err(EncodeError::PreconditionViolation(_))));
        assert_eq!(w.as_slice(), b"keep");
    }

    #[test]
    fn cancellation_truncates_output() {
        let s = PixelSurface::allocate(4, 4, 8, ColorDescriptor::direct(ChannelMasks::gray(8))).unwrap();
        let mut w = ByteWriter::new();
        w.write_bytes(b"xy");
        let err = encode_layered(&s, &mut w, false, &NoProgress, &Cancelled);
        assert!(matches!(err, Err(EncodeError::Cancelled(_))));
        assert_eq!(w.as_slice(), b"xy");
    }
}
