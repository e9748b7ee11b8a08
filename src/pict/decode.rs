//! Opcode-driven picture decoder.
//!
//! The decoder walks `Initial -> HeaderParsed -> Dispatching` and ends in
//! either `ImageAvailable` or `Error`. The surface is only handed back from
//! `ImageAvailable`; any error drops it.

use alloc::vec;

use enough::Stop;

use crate::cursor::ByteReader;
use crate::error::DecodeError;
use crate::limits::Limits;
use crate::packbits;
use crate::packing::{self, SampleBits};
use crate::pixel::Channel;
use crate::progress::{self, NoProgress, Progress};
use crate::surface::PixelSurface;

use super::header::{Generation, PictInfo};
use super::opcode::Opcode;
use super::pixmap::{self, BlockDescriptor};
use super::Permissiveness;

/// Knobs for a single decode call.
#[derive(Clone, Copy)]
pub(crate) struct DecodeOptions<'a> {
    pub limits: Option<&'a Limits>,
    pub permissiveness: Permissiveness,
    pub progress: &'a dyn Progress,
}

impl Default for DecodeOptions<'_> {
    fn default() -> Self {
        Self {
            limits: None,
            permissiveness: Permissiveness::Standard,
            progress: &NoProgress,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Initial,
    HeaderParsed,
    Dispatching,
    ImageAvailable,
    Error,
}

/// Where the current block's rows land in the surface.
#[derive(Clone, Copy, Debug)]
enum Placement {
    /// Row 0 of the block is row `offset` of the surface.
    Rows { offset: i64 },
    /// Shape differs from the first block; consume and drop.
    Discard,
}

struct PictDecoder<'r, 'a, 'o> {
    reader: &'r mut ByteReader<'a>,
    /// Offset of the payload-size field; opcode alignment is relative to it.
    origin: usize,
    options: DecodeOptions<'o>,
    state: State,
    info: Option<PictInfo>,
    surface: Option<PixelSurface>,
    /// Top edge of the first block, in picture coordinates.
    anchor_top: i64,
}

/// Decode a picture starting at the reader's position, just past any
/// platform prefix.
pub(crate) fn decode_picture_with(
    reader: &mut ByteReader<'_>,
    options: DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<PixelSurface, DecodeError> {
    let mut dec = PictDecoder {
        origin: reader.tell(),
        reader,
        options,
        state: State::Initial,
        info: None,
        surface: None,
        anchor_top: 0,
    };
    dec.run(stop)
}

impl PictDecoder<'_, '_, '_> {
    fn run(&mut self, stop: &dyn Stop) -> Result<PixelSurface, DecodeError> {
        while self.state != State::ImageAvailable {
            if let Err(e) = self.step(stop) {
                self.state = State::Error;
                self.surface = None;
                return Err(e);
            }
        }
        self.surface.take().ok_or_else(|| {
            DecodeError::InvalidData("picture ended without a bitmap or pixmap".into())
        })
    }

    fn step(&mut self, stop: &dyn Stop) -> Result<(), DecodeError> {
        match self.state {
            State::Initial => {
                let info = PictInfo::parse(self.reader, self.options.permissiveness)?;
                log::debug!(
                    "picture {:?}: {}x{} frame, payload size field {}",
                    info.generation,
                    info.width(),
                    info.height(),
                    info.picture_size
                );
                self.info = Some(info);
                self.state = State::HeaderParsed;
            }
            State::HeaderParsed => {
                stop.check()?;
                self.state = State::Dispatching;
            }
            State::Dispatching => {
                let opcode = match self.read_opcode() {
                    Ok(opcode) => opcode,
                    // covers a trailing pad byte or half an opcode too
                    Err(DecodeError::TruncatedStream { offset }) if self.accepts_missing_end() => {
                        log::warn!("picture ends at offset {offset} without an end opcode");
                        self.state = State::ImageAvailable;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                };
                if self.dispatch(opcode, stop)? {
                    self.state = State::ImageAvailable;
                }
            }
            State::ImageAvailable | State::Error => {}
        }
        Ok(())
    }

    fn generation(&self) -> Generation {
        self.info.map_or(Generation::V1, |i| i.generation)
    }

    fn accepts_missing_end(&self) -> bool {
        self.options.permissiveness == Permissiveness::Permissive && self.surface.is_some()
    }

    fn read_opcode(&mut self) -> Result<Opcode, DecodeError> {
        let code = match self.generation() {
            Generation::V1 => u16::from(self.reader.read_u8()?),
            Generation::V2 => {
                if (self.reader.tell() - self.origin) & 1 != 0 {
                    self.reader.skip(1)?;
                }
                self.reader.read_u16()?
            }
        };
        let opcode = Opcode::from_u16(code);
        log::trace!("opcode {code:#06X} ({opcode:?}) at {}", self.reader.tell());
        Ok(opcode)
    }

    /// Handle one opcode. Returns `true` at end of picture.
    fn dispatch(&mut self, opcode: Opcode, stop: &dyn Stop) -> Result<bool, DecodeError> {
        match opcode {
            Opcode::EndOfPicture => return Ok(true),
            Opcode::ClipRegion => self.skip_region()?,
            Opcode::ShortComment => self.reader.skip(2)?,
            Opcode::LongComment => {
                let _kind = self.reader.read_u16()?;
                let size = self.reader.read_u16()?;
                self.reader.skip(usize::from(size))?;
            }
            op if op.is_image() => self.read_block(op, stop)?,
            _ => {}
        }
        Ok(false)
    }

    /// Skip a region whose leading size word counts itself.
    fn skip_region(&mut self) -> Result<(), DecodeError> {
        let at = self.reader.tell();
        let size = usize::from(self.reader.read_u16()?);
        if size < 2 {
            return Err(DecodeError::InvalidData(alloc::format!(
                "region at offset {at} has size {size}"
            )));
        }
        self.reader.skip(size - 2)
    }

    fn read_block(&mut self, opcode: Opcode, stop: &dyn Stop) -> Result<(), DecodeError> {
        let desc = if opcode.is_direct() {
            pixmap::read_direct(self.reader)?
        } else {
            let row_bytes = self.reader.read_u16()?;
            if self.generation() == Generation::V1 || row_bytes & 0x8000 == 0 {
                pixmap::read_bitmap(self.reader, row_bytes)?
            } else {
                pixmap::read_indexed(self.reader, row_bytes, self.options.permissiveness)?
            }
        };
        // source rect, destination rect, transfer mode
        self.reader.skip(8 + 8 + 2)?;
        if opcode.has_mask_region() {
            self.skip_region()?;
        }

        log::debug!(
            "{opcode:?}: {}x{} at ({}, {}), {} bpp, {} components, row bytes {}{}",
            desc.width(),
            desc.height(),
            desc.bounds.left,
            desc.bounds.top,
            desc.pixel_size,
            desc.component_count,
            desc.row_bytes,
            if desc.is_compressed() { ", packed" } else { "" }
        );

        if desc.bounds.is_empty() {
            return Err(DecodeError::InvalidData(alloc::format!(
                "empty or inverted block bounds {:?}",
                desc.bounds
            )));
        }
        self.check_stride(&desc)?;
        let placement = self.place(&desc)?;
        self.read_rows(&desc, placement, stop)
    }

    fn check_stride(&self, desc: &BlockDescriptor) -> Result<(), DecodeError> {
        let Some(bits) = SampleBits::from_bits(desc.pixel_size) else {
            return Ok(());
        };
        let needed = bits.packed_len(desc.width() as usize);
        if desc.row_bytes >= needed {
            return Ok(());
        }
        if self.options.permissiveness == Permissiveness::Strict {
            return Err(DecodeError::InvalidData(alloc::format!(
                "row bytes {} too small for {} pixels",
                desc.row_bytes,
                desc.width()
            )));
        }
        log::warn!(
            "row bytes {} too small for {} pixels; padding with zeros",
            desc.row_bytes,
            desc.width()
        );
        Ok(())
    }

    fn place(&mut self, desc: &BlockDescriptor) -> Result<Placement, DecodeError> {
        let top = i64::from(desc.bounds.top);
        match &self.surface {
            None => {
                let (width, height) = (desc.width(), desc.height());
                if let Some(limits) = self.options.limits {
                    limits.check(width, height)?;
                    limits.check_memory(PixelSurface::allocation_size(
                        width,
                        height,
                        desc.pixel_size,
                        desc.color.channel_count(),
                    ))?;
                }
                self.surface = Some(PixelSurface::allocate(
                    width,
                    height,
                    desc.pixel_size,
                    desc.color.clone(),
                )?);
                self.anchor_top = top;
                Ok(Placement::Rows { offset: 0 })
            }
            Some(s) if s.same_layout(desc.width(), desc.pixel_size, &desc.color) => {
                Ok(Placement::Rows {
                    offset: top - self.anchor_top,
                })
            }
            Some(_) => {
                log::warn!(
                    "discarding {}x{} block at {} bpp that does not match the first block",
                    desc.width(),
                    desc.height(),
                    desc.pixel_size
                );
                Ok(Placement::Discard)
            }
        }
    }

    fn read_rows(
        &mut self,
        desc: &BlockDescriptor,
        placement: Placement,
        stop: &dyn Stop,
    ) -> Result<(), DecodeError> {
        let width = desc.width() as usize;
        let height = desc.height();
        let row_len = desc.unpacked_row_len();

        let mut unpacked = vec![0u8; row_len];
        let mut words = vec![0u16; if desc.pixel_size == 16 { width } else { 0 }];
        let mut samples = vec![0u8; width];
        let mut clipped = 0u32;

        for row in 0..height {
            if row % 16 == 0 {
                stop.check()?;
            }
            self.read_row(desc, row, &mut unpacked, &mut words)?;

            let target = match placement {
                Placement::Rows { offset } => {
                    let t = offset + i64::from(row);
                    let in_range = self
                        .surface
                        .as_ref()
                        .is_some_and(|s| t >= 0 && t < i64::from(s.height()));
                    if in_range {
                        Some(t as u32)
                    } else {
                        clipped += 1;
                        None
                    }
                }
                Placement::Discard => None,
            };
            if let (Some(target), Some(surface)) = (target, self.surface.as_mut()) {
                store_row(surface, desc, target, &unpacked, &words, &mut samples)?;
            }

            self.options
                .progress
                .report(progress::row_fraction(row, height));
        }

        if clipped > 0 {
            log::warn!("clipped {clipped} rows outside the first block");
        }
        Ok(())
    }

    /// Read one stored row into `unpacked` (or `words` for 16-bit pixels).
    fn read_row(
        &mut self,
        desc: &BlockDescriptor,
        row: u32,
        unpacked: &mut [u8],
        words: &mut [u16],
    ) -> Result<(), DecodeError> {
        let permissiveness = self.options.permissiveness;

        if !desc.is_compressed() {
            let raw = self.reader.read_exact(desc.row_bytes)?;
            if desc.pixel_size == 16 {
                for (i, w) in words.iter_mut().enumerate() {
                    let hi = raw.get(2 * i).copied().unwrap_or(0);
                    let lo = raw.get(2 * i + 1).copied().unwrap_or(0);
                    *w = u16::from_be_bytes([hi, lo]);
                }
            } else {
                let n = raw.len().min(unpacked.len());
                unpacked[..n].copy_from_slice(&raw[..n]);
                unpacked[n..].fill(0);
            }
            return Ok(());
        }

        let declared = if desc.length_field_bytes() == 2 {
            usize::from(self.reader.read_u16()?)
        } else {
            usize::from(self.reader.read_u8()?)
        };
        let start = self.reader.tell();
        let raw = if permissiveness == Permissiveness::Permissive {
            let raw = self.reader.read_at_most(declared);
            if raw.len() < declared {
                log::warn!("row {row} declares {declared} bytes, {} remain", raw.len());
            }
            raw
        } else {
            self.reader.read_exact(declared)?
        };

        let (produced, expected) = if desc.pixel_size == 16 {
            let n = packbits::decode16_into(raw, words).map_err(|e| shift_offset(e.into(), start))?;
            words[n..].fill(0);
            (n, words.len())
        } else {
            let n = packbits::decode_into(raw, unpacked).map_err(|e| shift_offset(e.into(), start))?;
            unpacked[n..].fill(0);
            (n, unpacked.len())
        };

        if produced < expected {
            if permissiveness == Permissiveness::Strict {
                return Err(DecodeError::InvalidData(alloc::format!(
                    "row {row} decoded to {produced} of {expected} elements"
                )));
            }
            log::warn!("row {row} short by {} elements, zero-filled", expected - produced);
        }
        Ok(())
    }
}

/// Rebase a codec error offset from the row slice to the stream.
fn shift_offset(e: DecodeError, base: usize) -> DecodeError {
    match e {
        DecodeError::TruncatedStream { offset } => DecodeError::TruncatedStream {
            offset: base + offset,
        },
        DecodeError::TruncatedOutput { offset } => DecodeError::TruncatedOutput {
            offset: base + offset,
        },
        other => other,
    }
}

/// Convert a decoded row to surface samples and write it at `target`.
fn store_row(
    surface: &mut PixelSurface,
    desc: &BlockDescriptor,
    target: u32,
    unpacked: &[u8],
    words: &[u16],
    samples: &mut [u8],
) -> Result<(), DecodeError> {
    let width = samples.len();
    match desc.pixel_size {
        16 => surface.set_word_row(target, words)?,
        24 | 32 => {
            let planes: &[Channel] = if desc.component_count == 4 {
                &Channel::ARGB
            } else {
                &Channel::RGB
            };
            for (&channel, plane) in planes.iter().zip(unpacked.chunks(width)) {
                let dst = surface.channel_row_mut(channel, target)?;
                dst[..plane.len()].copy_from_slice(plane);
                dst[plane.len()..].fill(0);
            }
        }
        bits => {
            let bits = SampleBits::from_bits(bits).ok_or_else(|| {
                DecodeError::UnsupportedPixelFormat(alloc::format!("{bits} bits per pixel"))
            })?;
            packing::expand(bits, unpacked, samples);
            if desc.bilevel {
                // stored 0 = white, surface 0 = black; padding past a short
                // stride expands to stored 0 and so ends up white
                for s in samples.iter_mut() {
                    *s ^= 1;
                }
                packing::promote_to_8bit(1, samples);
            }
            surface.set_channel_row(Channel::Gray, target, samples)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use enough::Unstoppable;

    use super::*;

    fn v1_bitmap(row_bytes: u16, width: i16, height: i16, rows: &[u8]) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&[0, 0]);
        d.extend_from_slice(&[0, 0, 0, 0]);
        d.extend_from_slice(&height.to_be_bytes());
        d.extend_from_slice(&width.to_be_bytes());
        d.extend_from_slice(&[0x11, 0x01]);
        d.push(0x90);
        d.extend_from_slice(&row_bytes.to_be_bytes());
        d.extend_from_slice(&[0, 0, 0, 0]);
        d.extend_from_slice(&height.to_be_bytes());
        d.extend_from_slice(&width.to_be_bytes());
        d.extend_from_slice(&[0; 18]);
        d.extend_from_slice(rows);
        d.push(0xFF);
        d
    }

    fn decode(data: &[u8], permissiveness: Permissiveness) -> Result<PixelSurface, DecodeError> {
        let options = DecodeOptions {
            permissiveness,
            ..Default::default()
        };
        decode_picture_with(&mut ByteReader::new(data), options, &Unstoppable)
    }

    #[test]
    fn bilevel_rows_are_inverted_and_promoted() {
        let data = v1_bitmap(2, 10, 2, &[0x80, 0x00, 0xFF, 0xC0]);
        let s = decode(&data, Permissiveness::Standard).unwrap();
        assert_eq!((s.width(), s.height(), s.bits_per_pixel()), (10, 2, 1));
        let row0 = s.channel_row(Channel::Gray, 0).unwrap();
        assert_eq!(row0, &[0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        let row1 = s.channel_row(Channel::Gray, 1).unwrap();
        assert_eq!(row1, &[0; 10]);
    }

    #[test]
    fn missing_end_needs_permissive() {
        let mut data = v1_bitmap(1, 8, 1, &[0x00]);
        data.pop();
        assert!(matches!(
            decode(&data, Permissiveness::Standard),
            Err(DecodeError::TruncatedStream { .. })
        ));
        assert!(decode(&data, Permissiveness::Permissive).is_ok());
    }

    #[test]
    fn end_without_image_is_an_error() {
        let data = [0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0x11, 0x01, 0xFF];
        assert!(matches!(
            decode(&data, Permissiveness::Standard),
            Err(DecodeError::InvalidData(_))
        ));
    }

    #[test]
    fn unknown_opcodes_are_skipped() {
        let mut data = v1_bitmap(1, 8, 1, &[0x00]);
        // NOP and an unknown opcode ahead of the bitmap
        data.splice(12..12, [0x00, 0x1E]);
        assert!(decode(&data, Permissiveness::Strict).is_ok());
    }

    #[test]
    fn compressed_short_row_is_strict_error() {
        // row bytes 8: compressed, 1-byte length; the row decodes to 2 bytes
        let data = v1_bitmap(8, 64, 1, &[2, 0xFF, 0x00]);
        assert!(matches!(
            decode(&data, Permissiveness::Strict),
            Err(DecodeError::InvalidData(_))
        ));
        let s = decode(&data, Permissiveness::Standard).unwrap();
        // two decoded zero bytes plus zero fill, all white after inversion
        let row = s.channel_row(Channel::Gray, 0).unwrap();
        assert!(row.iter().all(|&v| v == 0xFF));
    }

    #[test]
    fn narrow_stride_pads_bitmap_with_white() {
        // one stored byte for a 16-pixel row
        let data = v1_bitmap(1, 16, 1, &[0b1000_0000]);
        assert!(matches!(
            decode(&data, Permissiveness::Strict),
            Err(DecodeError::InvalidData(_))
        ));
        let s = decode(&data, Permissiveness::Standard).unwrap();
        let row = s.channel_row(Channel::Gray, 0).unwrap();
        assert_eq!(row[0], 0);
        assert!(row[1..].iter().all(|&v| v == 0xFF), "{row:?}");
    }

    #[test]
    fn run_overflow_is_truncated_output() {
        // repeat 0 a hundred times into an 8-byte row
        let data = v1_bitmap(8, 64, 1, &[2, 0x9D, 0x00]);
        assert!(matches!(
            decode(&data, Permissiveness::Standard),
            Err(DecodeError::TruncatedOutput { .. })
        ));
    }
}
