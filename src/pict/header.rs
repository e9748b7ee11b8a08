//! Picture header: frame, version marker and the generation-2 extended header.

use crate::cursor::ByteReader;
use crate::error::DecodeError;

use super::{Permissiveness, PLATFORM_PREFIX_LEN};

/// Generation-2 opcode that introduces the extended header.
pub(crate) const HEADER_OP: u16 = 0x0C00;
const V2_MARKER: u16 = 0x02FF;
/// Resolution reported when the header does not carry one, 72 dpi in 16.16.
const DEFAULT_RESOLUTION: u32 = 72 << 16;

/// Rectangle in picture coordinates, stored top, left, bottom, right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub top: i16,
    pub left: i16,
    pub bottom: i16,
    pub right: i16,
}

impl Rect {
    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            top: r.read_i16()?,
            left: r.read_i16()?,
            bottom: r.read_i16()?,
            right: r.read_i16()?,
        })
    }

    /// Width, or 0 when the rectangle is empty or inverted.
    pub fn width(&self) -> u32 {
        (i32::from(self.right) - i32::from(self.left)).max(0) as u32
    }

    /// Height, or 0 when the rectangle is empty or inverted.
    pub fn height(&self) -> u32 {
        (i32::from(self.bottom) - i32::from(self.top)).max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Header grammar selected by the version marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    /// One-byte opcodes, no extended header.
    V1,
    /// Two-byte, word-aligned opcodes and an extended header.
    V2,
}

/// Extended header of a generation-2 picture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedHeader {
    /// `-1` for the original layout, `-2` for the extended one.
    pub version: i16,
    /// Horizontal resolution, 16.16 fixed point pixels per inch.
    pub h_res: u32,
    /// Vertical resolution, 16.16 fixed point pixels per inch.
    pub v_res: u32,
    /// Optimal source rectangle. Equals the frame for version `-1` headers.
    pub source: Rect,
}

impl ExtendedHeader {
    /// Horizontal and vertical resolution in pixels per inch.
    pub fn dpi(&self) -> (f32, f32) {
        (
            self.h_res as f32 / 65536.0,
            self.v_res as f32 / 65536.0,
        )
    }
}

/// Picture metadata available without decoding pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PictInfo {
    /// Low 16 bits of the payload size. Unreliable for large pictures.
    pub picture_size: u16,
    pub frame: Rect,
    pub generation: Generation,
    pub extended: Option<ExtendedHeader>,
}

impl PictInfo {
    /// Probe a picture file that starts with the 512-byte platform prefix.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = ByteReader::new(data);
        r.skip(PLATFORM_PREFIX_LEN)?;
        Self::parse(&mut r, Permissiveness::Standard)
    }

    /// Probe a picture with no platform prefix, as embedded in other containers.
    pub fn from_bytes_without_prefix(data: &[u8]) -> Result<Self, DecodeError> {
        Self::parse(&mut ByteReader::new(data), Permissiveness::Standard)
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Parse from just past the platform prefix, leaving `r` at the first opcode.
    pub(crate) fn parse(
        r: &mut ByteReader<'_>,
        permissiveness: Permissiveness,
    ) -> Result<Self, DecodeError> {
        let picture_size = r.read_u16()?;
        let frame = Rect::read(r)?;
        let marker = (r.read_u8()?, r.read_u8()?);

        let (generation, extended) = match marker {
            (0x11, 0x01) => (Generation::V1, None),
            (0x00, 0x11) => {
                let v2 = r.read_u16()?;
                if v2 != V2_MARKER {
                    return Err(DecodeError::InvalidHeader(alloc::format!(
                        "expected version 2 marker 0x02FF, found {v2:#06X}"
                    )));
                }
                let ext = read_extended(r, frame, permissiveness)?;
                (Generation::V2, Some(ext))
            }
            (op, num) => {
                return Err(DecodeError::InvalidHeader(alloc::format!(
                    "unknown version marker ({op:#04X}, {num:#04X})"
                )));
            }
        };

        Ok(Self {
            picture_size,
            frame,
            generation,
            extended,
        })
    }
}

fn read_extended(
    r: &mut ByteReader<'_>,
    frame: Rect,
    permissiveness: Permissiveness,
) -> Result<ExtendedHeader, DecodeError> {
    let op = r.read_u16()?;
    let version = r.read_i16()?;
    let strict = permissiveness == Permissiveness::Strict;
    if strict && op != HEADER_OP {
        return Err(DecodeError::InvalidHeader(alloc::format!(
            "expected header opcode 0x0C00, found {op:#06X}"
        )));
    }

    let ext = if version == -2 {
        let _reserved = r.read_u16()?;
        let h_res = r.read_u32()?;
        let v_res = r.read_u32()?;
        let source = Rect::read(r)?;
        ExtendedHeader {
            version,
            h_res,
            v_res,
            source,
        }
    } else {
        if strict && version != -1 {
            return Err(DecodeError::InvalidHeader(alloc::format!(
                "unknown extended header version {version}"
            )));
        }
        // reserved word, fixed-point bounds
        r.skip(2 + 16)?;
        ExtendedHeader {
            version,
            h_res: DEFAULT_RESOLUTION,
            v_res: DEFAULT_RESOLUTION,
            source: frame,
        }
    };
    r.skip(4)?;
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn v2_header(op: u16, version: i16) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&[0x00, 0x40]);
        d.extend_from_slice(&[0, 0, 0, 0, 0, 20, 0, 30]);
        d.extend_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        d.extend_from_slice(&op.to_be_bytes());
        d.extend_from_slice(&version.to_be_bytes());
        d.extend_from_slice(&[0, 0]);
        d.extend_from_slice(&(144u32 << 16).to_be_bytes());
        d.extend_from_slice(&(72u32 << 16).to_be_bytes());
        d.extend_from_slice(&[0, 0, 0, 0, 0, 20, 0, 30]);
        d.extend_from_slice(&[0; 4]);
        d
    }

    #[test]
    fn parses_generation_one() {
        let data = [0, 10, 0, 0, 0, 0, 0, 4, 0, 8, 0x11, 0x01];
        let info = PictInfo::from_bytes_without_prefix(&data).unwrap();
        assert_eq!(info.generation, Generation::V1);
        assert_eq!((info.width(), info.height()), (8, 4));
        assert!(info.extended.is_none());
    }

    #[test]
    fn parses_extended_header() {
        let data = v2_header(HEADER_OP, -2);
        let mut r = ByteReader::new(&data);
        let info = PictInfo::parse(&mut r, Permissiveness::Strict).unwrap();
        assert_eq!(r.tell(), 40);
        assert_eq!(info.generation, Generation::V2);
        assert_eq!((info.width(), info.height()), (30, 20));
        let ext = info.extended.unwrap();
        assert_eq!(ext.dpi(), (144.0, 72.0));
    }

    #[test]
    fn strict_rejects_wrong_header_op() {
        let data = v2_header(0x0C01, -2);
        let err = PictInfo::parse(&mut ByteReader::new(&data), Permissiveness::Strict);
        assert!(matches!(err, Err(DecodeError::InvalidHeader(_))));
        assert!(PictInfo::parse(&mut ByteReader::new(&data), Permissiveness::Standard).is_ok());
    }

    #[test]
    fn rejects_unknown_marker() {
        let data = [0, 10, 0, 0, 0, 0, 0, 4, 0, 8, 0x05, 0x02];
        assert!(matches!(
            PictInfo::from_bytes_without_prefix(&data),
            Err(DecodeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn inverted_rect_is_empty() {
        let r = Rect {
            top: 10,
            left: 0,
            bottom: 5,
            right: 4,
        };
        assert!(r.is_empty());
        assert_eq!(r.height(), 0);
    }
}
