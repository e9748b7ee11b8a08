/// Opcodes the decoder acts on. Everything else is [`Opcode::Unknown`] and
/// carries no data as far as the decoder is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    ClipRegion,
    ShortComment,
    LongComment,
    BitsRect,
    BitsRgn,
    PackBitsRect,
    PackBitsRgn,
    DirectBitsRect,
    DirectBitsRgn,
    EndOfPicture,
    Unknown(u16),
}

impl Opcode {
    pub fn from_u16(code: u16) -> Self {
        match code {
            0x0000 => Self::Nop,
            0x0001 => Self::ClipRegion,
            0x00A0 => Self::ShortComment,
            0x00A1 => Self::LongComment,
            0x0090 => Self::BitsRect,
            0x0091 => Self::BitsRgn,
            0x0098 => Self::PackBitsRect,
            0x0099 => Self::PackBitsRgn,
            0x009A => Self::DirectBitsRect,
            0x009B => Self::DirectBitsRgn,
            0x00FF => Self::EndOfPicture,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Nop => 0x0000,
            Self::ClipRegion => 0x0001,
            Self::ShortComment => 0x00A0,
            Self::LongComment => 0x00A1,
            Self::BitsRect => 0x0090,
            Self::BitsRgn => 0x0091,
            Self::PackBitsRect => 0x0098,
            Self::PackBitsRgn => 0x0099,
            Self::DirectBitsRect => 0x009A,
            Self::DirectBitsRgn => 0x009B,
            Self::EndOfPicture => 0x00FF,
            Self::Unknown(code) => code,
        }
    }

    /// Whether the opcode carries a bitmap or pixmap.
    pub fn is_image(self) -> bool {
        matches!(
            self,
            Self::BitsRect
                | Self::BitsRgn
                | Self::PackBitsRect
                | Self::PackBitsRgn
                | Self::DirectBitsRect
                | Self::DirectBitsRgn
        )
    }

    /// Whether pixel data is preceded by a mask region.
    pub fn has_mask_region(self) -> bool {
        matches!(self, Self::BitsRgn | Self::PackBitsRgn | Self::DirectBitsRgn)
    }

    pub fn is_direct(self) -> bool {
        matches!(self, Self::DirectBitsRect | Self::DirectBitsRgn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [0x00, 0x01, 0xA0, 0xA1, 0x90, 0x91, 0x98, 0x99, 0x9A, 0x9B, 0xFF, 0x1E, 0x0C00] {
            assert_eq!(Opcode::from_u16(code).code(), code);
        }
        assert_eq!(Opcode::from_u16(0x1E), Opcode::Unknown(0x1E));
    }

    #[test]
    fn classification() {
        assert!(Opcode::PackBitsRgn.is_image());
        assert!(Opcode::PackBitsRgn.has_mask_region());
        assert!(!Opcode::PackBitsRect.has_mask_region());
        assert!(Opcode::DirectBitsRgn.is_direct());
        assert!(!Opcode::LongComment.is_image());
    }
}
