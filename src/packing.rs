//! Sub-byte pixel expansion and compaction.
//!
//! Packed rows hold 1, 2 or 4 bit samples, most significant group first.
//! Expanded rows hold one sample per byte in the low-order bits. Neither
//! direction rescales values; [`promote_to_8bit`] does that when a caller
//! wants full-range samples.

/// Bits per sample in a packed row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleBits {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl SampleBits {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub const fn bits(self) -> u8 {
        self as u8
    }

    const fn mask(self) -> u8 {
        match self {
            Self::One => 0x01,
            Self::Two => 0x03,
            Self::Four => 0x0F,
            Self::Eight => 0xFF,
        }
    }

    /// Samples stored in one packed byte.
    pub const fn per_byte(self) -> usize {
        8 / self as usize
    }

    /// Bytes needed to pack `samples` samples.
    pub const fn packed_len(self, samples: usize) -> usize {
        samples.div_ceil(self.per_byte())
    }
}

/// Unpack `packed` into one sample per byte, filling all of `out`.
///
/// Samples past the end of `packed` are zero.
pub fn expand(bits: SampleBits, packed: &[u8], out: &mut [u8]) {
    let per_byte = bits.per_byte();
    let width = bits.bits() as usize;
    let mask = bits.mask();

    for (i, out_vals) in out.chunks_mut(per_byte).enumerate() {
        let in_val = packed.get(i).copied().unwrap_or(0);
        for (pos, o) in out_vals.iter_mut().enumerate() {
            let shift = 8 - width * (pos + 1);
            *o = (in_val >> shift) & mask;
        }
    }
}

/// Pack the low `bits` of each sample in `expanded` into `out`.
///
/// Fills all of `out`; a trailing partial group and any bytes past the
/// packed input are zero-padded.
pub fn compact(bits: SampleBits, expanded: &[u8], out: &mut [u8]) {
    let per_byte = bits.per_byte();
    let width = bits.bits() as usize;
    let mask = bits.mask();

    for (i, o) in out.iter_mut().enumerate() {
        let start = i * per_byte;
        let group = expanded.get(start..).unwrap_or(&[]);
        let mut byte = 0u8;
        for (pos, &s) in group.iter().take(per_byte).enumerate() {
            let shift = 8 - width * (pos + 1);
            byte |= (s & mask) << shift;
        }
        *o = byte;
    }
}

/// Bitfield scale table for converting N-bit values to 8-bit.
pub(crate) const MUL_TABLE: [u32; 9] = [
    0,    // 0 bits
    0xff, // 1 bit:  0b11111111
    0x55, // 2 bits: 0b01010101
    0x49, // 3 bits: 0b01001001
    0x11, // 4 bits: 0b00010001
    0x21, // 5 bits: 0b00100001
    0x41, // 6 bits: 0b01000001
    0x81, // 7 bits: 0b10000001
    0x01, // 8 bits: 0b00000001
];

pub(crate) const SHIFT_TABLE: [u32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Scale an `bits`-wide value to 0..=255 by bit replication.
pub(crate) fn scale_to_8bit(v: u32, bits: u32) -> u8 {
    let bits = bits.clamp(0, 8) as usize;
    let v = v & ((1u32 << bits) - 1);
    ((v * MUL_TABLE[bits]) >> SHIFT_TABLE[bits]) as u8
}

/// Replace each sample's low `bits` with its full 8-bit equivalent.
///
/// A 1-bit 1 becomes 0xFF, a 4-bit 0x7 becomes 0x77. Idempotent on samples
/// that are already promoted.
pub fn promote_to_8bit(bits: u8, samples: &mut [u8]) {
    if bits >= 8 {
        return;
    }
    for s in samples.iter_mut() {
        *s = scale_to_8bit(u32::from(*s), u32::from(bits));
    }
}

/// Bitwise-invert a row in place.
pub fn invert(row: &mut [u8]) {
    for b in row.iter_mut() {
        *b = !*b;
    }
}
