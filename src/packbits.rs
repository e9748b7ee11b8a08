//! PackBits run-length codec shared by the picture decoder and the layered
//! image encoder.
//!
//! Each run starts with a signed control byte `n`:
//! - `0..=127`: `n + 1` literal bytes follow.
//! - `-127..=-1`: one byte follows, repeated `1 - n` times.
//! - `-128`: no-op.
//!
//! The 16-bit variant uses the same control grammar with two-byte elements.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::RleError;

/// Longest literal or repeat run a single control byte can describe.
pub const MAX_RUN: usize = 128;

/// Upper bound on the encoded size of `len` input bytes.
pub const fn max_encoded_len(len: usize) -> usize {
    len + len.div_ceil(MAX_RUN) + 1
}

/// Decode into `output`, stopping when it is full or the input runs out.
///
/// Returns the number of bytes written. A run that does not fit in the
/// remaining output is [`RleError::TruncatedOutput`]; a run cut short by the
/// end of the input is [`RleError::TruncatedInput`].
pub fn decode_into(input: &[u8], output: &mut [u8]) -> Result<usize, RleError> {
    let mut i = 0;
    let mut o = 0;
    while o < output.len() && i < input.len() {
        let control = input[i] as i8;
        let at = i;
        i += 1;
        match control {
            -128 => {}
            0.. => {
                let count = control as usize + 1;
                let src = input
                    .get(i..i + count)
                    .ok_or(RleError::TruncatedInput { offset: at })?;
                let dst = output
                    .get_mut(o..o + count)
                    .ok_or(RleError::TruncatedOutput { offset: at })?;
                dst.copy_from_slice(src);
                i += count;
                o += count;
            }
            _ => {
                let count = (1 - i16::from(control)) as usize;
                let value = *input.get(i).ok_or(RleError::TruncatedInput { offset: at })?;
                let dst = output
                    .get_mut(o..o + count)
                    .ok_or(RleError::TruncatedOutput { offset: at })?;
                dst.fill(value);
                i += 1;
                o += count;
            }
        }
    }
    Ok(o)
}

/// Decode the first `input_len` bytes of `input` into `output`.
///
/// `input_len` larger than the slice is clamped to it.
pub fn decode_limited(
    input: &[u8],
    input_len: usize,
    output: &mut [u8],
) -> Result<usize, RleError> {
    decode_into(&input[..input_len.min(input.len())], output)
}

/// Decode into a fresh buffer of `output_capacity` bytes, truncated to the
/// bytes actually produced.
pub fn decode(input: &[u8], output_capacity: usize) -> Result<Vec<u8>, RleError> {
    let mut out = vec![0u8; output_capacity];
    let n = decode_into(input, &mut out)?;
    out.truncate(n);
    Ok(out)
}

/// Decode big-endian 16-bit elements into `output`.
///
/// Control bytes count elements, not bytes.
pub fn decode16_into(input: &[u8], output: &mut [u16]) -> Result<usize, RleError> {
    let mut i = 0;
    let mut o = 0;
    let word = |i: usize, at: usize| -> Result<u16, RleError> {
        input
            .get(i..i + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or(RleError::TruncatedInput { offset: at })
    };
    while o < output.len() && i < input.len() {
        let control = input[i] as i8;
        let at = i;
        i += 1;
        match control {
            -128 => {}
            0.. => {
                let count = control as usize + 1;
                let dst = output
                    .get_mut(o..o + count)
                    .ok_or(RleError::TruncatedOutput { offset: at })?;
                for slot in dst.iter_mut() {
                    *slot = word(i, at)?;
                    i += 2;
                }
                o += count;
            }
            _ => {
                let count = (1 - i16::from(control)) as usize;
                let value = word(i, at)?;
                let dst = output
                    .get_mut(o..o + count)
                    .ok_or(RleError::TruncatedOutput { offset: at })?;
                dst.fill(value);
                i += 2;
                o += count;
            }
        }
    }
    Ok(o)
}

/// Decode 16-bit elements into a fresh buffer of `output_capacity` elements.
pub fn decode16(input: &[u8], output_capacity: usize) -> Result<Vec<u16>, RleError> {
    let mut out = vec![0u16; output_capacity];
    let n = decode16_into(input, &mut out)?;
    out.truncate(n);
    Ok(out)
}

/// Encode `input`, appending to `out`. Returns the number of bytes appended.
///
/// Runs of three or more equal bytes become repeat runs. A pair becomes a
/// repeat run only when no literal is pending, since inside a literal it
/// costs the same two bytes without an extra control byte.
pub fn encode_into(input: &[u8], out: &mut Vec<u8>) -> usize {
    let start_len = out.len();
    let mut literal_start = 0;
    let mut literal_len = 0;
    let mut i = 0;

    while i < input.len() {
        let value = input[i];
        let run = input[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == value)
            .count();

        if run >= 3 || (run == 2 && literal_len == 0) {
            flush_literal(input, literal_start, literal_len, out);
            literal_len = 0;
            out.push((1 - run as i16) as u8);
            out.push(value);
            i += run;
        } else {
            for _ in 0..run {
                if literal_len == 0 {
                    literal_start = i;
                }
                literal_len += 1;
                i += 1;
                if literal_len == MAX_RUN {
                    flush_literal(input, literal_start, literal_len, out);
                    literal_len = 0;
                }
            }
        }
    }
    flush_literal(input, literal_start, literal_len, out);

    out.len() - start_len
}

fn flush_literal(input: &[u8], start: usize, len: usize, out: &mut Vec<u8>) {
    if len == 0 {
        return;
    }
    out.push((len - 1) as u8);
    out.extend_from_slice(&input[start..start + len]);
}

/// Encode `input` into a fresh buffer.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_encoded_len(input.len()));
    encode_into(input, &mut out);
    out
}

/// Size `encode(input)` would produce, without keeping the output.
pub fn encoded_len(input: &[u8], scratch: &mut Vec<u8>) -> usize {
    scratch.clear();
    encode_into(input, scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                // quantize so that short runs show up
                (state % 5) as u8
            })
            .collect()
    }

    #[test]
    fn empty_input() {
        assert!(encode(&[]).is_empty());
        assert_eq!(decode(&[], 10).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn literal_run_of_128() {
        let input: Vec<u8> = (0..128).map(|i| i as u8).collect();
        let encoded = encode(&input);
        assert_eq!(encoded.len(), 129);
        assert_eq!(encoded[0], 127);
        assert_eq!(&encoded[1..], &input[..]);
    }

    #[test]
    fn repeat_run_of_129_splits() {
        let encoded = encode(&[0xAB; 129]);
        // 128 repeats, then the leftover byte as a one-byte literal
        assert_eq!(encoded, vec![0x81, 0xAB, 0x00, 0xAB]);
        assert_eq!(decode(&encoded, 129).unwrap(), vec![0xAB; 129]);
    }

    #[test]
    fn mixed_literal_and_repeat() {
        let input = [1, 2, 3, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA];
        assert_eq!(encode(&input), vec![2, 1, 2, 3, 0xFC, 0xAA]);
    }

    #[test]
    fn pair_inside_literal_stays_literal() {
        let input = [9, 7, 7, 4];
        assert_eq!(encode(&input), vec![3, 9, 7, 7, 4]);
    }

    #[test]
    fn noop_control_byte() {
        let mut out = [0x55u8; 4];
        assert_eq!(decode_into(&[0x80], &mut out).unwrap(), 0);
        assert_eq!(out, [0x55; 4]);
        assert_eq!(decode(&[0x80, 0x00, 0x07], 1).unwrap(), vec![7]);
    }

    #[test]
    fn overflow_is_truncated_output() {
        let mut out = [0u8; 3];
        assert_eq!(
            decode_into(&[0xFC, 0x01], &mut out),
            Err(RleError::TruncatedOutput { offset: 0 })
        );
        assert_eq!(
            decode_into(&[0x00, 0x01, 0x02, 0x01, 0x02, 0x03], &mut out),
            Err(RleError::TruncatedOutput { offset: 2 })
        );
    }

    #[test]
    fn short_literal_is_truncated_input() {
        let mut out = [0u8; 8];
        assert_eq!(
            decode_into(&[0x03, 1, 2], &mut out),
            Err(RleError::TruncatedInput { offset: 0 })
        );
    }

    #[test]
    fn decode_limited_ignores_tail() {
        let mut out = [0u8; 8];
        let n = decode_limited(&[0x01, 5, 6, 0xFE, 9], 3, &mut out).unwrap();
        assert_eq!(&out[..n], &[5, 6]);
    }

    #[test]
    fn roundtrip_lengths() {
        for len in 0..600 {
            let input = noise(len, 0x9E37_79B9 ^ len as u32);
            let encoded = encode(&input);
            assert!(encoded.len() <= max_encoded_len(len), "len {len}");
            assert_eq!(decode(&encoded, len).unwrap(), input, "len {len}");
        }
    }

    #[test]
    fn incompressible_worst_case() {
        let input: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
        let encoded = encode(&input);
        assert_eq!(encoded.len(), 1000 + 1000usize.div_ceil(128));
        assert_eq!(decode(&encoded, 1000).unwrap(), input);
    }

    #[test]
    fn encoded_len_matches_encode() {
        let input = noise(333, 7);
        let mut scratch = Vec::new();
        assert_eq!(encoded_len(&input, &mut scratch), encode(&input).len());
    }

    #[test]
    fn decode16_literal_and_repeat() {
        // two literal words, then 0x7FFF three times
        let input = [0x01, 0x12, 0x34, 0x56, 0x78, 0xFE, 0x7F, 0xFF];
        assert_eq!(
            decode16(&input, 5).unwrap(),
            vec![0x1234, 0x5678, 0x7FFF, 0x7FFF, 0x7FFF]
        );
    }

    #[test]
    fn decode16_truncated_word() {
        let mut out = [0u16; 4];
        assert_eq!(
            decode16_into(&[0x01, 0x12, 0x34, 0x56], &mut out),
            Err(RleError::TruncatedInput { offset: 0 })
        );
    }
}
