
use crate::cursor::{ByteReader, ByteWriter};
use crate::Error;

const MAX_CHANNEL_COUNT: usize = 2;

// Per-magnitude growth factors for the running multiplier, fixed point with
// 8 fractional bits. One table per header bit count; the constants follow the
// reverse-engineered behavior of the original decoder and cannot be derived
// independently, only compared against known-good legacy streams.
const RATE_2BIT: &[i16; 2] = &[230, 307];
const RATE_3BIT: &[i16; 4] = &[230, 256, 307, 409];
const RATE_4BIT: &[i16; 8] = &[230, 230, 256, 280, 307, 358, 409, 512];
const RATE_6BIT: &[i16; 32] = &[
    205, 215, 225, 235, 245, 256, 268, 280,
    293, 307, 321, 337, 353, 371, 389, 409,
    429, 451, 475, 500, 526, 554, 583, 614,
    646, 680, 716, 754, 768, 768, 768, 768,
];

// Working range for the running multiplier.
const MULTIPLIER_MIN: i32 = 0x10;
const MULTIPLIER_MAX: i32 = 0x6000;

#[derive(Debug, Clone, Copy, Default)]
struct V1Channel {
    /// Running multiplier, fixed point with 8 fractional bits.
    multiplier: i32,
    /// Delta shift from the low nibble of the channel's split byte.
    shift: u32,
    /// Delta bias from the upper nibble of the channel's split byte.
    bias: i32,
    /// Running reconstructed sample.
    sample: i32,
}

/// Decodes the older stream variant (no matching encoder exists).
///
/// The header is one bit-count byte (2, 3, 4 or 6), then per channel a split
/// byte and a little-endian 16-bit multiplier seed. Each following byte is a
/// sign-magnitude code in its low bits.
///
/// This is a best-effort compatibility decoder: the arithmetic reproduces the
/// reverse-engineered original and is validated only structurally and against
/// vectors derived from this implementation, not independently.
pub fn decode_adpcm_v1(input: &[u8], output: &mut [u8], channels: usize)
    -> Result<usize, Error> {

    if channels < 1 || channels > MAX_CHANNEL_COUNT {
        return Err(Error::InvalidChannels);
    }

    let mut reader = ByteReader::new(input);
    let mut writer = ByteWriter::new(output);

    let Some(bit_count) = reader.read_byte() else {
        return Ok(0);
    };
    let rate_table: &[i16] = match bit_count {
        2 => RATE_2BIT,
        3 => RATE_3BIT,
        4 => RATE_4BIT,
        6 => RATE_6BIT,
        _ => return Err(Error::InvalidHeader),
    };
    let sign_mask: u8 = 1 << (bit_count - 1);
    let magnitude_mask: u8 = sign_mask - 1;

    let mut states = [V1Channel::default(); MAX_CHANNEL_COUNT];
    for state in states.iter_mut().take(channels) {
        let Some(split) = reader.read_byte() else {
            return Ok(0);
        };
        let Some(seed) = reader.read_sample() else {
            return Ok(0);
        };
        state.shift = u32::from(split & 0x0f);
        state.bias = i32::from(split >> 4) * 10;
        state.multiplier = (i32::from(seed) & 0xffff).max(MULTIPLIER_MIN);
    }

    let total = reader.remaining();
    let mut channel = channels - 1;
    while let Some(code) = reader.read_byte() {
        channel = (channel + 1) % channels;
        let state = &mut states[channel];

        // multiply-and-round the running multiplier against the rate table
        let magnitude = usize::from(code & magnitude_mask);
        let scaled = (state.multiplier * i32::from(rate_table[magnitude]) + 0x80) >> 8;
        state.multiplier = scaled.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX);

        let mut delta = (scaled >> state.shift) + state.bias;
        if code & sign_mask != 0 {
            delta = -delta;
        }

        // triple/scale-and-round predictor transform
        let predicted = (state.sample * 3 + 2) >> 2;
        state.sample = (predicted + delta).clamp(-32768, 32767);

        // tail correction: the original weights the written sample by how far
        // the cursor has progressed through the payload, in tenths, relative
        // to the channel count
        let consumed = total - reader.remaining();
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        // at most 10, truncation never happens
        let tenths = ((consumed * 10) / (total * channels)) as i32;
        let correction = (delta * tenths) / 0x80;
        let adjusted = (state.sample + correction).clamp(-32768, 32767);

        #[allow(clippy::cast_possible_truncation)] // value is clamped so truncation never happens
        let adjusted = adjusted as i16;
        if !writer.write_sample(adjusted) {
            break;
        }
    }

    Ok(writer.bytes_consumed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(bytes: &[u8], index: usize) -> i16 {
        i16::from_le_bytes([bytes[index * 2], bytes[index * 2 + 1]])
    }

    #[test]
    fn test_invalid_bit_count() {
        let mut output = [0u8; 16];
        for bit_count in [0u8, 1, 5, 7, 8, 255] {
            let stream = [bit_count, 0x00, 0x00, 0x01, 0x42];
            assert!(matches!(decode_adpcm_v1(&stream, &mut output, 1),
                Err(Error::InvalidHeader)));
        }
    }

    #[test]
    fn test_invalid_channels() {
        let mut output = [0u8; 16];
        assert!(matches!(decode_adpcm_v1(&[4, 0, 0, 1], &mut output, 0),
            Err(Error::InvalidChannels)));
        assert!(matches!(decode_adpcm_v1(&[4, 0, 0, 1], &mut output, 3),
            Err(Error::InvalidChannels)));
    }

    #[test]
    fn test_truncated_header() {
        let mut output = [0u8; 16];
        assert_eq!(decode_adpcm_v1(&[], &mut output, 1).unwrap_or(usize::MAX), 0);
        assert_eq!(decode_adpcm_v1(&[4], &mut output, 1).unwrap_or(usize::MAX), 0);
        assert_eq!(decode_adpcm_v1(&[4, 0x00], &mut output, 1).unwrap_or(usize::MAX), 0);
        assert_eq!(decode_adpcm_v1(&[4, 0x00, 0x01], &mut output, 1).unwrap_or(usize::MAX), 0);
        // stereo needs a second channel seed
        assert_eq!(decode_adpcm_v1(&[4, 0x00, 0x00, 0x01], &mut output, 2).unwrap_or(usize::MAX), 0);
    }

    #[test]
    fn test_known_vector() {
        // values follow this implementation's concretization of the
        // reverse-engineered arithmetic (multiplier seed 256, no shift/bias):
        //   code 0x01: multiplier 256 -> 230, sample 230, correction +8
        //   code 0x09: multiplier 230 -> 207, sample -34, correction -16
        let stream = [4, 0x00, 0x00, 0x01, 0x01, 0x09];
        let mut output = [0u8; 8];
        let written = decode_adpcm_v1(&stream, &mut output, 1).unwrap_or(usize::MAX);
        assert_eq!(written, 4);
        assert_eq!(sample_at(&output, 0), 238);
        assert_eq!(sample_at(&output, 1), -50);
    }

    #[test]
    fn test_deterministic() {
        let mut stream = [0u8; 64];
        stream[0] = 6;
        stream[1] = 0x21;
        stream[3] = 0x02;
        let mut x: u32 = 0x9e3779b9;
        for b in stream.iter_mut().skip(4) {
            x = x.wrapping_mul(1664525).wrapping_add(1013904223);
            *b = x.to_le_bytes()[3];
        }
        let mut first = [0u8; 256];
        let mut second = [0u8; 256];
        let a = decode_adpcm_v1(&stream, &mut first, 1).unwrap_or(usize::MAX);
        let b = decode_adpcm_v1(&stream, &mut second, 1).unwrap_or(usize::MAX);
        assert_eq!(a, b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_adversarial_bytes() {
        // every accepted bit count, both channel counts, arbitrary payload:
        // no panics, no overruns, whole samples only
        let mut x: u32 = 0x1234_5678;
        for bit_count in [2u8, 3, 4, 6] {
            let mut stream = [0u8; 128];
            stream[0] = bit_count;
            for b in stream.iter_mut().skip(1) {
                x = x.wrapping_mul(1664525).wrapping_add(1013904223);
                *b = x.to_le_bytes()[3];
            }
            for channels in 1..=2 {
                let mut output = [0u8; 512];
                let written = decode_adpcm_v1(&stream, &mut output, channels).unwrap_or(usize::MAX);
                assert!(written <= output.len());
                assert_eq!(written % 2, 0);
            }
        }
    }

    #[test]
    fn test_truncated_output() {
        let stream = [4, 0x00, 0x00, 0x01, 0x01, 0x09, 0x02, 0x0a];
        // room for one whole sample only
        let mut output = [0u8; 3];
        assert_eq!(decode_adpcm_v1(&stream, &mut output, 1).unwrap_or(usize::MAX), 2);
        let mut output = [0u8; 0];
        assert_eq!(decode_adpcm_v1(&stream, &mut output, 1).unwrap_or(usize::MAX), 0);
    }
}
