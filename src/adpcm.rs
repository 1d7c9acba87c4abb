
#[cfg(feature = "internal-no-panic")]
use no_panic::no_panic;

use crate::cursor::{ByteReader, ByteWriter};
use crate::Error;

/// Maximum number of interleaved channels in a stream.
const MAX_CHANNEL_COUNT: usize = 2;

/// Step index every channel starts from (0x2C).
const INITIAL_STEP_INDEX: u8 = 44;

/// Control byte: decrement the channel's step index, sample repeats.
const MARKER_STEP_DOWN: u8 = 0x80;

/// Control byte: raise the channel's step index by 8, no sample emitted.
const MARKER_STEP_UP: u8 = 0x81;

/// Step index adjustment, indexed by the low 5 bits of an ordinary code byte.
const NEXT_STEP_TABLE: &[i8; 32] = &[
    -1, 0, -1, 4, -1, 2, -1, 6,
    -1, 1, -1, 5, -1, 3, -1, 7,
    -1, 1, -1, 5, -1, 3, -1, 7,
    -1, 2, -1, 4, -1, 6, -1, 8,
];

const STEP_SIZE_TABLE: &[i16; 89] = &[
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17,
    19, 21, 23, 25, 28, 31, 34, 37, 41, 45,
    50, 55, 60, 66, 73, 80, 88, 97, 107, 118,
    130, 143, 157, 173, 190, 209, 230, 253, 279, 307,
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358,
    5894, 6484, 7132, 7845, 8630, 9493, 10442, 11487, 12635, 13899,
    15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794, 32767
];

/// Per-channel codec state, created fresh for every encode/decode call.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ChannelState {
    predicted_sample: i16,
    step_index: u8,
}

impl ChannelState {
    fn new() -> ChannelState {
        ChannelState {
            predicted_sample: 0,
            step_index: INITIAL_STEP_INDEX,
        }
    }
}

/// Applies a signed delta to the running predicted sample, clamped to i16.
///
/// Bit 0x40 of `code` is the sign bit: set means the delta is subtracted.
#[cfg_attr(feature = "internal-no-panic", no_panic)]
#[inline(always)]
fn update_predicted_sample(current: i16, code: u8, delta: i32) -> i16 {
    let predicted = if code & 0x40 != 0 {
        i32::from(current) - delta
    } else {
        i32::from(current) + delta
    };
    #[allow(clippy::cast_possible_truncation)] // value is clamped so truncation never happens
    {
    predicted.clamp(-32768, 32767) as i16
    }
}

/// Adjusts the step index after an ordinary code byte, clamped to 0..=88.
#[cfg_attr(feature = "internal-no-panic", no_panic)]
#[inline(always)]
fn next_step_index(step_index: u8, code: u8) -> u8 {
    step_index
        .saturating_add_signed(NEXT_STEP_TABLE[usize::from(code & 0x1f)])
        .min(88)
}

/// Expands the magnitude bits of a code byte into a delta.
///
/// Mirror of the encoder's quantizer: bit 0 carries the unshifted step size
/// and every following bit half the previous weight, on top of the
/// `step_size >> bit_shift` base term.
#[cfg_attr(feature = "internal-no-panic", no_panic)]
#[inline(always)]
fn decode_magnitude(step_size: i32, bit_shift: u8, code: u8) -> i32 {
    let mut delta = step_size >> bit_shift;
    if code & 0x01 != 0 { delta += step_size; }
    if code & 0x02 != 0 { delta += step_size >> 1; }
    if code & 0x04 != 0 { delta += step_size >> 2; }
    if code & 0x08 != 0 { delta += step_size >> 3; }
    if code & 0x10 != 0 { delta += step_size >> 4; }
    if code & 0x20 != 0 { delta += step_size >> 5; }
    delta
}

/// Compresses interleaved 16-bit little-endian samples into an ADPCM stream.
///
/// `input` holds the raw samples (low byte first, channels interleaved in
/// round-robin order for stereo). `quality_level` must be in 2..=7; higher
/// values spend more bits per sample. The compressed stream is written to
/// `output` and the number of bytes written is returned.
///
/// Running out of input or output space is not an error: the function stops
/// and reports the bytes written so far. A result of 0 means the output could
/// not even hold the 2-byte header.
pub fn encode_adpcm(input: &[u8], output: &mut [u8], channels: usize,
    quality_level: u8) -> Result<usize, Error> {

    if channels < 1 || channels > MAX_CHANNEL_COUNT {
        return Err(Error::InvalidChannels);
    }
    if quality_level < 2 || quality_level > 7 {
        return Err(Error::InvalidQuality);
    }
    let bit_shift = quality_level - 1;

    let mut reader = ByteReader::new(input);
    let mut writer = ByteWriter::new(output);

    // header: fixed zero marker, then the bit shift
    if !writer.write_byte(0) || !writer.write_byte(bit_shift) {
        return Ok(0);
    }

    // the first sample of every channel is stored verbatim and seeds the
    // channel's predictor
    let mut states = [ChannelState::new(); MAX_CHANNEL_COUNT];
    for state in states.iter_mut().take(channels) {
        let Some(sample) = reader.read_sample() else {
            return Ok(writer.bytes_consumed());
        };
        state.predicted_sample = sample;
        if !writer.write_sample(sample) {
            return Ok(writer.bytes_consumed());
        }
    }

    // starts at channels - 1 so that the first advance lands on channel 0
    let mut channel = channels - 1;
    while let Some(sample) = reader.read_sample() {
        channel = (channel + 1) % channels;
        let state = &mut states[channel];

        let mut difference = i32::from(sample) - i32::from(state.predicted_sample);
        let mut code: u8 = 0;
        if difference < 0 {
            difference = -difference;
            code |= 0x40;
        }

        let mut step_size = i32::from(STEP_SIZE_TABLE[usize::from(state.step_index)]);

        // difference too small for the current grain: shrink it and emit a
        // marker instead of a sample
        if difference < (step_size >> quality_level) {
            state.step_index = state.step_index.saturating_sub(1);
            if !writer.write_byte(MARKER_STEP_DOWN) {
                break;
            }
            continue;
        }

        // grain too coarse: every step-up costs one marker byte
        while difference > (step_size << 1) && state.step_index < 88 {
            state.step_index = (state.step_index + 8).min(88);
            step_size = i32::from(STEP_SIZE_TABLE[usize::from(state.step_index)]);
            if !writer.write_byte(MARKER_STEP_UP) {
                return Ok(writer.bytes_consumed());
            }
        }

        // greedy successive-approximation: the first tested bit carries the
        // full step size, each following bit half the previous weight
        let max_bit_mask = (1u8 << (bit_shift - 1)).min(0x20);
        let base_delta = step_size >> bit_shift;
        let mut accumulated = 0i32;
        let mut weight = step_size;
        let mut bit = 0x01u8;
        while bit <= max_bit_mask {
            if accumulated + weight <= difference {
                accumulated += weight;
                code |= bit;
            }
            weight >>= 1;
            bit <<= 1;
        }

        state.predicted_sample =
            update_predicted_sample(state.predicted_sample, code, base_delta + accumulated);
        if !writer.write_byte(code) {
            break;
        }
        state.step_index = next_step_index(state.step_index, code);
    }

    Ok(writer.bytes_consumed())
}

/// Reconstructs interleaved 16-bit samples from an ADPCM stream produced by
/// [`encode_adpcm`].
///
/// Decoding stops when either buffer is exhausted and returns the number of
/// bytes written to `output`, always a whole number of samples. Malformed
/// code bytes cannot push the codec state out of range; only a header with a
/// bit shift outside 1..=6 is rejected.
pub fn decode_adpcm(input: &[u8], output: &mut [u8], channels: usize)
    -> Result<usize, Error> {

    if channels < 1 || channels > MAX_CHANNEL_COUNT {
        return Err(Error::InvalidChannels);
    }

    let mut reader = ByteReader::new(input);
    let mut writer = ByteWriter::new(output);

    // header: the marker byte's value is ignored
    let (Some(_marker), Some(bit_shift)) = (reader.read_byte(), reader.read_byte()) else {
        return Ok(0);
    };
    if bit_shift < 1 || bit_shift > 6 {
        return Err(Error::InvalidHeader);
    }

    let mut states = [ChannelState::new(); MAX_CHANNEL_COUNT];
    for state in states.iter_mut().take(channels) {
        let Some(sample) = reader.read_sample() else {
            return Ok(writer.bytes_consumed());
        };
        state.predicted_sample = sample;
        if !writer.write_sample(sample) {
            return Ok(writer.bytes_consumed());
        }
    }

    let mut channel = channels - 1;
    while let Some(code) = reader.read_byte() {
        channel = (channel + 1) % channels;
        let state = &mut states[channel];

        if code == MARKER_STEP_DOWN {
            state.step_index = state.step_index.saturating_sub(1);
            if !writer.write_sample(state.predicted_sample) {
                break;
            }
        } else if code == MARKER_STEP_UP {
            state.step_index = (state.step_index + 8).min(88);
            // the marker adjusts state without emitting a sample and must not
            // shift the interleave phase: a second advance restores the
            // pre-marker channel. Only cancels out because at most 2 channels
            // are supported.
            channel = (channel + 1) % channels;
        } else {
            let step_size = i32::from(STEP_SIZE_TABLE[usize::from(state.step_index)]);
            let delta = decode_magnitude(step_size, bit_shift, code);
            state.predicted_sample =
                update_predicted_sample(state.predicted_sample, code, delta);
            if !writer.write_sample(state.predicted_sample) {
                break;
            }
            state.step_index = next_step_index(state.step_index, code);
        }
    }

    Ok(writer.bytes_consumed())
}
