//! Sample rendering hot path
//!
//! Turns channel state into interleaved stereo PCM. Pitch follows the
//! Amiga convention: a channel's playback rate is the PAL Paula clock
//! divided by twice its period, so higher periods sound lower. Waveform
//! positions advance in 32.32 fixed-point steps, which keeps resampling
//! exact and playback bit-reproducible across seeks.

use crate::module::Instrument;
use crate::player::state::ChannelState;
use crate::player::ModPlayer;

/// Amiga PAL master clock driving period timing, in Hz
pub const PAL_CLOCK_HZ: f64 = 7_093_789.2;

/// Fixed-point fractional bits of a waveform position
pub(crate) const FIXED_SHIFT: u32 = 32;

/// Waveform step per output frame for a period, in 32.32 fixed-point
/// bytes.
///
/// `fine_tune` is in 1/8-semitone steps; `semitone_offset` is the
/// arpeggio offset for the current tick. A zero period yields a zero
/// step: the channel holds its position and stays silent.
pub fn period_to_increment(
    period: u16,
    fine_tune: i8,
    semitone_offset: u8,
    sample_rate: u32,
) -> u64 {
    if period == 0 {
        return 0;
    }
    let frequency = PAL_CLOCK_HZ / (2.0 * period as f64);
    let semitones = semitone_offset as f64 + fine_tune as f64 / 8.0;
    let frequency = frequency * (semitones / 12.0).exp2();
    ((frequency / sample_rate as f64) * (1u64 << FIXED_SHIFT) as f64) as u64
}

impl ModPlayer {
    /// Recompute every channel's waveform step for the given tick.
    ///
    /// Called once per tick: periods and arpeggio offsets only change on
    /// tick boundaries, so the per-frame path works from cached steps.
    pub(crate) fn refresh_increments(&mut self, tick: u32) {
        let arp_phase = tick % 3;
        let sample_rate = self.sample_rate;
        for channel in &mut self.channels {
            let semitone = match arp_phase {
                1 => channel.arpeggio.0,
                2 => channel.arpeggio.1,
                _ => 0,
            };
            channel.increment =
                period_to_increment(channel.period, channel.fine_tune, semitone, sample_rate);
        }
    }

    /// Mix one interleaved stereo frame from the current channel states.
    pub(crate) fn mix_frame(&mut self) -> (i16, i16) {
        let global_volume = self.state.global_volume as i32;
        let mut left_acc = 0i32;
        let mut right_acc = 0i32;

        for channel in &mut self.channels {
            if !channel.playing {
                continue;
            }
            let Some(instrument) = self.module.instrument(channel.instrument) else {
                continue;
            };
            let index = (channel.position >> FIXED_SHIFT) as usize;
            let Some(&raw) = instrument.sample_data.get(index) else {
                channel.playing = false;
                continue;
            };

            let volume = (channel.volume as i32 * global_volume) >> 6;
            let pan_right = channel.panning as i32 + 64; // 0..128
            let left_volume = ((128 - pan_right) * volume) >> 7;
            let right_volume = (pan_right * volume) >> 7;

            let value = (raw as i32) << 8;
            left_acc += (value * left_volume) >> 6;
            right_acc += (value * right_volume) >> 6;

            channel.position += channel.increment;
            advance_loop(channel, instrument);
        }

        let scale = per_side_voices(self.module.channel_count());
        (
            (left_acc / scale).clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            (right_acc / scale).clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        )
    }
}

/// Wrap a position back into the sustain loop, or silence the channel
/// once a non-looping waveform has been played through.
fn advance_loop(channel: &mut ChannelState, instrument: &Instrument) {
    if instrument.has_loop() {
        let end = (instrument.loop_end_bytes() as u64) << FIXED_SHIFT;
        let span = ((instrument.loop_end_bytes() - instrument.loop_start_bytes()) as u64)
            << FIXED_SHIFT;
        while channel.position >= end {
            channel.position -= span;
        }
    } else if (channel.position >> FIXED_SHIFT) as usize >= instrument.len() {
        channel.playing = false;
    }
}

/// Voices mixed into each stereo side under the default panning.
fn per_side_voices(channel_count: usize) -> i32 {
    (channel_count as i32 + 1) / 2
}
