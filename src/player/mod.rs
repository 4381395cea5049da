//! Module playback engine
//!
//! [`ModPlayer`] owns a parsed [`Module`] together with all mutable
//! playback state and turns "give me N frames" requests into audio. The
//! sequencer advances in discrete ticks (`tempo * 2 / 5` per second);
//! between ticks the renderer steps each channel's waveform and mixes
//! the voices down to interleaved stereo `i16` frames.
//!
//! Everything a playing song mutates lives inside the player, so
//! independent players over clones of one module never interfere.

mod effects;
mod render;
mod sequencer;
mod state;

pub use effects::Effect;
pub use render::{period_to_increment, PAL_CLOCK_HZ};
pub use sequencer::{PERIOD_MIN, PERIOD_MAX};
pub use state::{
    default_panning, ChannelState, SequencerState, DEFAULT_SPEED, DEFAULT_TEMPO, MAX_VOLUME,
};

use crate::module::{Module, ROWS_PER_PATTERN};
use crate::{ModError, Result};

/// Highest output rate the player accepts
const MAX_SAMPLE_RATE: u32 = 384_000;

/// Pull-based playback engine for a parsed module.
pub struct ModPlayer {
    module: Module,
    state: SequencerState,
    channels: Vec<ChannelState>,
    sample_rate: u32,
    /// Output frames left before the next sequencer tick; fractional to
    /// keep long-term tick timing exact at any rate and tempo
    samples_until_tick: f64,
}

impl ModPlayer {
    /// Create a player rendering at the given output sample rate.
    ///
    /// # Errors
    /// Returns a configuration error for a zero or implausibly high
    /// sample rate.
    pub fn new(module: Module, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(ModError::ConfigError("sample rate cannot be zero".into()));
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(ModError::ConfigError(format!(
                "sample rate {} exceeds supported maximum of {}",
                sample_rate, MAX_SAMPLE_RATE
            )));
        }

        let channels = (0..module.channel_count())
            .map(|index| ChannelState::new(default_panning(index)))
            .collect();

        Ok(ModPlayer {
            module,
            state: SequencerState::new(),
            channels,
            sample_rate,
            samples_until_tick: 0.0,
        })
    }

    /// Rewind to the start of the song.
    ///
    /// Sequencer cursor, every channel and the tick phase all return to
    /// their power-on values; rendering afterwards is indistinguishable
    /// from rendering a freshly created player.
    pub fn reset(&mut self) {
        self.state.reset();
        for channel in &mut self.channels {
            channel.reset();
        }
        self.samples_until_tick = 0.0;
    }

    /// The module being played.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The sequencer cursor.
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Per-voice playback state, one entry per module channel.
    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Render interleaved stereo frames into `frames`.
    ///
    /// The buffer length must be even (two samples per frame). The
    /// sequencer advances by however many ticks the rendered duration
    /// spans; rendering in many small batches or one large one produces
    /// identical output.
    pub fn render_frames_into(&mut self, frames: &mut [i16]) {
        debug_assert!(frames.len() % 2 == 0, "stereo buffers hold sample pairs");
        for frame in frames.chunks_exact_mut(2) {
            while self.samples_until_tick <= 0.0 {
                self.advance_tick();
                self.samples_until_tick += self.samples_per_tick();
            }
            let (left, right) = self.mix_frame();
            frame[0] = left;
            frame[1] = right;
            self.samples_until_tick -= 1.0;
        }
    }

    /// Render `count` interleaved stereo frames into a new buffer.
    pub fn generate_frames(&mut self, count: usize) -> Vec<i16> {
        let mut frames = vec![0i16; count * 2];
        self.render_frames_into(&mut frames);
        frames
    }

    /// Output frames per sequencer tick at the current tempo.
    fn samples_per_tick(&self) -> f64 {
        // Tick rate is tempo * 2 / 5 Hz; 125 BPM gives the PAL 50 Hz
        self.sample_rate as f64 * 2.5 / self.state.tempo as f64
    }

    /// Estimated length of one full pass through the song, in output
    /// frames.
    ///
    /// The format stores no duration, so this walks the meaningful order
    /// entries once, accumulating each row's ticks while honoring speed
    /// and tempo effects in file order. Position jumps and pattern
    /// breaks are ignored by the estimate.
    pub fn total_frames(&self) -> u64 {
        let mut speed = DEFAULT_SPEED;
        let mut tempo = DEFAULT_TEMPO;
        let mut frames = 0.0f64;

        for position in 0..self.module.song_length as usize {
            let pattern = &self.module.patterns[self.module.order_table[position] as usize];
            for row in 0..ROWS_PER_PATTERN {
                for channel in 0..self.module.channel_count() {
                    let note = pattern.note(row, channel);
                    match Effect::decode(note.effect, note.parameter) {
                        Effect::SetSpeed(value) => speed = value as u32,
                        Effect::SetTempo(value) => tempo = value as u32,
                        _ => {}
                    }
                }
                frames += speed as f64 * (self.sample_rate as f64 * 2.5 / tempo as f64);
            }
        }

        frames.round() as u64
    }

    /// Estimated song duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.total_frames() as f64 / self.sample_rate as f64
    }
}
