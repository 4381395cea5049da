//! Tick-by-tick sequencing
//!
//! The sequencer advances playback one tick at a time. Tick 0 of a row
//! fetches the row's notes into the channels and runs the first-tick
//! effect phase; later ticks run the per-tick phase (slides, retrigger,
//! note cut). After `speed` ticks the row advances, honoring pending
//! position jumps and pattern breaks, and the order position wraps past
//! the song length back to the restart position.
//!
//! Note triggering follows standard tracker semantics: an instrument
//! number re-binds volume and fine-tune, a period starts the waveform
//! from the top — unless a tone portamento is active, in which case the
//! period only becomes the slide target.

use crate::module::{Note, ROWS_PER_PATTERN};
use crate::player::effects::{slide_volume, Effect};
use crate::player::state::ChannelState;
use crate::player::ModPlayer;

/// Lowest period reachable by slides (ProTracker note B-3)
pub const PERIOD_MIN: u16 = 113;
/// Highest period reachable by slides (ProTracker note C-1)
pub const PERIOD_MAX: u16 = 856;

impl ModPlayer {
    /// Advance playback by one tick.
    pub(crate) fn advance_tick(&mut self) {
        let current_tick = self.state.tick;
        if current_tick == 0 {
            self.process_row();
        } else {
            self.process_tick_effects();
        }

        // Audio rendered until the next tick plays at this tick's pitch
        self.refresh_increments(current_tick);

        self.state.tick += 1;
        if self.state.tick >= self.state.speed {
            self.state.tick = 0;
            self.advance_row();
        }
    }

    /// Fetch the current row into every channel and run the first-tick phase.
    fn process_row(&mut self) {
        let pattern_index = self.module.order_table[self.state.position] as usize;
        for channel_index in 0..self.module.channel_count() {
            let note = *self.module.patterns[pattern_index].note(self.state.row, channel_index);
            self.channel_row(channel_index, note);
        }
    }

    /// Row-fetch processing for a single channel.
    fn channel_row(&mut self, index: usize, note: Note) {
        let effect = Effect::decode(note.effect, note.parameter);
        let channel = &mut self.channels[index];
        channel.note = note;
        channel.effect = effect;

        if note.instrument != 0 {
            if let Some(instrument) = self.module.instrument(note.instrument) {
                channel.instrument = note.instrument;
                channel.volume = instrument.volume;
                channel.fine_tune = instrument.fine_tune_steps();
            }
        }

        if note.period != 0 {
            if effect.is_tone_porta() {
                channel.target_period = note.period;
            } else {
                channel.period = note.period;
                channel.target_period = note.period;
                let offset = match effect {
                    Effect::SampleOffset(pages) => pages as u64 * 256,
                    _ => 0,
                };
                channel.position = offset << 32;
                let bound = channel.instrument;
                channel.playing = self
                    .module
                    .instrument(bound)
                    .map(|instrument| !instrument.is_empty())
                    .unwrap_or(false);
            }
        }

        channel.arpeggio = match effect {
            Effect::Arpeggio { x, y } => (x, y),
            _ => (0, 0),
        };

        match effect {
            Effect::TonePorta(speed) if speed != 0 => channel.porta_speed = speed,
            Effect::SetPanning(raw) => channel.panning = ((raw as i16 - 128) / 2) as i8,
            Effect::SetVolume(volume) => channel.volume = volume,
            Effect::SetFinetune(steps) => channel.fine_tune = steps,
            Effect::FinePortaUp(amount) => slide_period(channel, -(amount as i16)),
            Effect::FinePortaDown(amount) => slide_period(channel, amount as i16),
            Effect::FineVolumeUp(amount) => channel.volume = slide_volume(channel.volume, amount as i8),
            Effect::FineVolumeDown(amount) => {
                channel.volume = slide_volume(channel.volume, -(amount as i8))
            }
            Effect::NoteCut(0) => channel.volume = 0,
            Effect::PositionJump(position) => self.state.pending_jump = Some(position as usize),
            Effect::PatternBreak(row) => self.state.pending_break = Some(row as usize),
            Effect::SetSpeed(speed) => self.state.speed = speed as u32,
            Effect::SetTempo(tempo) => self.state.tempo = tempo as u32,
            _ => {}
        }
    }

    /// The per-tick effect phase, run on every tick except the row fetch.
    fn process_tick_effects(&mut self) {
        let tick = self.state.tick;
        for channel in &mut self.channels {
            match channel.effect {
                Effect::PortaUp(amount) => slide_period(channel, -(amount as i16)),
                Effect::PortaDown(amount) => slide_period(channel, amount as i16),
                Effect::TonePorta(_) => step_tone_porta(channel),
                Effect::TonePortaVolSlide(amount) => {
                    step_tone_porta(channel);
                    channel.volume = slide_volume(channel.volume, amount);
                }
                Effect::VolumeSlide(amount) | Effect::VibratoVolSlide(amount) => {
                    channel.volume = slide_volume(channel.volume, amount);
                }
                Effect::Retrigger(interval) if interval != 0 && tick % interval as u32 == 0 => {
                    channel.position = 0;
                }
                Effect::NoteCut(at) if tick == at as u32 => channel.volume = 0,
                _ => {}
            }
        }
    }

    /// Move to the next row, resolving pending jumps and wrapping the
    /// order position at the end of the song.
    fn advance_row(&mut self) {
        let jump = self.state.pending_jump.take();
        let brk = self.state.pending_break.take();

        if jump.is_some() || brk.is_some() {
            self.state.position = jump.unwrap_or(self.state.position + 1);
            self.state.row = brk.unwrap_or(0);
        } else {
            self.state.row += 1;
            if self.state.row >= ROWS_PER_PATTERN {
                self.state.row = 0;
                self.state.position += 1;
            }
        }

        if self.state.position >= self.module.song_length as usize {
            self.state.position = self.module.restart_position();
        }
    }
}

/// Apply a signed slide to a sounding channel's period, clamped to the
/// tracker's reachable note range.
fn slide_period(channel: &mut ChannelState, delta: i16) {
    if channel.period == 0 {
        return;
    }
    channel.period = (channel.period as i16 + delta).clamp(PERIOD_MIN as i16, PERIOD_MAX as i16) as u16;
}

/// Step a tone portamento toward its target, stopping exactly on it.
fn step_tone_porta(channel: &mut ChannelState) {
    let speed = channel.porta_speed as u16;
    if channel.period == 0 || channel.target_period == 0 || speed == 0 {
        return;
    }
    if channel.period < channel.target_period {
        channel.period = (channel.period + speed).min(channel.target_period);
    } else {
        channel.period = channel.period.saturating_sub(speed).max(channel.target_period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TrackerFormat;
    use crate::module::{Instrument, Module, Pattern};

    fn test_instrument() -> Instrument {
        Instrument {
            name: "lead".to_string(),
            volume: 48,
            fine_tune: 0,
            loop_start: 0,
            loop_length: 128,
            sample_data: vec![64; 256],
        }
    }

    /// A 4-channel module with the given patterns and order entries.
    fn test_module(order: &[u8], cells: Vec<Vec<(usize, usize, Note)>>) -> Module {
        let pattern_count = order.iter().copied().max().unwrap_or(0) as usize + 1;
        let mut patterns = Vec::new();
        for index in 0..pattern_count {
            let mut notes = vec![Note::default(); ROWS_PER_PATTERN * 4];
            if let Some(placed) = cells.get(index) {
                for &(row, channel, note) in placed {
                    notes[row * 4 + channel] = note;
                }
            }
            patterns.push(Pattern::new(4, notes));
        }

        let mut order_table = vec![0u8; 128];
        order_table[..order.len()].copy_from_slice(order);
        let mut instruments = vec![Instrument::default(); 31];
        instruments[0] = test_instrument();

        Module {
            song_name: String::new(),
            format: TrackerFormat {
                channels: 4,
                name: "Protracker M.K.".to_string(),
            },
            instruments,
            song_length: order.len() as u8,
            song_restart: 0,
            order_table,
            patterns,
        }
    }

    fn note(period: u16, instrument: u8, effect: u8, parameter: u8) -> Note {
        Note {
            period,
            instrument,
            effect,
            parameter,
        }
    }

    fn player_for(module: Module) -> ModPlayer {
        ModPlayer::new(module, 44100).unwrap()
    }

    #[test]
    fn test_note_trigger_on_key_and_instrument() {
        let module = test_module(&[0], vec![vec![(0, 0, note(428, 1, 0, 0))]]);
        let mut player = player_for(module);
        player.advance_tick();

        let channel = &player.channels()[0];
        assert!(channel.playing);
        assert_eq!(channel.period, 428);
        assert_eq!(channel.volume, 48);
        assert_eq!(channel.position, 0);
    }

    /// Frames in one row at the power-on speed and tempo (6 ticks of 882)
    const ROW_FRAMES: usize = 5292;

    #[test]
    fn test_instrument_only_rebinds_volume_without_restart() {
        let module = test_module(
            &[0],
            vec![vec![
                (0, 0, note(428, 1, 0xc, 10)), // key note, then drop the volume
                (1, 0, note(0, 1, 0, 0)),      // instrument alone on the next row
            ]],
        );
        let mut player = player_for(module);
        // Render all of row 0 so the waveform position moves
        player.generate_frames(ROW_FRAMES);
        assert_eq!(player.channels()[0].volume, 10);
        let position_before = player.channels()[0].position;
        assert!(position_before > 0);

        // Row 1: volume returns to the instrument default, waveform keeps running
        player.generate_frames(1);
        let channel = &player.channels()[0];
        assert_eq!(channel.volume, 48);
        assert!(channel.position >= position_before);
        assert!(channel.playing);
    }

    #[test]
    fn test_key_without_instrument_stays_silent() {
        let module = test_module(&[0], vec![vec![(0, 0, note(428, 0, 0, 0))]]);
        let mut player = player_for(module);
        player.advance_tick();
        assert!(!player.channels()[0].playing);
    }

    #[test]
    fn test_tone_porta_sets_target_without_retrigger() {
        let module = test_module(
            &[0],
            vec![vec![
                (0, 0, note(600, 1, 0, 0)),
                (1, 0, note(400, 1, 0x3, 8)), // slide target
                (2, 0, note(0, 0, 0x3, 0)),   // continue with remembered speed
                (3, 0, note(0, 0, 0x3, 0)),
                (4, 0, note(0, 0, 0x3, 0)),
                (5, 0, note(0, 0, 0x3, 0)),
            ]],
        );
        let mut player = player_for(module);
        for _ in 0..6 {
            player.advance_tick();
        }

        // Row 1, tick 0: period must not snap to the new note
        player.advance_tick();
        let channel = &player.channels()[0];
        assert_eq!(channel.period, 600);
        assert_eq!(channel.target_period, 400);
        assert!(channel.playing);

        // The next tick slides toward the target
        player.advance_tick();
        assert_eq!(player.channels()[0].period, 592);

        // Five sliding rows of five per-tick steps each land exactly on it
        for _ in 0..28 {
            player.advance_tick();
        }
        assert_eq!(player.channels()[0].period, 400);
    }

    #[test]
    fn test_set_speed_changes_row_length() {
        let module = test_module(
            &[0],
            vec![vec![
                (0, 0, note(0, 0, 0xf, 3)),
                (1, 1, note(428, 1, 0, 0)),
            ]],
        );
        let mut player = player_for(module);
        // Row 0 sets speed 3, so row 1 is fetched on the fourth tick
        for _ in 0..3 {
            player.advance_tick();
            assert!(!player.channels()[1].playing);
        }
        player.advance_tick();
        assert!(player.channels()[1].playing);
    }

    #[test]
    fn test_position_jump_and_restart_wrap() {
        let module = test_module(&[0, 1], vec![vec![(0, 0, note(0, 0, 0xb, 1))], vec![]]);
        let mut player = player_for(module);
        // Row 0 of position 0 requests a jump to position 1
        for _ in 0..6 {
            player.advance_tick();
        }
        assert_eq!(player.state().position, 1);
        assert_eq!(player.state().row, 0);

        // A jump past the song length wraps to the restart position
        let module = test_module(&[0], vec![vec![(0, 0, note(0, 0, 0xb, 9))]]);
        let mut player = player_for(module);
        for _ in 0..6 {
            player.advance_tick();
        }
        assert_eq!(player.state().position, 0);
    }

    #[test]
    fn test_pattern_break_starts_next_position_mid_pattern() {
        let module = test_module(
            &[0, 1],
            vec![
                vec![(0, 0, note(0, 0, 0xd, 0x12))],
                vec![(12, 0, note(428, 1, 0, 0))],
            ],
        );
        let mut player = player_for(module);
        for _ in 0..6 {
            player.advance_tick();
        }
        assert_eq!(player.state().position, 1);
        assert_eq!(player.state().row, 12);

        player.advance_tick();
        assert!(player.channels()[0].playing);
    }

    #[test]
    fn test_volume_slide_per_tick() {
        let module = test_module(&[0], vec![vec![(0, 0, note(428, 1, 0xa, 0x02))]]);
        let mut player = player_for(module);
        player.advance_tick();
        assert_eq!(player.channels()[0].volume, 48);
        // Five remaining ticks in the row slide down by 2 each
        for _ in 0..5 {
            player.advance_tick();
        }
        assert_eq!(player.channels()[0].volume, 38);
    }

    #[test]
    fn test_note_cut_at_tick() {
        let module = test_module(&[0], vec![vec![(0, 0, note(428, 1, 0x1c, 2))]]);
        let mut player = player_for(module);
        player.advance_tick();
        player.advance_tick();
        assert_eq!(player.channels()[0].volume, 48);
        player.advance_tick();
        assert_eq!(player.channels()[0].volume, 0);
    }

    #[test]
    fn test_unimplemented_effect_leaves_state_alone() {
        // Vibrato (0x4) is a documented no-op
        let module = test_module(&[0], vec![vec![(0, 0, note(428, 1, 0x4, 0x8f))]]);
        let mut player = player_for(module);
        for _ in 0..6 {
            player.advance_tick();
        }
        let channel = &player.channels()[0];
        assert_eq!(channel.period, 428);
        assert_eq!(channel.volume, 48);
        assert!(channel.playing);
    }

    #[test]
    fn test_period_slide_clamps() {
        let module = test_module(&[0], vec![vec![(0, 0, note(200, 1, 0x1, 0xff))]]);
        let mut player = player_for(module);
        for _ in 0..6 {
            player.advance_tick();
        }
        assert_eq!(player.channels()[0].period, PERIOD_MIN);
    }

    #[test]
    fn test_row_and_order_progression() {
        let module = test_module(&[0, 0], vec![vec![]]);
        let mut player = player_for(module);
        // A full pattern is 64 rows of 6 ticks
        for _ in 0..64 * 6 {
            player.advance_tick();
        }
        assert_eq!(player.state().position, 1);
        assert_eq!(player.state().row, 0);

        // And the song wraps back to the restart position
        for _ in 0..64 * 6 {
            player.advance_tick();
        }
        assert_eq!(player.state().position, 0);
    }
}
