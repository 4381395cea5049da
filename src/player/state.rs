//! Sequencer and channel state
//!
//! All mutable playback state lives here, owned exclusively by the
//! [`ModPlayer`](super::ModPlayer) that drives it. Nothing in this module
//! is global; two players over the same module never share a cursor.

use crate::module::Note;
use crate::player::effects::Effect;

/// Tracker power-on speed in ticks per row
pub const DEFAULT_SPEED: u32 = 6;
/// Tracker power-on tempo in BPM
pub const DEFAULT_TEMPO: u32 = 125;
/// Full-scale channel and global volume
pub const MAX_VOLUME: u8 = 64;

/// The sequencer cursor: where playback is within the song.
///
/// Speed counts ticks per row, tempo sets the tick rate
/// (`tempo * 2 / 5` Hz). Both start from the tracker's power-on
/// defaults, not from anything in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerState {
    /// Current position in the order table
    pub position: usize,
    /// Current row within the pattern, 0..64
    pub row: usize,
    /// Tick within the current row, 0..speed; row processing happens at tick 0
    pub tick: u32,
    /// Ticks per row
    pub speed: u32,
    /// Tempo in BPM
    pub tempo: u32,
    /// Global volume, 0-64
    pub global_volume: u8,
    /// Order position requested by a position-jump effect, applied at row end
    pub(crate) pending_jump: Option<usize>,
    /// Row requested by a pattern-break effect, applied at row end
    pub(crate) pending_break: Option<usize>,
}

impl SequencerState {
    /// State at the start of the song.
    pub fn new() -> Self {
        SequencerState {
            position: 0,
            row: 0,
            tick: 0,
            speed: DEFAULT_SPEED,
            tempo: DEFAULT_TEMPO,
            global_volume: MAX_VOLUME,
            pending_jump: None,
            pending_break: None,
        }
    }

    /// Rewind to the initial state.
    pub fn reset(&mut self) {
        *self = SequencerState::new();
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-voice playback state.
///
/// Mutated once per tick by the sequencer, read by the renderer between
/// ticks. The waveform position is 32.32 fixed-point: the high half is a
/// byte offset into the bound instrument's waveform, the low half is the
/// fractional resampling phase.
#[derive(Debug, Clone)]
pub struct ChannelState {
    /// The note fetched for the current row
    pub note: Note,
    /// Decoded effect of the current note
    pub effect: Effect,
    /// 1-based index of the bound instrument, 0 when none
    pub instrument: u8,
    /// Whether the voice currently produces audio
    pub playing: bool,
    /// Waveform position, 32.32 fixed-point bytes
    pub position: u64,
    /// Waveform step per output frame, 32.32 fixed-point; cached per tick
    pub increment: u64,
    /// Current pitch period
    pub period: u16,
    /// Slide target for tone portamento
    pub target_period: u16,
    /// Remembered tone portamento speed
    pub porta_speed: u8,
    /// Channel volume, 0-64
    pub volume: u8,
    /// Stereo position, -64 (left) ..= 64 (right)
    pub panning: i8,
    /// Fine-tune in 1/8-semitone steps, adopted from the bound instrument
    pub fine_tune: i8,
    /// Arpeggio semitone offsets for the current row
    pub arpeggio: (u8, u8),
}

impl ChannelState {
    /// A silent voice with the given default stereo position.
    pub fn new(panning: i8) -> Self {
        ChannelState {
            note: Note::default(),
            effect: Effect::None,
            instrument: 0,
            playing: false,
            position: 0,
            increment: 0,
            period: 0,
            target_period: 0,
            porta_speed: 0,
            volume: 0,
            panning,
            fine_tune: 0,
            arpeggio: (0, 0),
        }
    }

    /// Rewind to the initial state, keeping the default panning.
    pub fn reset(&mut self) {
        *self = ChannelState::new(self.panning);
    }
}

/// Hardware-style default panning: of every group of four voices, the
/// outer pair (0 and 3) plays left and the inner pair (1 and 2) right.
pub fn default_panning(channel: usize) -> i8 {
    match channel & 3 {
        1 | 2 => 64,
        _ => -64,
    }
}
