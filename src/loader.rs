//! Host-facing module loader
//!
//! [`ModLoader`] is the surface a streaming host talks to: open a file
//! or buffer, pull PCM with [`produce`](ModLoader::produce), seek, and
//! query stream metadata. Parsing happens once at open; after that every
//! call either completes or fails atomically, and no state is shared
//! between loader instances.

use crate::parser::parse_module;
use crate::player::ModPlayer;
use crate::{ModError, Module, Result};
use std::path::Path;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// PCM encoding of the produced samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit interleaved PCM
    Int16,
}

/// Streaming decoder for a single module.
///
/// Frames are interleaved stereo `i16` pairs. One pass through the song
/// (no restart loop) bounds the stream: [`produce`](ModLoader::produce)
/// returns an empty batch once [`total_samples`](ModLoader::total_samples)
/// frames have been delivered.
pub struct ModLoader {
    player: ModPlayer,
    loaded_frames: u64,
    total_frames: u64,
}

impl ModLoader {
    /// Open a module file from disk at the default output rate.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::open_bytes(&data)
    }

    /// Open a module from an in-memory file image at the default output
    /// rate.
    pub fn open_bytes(data: &[u8]) -> Result<Self> {
        Self::open_bytes_with_rate(data, DEFAULT_SAMPLE_RATE)
    }

    /// Open a module from an in-memory file image, rendering at the
    /// given output sample rate.
    pub fn open_bytes_with_rate(data: &[u8], sample_rate: u32) -> Result<Self> {
        let module = parse_module(data)?;
        let player = ModPlayer::new(module, sample_rate)?;
        let total_frames = player.total_frames();
        Ok(ModLoader {
            player,
            loaded_frames: 0,
            total_frames,
        })
    }

    /// Produce up to `max_frames` interleaved stereo frames.
    ///
    /// The batch is clamped to the remaining stream length; an empty
    /// vector means the end of the stream has been reached.
    pub fn produce(&mut self, max_frames: usize) -> Result<Vec<i16>> {
        let remaining = self.total_frames - self.loaded_frames;
        let count = (max_frames as u64).min(remaining) as usize;
        let frames = self.player.generate_frames(count);
        self.loaded_frames += count as u64;
        Ok(frames)
    }

    /// Seek to an absolute frame index.
    ///
    /// Index 0 fully resets the sequencer and every channel. Tracker
    /// sequencing has no random-access points, so a nonzero target is
    /// reached by replaying from the start: cost is O(target), not O(1).
    pub fn seek(&mut self, frame_index: u64) -> Result<()> {
        if frame_index > self.total_frames {
            return Err(ModError::ConfigError(format!(
                "seek target {} is past the end of the stream ({} frames)",
                frame_index, self.total_frames
            )));
        }

        self.player.reset();
        self.loaded_frames = 0;

        let mut scratch = vec![0i16; 4096 * 2];
        while self.loaded_frames < frame_index {
            let step = (frame_index - self.loaded_frames).min(4096) as usize;
            self.player.render_frames_into(&mut scratch[..step * 2]);
            self.loaded_frames += step as u64;
        }
        Ok(())
    }

    /// Rewind to the start of the stream; equivalent to `seek(0)`.
    pub fn reset(&mut self) -> Result<()> {
        self.seek(0)
    }

    /// Frames delivered so far.
    pub fn loaded_samples(&self) -> u64 {
        self.loaded_frames
    }

    /// Estimated total stream length in frames (one pass through the
    /// song; see [`ModPlayer::total_frames`]).
    pub fn total_samples(&self) -> u64 {
        self.total_frames
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.player.sample_rate()
    }

    /// Output channel count (stereo).
    pub fn num_channels(&self) -> u16 {
        2
    }

    /// Number of module voices in the source file.
    pub fn module_channels(&self) -> usize {
        self.player.module().channel_count()
    }

    /// Tracker dialect name, e.g. "Protracker M.K.".
    pub fn format_name(&self) -> &str {
        &self.player.module().format.name
    }

    /// PCM encoding of produced samples.
    pub fn sample_format(&self) -> SampleFormat {
        SampleFormat::Int16
    }

    /// Song title from the module header.
    pub fn song_name(&self) -> &str {
        &self.player.module().song_name
    }

    /// Estimated stream duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate() as f64
    }

    /// The parsed module.
    pub fn module(&self) -> &Module {
        self.player.module()
    }
}
