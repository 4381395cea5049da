//! Offline WAV rendering
//!
//! Renders the remainder of a loader's stream to a 16-bit PCM WAV file.
//! Frames are generated and written in fixed-size chunks, so memory use
//! stays flat regardless of song length.

use crate::loader::ModLoader;
use crate::Result;
use std::path::Path;

/// Frames generated and written per chunk
const FRAMES_PER_CHUNK: usize = 4096;

/// Options for WAV export.
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Fade-out applied over the final seconds of the stream; 0 disables
    pub fade_out_seconds: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            fade_out_seconds: 0.0,
        }
    }
}

impl ExportConfig {
    /// Fade the output over the final `seconds` of the song.
    pub fn fade_out(mut self, seconds: f64) -> Self {
        self.fade_out_seconds = seconds;
        self
    }
}

/// Render the remainder of the stream to a WAV file.
pub fn export_to_wav<P: AsRef<Path>>(loader: &mut ModLoader, output_path: P) -> Result<()> {
    export_to_wav_with_config(loader, output_path, ExportConfig::default())
}

/// Render the remainder of the stream to a WAV file with custom options.
pub fn export_to_wav_with_config<P: AsRef<Path>>(
    loader: &mut ModLoader,
    output_path: P,
    config: ExportConfig,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: loader.num_channels(),
        sample_rate: loader.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(output_path.as_ref(), spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    let total = loader.total_samples();
    let fade_frames = (config.fade_out_seconds * loader.sample_rate() as f64) as u64;
    let fade_start = total.saturating_sub(fade_frames);

    loop {
        let position = loader.loaded_samples();
        let frames = loader.produce(FRAMES_PER_CHUNK)?;
        if frames.is_empty() {
            break;
        }

        for (index, pair) in frames.chunks_exact(2).enumerate() {
            let frame_index = position + index as u64;
            let gain = fade_gain(frame_index, fade_start, fade_frames);
            for &sample in pair {
                let scaled = (sample as f64 * gain) as i16;
                writer
                    .write_sample(scaled)
                    .map_err(|e| format!("Failed to write sample: {}", e))?;
            }
        }
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}

/// Linear gain for a frame within the fade-out window.
fn fade_gain(frame_index: u64, fade_start: u64, fade_frames: u64) -> f64 {
    if fade_frames == 0 || frame_index < fade_start {
        return 1.0;
    }
    let into_fade = (frame_index - fade_start) as f64;
    (1.0 - into_fade / fade_frames as f64).max(0.0)
}
