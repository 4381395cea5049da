//! Amiga Tracker Module Decoder and Renderer
//!
//! Decodes ProTracker MOD files (and their FastTracker channel-count
//! variants) and renders them to interleaved stereo 16-bit PCM on
//! demand. The file format carries no audio stream — just instrument
//! waveforms, patterns and an order table — so playback reproduces the
//! original tracker's sequencing: ticks, rows, pattern order and
//! per-channel effects, mixed at any output sample rate.
//!
//! # Features
//! - Magic-signature dialect detection (M.K., M!K!, Startrekker,
//!   FastTracker xCHN/xxCH, up to 32 channels)
//! - Whole-file validation: truncated, unrecognized or capacity-violating
//!   input fails `open`, never yielding a partial module
//! - Tick-driven sequencer with the common effect set; unimplemented
//!   effect codes are guaranteed no-ops
//! - Deterministic fixed-point sample rendering with instrument sustain
//!   loops and Amiga-style stereo panning
//! - Pull-based loader surface: `produce` / `seek` / `reset` plus stream
//!   metadata queries
//! - WAV export and optional real-time streaming output
//!
//! # Crate feature flags
//! - `replayer` (default): playback engine, loader facade and WAV export
//! - `streaming` (opt-in): real-time audio output (enables optional
//!   `rodio` dep)
//!
//! # Quick start
//! ## Decode a file to PCM
//! ```no_run
//! use paula::ModLoader;
//! let mut loader = ModLoader::open("song.mod").unwrap();
//! println!("{} ({} channels)", loader.format_name(), loader.module_channels());
//! let frames = loader.produce(4096).unwrap();
//! assert!(frames.len() <= 4096 * 2); // interleaved stereo
//! ```
//!
//! ## Render to a WAV file
//! ```no_run
//! use paula::{export_to_wav, ModLoader};
//! let mut loader = ModLoader::open("song.mod").unwrap();
//! export_to_wav(&mut loader, "song.wav").unwrap();
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use paula::{AudioDevice, ModLoader, RealtimePlayer, StreamConfig};
//! let mut loader = ModLoader::open("song.mod").unwrap();
//! let config = StreamConfig::low_latency(loader.sample_rate());
//! let player = RealtimePlayer::new(config).unwrap();
//! let device = AudioDevice::open(config, player.queue()).unwrap();
//! loop {
//!     let frames = loader.produce(1024).unwrap();
//!     if frames.is_empty() {
//!         break;
//!     }
//!     player.push_frames(&frames);
//! }
//! player.finish();
//! device.wait_until_done();
//! # }
//! ```

#![warn(missing_docs)]

// Domain modules (feature-gated for modular use)
mod error;
pub mod format; // Dialect Detection
pub mod module; // Parsed Song Model
pub mod parser; // MOD Binary Parsing

#[cfg(feature = "replayer")]
pub mod export; // WAV Export
#[cfg(feature = "replayer")]
pub mod loader; // Host-Facing Streaming Surface
#[cfg(feature = "replayer")]
pub mod player; // Playback Engine
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming

pub use error::{ModError, Result};
pub use format::TrackerFormat;
pub use module::{Instrument, Module, Note, Pattern};
pub use parser::parse_module;

#[cfg(feature = "replayer")]
pub use export::{export_to_wav, export_to_wav_with_config, ExportConfig};
#[cfg(feature = "replayer")]
pub use loader::{ModLoader, SampleFormat, DEFAULT_SAMPLE_RATE};
#[cfg(feature = "replayer")]
pub use player::ModPlayer;

#[cfg(feature = "streaming")]
pub use streaming::{AudioDevice, FrameQueue, RealtimePlayer, StreamConfig};
