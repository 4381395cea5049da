//! Real-time audio output
//!
//! Feeds rendered module audio to a sound device. The decoding thread
//! pushes interleaved stereo `i16` frames into a bounded [`FrameQueue`];
//! a rodio-backed [`AudioDevice`] drains it from the audio thread,
//! converting to `f32` on the way out. Closing the queue unblocks any
//! waiting producer and lets the device play out whatever is left
//! before stopping, so a song ends cleanly instead of trailing silence.

pub mod device;

pub use device::AudioDevice;

use crate::{ModError, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Ceiling on queue capacity: ten minutes of audio at 48 kHz
const MAX_QUEUE_FRAMES: usize = 48_000 * 600;

/// Stream configuration for real-time playback.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Output channels (the decoder produces stereo)
    pub channels: u16,
    /// Queue capacity in frames
    pub queue_frames: usize,
}

impl StreamConfig {
    /// Small queue for interactive use: about 46 ms at 44.1 kHz.
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            channels: 2,
            queue_frames: 2048,
        }
    }

    /// Large queue that rides out scheduling hiccups: about 371 ms at
    /// 44.1 kHz.
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            channels: 2,
            queue_frames: 16384,
        }
    }

    /// Queue latency in milliseconds when full.
    pub fn latency_ms(&self) -> f32 {
        self.queue_frames as f32 / self.sample_rate as f32 * 1000.0
    }
}

/// Bounded queue of interleaved samples shared between the decoding
/// thread and the audio thread.
///
/// A deque behind a single `parking_lot::Mutex`, with a condvar that
/// parks producers while the queue is full. Samples come out in the
/// order they went in. Closing the queue wakes blocked producers and
/// tells the consumer no more samples are coming; samples already
/// queued stay readable so the tail of a song is not cut off.
pub struct FrameQueue {
    inner: Mutex<Inner>,
    space: Condvar,
    capacity_samples: usize,
}

struct Inner {
    samples: VecDeque<i16>,
    closed: bool,
}

impl FrameQueue {
    /// Create a queue holding up to `capacity_frames` stereo frames.
    ///
    /// # Errors
    /// Fails on a zero capacity or one above ten minutes of audio.
    pub fn new(capacity_frames: usize) -> Result<Self> {
        if capacity_frames == 0 {
            return Err(ModError::ConfigError(
                "frame queue capacity cannot be zero".into(),
            ));
        }
        if capacity_frames > MAX_QUEUE_FRAMES {
            return Err(ModError::ConfigError(format!(
                "frame queue capacity {} exceeds the {} frame maximum",
                capacity_frames, MAX_QUEUE_FRAMES
            )));
        }

        Ok(FrameQueue {
            inner: Mutex::new(Inner {
                samples: VecDeque::with_capacity(capacity_frames * 2),
                closed: false,
            }),
            space: Condvar::new(),
            capacity_samples: capacity_frames * 2,
        })
    }

    /// Queue as many samples as currently fit; never blocks.
    ///
    /// Returns how many were accepted. A closed queue accepts nothing.
    pub fn try_push(&self, samples: &[i16]) -> usize {
        let mut inner = self.inner.lock();
        if inner.closed {
            return 0;
        }
        let room = self.capacity_samples - inner.samples.len();
        let accepted = samples.len().min(room);
        inner.samples.extend(samples[..accepted].iter().copied());
        accepted
    }

    /// Queue all samples, parking the caller whenever the queue is full.
    ///
    /// Returns how many samples were queued; fewer than `samples.len()`
    /// only when the queue is closed mid-push.
    pub fn push_blocking(&self, samples: &[i16]) -> usize {
        let mut pushed = 0;
        let mut inner = self.inner.lock();
        while pushed < samples.len() {
            if inner.closed {
                break;
            }
            let room = self.capacity_samples - inner.samples.len();
            if room == 0 {
                self.space.wait(&mut inner);
                continue;
            }
            let take = (samples.len() - pushed).min(room);
            inner
                .samples
                .extend(samples[pushed..pushed + take].iter().copied());
            pushed += take;
        }
        pushed
    }

    /// Move queued samples into `dest`, oldest first; returns how many
    /// were copied.
    pub fn drain_into(&self, dest: &mut [i16]) -> usize {
        let mut inner = self.inner.lock();
        let count = dest.len().min(inner.samples.len());
        for (slot, sample) in dest.iter_mut().zip(inner.samples.drain(..count)) {
            *slot = sample;
        }
        drop(inner);
        if count > 0 {
            self.space.notify_all();
        }
        count
    }

    /// Mark the queue closed: producers stop blocking and the consumer
    /// ends once the remaining samples have been drained.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        drop(inner);
        self.space.notify_all();
    }

    /// Whether [`close`](FrameQueue::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Drop every queued sample, e.g. when seeking during playback.
    pub fn clear(&self) {
        self.inner.lock().samples.clear();
        self.space.notify_all();
    }

    /// Samples waiting to be played.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Whether the queue holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill level, 0.0 (empty) to 1.0 (full).
    pub fn fill_ratio(&self) -> f32 {
        self.len() as f32 / self.capacity_samples as f32
    }
}

/// Producer-side statistics for monitoring queue health.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackStats {
    /// Samples queued so far
    pub samples_queued: usize,
    /// Samples a non-blocking push could not fit
    pub samples_dropped: usize,
}

/// Producer facade over the shared frame queue.
///
/// The decoding thread pushes rendered frames here; an [`AudioDevice`]
/// holding the same queue drains them to the sound card.
pub struct RealtimePlayer {
    queue: Arc<FrameQueue>,
    config: StreamConfig,
    stats: Mutex<PlaybackStats>,
}

impl RealtimePlayer {
    /// Create a player with the given stream configuration.
    pub fn new(config: StreamConfig) -> Result<Self> {
        Ok(RealtimePlayer {
            queue: Arc::new(FrameQueue::new(config.queue_frames)?),
            config,
            stats: Mutex::new(PlaybackStats::default()),
        })
    }

    /// Push interleaved `i16` frames, blocking until all are queued.
    ///
    /// This is the natural sink for [`ModLoader::produce`] output.
    ///
    /// [`ModLoader::produce`]: crate::ModLoader::produce
    pub fn push_frames(&self, frames: &[i16]) -> usize {
        let queued = self.queue.push_blocking(frames);
        self.stats.lock().samples_queued += queued;
        queued
    }

    /// Push frames without blocking; whatever does not fit is dropped
    /// and counted in the statistics.
    pub fn try_push_frames(&self, frames: &[i16]) -> usize {
        let queued = self.queue.try_push(frames);
        let mut stats = self.stats.lock();
        stats.samples_queued += queued;
        stats.samples_dropped += frames.len() - queued;
        queued
    }

    /// Signal that no more frames will be produced; the device plays
    /// out the queued tail and stops.
    pub fn finish(&self) {
        self.queue.close();
    }

    /// Current producer statistics.
    pub fn stats(&self) -> PlaybackStats {
        *self.stats.lock()
    }

    /// Queue fill level, 0.0 to 1.0.
    pub fn fill_ratio(&self) -> f32 {
        self.queue.fill_ratio()
    }

    /// Queue latency in milliseconds when full.
    pub fn latency_ms(&self) -> f32 {
        self.config.latency_ms()
    }

    /// The stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Shared handle to the frame queue for device integration.
    pub fn queue(&self) -> Arc<FrameQueue> {
        Arc::clone(&self.queue)
    }
}
