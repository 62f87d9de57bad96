//! Timeline engine for midiframe.
//!
//! Turns a decoded `MidiFile` into a frame-quantized `Timeline`:
//! tempo map → track normalization → note pairing → quantization →
//! assembly. The tempo map is always complete before any tick is
//! converted to a frame.

mod normalize;
mod pairing;
mod quantize;
mod tempo_map;
mod timeline;

pub use normalize::{normalize, raw_note_events, LogicalTrack};
pub use pairing::pair_notes;
pub use quantize::{clamp_span, FrameQuantizer};
pub use tempo_map::TempoMap;
pub use timeline::{build_timeline, FrameSpan, NoteRange, Timeline, TrackView, TrackViews};

use mf_ir::{MinDuration, DEFAULT_FRAME_RATE};

/// Frame rates below this produce a `LowFrameRate` diagnostic.
pub const DEFAULT_ADVISORY_FRAME_RATE: f64 = 12.0;

/// Selection predicate over `(track index, channel)`.
pub type ChannelFilter<'a> = &'a (dyn Fn(usize, u8) -> bool + Sync);

/// Errors from timeline construction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("frame rate must be positive and finite, got {0}")]
    InvalidFrameRate(f64),
}

/// Parameters for `build_timeline`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSettings {
    /// Target frames per second
    pub frame_rate: f64,
    pub min_duration: MinDuration,
    /// Threshold for the low frame rate advisory
    pub advisory_frame_rate: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            min_duration: MinDuration::default(),
            advisory_frame_rate: DEFAULT_ADVISORY_FRAME_RATE,
        }
    }
}
