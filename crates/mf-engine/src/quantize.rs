//! Tick → frame conversion.

use mf_ir::{seconds_to_frame, Diagnostic, MinDuration, NoteEvent, PairedNote, Tick};

use crate::{TempoMap, TimelineError};

/// Converts paired notes to frame-quantized `NoteEvent`s against a
/// finished tempo map.
#[derive(Clone, Copy, Debug)]
pub struct FrameQuantizer<'a> {
    tempo_map: &'a TempoMap,
    frame_rate: f64,
    min_frames: u64,
}

impl<'a> FrameQuantizer<'a> {
    /// Fails when `frame_rate` is not a positive finite number.
    pub fn new(
        tempo_map: &'a TempoMap,
        frame_rate: f64,
        min_duration: MinDuration,
    ) -> Result<Self, TimelineError> {
        if !(frame_rate > 0.0) || !frame_rate.is_finite() {
            return Err(TimelineError::InvalidFrameRate(frame_rate));
        }
        Ok(Self {
            tempo_map,
            frame_rate,
            min_frames: min_duration.frames(frame_rate),
        })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Minimum note span in frames after policy resolution.
    pub fn min_frames(&self) -> u64 {
        self.min_frames
    }

    pub fn frame_at(&self, tick: Tick) -> u64 {
        seconds_to_frame(self.tempo_map.seconds_at(tick), self.frame_rate)
    }

    pub fn quantize(&self, note: &PairedNote) -> NoteEvent {
        let start_seconds = self.tempo_map.seconds_at(note.start_tick);
        let end_seconds = self.tempo_map.seconds_at(note.end_tick);
        let (start_frame, end_frame) = clamp_span(
            seconds_to_frame(start_seconds, self.frame_rate),
            seconds_to_frame(end_seconds, self.frame_rate),
            self.min_frames,
        );
        NoteEvent {
            track: note.track,
            channel: note.channel,
            note: note.note,
            velocity: note.velocity,
            start_tick: note.start_tick,
            end_tick: note.end_tick,
            start_frame,
            end_frame,
            start_seconds,
            end_seconds,
        }
    }

    /// `LowFrameRate` when the frame rate is under `threshold`.
    pub fn advisory(&self, threshold: f64) -> Option<Diagnostic> {
        (self.frame_rate < threshold).then_some(Diagnostic::LowFrameRate {
            frame_rate: self.frame_rate,
            advisory: threshold,
        })
    }
}

/// Stretch `[start, end]` to at least `min` frames.
pub fn clamp_span(start: u64, end: u64, min: u64) -> (u64, u64) {
    let end = end.max(start);
    if end - start < min {
        (start, start.saturating_add(min))
    } else {
        (start, end)
    }
}
