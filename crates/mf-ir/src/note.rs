//! Note records at each stage of the timeline pipeline.
//!
//! `RawNoteEvent` → `PairedNote` → `NoteEvent`. Each stage builds new values
//! from the previous one; nothing is edited in place.

use crate::{Tick, MAX_DATA_BYTE};

/// Whether a raw note event starts or ends a note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

/// A note-on or note-off at its absolute tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawNoteEvent {
    pub tick: Tick,
    pub track: usize,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub kind: NoteKind,
}

/// A closed note in ticks, as emitted by the pairing engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairedNote {
    pub track: usize,
    pub channel: u8,
    pub note: u8,
    /// Velocity captured at note-on
    pub velocity: u8,
    pub start_tick: Tick,
    pub end_tick: Tick,
}

impl PairedNote {
    pub fn duration_ticks(&self) -> Tick {
        self.end_tick - self.start_tick
    }
}

/// The unit handed to timeline consumers.
///
/// `end_frame >= start_frame` always holds, and the span is at least the
/// minimum visible duration the timeline was built with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    pub track: usize,
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub start_tick: Tick,
    pub end_tick: Tick,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl NoteEvent {
    /// Velocity scaled to 0.0..=1.0.
    pub fn velocity_normalized(&self) -> f32 {
        self.velocity as f32 / MAX_DATA_BYTE as f32
    }

    pub fn duration_frames(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Whether the note is sounding (or held visible) at `frame`.
    pub fn is_active_at(&self, frame: u64) -> bool {
        self.start_frame <= frame && frame < self.end_frame
    }
}
