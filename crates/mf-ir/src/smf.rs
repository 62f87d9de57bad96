//! Decoded Standard MIDI File structure.
//!
//! A `MidiFile` is produced once by the decoder and never mutated
//! afterwards. Each `Track` owns the events exactly as they appeared in its
//! chunk, with delta times preserved.

use alloc::string::String;
use alloc::vec::Vec;

use crate::Tick;

/// SMF header format field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Format 0: one track carrying every channel
    SingleTrack,
    /// Format 1: simultaneous tracks sharing one tempo map
    Parallel,
    /// Format 2: independent sequential patterns
    Sequential,
}

impl Format {
    /// Map the raw header value, `None` for anything outside 0..=2.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::SingleTrack),
            1 => Some(Self::Parallel),
            2 => Some(Self::Sequential),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::SingleTrack => 0,
            Self::Parallel => 1,
            Self::Sequential => 2,
        }
    }
}

/// A fully decoded MIDI file.
#[derive(Clone, Debug, PartialEq)]
pub struct MidiFile {
    pub format: Format,
    /// Ticks per quarter note (always positive)
    pub division: u16,
    pub tracks: Vec<Track>,
}

impl MidiFile {
    pub fn new(format: Format, division: u16) -> Self {
        Self {
            format,
            division,
            tracks: Vec::new(),
        }
    }

    /// Total number of note-on and note-off events across all tracks.
    pub fn note_event_count(&self) -> usize {
        self.tracks.iter().map(Track::note_event_count).sum()
    }
}

/// One `MTrk` chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    /// Position of the chunk in the file (0-based)
    pub index: usize,
    /// First Track-Name meta event, if any
    pub name: Option<String>,
    /// Events in chunk order
    pub events: Vec<TrackEvent>,
    /// Tick of End-of-Track, or of the last event if the chunk had none
    pub end_tick: Tick,
}

impl Track {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Iterate events with their absolute tick.
    pub fn absolute_events(&self) -> impl Iterator<Item = (Tick, &TrackEventKind)> + '_ {
        self.events.iter().scan(0 as Tick, |tick, event| {
            *tick += event.delta as Tick;
            Some((*tick, &event.kind))
        })
    }

    pub fn note_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Channel { message: ChannelMessage::NoteOn { .. } | ChannelMessage::NoteOff { .. }, .. }))
            .count()
    }
}

/// A decoded event with its delta time.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEvent {
    /// Ticks since the previous event in the same track
    pub delta: u32,
    pub kind: TrackEventKind,
}

impl TrackEvent {
    pub fn new(delta: u32, kind: TrackEventKind) -> Self {
        Self { delta, kind }
    }
}

/// Event categories the decoder distinguishes.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackEventKind {
    /// Channel voice message (status 0x80..=0xEF)
    Channel { channel: u8, message: ChannelMessage },
    /// Meta event (status 0xFF)
    Meta(MetaEvent),
    /// System exclusive or escape (status 0xF0 / 0xF7), payload skipped
    SysEx { len: u32 },
}

/// Channel voice messages. Only notes are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    NoteOn { key: u8, velocity: u8 },
    /// Also produced for a note-on with velocity 0
    NoteOff { key: u8, velocity: u8 },
    /// Aftertouch, controller, program, pressure or pitch bend
    Other { status: u8 },
}

/// Meta events. Only tempo, time signature, track name and end of track
/// carry a payload; the rest are skipped by length.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaEvent {
    /// Microseconds per quarter note
    Tempo(u32),
    TimeSignature(TimeSignature),
    TrackName(String),
    EndOfTrack,
    Other { kind: u8 },
}

/// Time signature meta event (0x58).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSignature {
    pub numerator: u8,
    /// Real denominator (the file stores it as a power of two)
    pub denominator: u16,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note
    pub thirty_seconds_per_quarter: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }
}
