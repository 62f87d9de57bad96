//! Core types for midiframe.
//!
//! This crate defines the data model shared by the decoder, the timeline
//! engine and the controller: the decoded file, raw and paired note
//! records, the final frame-quantized `NoteEvent`, tempo entries and the
//! advisory diagnostics attached to a finished timeline.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod diagnostic;
mod frame;
mod note;
pub mod smf;
mod tempo;
mod track;

pub use diagnostic::Diagnostic;
pub use frame::{seconds_to_frame, MinDuration, DEFAULT_FRAME_RATE};
pub use note::{NoteEvent, NoteKind, PairedNote, RawNoteEvent};
pub use smf::{ChannelMessage, Format, MetaEvent, MidiFile, TimeSignature, Track, TrackEvent, TrackEventKind};
pub use tempo::{micros_to_bpm, TempoMapEntry, DEFAULT_MICROS_PER_QUARTER};
pub use track::{TrackInfo, TrackOrigin};

/// Absolute position in MIDI ticks from the start of a track.
pub type Tick = u64;

/// Highest valid MIDI channel number.
pub const MAX_CHANNEL: u8 = 15;

/// Highest valid MIDI note number or velocity.
pub const MAX_DATA_BYTE: u8 = 127;
