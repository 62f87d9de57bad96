//! Logical track identity and summary.

use alloc::string::String;
use alloc::vec::Vec;

/// Where a logical timeline track came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackOrigin {
    /// A track chunk used as-is (format 1 and 2)
    Original { source: usize },
    /// One channel split out of a format 0 track
    ChannelSplit { source: usize, channel: u8 },
}

impl TrackOrigin {
    /// Index of the track chunk in the file.
    pub fn source(&self) -> usize {
        match *self {
            Self::Original { source } | Self::ChannelSplit { source, .. } => source,
        }
    }
}

/// Per-track summary exposed alongside the timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackInfo {
    /// Stable 0-based logical index
    pub index: usize,
    pub origin: TrackOrigin,
    pub name: String,
    pub note_count: usize,
    /// Lowest note number, `None` for a track without notes
    pub min_note: Option<u8>,
    pub max_note: Option<u8>,
    /// Distinct note numbers in ascending order
    pub notes_used: Vec<u8>,
}

impl TrackInfo {
    pub fn new(index: usize, origin: TrackOrigin, name: String) -> Self {
        Self {
            index,
            origin,
            name,
            note_count: 0,
            min_note: None,
            max_note: None,
            notes_used: Vec::new(),
        }
    }

    /// Fold one note number into the summary.
    pub fn record_note(&mut self, note: u8) {
        self.note_count += 1;
        self.min_note = Some(self.min_note.map_or(note, |n| n.min(note)));
        self.max_note = Some(self.max_note.map_or(note, |n| n.max(note)));
        if let Err(pos) = self.notes_used.binary_search(&note) {
            self.notes_used.insert(pos, note);
        }
    }

    /// Octaves spanned by the used note range, counting partial octaves.
    pub fn octave_count(&self) -> u8 {
        match (self.min_note, self.max_note) {
            (Some(lo), Some(hi)) => hi / 12 - lo / 12 + 1,
            _ => 0,
        }
    }
}
