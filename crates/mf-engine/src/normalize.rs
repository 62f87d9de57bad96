//! Track/channel normalization.
//!
//! Format 0 files carry every channel in one track; they are split into one
//! logical track per channel that actually plays notes. Format 1 and 2
//! tracks pass through unchanged. Either way the result is a list of
//! `LogicalTrack`s with stable 0-based indices.

use arrayvec::ArrayVec;
use mf_ir::{
    ChannelMessage, Format, MidiFile, NoteKind, RawNoteEvent, Tick, Track, TrackEventKind,
    TrackOrigin, MAX_CHANNEL,
};

use crate::ChannelFilter;

const CHANNEL_COUNT: usize = MAX_CHANNEL as usize + 1;

/// A track as seen by the pairing engine.
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalTrack {
    pub index: usize,
    pub origin: TrackOrigin,
    pub name: String,
    /// Note events in original order; `RawNoteEvent::track` equals `index`
    pub notes: Vec<RawNoteEvent>,
    pub end_tick: Tick,
}

impl LogicalTrack {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Extract note events from `track` with absolute ticks, labelled with
/// logical index `index`.
pub fn raw_note_events(track: &Track, index: usize) -> Vec<RawNoteEvent> {
    track
        .absolute_events()
        .filter_map(|(tick, kind)| {
            let TrackEventKind::Channel { channel, message } = *kind else {
                return None;
            };
            let (note, velocity, kind) = match message {
                ChannelMessage::NoteOn { key, velocity } => (key, velocity, NoteKind::On),
                ChannelMessage::NoteOff { key, velocity } => (key, velocity, NoteKind::Off),
                ChannelMessage::Other { .. } => return None,
            };
            Some(RawNoteEvent { tick, track: index, channel, note, velocity, kind })
        })
        .collect()
}

/// Build logical tracks for `file`.
///
/// Indices are assigned before `filter` is applied, so a track keeps its
/// index whatever the selection. Tracks with no selected note events are
/// not materialized when a filter is given.
pub fn normalize(file: &MidiFile, filter: Option<ChannelFilter<'_>>) -> Vec<LogicalTrack> {
    match file.format {
        Format::SingleTrack => split_channels(file, filter),
        Format::Parallel | Format::Sequential => file
            .tracks
            .iter()
            .filter_map(|track| {
                let index = track.index;
                let mut notes = raw_note_events(track, index);
                if let Some(accept) = filter {
                    notes.retain(|n| accept(index, n.channel));
                    if notes.is_empty() {
                        return None;
                    }
                }
                Some(LogicalTrack {
                    index,
                    origin: TrackOrigin::Original { source: index },
                    name: track_name(track),
                    notes,
                    end_tick: track.end_tick,
                })
            })
            .collect(),
    }
}

fn split_channels(file: &MidiFile, filter: Option<ChannelFilter<'_>>) -> Vec<LogicalTrack> {
    let mut tracks = Vec::new();
    let mut next_index = 0;

    for track in &file.tracks {
        let channels = channels_with_notes(track);
        let base_name = track_name(track);
        let all_notes = raw_note_events(track, 0);

        for channel in channels {
            let index = next_index;
            next_index += 1;
            if filter.is_some_and(|accept| !accept(index, channel)) {
                continue;
            }
            let notes = all_notes
                .iter()
                .filter(|n| n.channel == channel)
                .map(|n| RawNoteEvent { track: index, ..*n })
                .collect();
            tracks.push(LogicalTrack {
                index,
                origin: TrackOrigin::ChannelSplit { source: track.index, channel },
                name: format!("{base_name}-ch{channel}"),
                notes,
                end_tick: track.end_tick,
            });
        }
    }

    tracks
}

/// Channels with at least one note-on, ascending. A channel holding only
/// note-offs would pair to nothing.
fn channels_with_notes(track: &Track) -> ArrayVec<u8, CHANNEL_COUNT> {
    let mut seen = [false; CHANNEL_COUNT];
    for event in &track.events {
        if let TrackEventKind::Channel { channel, message: ChannelMessage::NoteOn { .. } } = event.kind {
            seen[channel as usize & MAX_CHANNEL as usize] = true;
        }
    }
    (0..CHANNEL_COUNT as u8).filter(|&c| seen[c as usize]).collect()
}

fn track_name(track: &Track) -> String {
    track
        .name
        .clone()
        .unwrap_or_else(|| format!("Track {}", track.index))
}
