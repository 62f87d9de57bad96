//! Note-on/note-off pairing.

use mf_ir::{Diagnostic, NoteKind, PairedNote, RawNoteEvent, Tick};

use crate::LogicalTrack;

const CHANNELS: usize = 16;
const KEYS: usize = 128;

/// Pending-on table for one track: `(start tick, velocity)` per
/// `(channel, note)`.
struct NoteAccumulator {
    track: usize,
    notes: Vec<PairedNote>,
    active: Vec<Option<(Tick, u8)>>,
}

impl NoteAccumulator {
    fn new(track: usize, capacity: usize) -> Self {
        Self {
            track,
            notes: Vec::with_capacity(capacity),
            active: vec![None; CHANNELS * KEYS],
        }
    }

    #[inline]
    fn slot(channel: u8, note: u8) -> usize {
        (channel as usize % CHANNELS) * KEYS + (note as usize % KEYS)
    }

    fn close(&mut self, channel: u8, note: u8, start: (Tick, u8), end_tick: Tick) {
        let (start_tick, velocity) = start;
        self.notes.push(PairedNote {
            track: self.track,
            channel,
            note,
            velocity,
            start_tick,
            end_tick,
        });
    }

    fn note_on(&mut self, event: &RawNoteEvent, diagnostics: &mut Vec<Diagnostic>) {
        let slot = Self::slot(event.channel, event.note);
        if let Some(previous) = self.active[slot].take() {
            self.close(event.channel, event.note, previous, event.tick);
            diagnostics.push(Diagnostic::Retrigger {
                track: self.track,
                channel: event.channel,
                note: event.note,
                tick: event.tick,
            });
        }
        self.active[slot] = Some((event.tick, event.velocity));
    }

    fn note_off(&mut self, event: &RawNoteEvent, diagnostics: &mut Vec<Diagnostic>) {
        match self.active[Self::slot(event.channel, event.note)].take() {
            Some(start) => self.close(event.channel, event.note, start, event.tick),
            None => diagnostics.push(Diagnostic::DanglingNoteOff {
                track: self.track,
                channel: event.channel,
                note: event.note,
                tick: event.tick,
            }),
        }
    }

    /// Close everything still sounding, in (channel, note) order.
    fn finish(mut self, end_tick: Tick, diagnostics: &mut Vec<Diagnostic>) -> Vec<PairedNote> {
        for slot in 0..self.active.len() {
            let Some(start) = self.active[slot].take() else {
                continue;
            };
            let channel = (slot / KEYS) as u8;
            let note = (slot % KEYS) as u8;
            let end = end_tick.max(start.0);
            self.close(channel, note, start, end);
            diagnostics.push(Diagnostic::UnterminatedNote {
                track: self.track,
                channel,
                note,
                start_tick: start.0,
                end_tick: end,
            });
        }
        // Stable: notes starting on the same tick keep close order
        self.notes.sort_by_key(|n| n.start_tick);
        self.notes
    }
}

/// Pair the note events of one logical track.
///
/// Every note-on yields exactly one `PairedNote`. A note-on for a note that
/// is already sounding closes the earlier note at its own tick; notes still
/// open at the end of the track close at `track.end_tick`. Anomalies are
/// appended to `diagnostics`. Output is ordered by start tick.
pub fn pair_notes(track: &LogicalTrack, diagnostics: &mut Vec<Diagnostic>) -> Vec<PairedNote> {
    let mut acc = NoteAccumulator::new(track.index, track.notes.len() / 2);

    for event in &track.notes {
        match event.kind {
            NoteKind::On => acc.note_on(event, diagnostics),
            NoteKind::Off => acc.note_off(event, diagnostics),
        }
    }

    acc.finish(track.end_tick, diagnostics)
}
