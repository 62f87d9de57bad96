//! Tick → seconds mapping built from Set-Tempo events.

use mf_ir::{
    micros_to_bpm, MetaEvent, MidiFile, TempoMapEntry, Tick, TimeSignature, TrackEventKind,
    DEFAULT_MICROS_PER_QUARTER,
};

/// Piecewise-linear tempo map.
///
/// Entries are sorted by tick and the first one is always at tick 0.
/// Tempo events from every track are merged, so files that put tempo
/// changes outside the first track still time correctly.
#[derive(Clone, Debug, PartialEq)]
pub struct TempoMap {
    division: u16,
    entries: Vec<TempoMapEntry>,
    time_signatures: Vec<(Tick, TimeSignature)>,
}

impl TempoMap {
    /// Scan all tracks of `file` for tempo and time signature events.
    pub fn build(file: &MidiFile) -> Self {
        let mut changes: Vec<(Tick, u32)> = Vec::new();
        let mut time_signatures = Vec::new();

        for track in &file.tracks {
            for (tick, kind) in track.absolute_events() {
                match kind {
                    TrackEventKind::Meta(MetaEvent::Tempo(micros)) => changes.push((tick, *micros)),
                    TrackEventKind::Meta(MetaEvent::TimeSignature(sig)) => {
                        time_signatures.push((tick, *sig))
                    }
                    _ => {}
                }
            }
        }

        // Stable: at equal ticks the later track wins
        changes.sort_by_key(|&(tick, _)| tick);
        time_signatures.sort_by_key(|&(tick, _)| tick);

        Self::from_changes(file.division, &changes, time_signatures)
    }

    /// Build from `(tick, micros_per_quarter)` pairs sorted by tick.
    pub fn from_changes(
        division: u16,
        changes: &[(Tick, u32)],
        time_signatures: Vec<(Tick, TimeSignature)>,
    ) -> Self {
        let mut map = Self {
            division: division.max(1),
            entries: Vec::with_capacity(changes.len() + 1),
            time_signatures,
        };

        if changes.first().map_or(true, |&(tick, _)| tick > 0) {
            map.entries.push(TempoMapEntry {
                tick: 0,
                micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
                seconds: 0.0,
            });
        }

        let division = map.division;
        for &(tick, micros) in changes {
            let seconds = match map.entries.last() {
                Some(last) if last.tick == tick => None,
                Some(last) => Some(last.seconds + segment_seconds(division, last, tick)),
                None => Some(0.0),
            };
            if let Some(seconds) = seconds {
                map.entries.push(TempoMapEntry { tick, micros_per_quarter: micros, seconds });
            } else if let Some(last) = map.entries.last_mut() {
                last.micros_per_quarter = micros;
            }
        }

        map
    }

    /// Elapsed seconds at `tick`.
    pub fn seconds_at(&self, tick: Tick) -> f64 {
        let segment = &self.entries[self.segment_index(tick)];
        segment.seconds + segment_seconds(self.division, segment, tick)
    }

    /// Index of the tempo segment containing `tick` (binary search).
    fn segment_index(&self, tick: Tick) -> usize {
        self.entries
            .partition_point(|e| e.tick <= tick)
            .saturating_sub(1)
    }

    /// Tempo in effect at `tick`.
    pub fn micros_per_quarter_at(&self, tick: Tick) -> u32 {
        self.entries[self.segment_index(tick)].micros_per_quarter
    }

    pub fn division(&self) -> u16 {
        self.division
    }

    pub fn entries(&self) -> &[TempoMapEntry] {
        &self.entries
    }

    pub fn time_signatures(&self) -> &[(Tick, TimeSignature)] {
        &self.time_signatures
    }

    pub fn initial_bpm(&self) -> f64 {
        micros_to_bpm(self.entries[0].micros_per_quarter)
    }

    /// True when a single tempo holds for the whole file.
    pub fn is_constant(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].micros_per_quarter == w[1].micros_per_quarter)
    }
}

/// Seconds from the start of `segment` to `tick`.
fn segment_seconds(division: u16, segment: &TempoMapEntry, tick: Tick) -> f64 {
    let quarters = (tick - segment.tick) as f64 / division as f64;
    quarters * segment.micros_per_quarter as f64 / 1_000_000.0
}
