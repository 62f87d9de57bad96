//! Timeline assembly.

use std::collections::BTreeSet;
use std::ops::Range;

use mf_ir::{Diagnostic, MidiFile, NoteEvent, TrackInfo};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    normalize, pair_notes, ChannelFilter, FrameQuantizer, LogicalTrack, TempoMap, TimelineError,
    TimelineSettings,
};

/// First and last frame covered by any note (`end` is exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameSpan {
    pub start: u64,
    pub end: u64,
}

impl FrameSpan {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Note range across every track that has notes, for keyboard layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoteRange {
    pub min_note: u8,
    pub max_note: u8,
    /// Octaves spanned, counting partial octaves at both ends
    pub octave_count: u8,
    /// Tracks contributing at least one note
    pub track_count: usize,
}

/// Frame-quantized note events for a whole file.
///
/// Read-only once built. Events are ordered by
/// `(start_frame, track, channel, note, start_tick)`.
#[derive(Clone, Debug)]
pub struct Timeline {
    events: Vec<NoteEvent>,
    /// Indices into `events`, grouped by track in `track_info` order
    by_track: Vec<usize>,
    /// Range of `by_track` for each entry of `track_info`
    track_ranges: Vec<Range<usize>>,
    track_info: Vec<TrackInfo>,
    tempo_map: TempoMap,
    diagnostics: Vec<Diagnostic>,
    frame_rate: f64,
}

impl Timeline {
    /// Merge per-track results. `tracks` must be in ascending track index.
    fn assemble(
        tracks: Vec<(TrackInfo, Vec<NoteEvent>)>,
        tempo_map: TempoMap,
        diagnostics: Vec<Diagnostic>,
        frame_rate: f64,
    ) -> Self {
        let total = tracks.iter().map(|(_, notes)| notes.len()).sum();
        let mut events = Vec::with_capacity(total);
        let mut track_info = Vec::with_capacity(tracks.len());
        for (info, notes) in tracks {
            events.extend(notes);
            track_info.push(info);
        }

        events.sort_by(|a, b| {
            (a.start_frame, a.track, a.channel, a.note, a.start_tick)
                .cmp(&(b.start_frame, b.track, b.channel, b.note, b.start_tick))
        });

        // Stable sort keeps each track's slice in global order
        let mut by_track: Vec<usize> = (0..events.len()).collect();
        by_track.sort_by_key(|&i| events[i].track);

        let mut track_ranges = Vec::with_capacity(track_info.len());
        for info in &track_info {
            let start = by_track.partition_point(|&i| events[i].track < info.index);
            let end = by_track.partition_point(|&i| events[i].track <= info.index);
            track_ranges.push(start..end);
        }

        Self { events, by_track, track_ranges, track_info, tempo_map, diagnostics, frame_rate }
    }

    /// All events in timeline order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// `None` for a timeline without notes.
    pub fn frame_span(&self) -> Option<FrameSpan> {
        let start = self.events.first()?.start_frame;
        let end = self.events.iter().map(|e| e.end_frame).max()?;
        Some(FrameSpan { start, end })
    }

    /// Lowest and highest note over all tracks, `None` without notes.
    pub fn note_range(&self) -> Option<NoteRange> {
        let mut used = self
            .track_info
            .iter()
            .filter_map(|t| Some((t.min_note?, t.max_note?)));
        let (mut min_note, mut max_note) = used.next()?;
        let mut track_count = 1;
        for (lo, hi) in used {
            min_note = min_note.min(lo);
            max_note = max_note.max(hi);
            track_count += 1;
        }
        Some(NoteRange {
            min_note,
            max_note,
            octave_count: max_note / 12 - min_note / 12 + 1,
            track_count,
        })
    }

    /// `(track, channel)` pairs with at least one note.
    pub fn active_channels(&self) -> BTreeSet<(usize, u8)> {
        self.events.iter().map(|e| (e.track, e.channel)).collect()
    }

    /// Per-track views in track order. The iterator can be cloned or
    /// requested again to restart.
    pub fn tracks(&self) -> TrackViews<'_> {
        TrackViews { timeline: self, next: 0 }
    }

    /// View of the track with logical index `index`.
    pub fn track(&self, index: usize) -> Option<TrackView<'_>> {
        let pos = self.track_info.binary_search_by_key(&index, |t| t.index).ok()?;
        Some(self.view(pos))
    }

    /// Notes of one track in timeline order; empty for unknown tracks.
    pub fn track_notes(&self, index: usize) -> impl Iterator<Item = &NoteEvent> + Clone + '_ {
        let indices = match self.track(index) {
            Some(view) => view.indices,
            None => &[],
        };
        indices.iter().map(move |&i| &self.events[i])
    }

    fn view(&self, pos: usize) -> TrackView<'_> {
        TrackView {
            info: &self.track_info[pos],
            events: &self.events,
            indices: &self.by_track[self.track_ranges[pos].clone()],
        }
    }

    pub fn track_info(&self) -> &[TrackInfo] {
        &self.track_info
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Time of the last note-off in seconds, 0 for an empty timeline.
    pub fn end_seconds(&self) -> f64 {
        self.events.iter().map(|e| e.end_seconds).fold(0.0, f64::max)
    }

    /// Notes sounding at `frame`.
    pub fn active_at(&self, frame: u64) -> impl Iterator<Item = &NoteEvent> + '_ {
        // Events after the first start past `frame` cannot be active
        let upper = self.events.partition_point(|e| e.start_frame <= frame);
        self.events[..upper].iter().filter(move |e| e.is_active_at(frame))
    }
}

/// One logical track of a `Timeline`.
#[derive(Clone, Copy, Debug)]
pub struct TrackView<'a> {
    info: &'a TrackInfo,
    events: &'a [NoteEvent],
    indices: &'a [usize],
}

impl<'a> TrackView<'a> {
    pub fn info(&self) -> &'a TrackInfo {
        self.info
    }

    pub fn index(&self) -> usize {
        self.info.index
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Notes in timeline order.
    pub fn notes(&self) -> impl Iterator<Item = &'a NoteEvent> + Clone + 'a {
        let events = self.events;
        self.indices.iter().map(move |&i| &events[i])
    }
}

/// Iterator over the tracks of a `Timeline`.
#[derive(Clone, Debug)]
pub struct TrackViews<'a> {
    timeline: &'a Timeline,
    next: usize,
}

impl<'a> Iterator for TrackViews<'a> {
    type Item = TrackView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.timeline.track_info.len() {
            return None;
        }
        let view = self.timeline.view(self.next);
        self.next += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.timeline.track_info.len() - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for TrackViews<'_> {}

/// Pair and quantize one logical track.
fn process_track(
    track: &LogicalTrack,
    quantizer: &FrameQuantizer<'_>,
) -> (TrackInfo, Vec<NoteEvent>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let paired = pair_notes(track, &mut diagnostics);

    let mut info = TrackInfo::new(track.index, track.origin, track.name.clone());
    let notes = paired
        .iter()
        .map(|note| {
            info.record_note(note.note);
            quantizer.quantize(note)
        })
        .collect();

    (info, notes, diagnostics)
}

/// Build the frame-quantized timeline for `file`.
///
/// Only tracks and channels accepted by `filter` are paired. Anomalies in
/// the input are reported through `Timeline::diagnostics`; the only error
/// is an unusable frame rate.
pub fn build_timeline(
    file: &MidiFile,
    settings: &TimelineSettings,
    filter: Option<ChannelFilter<'_>>,
) -> Result<Timeline, TimelineError> {
    let tempo_map = TempoMap::build(file);
    let quantizer = FrameQuantizer::new(&tempo_map, settings.frame_rate, settings.min_duration)?;

    let mut diagnostics: Vec<Diagnostic> = quantizer
        .advisory(settings.advisory_frame_rate)
        .into_iter()
        .collect();

    let logical = normalize(file, filter);
    log::debug!(
        "[timeline] {} logical tracks, {} tempo segments, {} fps (min {} frames)",
        logical.len(),
        tempo_map.entries().len(),
        settings.frame_rate,
        quantizer.min_frames()
    );

    #[cfg(feature = "parallel")]
    let processed: Vec<_> = logical.par_iter().map(|t| process_track(t, &quantizer)).collect();
    #[cfg(not(feature = "parallel"))]
    let processed: Vec<_> = logical.iter().map(|t| process_track(t, &quantizer)).collect();

    let mut tracks = Vec::with_capacity(processed.len());
    for (info, notes, track_diagnostics) in processed {
        diagnostics.extend(track_diagnostics);
        tracks.push((info, notes));
    }

    let frame_rate = quantizer.frame_rate();
    Ok(Timeline::assemble(tracks, tempo_map, diagnostics, frame_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_ir::{
        ChannelMessage, Format, MetaEvent, MinDuration, Tick, Track, TrackEvent, TrackEventKind,
        TrackOrigin,
    };

    fn note(delta: u32, channel: u8, key: u8, velocity: u8) -> TrackEvent {
        let message = if velocity > 0 {
            ChannelMessage::NoteOn { key, velocity }
        } else {
            ChannelMessage::NoteOff { key, velocity: 0 }
        };
        TrackEvent::new(delta, TrackEventKind::Channel { channel, message })
    }

    fn track(index: usize, events: Vec<TrackEvent>) -> Track {
        let mut t = Track::new(index);
        t.end_tick = events.iter().map(|e| e.delta as Tick).sum();
        t.events = events;
        t
    }

    /// Division 96 at the default tempo: 8 ticks per frame at 24 fps.
    fn file(format: Format, tracks: Vec<Track>) -> MidiFile {
        let mut file = MidiFile::new(format, 96);
        file.tracks = tracks;
        file
    }

    fn two_track_file() -> MidiFile {
        file(
            Format::Parallel,
            vec![
                track(0, vec![TrackEvent::new(0, TrackEventKind::Meta(MetaEvent::Tempo(500_000)))]),
                track(
                    1,
                    vec![note(0, 0, 64, 90), note(0, 0, 60, 100), note(96, 0, 60, 0), note(0, 0, 64, 0)],
                ),
                track(2, vec![note(0, 1, 48, 80), note(48, 1, 48, 0), note(48, 1, 50, 80), note(48, 1, 50, 0)]),
            ],
        )
    }

    fn keys(timeline: &Timeline) -> Vec<(u64, usize, u8)> {
        timeline.events().iter().map(|e| (e.start_frame, e.track, e.note)).collect()
    }

    #[test]
    fn events_sorted_by_frame_then_track_channel_note() {
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), None).unwrap();
        assert_eq!(timeline.len(), 4);
        assert_eq!(keys(&timeline), [(0, 1, 60), (0, 1, 64), (0, 2, 48), (12, 2, 50)]);
        assert!(timeline.diagnostics().is_empty());
    }

    #[test]
    fn frame_span_and_end_seconds() {
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), None).unwrap();
        // Last note ends at tick 144 = 0.75 s = frame 18
        assert_eq!(timeline.frame_span(), Some(FrameSpan { start: 0, end: 18 }));
        assert!((timeline.end_seconds() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn empty_file_has_no_span() {
        let timeline = build_timeline(&file(Format::Parallel, vec![]), &TimelineSettings::default(), None).unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline.frame_span(), None);
        assert_eq!(timeline.end_seconds(), 0.0);
        assert!(timeline.active_channels().is_empty());
    }

    #[test]
    fn active_channels_lists_track_channel_pairs() {
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), None).unwrap();
        let channels: Vec<_> = timeline.active_channels().into_iter().collect();
        assert_eq!(channels, [(1, 0), (2, 1)]);
    }

    #[test]
    fn per_track_views_are_restartable() {
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), None).unwrap();
        let views = timeline.tracks();
        assert_eq!(views.len(), 3);

        let first_pass: Vec<(usize, usize)> = views.clone().map(|v| (v.index(), v.len())).collect();
        let second_pass: Vec<(usize, usize)> = views.map(|v| (v.index(), v.len())).collect();
        assert_eq!(first_pass, [(0, 0), (1, 2), (2, 2)]);
        assert_eq!(first_pass, second_pass);

        let track2 = timeline.track(2).unwrap();
        let notes = track2.notes();
        assert_eq!(notes.clone().count(), 2);
        let pitches: Vec<u8> = notes.map(|e| e.note).collect();
        assert_eq!(pitches, [48, 50]);
        assert_eq!(track2.info().notes_used, [48, 50]);

        assert_eq!(timeline.track_notes(1).count(), 2);
        assert_eq!(timeline.track_notes(9).count(), 0);
        assert!(timeline.track(9).is_none());
    }

    #[test]
    fn format0_channels_become_tracks() {
        let input = file(
            Format::SingleTrack,
            vec![track(0, vec![note(0, 2, 64, 100), note(0, 0, 60, 100), note(16, 0, 60, 0), note(0, 2, 64, 0)])],
        );
        let timeline = build_timeline(&input, &TimelineSettings::default(), None).unwrap();
        let origins: Vec<TrackOrigin> = timeline.track_info().iter().map(|t| t.origin).collect();
        assert_eq!(
            origins,
            [
                TrackOrigin::ChannelSplit { source: 0, channel: 0 },
                TrackOrigin::ChannelSplit { source: 0, channel: 2 },
            ]
        );
        assert_eq!(timeline.track_notes(0).next().map(|e| e.note), Some(60));
        assert_eq!(timeline.track_notes(1).next().map(|e| e.note), Some(64));
    }

    #[test]
    fn zero_length_note_is_clamped_in_timeline() {
        let input = file(Format::Parallel, vec![track(0, vec![note(40, 0, 60, 100), note(0, 0, 60, 0)])]);
        let timeline = build_timeline(&input, &TimelineSettings::default(), None).unwrap();
        let event = timeline.events()[0];
        assert_eq!((event.start_frame, event.end_frame), (5, 7));
        assert_eq!(event.start_tick, event.end_tick);
    }

    #[test]
    fn filter_limits_paired_tracks() {
        let select: ChannelFilter<'_> = &|track, _channel| track == 2;
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), Some(select)).unwrap();
        assert_eq!(timeline.track_info().len(), 1);
        assert_eq!(timeline.track_info()[0].index, 2);
        assert!(timeline.events().iter().all(|e| e.track == 2));
    }

    #[test]
    fn diagnostics_collected_from_all_stages() {
        let input = file(
            Format::Parallel,
            vec![track(0, vec![note(0, 0, 60, 0), note(0, 0, 62, 100), note(8, 0, 62, 100)])],
        );
        let settings = TimelineSettings { frame_rate: 8.0, ..TimelineSettings::default() };
        let timeline = build_timeline(&input, &settings, None).unwrap();
        let diags = timeline.diagnostics();
        assert_eq!(diags.len(), 4);
        assert!(matches!(diags[0], Diagnostic::LowFrameRate { .. }));
        assert!(matches!(diags[1], Diagnostic::DanglingNoteOff { note: 60, .. }));
        assert!(matches!(diags[2], Diagnostic::Retrigger { note: 62, tick: 8, .. }));
        assert!(matches!(diags[3], Diagnostic::UnterminatedNote { note: 62, start_tick: 8, end_tick: 8, .. }));
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn note_range_spans_selected_tracks() {
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), None).unwrap();
        // Track 0 has no notes and is not counted
        assert_eq!(
            timeline.note_range(),
            Some(NoteRange { min_note: 48, max_note: 64, octave_count: 2, track_count: 2 })
        );

        let select: ChannelFilter<'_> = &|track, _channel| track == 1;
        let timeline = build_timeline(&two_track_file(), &TimelineSettings::default(), Some(select)).unwrap();
        assert_eq!(
            timeline.note_range(),
            Some(NoteRange { min_note: 60, max_note: 64, octave_count: 1, track_count: 1 })
        );

        let empty = build_timeline(&file(Format::Parallel, vec![]), &TimelineSettings::default(), None).unwrap();
        assert_eq!(empty.note_range(), None);
    }

    #[test]
    fn invalid_frame_rate_is_an_error() {
        let settings = TimelineSettings { frame_rate: 0.0, ..TimelineSettings::default() };
        assert_eq!(
            build_timeline(&two_track_file(), &settings, None).unwrap_err(),
            TimelineError::InvalidFrameRate(0.0)
        );
    }

    #[test]
    fn active_at_uses_half_open_spans() {
        let settings = TimelineSettings { min_duration: MinDuration::Frames(0), ..TimelineSettings::default() };
        let timeline = build_timeline(&two_track_file(), &settings, None).unwrap();
        // Track 2: note 48 covers frames [0, 6), note 50 covers [12, 18)
        let at = |frame| timeline.active_at(frame).map(|e| e.note).collect::<Vec<_>>();
        assert_eq!(at(0), [60, 64, 48]);
        assert_eq!(at(6), [60, 64]);
        assert_eq!(at(12), [50]);
        assert!(at(18).is_empty());
    }
}
