//! Advisory diagnostics for musically odd but legal input.

use core::fmt;

use crate::Tick;

/// Non-fatal anomaly recorded while building a timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Diagnostic {
    /// Note-on while the same note was already sounding; the earlier note
    /// was closed at `tick`.
    Retrigger { track: usize, channel: u8, note: u8, tick: Tick },
    /// Note-off with no matching note-on; ignored.
    DanglingNoteOff { track: usize, channel: u8, note: u8, tick: Tick },
    /// Note still sounding at end of track; closed at `end_tick`.
    UnterminatedNote { track: usize, channel: u8, note: u8, start_tick: Tick, end_tick: Tick },
    /// Frame rate below the advisory threshold; timing will be coarse.
    LowFrameRate { frame_rate: f64, advisory: f64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Retrigger { track, channel, note, tick } => write!(
                f,
                "track {track} ch {channel}: note {note} retriggered at tick {tick} without note-off"
            ),
            Self::DanglingNoteOff { track, channel, note, tick } => write!(
                f,
                "track {track} ch {channel}: note-off for {note} at tick {tick} has no note-on"
            ),
            Self::UnterminatedNote { track, channel, note, start_tick, end_tick } => write!(
                f,
                "track {track} ch {channel}: note {note} from tick {start_tick} closed at end of track ({end_tick})"
            ),
            Self::LowFrameRate { frame_rate, advisory } => write!(
                f,
                "frame rate {frame_rate} fps is below {advisory} fps, note timing will be coarse"
            ),
        }
    }
}
