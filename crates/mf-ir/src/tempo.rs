//! Tempo map entries.

use crate::Tick;

/// Tempo assumed until the file sets one: 120 BPM.
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// A tempo segment start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoMapEntry {
    pub tick: Tick,
    pub micros_per_quarter: u32,
    /// Elapsed seconds at `tick`, integrated over earlier segments
    pub seconds: f64,
}

impl TempoMapEntry {
    pub fn bpm(&self) -> f64 {
        micros_to_bpm(self.micros_per_quarter)
    }
}

/// Convert microseconds per quarter note to beats per minute.
pub fn micros_to_bpm(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / micros_per_quarter as f64
}
