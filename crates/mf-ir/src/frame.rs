//! Animation frame math.

/// Frame rate used when nothing else is configured.
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

/// Convert elapsed seconds to the nearest frame at `frame_rate`.
///
/// Halfway values round away from zero.
pub fn seconds_to_frame(seconds: f64, frame_rate: f64) -> u64 {
    let frame = libm::round(seconds * frame_rate);
    if frame <= 0.0 {
        0
    } else {
        frame as u64
    }
}

/// Policy for the shortest span a note may occupy on the timeline.
///
/// Stretching short notes distorts musical timing in exchange for every
/// note being visible for at least a few frames.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MinDuration {
    /// Fixed number of frames. `Frames(0)` disables the clamp.
    Frames(u32),
    /// Fraction of one second, rounded up to whole frames (at least one)
    FractionOfSecond(f64),
}

impl Default for MinDuration {
    fn default() -> Self {
        Self::Frames(2)
    }
}

impl MinDuration {
    /// Minimum frame count at `frame_rate`.
    pub fn frames(self, frame_rate: f64) -> u64 {
        match self {
            Self::Frames(n) => n as u64,
            Self::FractionOfSecond(fraction) => {
                if !(fraction > 0.0) || !fraction.is_finite() {
                    return 0;
                }
                let frames = libm::ceil(frame_rate * fraction);
                if frames < 1.0 {
                    1
                } else {
                    frames as u64
                }
            }
        }
    }
}
