use mf_engine::{TimelineSettings, DEFAULT_ADVISORY_FRAME_RATE};
use mf_ir::{MinDuration, DEFAULT_FRAME_RATE};
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, io, path::Path};

use crate::selection::{SelectionError, TrackSelection};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Conversion settings, usually read from a TOML file.
///
/// ```toml
/// frame_rate = 30.0
/// min_duration = { fraction_of_second = 0.1 }
/// tracks = "1-3"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub frame_rate: f64,
    pub min_duration: MinDuration,
    pub advisory_frame_rate: f64,
    /// Track selection, `"*"` for all tracks
    pub tracks: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            min_duration: MinDuration::default(),
            advisory_frame_rate: DEFAULT_ADVISORY_FRAME_RATE,
            tracks: String::from("*"),
        }
    }
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn settings(&self) -> TimelineSettings {
        TimelineSettings {
            frame_rate: self.frame_rate,
            min_duration: self.min_duration,
            advisory_frame_rate: self.advisory_frame_rate,
        }
    }

    pub fn selection(&self) -> Result<TrackSelection, SelectionError> {
        TrackSelection::parse(&self.tracks)
    }
}
