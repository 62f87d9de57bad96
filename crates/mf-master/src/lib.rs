//! Headless controller for midiframe.
//!
//! Provides a unified API for decoding a MIDI file and building its
//! frame-quantized timeline that the CLI and other frontends can share.

mod config;
mod selection;

use mf_engine::ChannelFilter;
use std::path::Path;

// Re-export common types so callers don't need mf-ir/mf-engine directly.
pub use config::{Config, ConfigError};
pub use mf_engine::{
    FrameSpan, NoteRange, TempoMap, Timeline, TimelineError, TimelineSettings, TrackView,
};
pub use mf_formats::FormatError;
pub use mf_ir::{Diagnostic, MidiFile, MinDuration, NoteEvent, TrackInfo, TrackOrigin};
pub use selection::{SelectionError, TrackSelection};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// Decodes MIDI data into timelines with one set of settings.
#[derive(Clone, Debug)]
pub struct Converter {
    settings: TimelineSettings,
    selection: TrackSelection,
}

impl Converter {
    /// Fails when the config's track selection does not parse.
    pub fn new(config: &Config) -> Result<Self, ConvertError> {
        Ok(Self {
            settings: config.settings(),
            selection: config.selection()?,
        })
    }

    /// Load a TOML config from `path` and build a converter from it.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let config = Config::read(path)?;
        Self::new(&config)
    }

    pub fn with_settings(settings: TimelineSettings, selection: TrackSelection) -> Self {
        Self { settings, selection }
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn selection(&self) -> &TrackSelection {
        &self.selection
    }

    /// Decode SMF bytes without building a timeline.
    pub fn decode(&self, data: &[u8]) -> Result<MidiFile, ConvertError> {
        Ok(mf_formats::load_smf(data)?)
    }

    /// Decode `data` and build its timeline.
    pub fn convert(&self, data: &[u8]) -> Result<Timeline, ConvertError> {
        let file = self.decode(data)?;
        self.timeline(&file)
    }

    /// Read and convert the file at `path`.
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Result<Timeline, ConvertError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ConvertError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.convert(&data)
    }

    /// Build the timeline for an already decoded file.
    pub fn timeline(&self, file: &MidiFile) -> Result<Timeline, ConvertError> {
        let timeline = match &self.selection {
            TrackSelection::All => mf_engine::build_timeline(file, &self.settings, None)?,
            selection => {
                let accept: ChannelFilter<'_> = &|track, _channel| selection.contains(track);
                mf_engine::build_timeline(file, &self.settings, Some(accept))?
            }
        };

        for diagnostic in timeline.diagnostics() {
            log::warn!("{diagnostic}");
        }
        log::info!(
            "{} notes on {} tracks, {} frames at {} fps",
            timeline.len(),
            timeline.track_info().len(),
            timeline.frame_span().map_or(0, |span| span.end),
            timeline.frame_rate()
        );

        Ok(timeline)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::with_settings(TimelineSettings::default(), TrackSelection::All)
    }
}
