//! Track selection strings such as `"*"` or `"0-3,5"`.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("empty track selection")]
    Empty,
    #[error("invalid track index {0:?}")]
    InvalidIndex(String),
    #[error("track range {start}-{end} is reversed")]
    ReversedRange { start: usize, end: usize },
}

/// Which logical tracks to include in a timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TrackSelection {
    #[default]
    All,
    /// Inclusive index ranges; a single index is a one-element range
    Ranges(Vec<RangeInclusive<usize>>),
}

impl TrackSelection {
    /// Parse `"*"` or a comma-separated list of indices and inclusive
    /// ranges. Whitespace around items is ignored.
    pub fn parse(text: &str) -> Result<Self, SelectionError> {
        let text = text.trim();
        if text == "*" {
            return Ok(Self::All);
        }
        if text.is_empty() {
            return Err(SelectionError::Empty);
        }

        let ranges = text
            .split(',')
            .map(|item| {
                let item = item.trim();
                match item.split_once('-') {
                    Some((start, end)) => {
                        let (start, end) = (parse_index(start)?, parse_index(end)?);
                        if start > end {
                            return Err(SelectionError::ReversedRange { start, end });
                        }
                        Ok(start..=end)
                    }
                    None => parse_index(item).map(|i| i..=i),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Ranges(ranges))
    }

    pub fn contains(&self, track: usize) -> bool {
        match self {
            Self::All => true,
            Self::Ranges(ranges) => ranges.iter().any(|r| r.contains(&track)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

fn parse_index(text: &str) -> Result<usize, SelectionError> {
    let text = text.trim();
    text.parse()
        .map_err(|_| SelectionError::InvalidIndex(text.to_owned()))
}

impl FromStr for TrackSelection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Ranges(ranges) => {
                for (i, r) in ranges.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if r.start() == r.end() {
                        write!(f, "{}", r.start())?;
                    } else {
                        write!(f, "{}-{}", r.start(), r.end())?;
                    }
                }
                Ok(())
            }
        }
    }
}
