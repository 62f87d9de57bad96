//! Format parsers for midiframe.
//!
//! Decodes Standard MIDI Files (formats 0, 1 and 2) from an in-memory
//! buffer into the `MidiFile` IR.

mod reader;
mod smf_format;

pub use reader::{encode_vlq, ByteReader, MAX_VLQ, MAX_VLQ_BYTES};
pub use smf_format::load_smf;

/// Error type for format parsing.
///
/// Every variant carries the absolute byte offset where decoding stopped.
/// Any error is terminal for the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Chunk does not start with the expected magic bytes
    #[error("expected {expected} chunk signature at byte {offset}")]
    InvalidSignature { offset: usize, expected: &'static str },
    /// Header chunk has an impossible length or division
    #[error("malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: &'static str },
    /// Valid file using a feature this decoder does not handle
    #[error("unsupported at byte {offset}: {reason}")]
    UnsupportedFormat { offset: usize, reason: Unsupported },
    /// A read ran past the end of the buffer or chunk
    #[error("truncated data: needed {needed} byte(s) at byte {offset}")]
    TruncatedData { offset: usize, needed: usize },
    /// Variable-length quantity longer than four bytes
    #[error("variable-length quantity at byte {offset} exceeds 4 bytes")]
    MalformedVlq { offset: usize },
    /// Unknown status byte, data byte without running status, or bad payload
    #[error("malformed event with status {status:#04x} at byte {offset}")]
    MalformedEvent { offset: usize, status: u8 },
}

impl FormatError {
    /// Byte offset where decoding failed.
    pub fn offset(&self) -> usize {
        match *self {
            Self::InvalidSignature { offset, .. }
            | Self::MalformedHeader { offset, .. }
            | Self::UnsupportedFormat { offset, .. }
            | Self::TruncatedData { offset, .. }
            | Self::MalformedVlq { offset }
            | Self::MalformedEvent { offset, .. } => offset,
        }
    }
}

/// What made a file unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unsupported {
    #[error("file format {0} (expected 0, 1 or 2)")]
    FileFormat(u16),
    #[error("SMPTE time division")]
    SmpteDivision,
}
