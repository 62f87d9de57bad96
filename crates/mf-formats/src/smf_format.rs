//! Standard MIDI File parser.
//!
//! Reads the `MThd` header and `trackCount` `MTrk` chunks. Each track's
//! events are decoded through a reader bounded to the chunk's declared
//! length, so a corrupt track can never read into the next chunk.

use std::io::Cursor;

use binrw::BinRead;
use mf_ir::{
    ChannelMessage, Format, MetaEvent, MidiFile, TimeSignature, Tick, Track, TrackEvent,
    TrackEventKind, MAX_DATA_BYTE,
};

use crate::reader::ByteReader;
use crate::{FormatError, Unsupported};

const HEADER_CHUNK_LEN: usize = 14;
const HEADER_DATA_LEN: u32 = 6;
const TRACK_CHUNK_HEADER_LEN: usize = 8;

const META: u8 = 0xFF;
const SYSEX: u8 = 0xF0;
const SYSEX_ESCAPE: u8 = 0xF7;

const META_TRACK_NAME: u8 = 0x03;
const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;
const META_TIME_SIGNATURE: u8 = 0x58;

// ---------------------------------------------------------------------------
// Chunk headers
// ---------------------------------------------------------------------------

#[derive(BinRead, Debug)]
#[br(big, magic = b"MThd")]
struct HeaderChunk {
    length: u32,
    format: u16,
    track_count: u16,
    division: u16,
}

#[derive(BinRead, Debug)]
#[br(big, magic = b"MTrk")]
struct TrackChunkHeader {
    length: u32,
}

/// Decode a fixed-layout chunk header from at most `len` bytes at the cursor.
///
/// A short buffer still gets its magic checked first, so garbage input
/// reports a bad signature rather than truncation.
fn read_chunk_header<T>(
    reader: &mut ByteReader<'_>,
    len: usize,
    expected: &'static str,
) -> Result<T, FormatError>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let offset = reader.position();
    let available = len.min(reader.remaining());
    let bytes = reader.read_bytes(available)?;
    T::read_options(&mut Cursor::new(bytes), binrw::Endian::Big, ()).map_err(|e| match e {
        binrw::Error::BadMagic { pos, .. } => FormatError::InvalidSignature {
            offset: offset + pos as usize,
            expected,
        },
        _ => FormatError::TruncatedData {
            offset: offset + available,
            needed: len - available,
        },
    })
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Load a Standard MIDI File from bytes.
pub fn load_smf(data: &[u8]) -> Result<MidiFile, FormatError> {
    let mut reader = ByteReader::new(data);

    let header: HeaderChunk = read_chunk_header(&mut reader, HEADER_CHUNK_LEN, "MThd")?;
    if header.length != HEADER_DATA_LEN {
        return Err(FormatError::MalformedHeader {
            offset: 4,
            reason: "header length is not 6",
        });
    }
    let format = Format::from_u16(header.format).ok_or(FormatError::UnsupportedFormat {
        offset: 8,
        reason: Unsupported::FileFormat(header.format),
    })?;
    if header.division & 0x8000 != 0 {
        return Err(FormatError::UnsupportedFormat {
            offset: 12,
            reason: Unsupported::SmpteDivision,
        });
    }
    if header.division == 0 {
        return Err(FormatError::MalformedHeader {
            offset: 12,
            reason: "zero ticks per quarter note",
        });
    }

    log::debug!(
        "[SMF] format {}, {} track(s), {} ticks/quarter",
        header.format,
        header.track_count,
        header.division
    );

    let mut file = MidiFile::new(format, header.division);
    for index in 0..header.track_count as usize {
        let chunk: TrackChunkHeader =
            read_chunk_header(&mut reader, TRACK_CHUNK_HEADER_LEN, "MTrk")?;
        let mut body = reader.sub_reader(chunk.length as usize)?;
        let track = parse_track(&mut body, index)?;
        log::debug!(
            "[SMF] track {}: {} bytes, {} events, end tick {}",
            index,
            chunk.length,
            track.events.len(),
            track.end_tick
        );
        file.tracks.push(track);
    }

    if !reader.is_empty() {
        log::debug!("[SMF] ignoring {} trailing byte(s)", reader.remaining());
    }

    Ok(file)
}

// ---------------------------------------------------------------------------
// Track events
// ---------------------------------------------------------------------------

/// Decode one track chunk body. Stops at End-of-Track or at the end of the
/// chunk, whichever comes first.
fn parse_track(reader: &mut ByteReader<'_>, index: usize) -> Result<Track, FormatError> {
    let mut track = Track::new(index);
    let mut running_status: Option<u8> = None;
    let mut tick: Tick = 0;

    while !reader.is_empty() {
        let delta = reader.read_vlq()?;
        tick += delta as Tick;

        let status_offset = reader.position();
        let byte = reader.read_u8()?;
        let (status, first_data) = if byte & 0x80 != 0 {
            (byte, None)
        } else {
            // Running status: reuse the last channel status, `byte` is data
            let status = running_status.ok_or(FormatError::MalformedEvent {
                offset: status_offset,
                status: byte,
            })?;
            (status, Some(byte))
        };

        let kind = match status {
            0x80..=0xEF => {
                running_status = Some(status);
                parse_channel_message(reader, status, first_data, status_offset)?
            }
            META => parse_meta_event(reader)?,
            SYSEX | SYSEX_ESCAPE => {
                let len = reader.read_vlq()?;
                reader.skip(len as usize)?;
                TrackEventKind::SysEx { len }
            }
            _ => {
                return Err(FormatError::MalformedEvent {
                    offset: status_offset,
                    status,
                })
            }
        };

        if let TrackEventKind::Meta(MetaEvent::TrackName(name)) = &kind {
            if track.name.is_none() {
                track.name = Some(name.clone());
            }
        }
        let end_of_track = matches!(kind, TrackEventKind::Meta(MetaEvent::EndOfTrack));
        track.events.push(TrackEvent::new(delta, kind));
        if end_of_track {
            break;
        }
    }

    track.end_tick = tick;
    Ok(track)
}

fn parse_channel_message(
    reader: &mut ByteReader<'_>,
    status: u8,
    first_data: Option<u8>,
    status_offset: usize,
) -> Result<TrackEventKind, FormatError> {
    let channel = status & 0x0F;
    let data1 = match first_data {
        Some(b) => b,
        None => reader.read_u8()?,
    };

    let message = match status & 0xF0 {
        0x80 | 0x90 => {
            let velocity = reader.read_u8()?;
            if data1 > MAX_DATA_BYTE || velocity > MAX_DATA_BYTE {
                return Err(FormatError::MalformedEvent {
                    offset: status_offset,
                    status,
                });
            }
            // Note-on with velocity 0 is a note-off
            if status & 0xF0 == 0x90 && velocity > 0 {
                ChannelMessage::NoteOn { key: data1, velocity }
            } else {
                ChannelMessage::NoteOff { key: data1, velocity }
            }
        }
        // Program change and channel pressure carry one data byte
        0xC0 | 0xD0 => ChannelMessage::Other { status },
        _ => {
            reader.skip(1)?;
            ChannelMessage::Other { status }
        }
    };

    Ok(TrackEventKind::Channel { channel, message })
}

fn parse_meta_event(reader: &mut ByteReader<'_>) -> Result<TrackEventKind, FormatError> {
    let kind = reader.read_u8()?;
    let len = reader.read_vlq()? as usize;
    let payload_offset = reader.position();
    let data = reader.read_bytes(len)?;

    let meta = match kind {
        META_TEMPO => {
            let micros = match data {
                &[a, b, c] => u32::from_be_bytes([0, a, b, c]),
                _ => 0,
            };
            if micros == 0 {
                return Err(FormatError::MalformedEvent {
                    offset: payload_offset,
                    status: META,
                });
            }
            MetaEvent::Tempo(micros)
        }
        META_TIME_SIGNATURE => match data {
            &[numerator, power, clocks_per_click, thirty_seconds_per_quarter, ..] if power < 16 => {
                MetaEvent::TimeSignature(TimeSignature {
                    numerator,
                    denominator: 1 << power,
                    clocks_per_click,
                    thirty_seconds_per_quarter,
                })
            }
            _ => MetaEvent::Other { kind },
        },
        META_TRACK_NAME => MetaEvent::TrackName(decode_latin1(data)),
        META_END_OF_TRACK => MetaEvent::EndOfTrack,
        _ => MetaEvent::Other { kind },
    };

    Ok(TrackEventKind::Meta(meta))
}

/// Text meta events have no declared encoding; Latin-1 maps every byte.
fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_from(bytes: &[u8]) -> Result<Track, FormatError> {
        parse_track(&mut ByteReader::new(bytes), 0)
    }

    #[test]
    fn channel_messages_keep_cursor_in_sync() {
        let bytes = [
            0x00, 0xB0, 0x07, 0x64, // controller: 2 data bytes
            0x00, 0xC0, 0x05, // program: 1 data byte
            0x00, 0xD0, 0x40, // channel pressure: 1 data byte
            0x00, 0xE0, 0x00, 0x40, // pitch bend: 2 data bytes
            0x00, 0x90, 0x3C, 0x64, // note on
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let track = track_from(&bytes).unwrap();
        assert_eq!(track.events.len(), 6);
        assert_eq!(
            track.events[4].kind,
            TrackEventKind::Channel {
                channel: 0,
                message: ChannelMessage::NoteOn { key: 0x3C, velocity: 0x64 }
            }
        );
    }

    #[test]
    fn running_status_survives_meta_events() {
        let bytes = [
            0x00, 0x91, 0x3C, 0x64, //
            0x00, 0xFF, 0x01, 0x01, b'x', // text meta
            0x10, 0x3C, 0x00, // running status note-on, velocity 0
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let track = track_from(&bytes).unwrap();
        assert_eq!(
            track.events[2].kind,
            TrackEventKind::Channel {
                channel: 1,
                message: ChannelMessage::NoteOff { key: 0x3C, velocity: 0 }
            }
        );
    }

    #[test]
    fn data_byte_without_running_status_is_malformed() {
        let bytes = [0x00, 0x3C, 0x64];
        assert_eq!(
            track_from(&bytes),
            Err(FormatError::MalformedEvent { offset: 1, status: 0x3C })
        );
    }

    #[test]
    fn system_common_status_is_malformed() {
        let bytes = [0x00, 0xF2, 0x00, 0x00];
        assert_eq!(
            track_from(&bytes),
            Err(FormatError::MalformedEvent { offset: 1, status: 0xF2 })
        );
    }

    #[test]
    fn tempo_and_time_signature_payloads() {
        let bytes = [
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 500000
            0x00, 0xFF, 0x58, 0x04, 0x06, 0x03, 0x18, 0x08, // 6/8
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let track = track_from(&bytes).unwrap();
        assert_eq!(track.events[0].kind, TrackEventKind::Meta(MetaEvent::Tempo(500_000)));
        assert_eq!(
            track.events[1].kind,
            TrackEventKind::Meta(MetaEvent::TimeSignature(TimeSignature {
                numerator: 6,
                denominator: 8,
                clocks_per_click: 24,
                thirty_seconds_per_quarter: 8,
            }))
        );
    }

    #[test]
    fn tempo_with_wrong_length_is_malformed() {
        let bytes = [0x00, 0xFF, 0x51, 0x02, 0x07, 0xA1];
        assert_eq!(
            track_from(&bytes),
            Err(FormatError::MalformedEvent { offset: 4, status: META })
        );
    }

    #[test]
    fn track_name_is_latin1() {
        let bytes = [0x00, 0xFF, 0x03, 0x04, b'P', b'i', 0xE0, b'n', 0x00, 0xFF, 0x2F, 0x00];
        let track = track_from(&bytes).unwrap();
        assert_eq!(track.name.as_deref(), Some("Pi\u{e0}n"));
    }

    #[test]
    fn end_tick_without_end_of_track_is_last_event() {
        let bytes = [0x00, 0x90, 0x3C, 0x64, 0x60, 0x80, 0x3C, 0x40];
        let track = track_from(&bytes).unwrap();
        assert_eq!(track.events.len(), 2);
        assert_eq!(track.end_tick, 0x60);
    }

    #[test]
    fn bytes_after_end_of_track_are_ignored() {
        let bytes = [0x00, 0xFF, 0x2F, 0x00, 0xDE, 0xAD];
        let track = track_from(&bytes).unwrap();
        assert_eq!(track.events.len(), 1);
    }

    #[test]
    fn note_data_above_127_is_malformed() {
        let bytes = [0x00, 0x90, 0x3C, 0x80];
        assert!(matches!(track_from(&bytes), Err(FormatError::MalformedEvent { status: 0x90, .. })));
    }
}
