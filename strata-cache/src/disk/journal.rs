//! Record framing for the disk tier's journal.
//!
//! The journal is the only authority on which value files exist and in what
//! recency order. Layout: a fixed header (magic, format version, app
//! version) followed by framed records, each `u32` payload length, `u32`
//! crc32 of the payload, then the bincode payload. A torn tail ends replay
//! with a warning instead of failing the open; the caller rewrites the file
//! before appending again.

use crate::core::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use tracing::warn;

/// Identifies a journal file. Never changes.
pub(super) const MAGIC: &[u8; 8] = b"STRATAL2";

/// Bumped whenever the record encoding changes.
pub(super) const FORMAT_VERSION: u32 = 1;

/// Redundant records tolerated before the journal is rewritten.
pub(super) const COMPACT_THRESHOLD: usize = 2000;

/// Keys are the only variable-length field, so any larger length prefix is
/// corruption, not data.
const MAX_RECORD_LEN: u32 = 1024 * 1024;

/// One journal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) enum JournalRecord {
    /// Value file committed: `size` bytes with crc32 `checksum`.
    Put {
        key: String,
        size: u64,
        checksum: u32,
    },
    /// Value file removed.
    Remove { key: String },
    /// Value read; replays recency.
    Touch { key: String },
}

/// Fixed-size fields following the magic bytes.
#[derive(Debug, Clone, Copy)]
pub(super) struct Header {
    pub format_version: u32,
    pub app_version: u32,
}

/// Result of replaying a journal to its end.
pub(super) struct Replay {
    pub records: Vec<JournalRecord>,
    /// True when the file ended mid-record and must be rewritten.
    pub damaged: bool,
}

pub(super) fn write_header(sink: &mut impl Write, header: &Header) -> Result<()> {
    sink.write_all(MAGIC)?;
    sink.write_all(&header.format_version.to_le_bytes())?;
    sink.write_all(&header.app_version.to_le_bytes())?;
    Ok(())
}

pub(super) fn read_header(source: &mut impl Read) -> Result<Header> {
    let mut magic = [0u8; 8];
    source
        .read_exact(&mut magic)
        .map_err(|_| CacheError::CorruptJournal("truncated header".to_string()))?;
    if &magic != MAGIC {
        return Err(CacheError::CorruptJournal(
            "unrecognized magic bytes".to_string(),
        ));
    }
    let format_version = read_u32(source)
        .map_err(|_| CacheError::CorruptJournal("truncated header".to_string()))?;
    let app_version =
        read_u32(source).map_err(|_| CacheError::CorruptJournal("truncated header".to_string()))?;
    if format_version != FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: FORMAT_VERSION,
            found: format_version,
        });
    }
    Ok(Header {
        format_version,
        app_version,
    })
}

pub(super) fn write_record(sink: &mut impl Write, record: &JournalRecord) -> Result<()> {
    let payload = bincode::serde::encode_to_vec(record, bincode::config::standard())
        .map_err(|e| CacheError::Encode(e.to_string()))?;
    let checksum = crc32fast::hash(&payload);
    sink.write_all(&(payload.len() as u32).to_le_bytes())?;
    sink.write_all(&checksum.to_le_bytes())?;
    sink.write_all(&payload)?;
    Ok(())
}

/// Read records until the end of the stream, tolerating a damaged tail.
pub(super) fn replay(source: &mut impl Read) -> Replay {
    let mut records = Vec::new();
    let mut damaged = false;

    loop {
        let mut len_bytes = [0u8; 4];
        match read_prefix(source, &mut len_bytes) {
            Ok(Prefix::Full) => {}
            Ok(Prefix::CleanEof) => break,
            Ok(Prefix::Torn) | Err(_) => {
                warn!("Incomplete journal record detected, stopping replay");
                damaged = true;
                break;
            }
        }
        let len = u32::from_le_bytes(len_bytes);
        if len > MAX_RECORD_LEN {
            warn!("Implausible journal record length {}, stopping replay", len);
            damaged = true;
            break;
        }

        let expected = match read_u32(source) {
            Ok(checksum) => checksum,
            Err(_) => {
                warn!("Incomplete journal record header, stopping replay");
                damaged = true;
                break;
            }
        };

        let mut payload = vec![0u8; len as usize];
        if source.read_exact(&mut payload).is_err() {
            warn!("Incomplete journal record payload, stopping replay");
            damaged = true;
            break;
        }

        let actual = crc32fast::hash(&payload);
        if actual != expected {
            warn!(
                "Journal record checksum mismatch: expected {:#010x}, got {:#010x}; stopping replay",
                expected, actual
            );
            damaged = true;
            break;
        }

        match bincode::serde::decode_from_slice(&payload, bincode::config::standard()) {
            Ok((record, _)) => records.push(record),
            Err(_) => {
                warn!("Undecodable journal record, stopping replay");
                damaged = true;
                break;
            }
        }
    }

    Replay { records, damaged }
}

enum Prefix {
    Full,
    CleanEof,
    Torn,
}

/// Like `read_exact`, but distinguishes "no more records" from "record cut
/// short" so a clean end of file is not mistaken for damage.
fn read_prefix(source: &mut impl Read, buf: &mut [u8]) -> io::Result<Prefix> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => {
                return Ok(if filled == 0 {
                    Prefix::CleanEof
                } else {
                    Prefix::Torn
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Prefix::Full)
}

fn read_u32(source: &mut impl Read) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    source.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}
