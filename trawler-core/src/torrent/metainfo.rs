//! Torrent metadata extraction and info-hash derivation

use super::bencode::{self, Value};
use super::{InfoHash, TorrentError};

/// Structured metadata decoded from a `.torrent` byte buffer.
///
/// The decoded `info` dictionary is retained alongside the derived fields so
/// the hash stays re-derivable from the same structure it was computed over.
#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    /// The decoded `info` dictionary.
    pub info: Value,
    /// SHA-1 over the canonical re-encoding of `info`.
    pub info_hash: InfoHash,
    /// Display name, with `name.utf-8` preferred over `name`.
    pub name: String,
    /// Files of a multi-file torrent; empty for single-file torrents.
    pub files: Vec<TorrentFileEntry>,
}

impl TorrentMetadata {
    /// Returns the payload size when this is a single-file torrent.
    pub fn single_file_length(&self) -> Option<i64> {
        self.info.get(b"length").and_then(Value::as_integer)
    }
}

/// One file entry of a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentFileEntry {
    /// File size in bytes.
    pub length: i64,
    /// Path segments relative to the torrent root.
    pub path: Vec<String>,
}

impl TorrentFileEntry {
    /// Returns the path segments joined with `/`.
    pub fn joined_path(&self) -> String {
        self.path.join("/")
    }
}

/// Decodes a raw `.torrent` byte buffer into [`TorrentMetadata`].
///
/// The info-hash is the SHA-1 of the canonical re-encoding of the `info`
/// dictionary, so identical `info` structures always hash identically even
/// when the source bytes carried keys out of order.
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If the buffer is not well-formed bencode
/// - `TorrentError::InvalidTorrentFile` - If the decoded structure is missing
///   required torrent fields
pub fn decode_torrent(data: &[u8]) -> Result<TorrentMetadata, TorrentError> {
    let root = bencode::decode(data)?;
    let Some(mut dict) = root.into_dict() else {
        return Err(invalid_file("top-level value must be a dictionary"));
    };

    let info = dict
        .remove(b"info".as_slice())
        .ok_or_else(|| invalid_file("missing 'info' dictionary"))?;
    if info.as_dict().is_none() {
        return Err(invalid_file(format!("'info' must be a dictionary, got {}", info.type_name())));
    }

    let info_hash = InfoHash::from_info_bytes(&bencode::encode(&info));
    let name = extract_name(&info)?;
    let files = extract_files(&info)?;

    Ok(TorrentMetadata {
        info,
        info_hash,
        name,
        files,
    })
}

fn extract_name(info: &Value) -> Result<String, TorrentError> {
    let raw = info
        .get(b"name.utf-8")
        .or_else(|| info.get(b"name"))
        .and_then(Value::as_bytes)
        .ok_or_else(|| invalid_file("missing 'name' field"))?;
    Ok(String::from_utf8_lossy(raw).into_owned())
}

fn extract_files(info: &Value) -> Result<Vec<TorrentFileEntry>, TorrentError> {
    let entries = match info.get(b"files") {
        None => return Ok(Vec::new()),
        Some(value) => value
            .as_list()
            .ok_or_else(|| invalid_file("'files' must be a list"))?,
    };

    let mut files = Vec::with_capacity(entries.len());
    for entry in entries {
        let length = entry
            .get(b"length")
            .and_then(Value::as_integer)
            .ok_or_else(|| invalid_file("file entry missing 'length'"))?;
        let segments = entry
            .get(b"path")
            .and_then(Value::as_list)
            .ok_or_else(|| invalid_file("file entry missing 'path'"))?;

        let mut path = Vec::with_capacity(segments.len());
        for segment in segments {
            let raw = segment
                .as_bytes()
                .ok_or_else(|| invalid_file("file path segment must be a byte string"))?;
            path.push(String::from_utf8_lossy(raw).into_owned());
        }
        files.push(TorrentFileEntry { length, path });
    }
    Ok(files)
}

fn invalid_file(reason: impl Into<String>) -> TorrentError {
    TorrentError::InvalidTorrentFile {
        reason: reason.into(),
    }
}
