//! Torrent metadata decoding, magnet synthesis, and file selection

pub mod bencode;
pub mod fetch;
pub mod magnet;
pub mod metainfo;
pub mod select;
pub mod size;

use std::fmt;

use sha1::{Digest, Sha1};

pub use bencode::Value;
pub use fetch::{MagnetData, TorrentFetcher, magnet_from_bytes};
pub use magnet::{MagnetFields, magnet_param};
pub use metainfo::{TorrentFileEntry, TorrentMetadata, decode_torrent};
pub use select::select_file_index;
pub use size::format_size;

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte digest of the canonically re-encoded info dictionary. Displays
/// as 40 lowercase hex characters, the form carried in magnet links and
/// published records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates an InfoHash from a 20-byte SHA-1 digest.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Computes the InfoHash of a canonically encoded info dictionary.
    pub fn from_info_bytes(info_bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(info_bytes);
        let digest = hasher.finalize();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&digest);
        Self(hash)
    }

    /// Returns reference to the underlying 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Errors that can occur while decoding torrents or building magnets.
///
/// Covers bencode grammar violations, structurally invalid torrent files,
/// and torrent-file fetch failures.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    #[error("Invalid bencode data: {reason}")]
    InvalidBencode { reason: String },

    #[error("Failed to parse torrent file: {reason}")]
    InvalidTorrentFile { reason: String },

    #[error("Failed to fetch torrent from {url}: {reason}")]
    FetchFailed { url: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_hash_display() {
        let hash = [
            0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab,
            0xcd, 0xef, 0x01, 0x23, 0x45, 0x67,
        ];
        let info_hash = InfoHash::new(hash);
        assert_eq!(info_hash.to_string(), "0123456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn test_info_hash_from_info_bytes() {
        // SHA-1 of the empty input is well known.
        let info_hash = InfoHash::from_info_bytes(b"");
        assert_eq!(info_hash.to_string(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_info_hash_equality() {
        let first = InfoHash::new([7u8; 20]);
        let second = InfoHash::new([7u8; 20]);
        let third = InfoHash::new([8u8; 20]);
        assert_eq!(first, second);
        assert_ne!(first, third);
    }
}
