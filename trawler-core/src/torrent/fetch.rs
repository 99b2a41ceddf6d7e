//! Torrent-file download and magnet derivation

use bytes::Bytes;
use reqwest::Client;
use reqwest::header;

use super::magnet::MagnetFields;
use super::metainfo::{TorrentFileEntry, decode_torrent};
use super::size::format_size;
use super::{InfoHash, TorrentError};
use crate::config::FetchConfig;

/// Magnet link derived from a raw `.torrent` file.
///
/// Keeps the decoded file listing so a caller can still run file selection
/// against season-pack torrents without re-fetching.
#[derive(Debug, Clone)]
pub struct MagnetData {
    /// Synthesized magnet link carrying `xt` and `dn`.
    pub magnet_url: String,
    /// Hash of the torrent's info dictionary.
    pub info_hash: InfoHash,
    /// Human-readable payload size for single-file torrents.
    pub size: Option<String>,
    /// File listing for multi-file torrents; empty otherwise.
    pub files: Vec<TorrentFileEntry>,
}

/// Derives a [`MagnetData`] from raw `.torrent` bytes.
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If the buffer is not well-formed bencode
/// - `TorrentError::InvalidTorrentFile` - If required torrent fields are missing
pub fn magnet_from_bytes(data: &[u8]) -> Result<MagnetData, TorrentError> {
    let metadata = decode_torrent(data)?;

    let fields = MagnetFields {
        info_hash_buffer: Some(*metadata.info_hash.as_bytes()),
        name: Some(metadata.name.clone()),
        ..MagnetFields::default()
    };

    Ok(MagnetData {
        magnet_url: fields.build(),
        info_hash: metadata.info_hash,
        size: metadata.single_file_length().map(format_size),
        files: metadata.files,
    })
}

/// Downloads `.torrent` files and turns them into magnet links.
#[derive(Debug, Clone)]
pub struct TorrentFetcher {
    client: Client,
}

impl TorrentFetcher {
    /// Creates a fetcher with timeout and user-agent from `config`.
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .expect("HTTP client creation should not fail");

        Self { client }
    }

    /// Downloads a `.torrent` file and derives its magnet link.
    ///
    /// Some hosts require the page that linked the file as a `Referer`
    /// before they serve the download.
    ///
    /// # Errors
    ///
    /// - `TorrentError::FetchFailed` - If the download fails or returns a
    ///   non-success status
    /// - `TorrentError::InvalidBencode` - If the response is not bencode
    /// - `TorrentError::InvalidTorrentFile` - If required fields are missing
    pub async fn fetch_magnet(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<MagnetData, TorrentError> {
        let bytes = self.fetch_bytes(url, referer).await?;
        magnet_from_bytes(&bytes)
    }

    async fn fetch_bytes(&self, url: &str, referer: Option<&str>) -> Result<Bytes, TorrentError> {
        let fetch_error = |reason: String| TorrentError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP status {}", response.status())));
        }

        response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))
    }
}
