//! Resolver contract between the worker and site-specific sources
//!
//! A resolver turns one [`ResolutionRequest`](crate::bus::ResolutionRequest)
//! into zero or more magnet candidates. Implementations live outside this
//! crate; the worker drives them purely through the [`Resolver`] trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bus::ResolutionRequest;
use crate::swarm::SwarmHealth;
use crate::torrent::TorrentError;

/// One downloadable magnet candidate produced by a resolver.
///
/// Records are immutable once built; enrichment returns an updated copy
/// rather than mutating in place. When both `magnet_url` and `info_hash`
/// are set they refer to the same torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetRecord {
    /// Full magnet link.
    pub magnet_url: String,
    /// 40-char lowercase hex info-hash.
    pub info_hash: String,
    /// ISO 639-1 audio language code.
    pub language: String,
    /// Quality label, e.g. `1080p`.
    pub quality: String,
    /// Name of the resolver that produced this record.
    pub source: String,
    /// Human-readable payload size, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Index of the selected file inside a season-pack torrent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_idx: Option<usize>,
    /// Name of the selected file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Seeder count, from the source or a later swarm check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Peer count, from the source or a later swarm check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<u32>,
}

impl MagnetRecord {
    /// Returns a copy with seed/peer counts from a swarm check.
    ///
    /// Only fields the check actually reported are overridden; an empty
    /// check leaves source-reported counts untouched.
    pub fn with_swarm_health(mut self, health: SwarmHealth) -> Self {
        if let Some(seed) = health.seed {
            self.seed = Some(seed);
        }
        if let Some(peer) = health.peer {
            self.peer = Some(peer);
        }
        self
    }
}

/// Errors from request validation and candidate resolution.
///
/// `Display` and `Error` are implemented by hand because the
/// `UnknownSource::source` field holds a resolver *name*, which a derived
/// `thiserror::Error` would misread as an error source.
#[derive(Debug)]
pub enum ResolveError {
    /// Request missing required field.
    MissingField { field: &'static str },

    /// Unknown source name.
    UnknownSource { source: String },

    /// Request to a source failed.
    Http { url: String, reason: String },

    /// Unexpected response from a source.
    Parse { url: String, reason: String },

    /// Torrent-layer failure, reported transparently.
    Torrent(TorrentError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "Request missing required field '{field}'")
            }
            Self::UnknownSource { source } => write!(f, "Unknown source '{source}'"),
            Self::Http { url, reason } => write!(f, "Request to {url} failed: {reason}"),
            Self::Parse { url, reason } => {
                write!(f, "Unexpected response from {url}: {reason}")
            }
            Self::Torrent(inner) => std::fmt::Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Torrent(inner) => inner.source(),
            _ => None,
        }
    }
}

impl From<TorrentError> for ResolveError {
    fn from(err: TorrentError) -> Self {
        Self::Torrent(err)
    }
}

impl ResolveError {
    /// Shorthand for the missing-field validation error.
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}

/// Site-specific source of magnet candidates.
///
/// `validate` is a cheap synchronous precondition check so the worker can
/// drop unusable requests before any network work; `resolve` does the
/// actual lookup. Resolvers are shared across partitions and must not keep
/// per-request state.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Source name, used in logs and published records.
    fn name(&self) -> &str;

    /// Checks that `request` carries the fields this source needs.
    ///
    /// # Errors
    ///
    /// - `ResolveError::MissingField` - If a required field is absent
    fn validate(&self, request: &ResolutionRequest) -> Result<(), ResolveError>;

    /// Looks up magnet candidates for `request`.
    ///
    /// An empty vector is a valid outcome and means the source has nothing
    /// for this title.
    ///
    /// # Errors
    ///
    /// - `ResolveError::Http` - If the source is unreachable
    /// - `ResolveError::Parse` - If the source returns an unexpected shape
    async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<Vec<MagnetRecord>, ResolveError>;
}
