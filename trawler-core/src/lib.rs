//! Trawler Core - Torrent metadata resolution pipeline
//!
//! This crate provides the building blocks for resolving media requests into
//! swarm-checked magnet links: bencode decoding, info-hash derivation, magnet
//! URI synthesis, file selection, swarm-health checking, and the worker that
//! drives requests from a message bus to published records.

pub mod bus;
pub mod config;
pub mod resolve;
pub mod swarm;
pub mod torrent;
pub mod tracing_setup;
pub mod worker;

// Re-export main types for convenient access
pub use bus::{BusError, MagnetMessage, MagnetPublisher, PartitionConsumer, ResolutionRequest};
pub use config::TrawlerConfig;
pub use resolve::{MagnetRecord, ResolveError, Resolver};
pub use swarm::{SwarmError, SwarmHealth, SwarmHealthChecker, TrackerList};
pub use torrent::{InfoHash, TorrentError};
pub use worker::{RequestOutcome, ResolutionWorker};

/// Core errors that can bubble up from any Trawler subsystem.
///
/// High-level error types representing failures in core functionality.
#[derive(Debug, thiserror::Error)]
pub enum TrawlerError {
    #[error("Torrent error: {0}")]
    Torrent(#[from] TorrentError),

    #[error("Swarm error: {0}")]
    Swarm(#[from] SwarmError),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Resolver error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrawlerError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            TrawlerError::Torrent(e) => match e {
                TorrentError::InvalidBencode { reason } => {
                    format!("Invalid torrent data: {reason}")
                }
                TorrentError::InvalidTorrentFile { reason } => {
                    format!("Invalid torrent file: {reason}")
                }
                TorrentError::FetchFailed { url, .. } => {
                    format!("Could not download torrent from {url}")
                }
            },
            TrawlerError::Swarm(SwarmError::TrackerListFetch { url, .. }) => {
                format!("Could not fetch tracker list from {url}")
            }
            TrawlerError::Bus(_) => "Message bus error occurred".to_string(),
            TrawlerError::Resolve(e) => match e {
                ResolveError::MissingField { field } => {
                    format!("Request is missing required field '{field}'")
                }
                ResolveError::UnknownSource { source } => {
                    format!("Unknown source '{source}'")
                }
                _ => "Source lookup failed".to_string(),
            },
            TrawlerError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TrawlerError::Resolve(ResolveError::MissingField { .. })
                | TrawlerError::Resolve(ResolveError::UnknownSource { .. })
                | TrawlerError::Torrent(TorrentError::InvalidTorrentFile { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, TrawlerError>;
