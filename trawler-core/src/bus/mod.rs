//! Message-bus abstractions for request intake and magnet publication
//!
//! The production deployment feeds requests through a partitioned broker and
//! collects magnet records on another topic. The worker only depends on the
//! two traits here; an in-memory bus backs the tests and a JSONL bus backs
//! local runs, so no broker client enters this crate.

pub mod memory;
pub mod stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resolve::MagnetRecord;

pub use memory::{MemoryPartition, MemoryPublisher};
pub use stdio::{JsonlConsumer, StdoutPublisher};

/// Inbound media request, decoded from the request topic's JSON payloads.
///
/// Field names follow the wire contract of the upstream producer. Everything
/// except `cache_id` is optional on the wire; which fields must be present
/// depends on the resolver handling the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRequest {
    /// IMDB identifier, e.g. `tt0903747`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// English title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Spanish title, kept for sources indexed under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spanish_title: Option<String>,
    /// Season number for episode requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_num: Option<u32>,
    /// Episode number within the season.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_num: Option<u32>,
    /// TVDB identifier for show lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<i64>,
    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Correlation key; published records carry it and it keys the output.
    pub cache_id: String,
}

impl ResolutionRequest {
    /// Returns `(season, episode)` when both numbers are present.
    pub fn season_episode(&self) -> Option<(u32, u32)> {
        match (self.season_num, self.episode_num) {
            (Some(season), Some(episode)) => Some((season, episode)),
            _ => None,
        }
    }
}

/// Outbound record published per resolved magnet, keyed by `cache_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetMessage {
    /// Correlation key copied from the originating request.
    pub cache_id: String,
    #[serde(flatten)]
    pub record: MagnetRecord,
}

impl MagnetMessage {
    /// Pairs a resolved record with its originating request key.
    pub fn new(cache_id: impl Into<String>, record: MagnetRecord) -> Self {
        Self {
            cache_id: cache_id.into(),
            record,
        }
    }
}

/// Errors from bus transports.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Failed to read request stream: {reason}")]
    Consume { reason: String },

    #[error("Failed to publish message: {reason}")]
    Publish { reason: String },
}

/// Ordered request source for a single partition.
///
/// Requests within one partition are consumed strictly in arrival order.
/// Implementations decode payloads themselves and skip malformed ones with
/// a warning; only transport failures surface as errors.
#[async_trait]
pub trait PartitionConsumer: Send {
    /// Returns the next request, or `None` once the partition is exhausted.
    ///
    /// # Errors
    ///
    /// - `BusError::Consume` - If the underlying transport fails
    async fn next_request(&mut self) -> Result<Option<ResolutionRequest>, BusError>;
}

/// Sink for resolved magnet records.
#[async_trait]
pub trait MagnetPublisher: Send + Sync {
    /// Publishes one record under the given partition key.
    ///
    /// # Errors
    ///
    /// - `BusError::Publish` - If the record cannot be delivered
    async fn publish(&self, key: &str, message: &MagnetMessage) -> Result<(), BusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_decodes_camel_case_payload() {
        let payload = r#"{
            "imdbId": "tt0903747",
            "title": "Breaking Bad",
            "seasonNum": 1,
            "episodeNum": 2,
            "tvdbId": 81189,
            "cacheId": "req-42"
        }"#;
        let request: ResolutionRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(request.imdb_id.as_deref(), Some("tt0903747"));
        assert_eq!(request.season_episode(), Some((1, 2)));
        assert_eq!(request.tvdb_id, Some(81189));
        assert_eq!(request.cache_id, "req-42");
        assert_eq!(request.year, None);
    }

    #[test]
    fn test_request_requires_cache_id() {
        let result: Result<ResolutionRequest, _> = serde_json::from_str(r#"{"title": "Alien"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_serializes_flat_with_camel_case_keys() {
        let record = MagnetRecord {
            magnet_url: "magnet:?xt=urn:btih:abc".to_string(),
            info_hash: "abc".to_string(),
            language: "en".to_string(),
            quality: "1080p".to_string(),
            source: "yts".to_string(),
            size: None,
            file_idx: Some(2),
            file_name: None,
            seed: Some(10),
            peer: None,
        };
        let message = MagnetMessage::new("req-7", record);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["cacheId"], "req-7");
        assert_eq!(json["magnetUrl"], "magnet:?xt=urn:btih:abc");
        assert_eq!(json["fileIdx"], 2);
        assert_eq!(json["seed"], 10);
        // Absent optionals stay off the wire entirely.
        assert!(json.get("size").is_none());
        assert!(json.get("peer").is_none());
    }
}
