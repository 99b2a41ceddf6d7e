//! In-memory bus for tests and local simulations

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use super::{BusError, MagnetMessage, MagnetPublisher, PartitionConsumer, ResolutionRequest};

/// Single-partition request source backed by a bounded channel.
///
/// Payloads cross the channel as raw JSON strings so consuming them
/// exercises the same decoding path a broker-backed deployment would.
#[derive(Debug)]
pub struct MemoryPartition {
    receiver: mpsc::Receiver<String>,
}

impl MemoryPartition {
    /// Creates an empty partition and the sender that feeds it.
    ///
    /// The partition ends once the sender is dropped.
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver })
    }

    /// Creates a pre-loaded partition that ends after the given payloads.
    pub fn from_payloads<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let payloads: Vec<String> = payloads.into_iter().map(Into::into).collect();
        let (sender, partition) = Self::channel(payloads.len().max(1));
        for payload in payloads {
            sender
                .try_send(payload)
                .expect("channel sized to payload count");
        }
        partition
    }
}

#[async_trait]
impl PartitionConsumer for MemoryPartition {
    async fn next_request(&mut self) -> Result<Option<ResolutionRequest>, BusError> {
        while let Some(payload) = self.receiver.recv().await {
            match serde_json::from_str(&payload) {
                Ok(request) => return Ok(Some(request)),
                Err(e) => warn!("Skipping malformed request payload: {}", e),
            }
        }
        Ok(None)
    }
}

/// Publisher that records every message for later inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    messages: Arc<Mutex<Vec<(String, MagnetMessage)>>>,
}

impl MemoryPublisher {
    /// Creates an empty recording publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all `(key, message)` pairs in publish order.
    pub async fn published(&self) -> Vec<(String, MagnetMessage)> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl MagnetPublisher for MemoryPublisher {
    async fn publish(&self, key: &str, message: &MagnetMessage) -> Result<(), BusError> {
        self.messages
            .lock()
            .await
            .push((key.to_string(), message.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_json(cache_id: &str) -> String {
        format!(r#"{{"title": "Example", "cacheId": "{cache_id}"}}"#)
    }

    #[tokio::test]
    async fn test_partition_yields_requests_in_order() {
        let mut partition = MemoryPartition::from_payloads([request_json("a"), request_json("b")]);

        let first = partition.next_request().await.unwrap().unwrap();
        let second = partition.next_request().await.unwrap().unwrap();
        assert_eq!(first.cache_id, "a");
        assert_eq!(second.cache_id, "b");
        assert!(partition.next_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let mut partition = MemoryPartition::from_payloads([
            "{not json".to_string(),
            r#"{"title": "ok"}"#.to_string(),
            request_json("c"),
        ]);

        // Both the unparsable line and the one missing cacheId are dropped.
        let request = partition.next_request().await.unwrap().unwrap();
        assert_eq!(request.cache_id, "c");
        assert!(partition.next_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publisher_records_in_order() {
        let publisher = MemoryPublisher::new();
        let record = crate::resolve::MagnetRecord {
            magnet_url: "magnet:?xt=urn:btih:ff".to_string(),
            info_hash: "ff".to_string(),
            language: "en".to_string(),
            quality: "720p".to_string(),
            source: "test".to_string(),
            size: None,
            file_idx: None,
            file_name: None,
            seed: None,
            peer: None,
        };
        publisher
            .publish("k1", &MagnetMessage::new("k1", record.clone()))
            .await
            .unwrap();
        publisher
            .publish("k2", &MagnetMessage::new("k2", record))
            .await
            .unwrap();

        let published = publisher.published().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "k1");
        assert_eq!(published[1].1.cache_id, "k2");
    }
}
