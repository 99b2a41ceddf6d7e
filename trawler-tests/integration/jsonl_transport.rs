//! JSONL transport tests
//!
//! Runs the worker against real files through the JSONL consumer, checking
//! the wire shape of published messages along the way.

use std::io::Write;
use std::sync::Arc;

use trawler_core::bus::{JsonlConsumer, MemoryPublisher, PartitionConsumer};
use trawler_core::resolve::MagnetRecord;
use trawler_core::swarm::TrackerList;
use trawler_core::worker::ResolutionWorker;
use trawler_resolvers::StaticResolver;

struct UnknownChecker;

#[async_trait::async_trait]
impl trawler_core::swarm::SwarmHealthChecker for UnknownChecker {
    async fn check(
        &self,
        _magnet: &str,
        _trackers: &TrackerList,
    ) -> trawler_core::swarm::SwarmHealth {
        trawler_core::swarm::SwarmHealth::default()
    }
}

fn record() -> MagnetRecord {
    MagnetRecord {
        magnet_url: "magnet:?xt=urn:btih:f00d000000000000000000000000000000000000".to_string(),
        info_hash: "f00d000000000000000000000000000000000000".to_string(),
        language: "en".to_string(),
        quality: "720p".to_string(),
        source: "static".to_string(),
        size: None,
        file_idx: None,
        file_name: None,
        seed: None,
        peer: None,
    }
}

#[tokio::test]
async fn test_requests_from_file_flow_to_publisher() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"imdbId": "tt0111161", "cacheId": "c1"}}"#).unwrap();
    writeln!(file).unwrap();
    writeln!(file, r#"{{"imdbId": "tt0068646", "cacheId": "c2"}}"#).unwrap();
    file.flush().unwrap();

    let publisher = MemoryPublisher::default();
    let worker = ResolutionWorker::new(
        Arc::new(StaticResolver::new("static", vec![record()])),
        Arc::new(UnknownChecker),
        Arc::new(publisher.clone()),
        TrackerList::empty(),
        1,
    );

    let consumer = JsonlConsumer::open(file.path()).await.unwrap();
    let consumers: Vec<Box<dyn PartitionConsumer>> = vec![Box::new(consumer)];
    let processed = worker.run(consumers).await;

    assert_eq!(processed, 2);

    let published = publisher.published().await;
    assert_eq!(published.len(), 2);

    let keys: Vec<&str> = published.iter().map(|(key, _)| key.as_str()).collect();
    assert!(keys.contains(&"c1"));
    assert!(keys.contains(&"c2"));
}

#[tokio::test]
async fn test_published_message_wire_shape() {
    let publisher = MemoryPublisher::default();
    let worker = ResolutionWorker::new(
        Arc::new(StaticResolver::new("static", vec![record()])),
        Arc::new(UnknownChecker),
        Arc::new(publisher.clone()),
        TrackerList::empty(),
        1,
    );

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"imdbId": "tt0111161", "cacheId": "wire-1"}}"#).unwrap();
    file.flush().unwrap();

    let consumer = JsonlConsumer::open(file.path()).await.unwrap();
    worker.run(vec![Box::new(consumer)]).await;

    let published = publisher.published().await;
    let value = serde_json::to_value(&published[0].1).unwrap();

    // Flattened camelCase record with the correlation key alongside.
    assert_eq!(value["cacheId"], "wire-1");
    assert_eq!(value["magnetUrl"], "magnet:?xt=urn:btih:f00d000000000000000000000000000000000000");
    assert_eq!(value["quality"], "720p");
    // Unset optionals stay off the wire entirely.
    assert!(value.get("seed").is_none());
    assert!(value.get("fileIdx").is_none());
}
