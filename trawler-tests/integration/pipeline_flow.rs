//! Worker pipeline tests over the in-memory bus
//!
//! Exercises the request lifecycle end to end: consume, validate, resolve,
//! enrich, publish, with scripted checkers and publishers standing in for
//! the external services.

use std::sync::Arc;

use async_trait::async_trait;
use trawler_core::bus::{
    BusError, MagnetMessage, MagnetPublisher, MemoryPartition, MemoryPublisher, ResolutionRequest,
};
use trawler_core::resolve::MagnetRecord;
use trawler_core::swarm::{SwarmHealth, SwarmHealthChecker, TrackerList};
use trawler_core::worker::{DropReason, RequestOutcome, ResolutionWorker};
use trawler_resolvers::StaticResolver;

/// Checker scripted to report the same counts for every magnet.
struct FixedChecker {
    health: SwarmHealth,
}

#[async_trait]
impl SwarmHealthChecker for FixedChecker {
    async fn check(&self, _magnet: &str, _trackers: &TrackerList) -> SwarmHealth {
        self.health
    }
}

/// Publisher that fails for magnets containing a marker and delegates the
/// rest to an in-memory publisher.
struct FlakyPublisher {
    inner: MemoryPublisher,
    poison: &'static str,
}

#[async_trait]
impl MagnetPublisher for FlakyPublisher {
    async fn publish(&self, key: &str, message: &MagnetMessage) -> Result<(), BusError> {
        if message.record.magnet_url.contains(self.poison) {
            return Err(BusError::Publish {
                reason: "scripted outage".to_string(),
            });
        }
        self.inner.publish(key, message).await
    }
}

fn record(tag: &str, seed: Option<u32>, peer: Option<u32>) -> MagnetRecord {
    MagnetRecord {
        magnet_url: format!("magnet:?xt=urn:btih:{tag}"),
        info_hash: tag.to_string(),
        language: "en".to_string(),
        quality: "1080p".to_string(),
        source: "static".to_string(),
        size: Some("1.00 GB".to_string()),
        file_idx: None,
        file_name: None,
        seed,
        peer,
    }
}

fn request_payload(cache_id: &str) -> String {
    format!(r#"{{"imdbId": "tt0111161", "cacheId": "{cache_id}"}}"#)
}

fn worker_with(
    resolver: StaticResolver,
    health: SwarmHealth,
    publisher: Arc<dyn MagnetPublisher>,
) -> ResolutionWorker {
    ResolutionWorker::new(
        Arc::new(resolver),
        Arc::new(FixedChecker { health }),
        publisher,
        TrackerList::empty(),
        1,
    )
}

#[tokio::test]
async fn test_one_message_per_candidate_keyed_by_cache_id() {
    let resolver = StaticResolver::new(
        "static",
        vec![
            record("aaaa000000000000000000000000000000000000", None, None),
            record("bbbb000000000000000000000000000000000000", Some(3), Some(1)),
        ],
    );
    let publisher = MemoryPublisher::default();
    let worker = worker_with(resolver, SwarmHealth::default(), Arc::new(publisher.clone()));

    let partition = MemoryPartition::from_payloads([request_payload("movie-1")]);
    let processed = worker.run(vec![Box::new(partition)]).await;
    assert_eq!(processed, 1);

    let published = publisher.published().await;
    assert_eq!(published.len(), 2);
    for (key, message) in &published {
        assert_eq!(key, "movie-1");
        assert_eq!(message.cache_id, "movie-1");
    }

    // An empty health report leaves resolver-supplied counts untouched.
    let kept = published
        .iter()
        .find(|(_, m)| m.record.info_hash.starts_with("bbbb"))
        .unwrap();
    assert_eq!(kept.1.record.seed, Some(3));
    assert_eq!(kept.1.record.peer, Some(1));
}

#[tokio::test]
async fn test_checker_counts_override_resolver_counts() {
    let resolver = StaticResolver::new(
        "static",
        vec![record("cccc000000000000000000000000000000000000", Some(3), None)],
    );
    let publisher = MemoryPublisher::default();
    let health = SwarmHealth {
        seed: Some(42),
        peer: Some(7),
    };
    let worker = worker_with(resolver, health, Arc::new(publisher.clone()));

    let partition = MemoryPartition::from_payloads([request_payload("movie-2")]);
    worker.run(vec![Box::new(partition)]).await;

    let published = publisher.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].1.record.seed, Some(42));
    assert_eq!(published[0].1.record.peer, Some(7));
}

#[tokio::test]
async fn test_publish_failure_does_not_block_siblings() {
    let resolver = StaticResolver::new(
        "static",
        vec![
            record("good0000000000000000000000000000000000aa", None, None),
            record("bad00000000000000000000000000000000000bb", None, None),
        ],
    );
    let inner = MemoryPublisher::default();
    let publisher = Arc::new(FlakyPublisher {
        inner: inner.clone(),
        poison: "bad00000",
    });
    let worker = worker_with(resolver, SwarmHealth::default(), publisher);

    let request: ResolutionRequest = serde_json::from_str(&request_payload("movie-3")).unwrap();
    let outcome = worker.process_request(&request).await;

    match outcome {
        RequestOutcome::Published {
            records,
            enrichment_failures,
        } => {
            assert_eq!(records, 1);
            assert_eq!(enrichment_failures, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let published = inner.published().await;
    assert_eq!(published.len(), 1);
    assert!(published[0].1.record.info_hash.starts_with("good"));
}

#[tokio::test]
async fn test_validation_failure_drops_request_without_output() {
    let resolver = StaticResolver::failing_validation("static");
    let publisher = MemoryPublisher::default();
    let worker = worker_with(resolver, SwarmHealth::default(), Arc::new(publisher.clone()));

    let request: ResolutionRequest = serde_json::from_str(&request_payload("movie-4")).unwrap();
    let outcome = worker.process_request(&request).await;

    assert!(matches!(
        outcome,
        RequestOutcome::Dropped {
            reason: DropReason::Validation(_)
        }
    ));
    assert!(publisher.published().await.is_empty());
}

#[tokio::test]
async fn test_resolution_failure_drops_request_without_output() {
    let resolver = StaticResolver::failing_resolution("static");
    let publisher = MemoryPublisher::default();
    let worker = worker_with(resolver, SwarmHealth::default(), Arc::new(publisher.clone()));

    let request: ResolutionRequest = serde_json::from_str(&request_payload("movie-5")).unwrap();
    let outcome = worker.process_request(&request).await;

    assert!(matches!(
        outcome,
        RequestOutcome::Dropped {
            reason: DropReason::Resolution(_)
        }
    ));
    assert!(publisher.published().await.is_empty());
}

#[tokio::test]
async fn test_malformed_payloads_skipped_valid_ones_processed() {
    let resolver = StaticResolver::new(
        "static",
        vec![record("eeee000000000000000000000000000000000000", None, None)],
    );
    let publisher = MemoryPublisher::default();
    let worker = worker_with(resolver, SwarmHealth::default(), Arc::new(publisher.clone()));

    let partition = MemoryPartition::from_payloads([
        "not json at all".to_string(),
        request_payload("movie-6"),
    ]);
    let processed = worker.run(vec![Box::new(partition)]).await;

    assert_eq!(processed, 1);
    assert_eq!(publisher.published().await.len(), 1);
}
