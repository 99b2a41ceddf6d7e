//! Resolution worker driving requests from bus partitions to published magnets
//!
//! One worker serves all partitions. Partitions are consumed in parallel up
//! to a configured limit while requests within each partition stay strictly
//! ordered. Every failure is absorbed at the smallest enclosing scope: a bad
//! request, a failed lookup, or an unpublishable candidate never takes down
//! a sibling, the partition, or the worker.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::bus::{MagnetMessage, MagnetPublisher, PartitionConsumer, ResolutionRequest};
use crate::resolve::{MagnetRecord, ResolveError, Resolver};
use crate::swarm::{SwarmHealthChecker, TrackerList};

/// Result of processing one request end to end.
#[derive(Debug)]
pub enum RequestOutcome {
    /// The request resolved; `records` counts successfully published
    /// candidates. Zero candidates is a valid resolution.
    Published {
        records: usize,
        enrichment_failures: usize,
    },
    /// The request produced no output at all.
    Dropped { reason: DropReason },
}

/// Why a request was dropped without output.
#[derive(Debug)]
pub enum DropReason {
    /// The request lacks a field the resolver requires.
    Validation(ResolveError),
    /// The source lookup failed outright.
    Resolution(ResolveError),
}

/// Orchestrates resolve, enrich and publish for incoming requests.
pub struct ResolutionWorker {
    resolver: Arc<dyn Resolver>,
    checker: Arc<dyn SwarmHealthChecker>,
    publisher: Arc<dyn MagnetPublisher>,
    trackers: TrackerList,
    limit: Semaphore,
}

impl ResolutionWorker {
    /// Creates a worker processing at most `concurrent_partitions` requests
    /// at a time across all partitions.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        checker: Arc<dyn SwarmHealthChecker>,
        publisher: Arc<dyn MagnetPublisher>,
        trackers: TrackerList,
        concurrent_partitions: usize,
    ) -> Self {
        Self {
            resolver,
            checker,
            publisher,
            trackers,
            limit: Semaphore::new(concurrent_partitions.max(1)),
        }
    }

    /// Consumes every partition to exhaustion.
    ///
    /// Returns the total number of requests processed. A transport error
    /// ends its own partition; the others keep running.
    pub async fn run(&self, partitions: Vec<Box<dyn PartitionConsumer>>) -> usize {
        let drivers = partitions
            .into_iter()
            .enumerate()
            .map(|(index, consumer)| self.drive_partition(index, consumer));

        join_all(drivers).await.into_iter().sum()
    }

    async fn drive_partition(
        &self,
        index: usize,
        mut consumer: Box<dyn PartitionConsumer>,
    ) -> usize {
        let mut processed = 0;
        loop {
            match consumer.next_request().await {
                Ok(Some(request)) => {
                    // The semaphore is never closed, so acquire cannot fail.
                    let Ok(_permit) = self.limit.acquire().await else {
                        break;
                    };
                    self.process_request(&request).await;
                    processed += 1;
                }
                Ok(None) => {
                    debug!("Partition {} exhausted after {} requests", index, processed);
                    break;
                }
                Err(e) => {
                    error!("Partition {} consume failed: {}", index, e);
                    break;
                }
            }
        }
        processed
    }

    /// Processes a single request and reports what happened.
    ///
    /// Never fails: every error path is logged and folded into the
    /// returned outcome.
    pub async fn process_request(&self, request: &ResolutionRequest) -> RequestOutcome {
        info!("Processing request {} with source '{}'", request.cache_id, self.resolver.name());

        if let Err(reason) = self.resolver.validate(request) {
            warn!("Dropping request {}: {}", request.cache_id, reason);
            return RequestOutcome::Dropped {
                reason: DropReason::Validation(reason),
            };
        }

        let candidates = match self.resolver.resolve(request).await {
            Ok(candidates) => candidates,
            Err(reason) => {
                warn!("Resolution failed for request {}: {}", request.cache_id, reason);
                return RequestOutcome::Dropped {
                    reason: DropReason::Resolution(reason),
                };
            }
        };

        if candidates.is_empty() {
            info!("No candidates found for request {}", request.cache_id);
            return RequestOutcome::Published {
                records: 0,
                enrichment_failures: 0,
            };
        }

        let total = candidates.len();
        let publishes = candidates
            .into_iter()
            .map(|candidate| self.enrich_and_publish(&request.cache_id, candidate));
        let enrichment_failures = join_all(publishes)
            .await
            .into_iter()
            .filter(|published| !published)
            .count();

        let records = total - enrichment_failures;
        info!("Published {}/{} magnet records for request {}", records, total, request.cache_id);
        RequestOutcome::Published {
            records,
            enrichment_failures,
        }
    }

    /// Enriches one candidate with swarm health and publishes it.
    ///
    /// Returns whether the candidate reached the bus. The health check is
    /// infallible; only publishing can fail, and that failure stays local
    /// to this candidate.
    async fn enrich_and_publish(&self, cache_id: &str, candidate: MagnetRecord) -> bool {
        let health = self.checker.check(&candidate.magnet_url, &self.trackers).await;
        let message = MagnetMessage::new(cache_id, candidate.with_swarm_health(health));

        match self.publisher.publish(cache_id, &message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to publish candidate for request {}: {}", cache_id, e);
                false
            }
        }
    }
}
