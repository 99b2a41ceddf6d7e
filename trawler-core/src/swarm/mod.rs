//! Swarm-health checking for magnet links
//!
//! A magnet on its own says nothing about whether anyone is seeding it. An
//! external checking service queries trackers and reports per-tracker seed
//! and peer counts; this module reduces those reports to a single best
//! estimate and carries the process-wide tracker list used to widen checks.

pub mod checker;

use async_trait::async_trait;
use serde::Deserialize;

pub use checker::HttpSwarmChecker;

/// Seed and peer counts for a magnet.
///
/// Absent fields mean "unknown", never zero. An unreachable checker and a
/// dead swarm both surface as the empty value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwarmHealth {
    /// Seeder count, when known.
    pub seed: Option<u32>,
    /// Peer (leecher) count, when known.
    pub peer: Option<u32>,
}

impl SwarmHealth {
    /// Returns true when the check produced no usable data.
    pub fn is_empty(&self) -> bool {
        self.seed.is_none() && self.peer.is_none()
    }
}

/// One tracker's view of a swarm, as reported by the checking service.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrackerReport {
    #[serde(default)]
    pub seeds: u32,
    #[serde(default)]
    pub peers: u32,
}

/// Reduces per-tracker reports to a single best estimate.
///
/// Unseeded trackers are dropped before the reduction; among the rest the
/// greatest seed count wins, with ties keeping the first report
/// encountered. With nothing left after filtering the result is empty.
pub fn best_report(reports: &[TrackerReport]) -> SwarmHealth {
    let mut best: Option<TrackerReport> = None;
    for report in reports {
        if report.seeds == 0 {
            continue;
        }
        match best {
            Some(current) if current.seeds >= report.seeds => {}
            _ => best = Some(*report),
        }
    }

    match best {
        Some(report) => SwarmHealth {
            seed: Some(report.seeds),
            peer: Some(report.peers),
        },
        None => SwarmHealth::default(),
    }
}

/// Immutable tracker list shared by every health check in the process.
///
/// Fetched once at startup and stored pre-joined as `&tr=<url>&tr=<url>`,
/// ready for direct appending to a magnet string.
#[derive(Debug, Clone, Default)]
pub struct TrackerList {
    suffix: String,
}

impl TrackerList {
    /// An empty list; checks then rely on the magnet's own trackers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a list from tracker URLs, skipping blank entries.
    pub fn from_trackers<I, S>(trackers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut suffix = String::new();
        for tracker in trackers {
            let trimmed = tracker.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            suffix.push_str("&tr=");
            suffix.push_str(trimmed);
        }
        Self { suffix }
    }

    /// Downloads a newline-separated tracker list and pre-joins it.
    ///
    /// # Errors
    ///
    /// - `SwarmError::TrackerListFetch` - If the download fails or returns
    ///   a non-success status
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, SwarmError> {
        let fetch_error = |reason: String| SwarmError::TrackerListFetch {
            url: url.to_string(),
            reason,
        };

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP status {}", response.status())));
        }
        let text = response
            .text()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        Ok(Self::from_trackers(text.lines()))
    }

    /// Returns the pre-joined `&tr=` suffix, possibly empty.
    pub fn as_suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of trackers in the list.
    pub fn tracker_count(&self) -> usize {
        self.suffix.matches("&tr=").count()
    }
}

/// Errors from swarm subsystem setup.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("Failed to fetch tracker list from {url}: {reason}")]
    TrackerListFetch { url: String, reason: String },
}

/// Queries swarm health for magnet links.
///
/// Implementations never fail: any service or transport error degrades to
/// an empty [`SwarmHealth`] so a missing reading cannot block candidate
/// publication.
#[async_trait]
pub trait SwarmHealthChecker: Send + Sync {
    /// Returns seed/peer counts for `magnet`, consulting `trackers` in
    /// addition to any trackers the magnet already carries.
    async fn check(&self, magnet: &str, trackers: &TrackerList) -> SwarmHealth;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_report_picks_max_seeds() {
        let reports = [
            TrackerReport { seeds: 0, peers: 5 },
            TrackerReport { seeds: 12, peers: 3 },
        ];
        assert_eq!(
            best_report(&reports),
            SwarmHealth {
                seed: Some(12),
                peer: Some(3),
            }
        );
    }

    #[test]
    fn test_best_report_all_unseeded_is_empty() {
        let reports = [TrackerReport { seeds: 0, peers: 0 }];
        assert!(best_report(&reports).is_empty());
        assert!(best_report(&[]).is_empty());
    }

    #[test]
    fn test_best_report_tie_keeps_first() {
        let reports = [
            TrackerReport { seeds: 7, peers: 1 },
            TrackerReport { seeds: 7, peers: 9 },
        ];
        assert_eq!(best_report(&reports).peer, Some(1));
    }

    #[test]
    fn test_tracker_list_joins_entries() {
        let list = TrackerList::from_trackers(["udp://a:1337/announce", "", "  udp://b:80  "]);
        assert_eq!(list.as_suffix(), "&tr=udp://a:1337/announce&tr=udp://b:80");
        assert_eq!(list.tracker_count(), 2);
    }

    #[test]
    fn test_empty_tracker_list() {
        let list = TrackerList::empty();
        assert_eq!(list.as_suffix(), "");
        assert_eq!(list.tracker_count(), 0);
    }
}
