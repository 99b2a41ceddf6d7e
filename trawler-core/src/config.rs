//! Centralized configuration for Trawler.
//!
//! All tunable parameters live here to avoid hard-coded values scattered
//! throughout the codebase.

use std::time::Duration;

/// User agent sent on every outbound HTTP request.
pub const USER_AGENT: &str = "trawler/0.1.0";

/// Central configuration for all Trawler components.
///
/// Groups related settings into logical sections and supports environment
/// variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct TrawlerConfig {
    pub bus: BusConfig,
    pub swarm: SwarmConfig,
    pub fetch: FetchConfig,
}

/// Message-bus consumption and publication settings.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Input channel carrying resolution requests
    pub request_topic: String,
    /// Output channel receiving enriched magnet records
    pub magnet_topic: String,
    /// Maximum number of partitions processed concurrently
    pub concurrent_partitions: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_topic: "scrapingRequests".to_string(),
            magnet_topic: "magnets".to_string(),
            concurrent_partitions: 1,
        }
    }
}

/// Swarm-health checking settings.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// Swarm-health check endpoint
    pub checker_url: String,
    /// Source URL for the tracker list fetched at startup
    pub trackers_url: String,
    /// HTTP request timeout for health checks and the tracker-list fetch
    pub check_timeout: Duration,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            checker_url: "https://checker.openwebtorrent.com/check".to_string(),
            trackers_url:
                "https://raw.githubusercontent.com/ngosang/trackerslist/master/trackers_best.txt"
                    .to_string(),
            check_timeout: Duration::from_secs(30),
        }
    }
}

/// Torrent-file and site API fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// HTTP request timeout for torrent and site API fetches
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT,
        }
    }
}

impl TrawlerConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// `CONCURRENT_PARTITIONS` matches the variable the deployment already
    /// sets; the `TRAWLER_*` variables cover endpoints and timeouts.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(partitions) = std::env::var("CONCURRENT_PARTITIONS")
            && let Ok(count) = partitions.parse::<usize>()
        {
            config.bus.concurrent_partitions = count.max(1);
        }

        if let Ok(endpoint) = std::env::var("TRAWLER_SWARM_ENDPOINT") {
            config.swarm.checker_url = endpoint;
        }

        if let Ok(url) = std::env::var("TRAWLER_TRACKERS_URL") {
            config.swarm.trackers_url = url;
        }

        if let Ok(timeout) = std::env::var("TRAWLER_HTTP_TIMEOUT_SECS")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.fetch.timeout = Duration::from_secs(seconds);
            config.swarm.check_timeout = Duration::from_secs(seconds);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = TrawlerConfig::default();

        assert_eq!(config.bus.request_topic, "scrapingRequests");
        assert_eq!(config.bus.magnet_topic, "magnets");
        assert_eq!(config.bus.concurrent_partitions, 1);
        assert_eq!(config.swarm.check_timeout, Duration::from_secs(30));
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
        assert_eq!(config.fetch.user_agent, "trawler/0.1.0");
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("CONCURRENT_PARTITIONS", "4");
            std::env::set_var("TRAWLER_SWARM_ENDPOINT", "http://localhost:9999/check");
            std::env::set_var("TRAWLER_HTTP_TIMEOUT_SECS", "5");
        }

        let config = TrawlerConfig::from_env();

        assert_eq!(config.bus.concurrent_partitions, 4);
        assert_eq!(config.swarm.checker_url, "http://localhost:9999/check");
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.swarm.check_timeout, Duration::from_secs(5));

        // Zero partitions would stall the worker; clamped to one.
        unsafe {
            std::env::set_var("CONCURRENT_PARTITIONS", "0");
        }
        assert_eq!(TrawlerConfig::from_env().bus.concurrent_partitions, 1);

        // Cleanup
        unsafe {
            std::env::remove_var("CONCURRENT_PARTITIONS");
            std::env::remove_var("TRAWLER_SWARM_ENDPOINT");
            std::env::remove_var("TRAWLER_HTTP_TIMEOUT_SECS");
        }
    }
}
