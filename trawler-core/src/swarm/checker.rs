//! HTTP client for the external swarm checking service

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::{SwarmHealth, SwarmHealthChecker, TrackerList, TrackerReport, best_report};
use crate::config::{SwarmConfig, USER_AGENT};

/// Checker backed by an openwebtorrent-style HTTP service.
///
/// The service takes a full magnet link as a query parameter, scrapes the
/// trackers it names and returns per-tracker seed/peer counts as JSON.
#[derive(Debug, Clone)]
pub struct HttpSwarmChecker {
    client: Client,
    endpoint: String,
}

impl HttpSwarmChecker {
    /// Creates a checker for the endpoint in `config`.
    pub fn new(config: &SwarmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.check_timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            endpoint: config.checker_url.clone(),
        }
    }

    async fn query(&self, magnet: &str, trackers: &TrackerList) -> Result<SwarmHealth, QueryError> {
        let full_magnet = format!("{}{}", magnet, trackers.as_suffix());
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("magnet", full_magnet.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::Status(response.status()));
        }

        let payload: CheckerResponse = response.json().await?;
        evaluate(payload)
    }
}

#[async_trait]
impl SwarmHealthChecker for HttpSwarmChecker {
    async fn check(&self, magnet: &str, trackers: &TrackerList) -> SwarmHealth {
        match self.query(magnet, trackers).await {
            Ok(health) => health,
            Err(e) => {
                warn!("Swarm health check failed: {}", e);
                SwarmHealth::default()
            }
        }
    }
}

/// Turns a decoded service response into a health reading.
///
/// A nonzero error code from the service invalidates the whole response.
/// An error object with code zero or no code at all is ignored, matching
/// services that always include the field.
fn evaluate(response: CheckerResponse) -> Result<SwarmHealth, QueryError> {
    if let Some(error) = &response.error
        && let Some(code) = error.code
        && code != 0
    {
        return Err(QueryError::Service {
            code,
            message: error.message.clone().unwrap_or_default(),
        });
    }

    Ok(best_report(&response.extra))
}

#[derive(Debug, Deserialize)]
struct CheckerResponse {
    #[serde(default)]
    error: Option<ServiceError>,
    #[serde(default)]
    extra: Vec<TrackerReport>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum QueryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("service error code {code}: {message}")]
    Service { code: i64, message: String },
}
