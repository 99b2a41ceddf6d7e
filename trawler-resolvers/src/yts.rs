//! YTS movie API resolver

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use trawler_core::bus::ResolutionRequest;
use trawler_core::config::FetchConfig;
use trawler_core::resolve::{MagnetRecord, ResolveError, Resolver};
use trawler_core::torrent::MagnetFields;

const DEFAULT_BASE_URL: &str = "https://yts.mx/api/v2/";

const SOURCE_NAME: &str = "yts";

/// Tracker hints appended to every synthesized YTS magnet, matching the
/// hints the site itself embeds in its download links.
const TRACKERS: [&str; 8] = [
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:80",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://glotorrents.pw:6969/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://torrent.gresille.org:80/announce",
    "udp://p4p.arenabg.com:1337",
    "udp://tracker.leechers-paradise.org:6969",
];

/// Movie resolver backed by the YTS JSON API.
///
/// YTS reports per-quality torrents with hashes but no magnet links, so
/// the magnet is synthesized here from the hash, a display title and the
/// fixed tracker hints.
#[derive(Debug)]
pub struct YtsResolver {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct YtsResponse {
    data: YtsData,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    #[serde(default)]
    movies: Vec<YtsMovie>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    imdb_code: String,
    title_long: String,
    #[serde(default)]
    torrents: Vec<YtsTorrent>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    hash: String,
    quality: String,
    #[serde(rename = "type", default)]
    release_type: String,
    #[serde(default)]
    seeds: Option<u32>,
    #[serde(default)]
    peers: Option<u32>,
    #[serde(default)]
    size: Option<String>,
}

impl YtsResolver {
    /// Creates a resolver against the public YTS API.
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), config)
    }

    /// Creates a resolver against a custom API mirror.
    ///
    /// # Panics
    ///
    /// Panics if HTTP client creation fails due to invalid configuration.
    /// This should never happen with valid timeout and user agent values.
    pub fn with_base_url(base_url: String, config: &FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, base_url }
    }

    fn search_url(&self, imdb_id: &str) -> Result<Url, ResolveError> {
        let endpoint = format!("{}list_movies.json", self.base_url);
        Url::parse_with_params(&endpoint, [("query_term", imdb_id)]).map_err(|e| {
            ResolveError::Http {
                url: endpoint,
                reason: format!("invalid search URL: {e}"),
            }
        })
    }

    /// Builds one magnet record from a per-quality API torrent.
    fn build_record(torrent: &YtsTorrent, title_long: &str) -> MagnetRecord {
        let built_title = format!(
            "{} [{}] [{}] [YTS.MX]",
            title_long, torrent.quality, torrent.release_type
        );
        let fields = MagnetFields {
            info_hash: Some(torrent.hash.clone()),
            name: Some(built_title),
            announce: TRACKERS.iter().map(|t| (*t).to_string()).collect(),
            ..MagnetFields::default()
        };

        MagnetRecord {
            magnet_url: fields.build(),
            info_hash: torrent.hash.clone(),
            language: "en".to_string(),
            quality: torrent.quality.clone(),
            source: SOURCE_NAME.to_string(),
            size: torrent.size.clone(),
            file_idx: None,
            file_name: None,
            seed: torrent.seeds,
            peer: torrent.peers,
        }
    }

    /// Picks the movie whose IMDB code matches exactly.
    ///
    /// The API's query matching is fuzzy and can return near-miss titles,
    /// so a strict filter runs over the response.
    fn matching_movie(response: YtsResponse, imdb_id: &str) -> Option<YtsMovie> {
        response
            .data
            .movies
            .into_iter()
            .find(|movie| movie.imdb_code == imdb_id)
    }
}

#[async_trait]
impl Resolver for YtsResolver {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn validate(&self, request: &ResolutionRequest) -> Result<(), ResolveError> {
        if request.imdb_id.is_none() {
            return Err(ResolveError::missing("imdbId"));
        }
        Ok(())
    }

    async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<Vec<MagnetRecord>, ResolveError> {
        let imdb_id = request
            .imdb_id
            .as_deref()
            .ok_or_else(|| ResolveError::missing("imdbId"))?;
        let url = self.search_url(imdb_id)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ResolveError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::Http {
                url: url.to_string(),
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let parsed: YtsResponse = response.json().await.map_err(|e| ResolveError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let Some(movie) = Self::matching_movie(parsed, imdb_id) else {
            return Ok(Vec::new());
        };

        Ok(movie
            .torrents
            .iter()
            .map(|torrent| Self::build_record(torrent, &movie.title_long))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> YtsResponse {
        serde_json::from_str(
            r#"{
              "data": {
                "movies": [
                  {
                    "imdb_code": "tt9999999",
                    "title_long": "Близко Close (2019)",
                    "torrents": []
                  },
                  {
                    "imdb_code": "tt0111161",
                    "title_long": "The Shawshank Redemption (1994)",
                    "torrents": [
                      {
                        "hash": "AB34F5C29D1E0B7A86F20C44D19E5A7B8C3D2E1F",
                        "quality": "1080p",
                        "type": "bluray",
                        "seeds": 87,
                        "peers": 12,
                        "size": "1.85 GB"
                      }
                    ]
                  }
                ]
              }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_exact_imdb_filter() {
        let movie = YtsResolver::matching_movie(sample_response(), "tt0111161").unwrap();
        assert_eq!(movie.title_long, "The Shawshank Redemption (1994)");

        assert!(YtsResolver::matching_movie(sample_response(), "tt0000001").is_none());
    }

    #[test]
    fn test_build_record_synthesizes_magnet() {
        let movie = YtsResolver::matching_movie(sample_response(), "tt0111161").unwrap();
        let record = YtsResolver::build_record(&movie.torrents[0], &movie.title_long);

        assert!(record.magnet_url.starts_with(
            "magnet:?xt=urn:btih:AB34F5C29D1E0B7A86F20C44D19E5A7B8C3D2E1F&dn=The+Shawshank+Redemption"
        ));
        // Display name carries the quality, type and site tags.
        assert!(record.magnet_url.contains("%5B1080p%5D"));
        assert!(record.magnet_url.contains("%5BYTS.MX%5D"));
        // All tracker hints are appended percent-encoded.
        assert_eq!(record.magnet_url.matches("&tr=").count(), TRACKERS.len());
        assert!(
            record
                .magnet_url
                .contains("&tr=udp%3A%2F%2Fopen.demonii.com%3A1337%2Fannounce")
        );

        assert_eq!(record.info_hash, "AB34F5C29D1E0B7A86F20C44D19E5A7B8C3D2E1F");
        assert_eq!(record.language, "en");
        assert_eq!(record.quality, "1080p");
        assert_eq!(record.source, "yts");
        assert_eq!(record.size.as_deref(), Some("1.85 GB"));
        assert_eq!(record.seed, Some(87));
        assert_eq!(record.peer, Some(12));
    }

    #[test]
    fn test_validate_requires_imdb_id() {
        let resolver = YtsResolver::new(&FetchConfig::default());
        let request: ResolutionRequest =
            serde_json::from_str(r#"{"title": "Alien", "cacheId": "x"}"#).unwrap();
        assert!(matches!(
            resolver.validate(&request),
            Err(ResolveError::MissingField { field: "imdbId" })
        ));

        let request: ResolutionRequest =
            serde_json::from_str(r#"{"imdbId": "tt0078748", "cacheId": "x"}"#).unwrap();
        assert!(resolver.validate(&request).is_ok());
    }

    #[test]
    fn test_search_url_includes_query_term() {
        let resolver = YtsResolver::new(&FetchConfig::default());
        let url = resolver.search_url("tt0111161").unwrap();
        assert_eq!(
            url.as_str(),
            "https://yts.mx/api/v2/list_movies.json?query_term=tt0111161"
        );
    }
}
