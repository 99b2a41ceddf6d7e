//! Popcorn Time API resolver for movies and show episodes

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use trawler_core::bus::ResolutionRequest;
use trawler_core::config::FetchConfig;
use trawler_core::resolve::{MagnetRecord, ResolveError, Resolver};
use trawler_core::torrent::magnet::{encode_display_name, magnet_param};
use trawler_core::torrent::{MagnetData, TorrentFetcher, TorrentFileEntry};

const DEFAULT_BASE_URL: &str = "https://jfper.link";

const MAGNET2TORRENT_URL: &str = "https://anonymiz.com/magnet2torrent/magnet2torrent.php?magnet=";

const SOURCE_NAME: &str = "popcorntime";

/// Source label used when the API omits a provider name.
const FALLBACK_PROVIDER: &str = "PopcornTime";

/// Resolver backed by a Popcorn Time metadata API.
///
/// Movies are looked up by IMDB id and carry per-language, per-quality
/// magnets. Episodes are located inside the show payload by TVDB id; when
/// an episode's magnet points at a whole-season pack, the torrent file is
/// fetched through a magnet-to-torrent service to work out which file
/// index inside the pack is the requested episode.
#[derive(Debug)]
pub struct PopcornResolver {
    client: reqwest::Client,
    base_url: String,
    magnet2torrent_url: String,
    fetcher: TorrentFetcher,
}

#[derive(Debug, Deserialize)]
struct PopcornMovie {
    title: String,
    #[serde(default)]
    year: u32,
    #[serde(default)]
    torrents: BTreeMap<String, BTreeMap<String, MovieTorrent>>,
}

#[derive(Debug, Deserialize)]
struct MovieTorrent {
    url: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    seed: Option<u32>,
    #[serde(default)]
    peer: Option<u32>,
    #[serde(default)]
    filesize: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PopcornShow {
    #[serde(default)]
    episodes: Vec<ShowEpisode>,
}

#[derive(Debug, Deserialize)]
struct ShowEpisode {
    #[serde(default)]
    tvdb_id: i64,
    #[serde(default)]
    torrents: BTreeMap<String, EpisodeTorrent>,
}

/// Episode torrents report `seeds`/`peers`, unlike the movie endpoint's
/// singular field names.
#[derive(Debug, Deserialize)]
struct EpisodeTorrent {
    url: String,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    seeds: Option<u32>,
    #[serde(default)]
    peers: Option<u32>,
    #[serde(default)]
    filesize: Option<String>,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Magnet2Torrent {
    #[allow(dead_code)]
    #[serde(default)]
    result: bool,
    #[serde(default)]
    url: Option<String>,
}

impl PopcornResolver {
    /// Creates a resolver against the default API host.
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), config)
    }

    /// Creates a resolver against a custom API host.
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

        Self {
            client,
            base_url,
            magnet2torrent_url: MAGNET2TORRENT_URL.to_string(),
            fetcher: TorrentFetcher::new(config),
        }
    }

    fn endpoint(&self, kind: &str, imdb_id: &str) -> Result<Url, ResolveError> {
        let invalid = |reason: String| ResolveError::Http {
            url: self.base_url.clone(),
            reason,
        };
        let base = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        base.join(&format!("{kind}/{imdb_id}"))
            .map_err(|e| invalid(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ResolveError> {
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

        response.json().await.map_err(|e| ResolveError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn movie_records(&self, imdb_id: &str) -> Result<Vec<MagnetRecord>, ResolveError> {
        let url = self.endpoint("movie", imdb_id)?;
        let movie: PopcornMovie = self.get_json(&url).await?;
        Ok(build_movie_records(movie))
    }

    async fn episode_records(
        &self,
        imdb_id: &str,
        tvdb_id: i64,
    ) -> Result<Vec<MagnetRecord>, ResolveError> {
        let url = self.endpoint("show", imdb_id)?;
        let show: PopcornShow = self.get_json(&url).await?;

        let Some(episode) = matching_episode(show, tvdb_id) else {
            return Ok(Vec::new());
        };

        let mut records = Vec::with_capacity(episode.torrents.len());
        for (quality, torrent) in episode.torrents {
            records.push(self.episode_record(quality, torrent).await);
        }
        Ok(records)
    }

    async fn episode_record(&self, quality: String, torrent: EpisodeTorrent) -> MagnetRecord {
        let info_hash = info_hash_from_magnet(&torrent.url);
        let mut size = torrent.filesize;
        let mut file_idx = None;

        // A `file` field marks a season-pack magnet; the pack listing is
        // needed to turn the file name into an index.
        if let Some(file) = &torrent.file {
            match self.fetch_pack_listing(&torrent.url).await {
                Ok(listing) => {
                    if size.is_none() {
                        size = listing.size.clone();
                    }
                    file_idx = locate_in_listing(&listing.files, file);
                }
                Err(e) => warn!("Season pack file lookup failed: {}", e),
            }
        }

        MagnetRecord {
            magnet_url: torrent.url,
            info_hash,
            language: "en".to_string(),
            quality,
            source: torrent
                .provider
                .unwrap_or_else(|| FALLBACK_PROVIDER.to_string()),
            size,
            file_idx,
            file_name: None,
            seed: torrent.seeds,
            peer: torrent.peers,
        }
    }

    /// Converts a magnet into a torrent file via the magnet2torrent
    /// service, then fetches and decodes that torrent.
    async fn fetch_pack_listing(&self, magnet_url: &str) -> Result<MagnetData, ResolveError> {
        let convert_url = format!("{}{}", self.magnet2torrent_url, magnet_url);
        let response = self
            .client
            .get(&convert_url)
            .send()
            .await
            .map_err(|e| ResolveError::Http {
                url: convert_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::Http {
                url: convert_url,
                reason: format!("HTTP status {}", response.status()),
            });
        }

        let converted: Magnet2Torrent =
            response.json().await.map_err(|e| ResolveError::Parse {
                url: convert_url.clone(),
                reason: e.to_string(),
            })?;
        let Some(url) = converted.url else {
            return Err(ResolveError::Parse {
                url: convert_url,
                reason: "conversion response carries no torrent URL".to_string(),
            });
        };

        // The service occasionally appends HTML after the URL.
        let torrent_url = url.split('<').next().unwrap_or_default();
        Ok(self.fetcher.fetch_magnet(torrent_url, None).await?)
    }
}

#[async_trait]
impl Resolver for PopcornResolver {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn validate(&self, request: &ResolutionRequest) -> Result<(), ResolveError> {
        if request.imdb_id.is_none() {
            return Err(ResolveError::missing("imdbId"));
        }
        if request.season_episode().is_some() && request.tvdb_id.is_none() {
            return Err(ResolveError::missing("tvdbId"));
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

        if request.season_episode().is_some() {
            let tvdb_id = request
                .tvdb_id
                .ok_or_else(|| ResolveError::missing("tvdbId"))?;
            self.episode_records(imdb_id, tvdb_id).await
        } else {
            self.movie_records(imdb_id).await
        }
    }
}

/// Builds records for every language/quality combination of a movie.
fn build_movie_records(movie: PopcornMovie) -> Vec<MagnetRecord> {
    let PopcornMovie {
        title,
        year,
        torrents,
    } = movie;

    let mut records = Vec::new();
    for (language, qualities) in torrents {
        for (quality, torrent) in qualities {
            let built_title = format!("[POPCORNTIME] {title} ({year}) [{quality}]");
            let magnet_url = if torrent.url.contains("dn=") {
                torrent.url
            } else {
                format!("{}&dn={}", torrent.url, encode_display_name(&built_title))
            };

            records.push(MagnetRecord {
                info_hash: info_hash_from_magnet(&magnet_url),
                magnet_url,
                language: language.clone(),
                quality,
                source: torrent
                    .provider
                    .unwrap_or_else(|| FALLBACK_PROVIDER.to_string()),
                size: torrent.filesize,
                file_idx: None,
                file_name: None,
                seed: torrent.seed,
                peer: torrent.peer,
            });
        }
    }
    records
}

/// Picks the episode entry matching the requested TVDB id.
fn matching_episode(show: PopcornShow, tvdb_id: i64) -> Option<ShowEpisode> {
    show.episodes
        .into_iter()
        .find(|episode| episode.tvdb_id == tvdb_id)
}

/// Recovers the info-hash from a magnet's `xt` parameter.
///
/// Empty when the magnet carries no `xt`.
fn info_hash_from_magnet(magnet_url: &str) -> String {
    magnet_param(magnet_url, "xt")
        .and_then(|xt| xt.rsplit(':').next().map(str::to_string))
        .unwrap_or_default()
}

/// Finds the pack entry whose leading path segment matches the API's file
/// name, comparing basenames.
fn locate_in_listing(files: &[TorrentFileEntry], file: &str) -> Option<usize> {
    let target = file.rsplit('/').next().unwrap_or(file);
    files
        .iter()
        .position(|entry| entry.path.first().map(String::as_str) == Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_records_built_per_language_and_quality() {
        let movie: PopcornMovie = serde_json::from_str(
            r#"{
              "title": "The Lighthouse",
              "year": 2019,
              "torrents": {
                "en": {
                  "1080p": {
                    "url": "magnet:?xt=urn:btih:AA11BB22CC33DD44EE55AA11BB22CC33DD44EE55",
                    "provider": "MagnetDL",
                    "seed": 120,
                    "peer": 30,
                    "filesize": "1.92 GB"
                  }
                },
                "es": {
                  "720p": {
                    "url": "magnet:?xt=urn:btih:FFEEDDCCBBAA99887766FFEEDDCCBBAA99887766&dn=existing",
                    "seed": 4
                  }
                }
              }
            }"#,
        )
        .unwrap();

        let records = build_movie_records(movie);
        assert_eq!(records.len(), 2);

        let en = records.iter().find(|r| r.language == "en").unwrap();
        assert_eq!(en.info_hash, "AA11BB22CC33DD44EE55AA11BB22CC33DD44EE55");
        assert_eq!(en.quality, "1080p");
        assert_eq!(en.source, "MagnetDL");
        assert_eq!(en.size.as_deref(), Some("1.92 GB"));
        assert_eq!(en.seed, Some(120));
        assert_eq!(en.peer, Some(30));
        // No dn in the source magnet, so the built title is appended.
        assert!(
            en.magnet_url
                .ends_with("&dn=%5BPOPCORNTIME%5D+The+Lighthouse+%282019%29+%5B1080p%5D")
        );

        let es = records.iter().find(|r| r.language == "es").unwrap();
        // A magnet that already names itself is left alone.
        assert!(es.magnet_url.ends_with("&dn=existing"));
        assert_eq!(es.source, "PopcornTime");
        assert_eq!(es.seed, Some(4));
        assert_eq!(es.peer, None);
    }

    #[test]
    fn test_matching_episode_by_tvdb_id() {
        let show: PopcornShow = serde_json::from_str(
            r#"{
              "episodes": [
                {"tvdb_id": 100, "torrents": {}},
                {"tvdb_id": 200, "torrents": {"720p": {"url": "magnet:?xt=urn:btih:11"}}}
              ]
            }"#,
        )
        .unwrap();

        let episode = matching_episode(show, 200).unwrap();
        assert_eq!(episode.tvdb_id, 200);
        assert!(episode.torrents.contains_key("720p"));
    }

    #[test]
    fn test_matching_episode_absent() {
        let show: PopcornShow = serde_json::from_str(r#"{"episodes": []}"#).unwrap();
        assert!(matching_episode(show, 1).is_none());
    }

    #[test]
    fn test_info_hash_recovery() {
        assert_eq!(info_hash_from_magnet("magnet:?xt=urn:btih:CAFEBABE&dn=x"), "CAFEBABE");
        assert_eq!(info_hash_from_magnet("magnet:?dn=no-hash"), "");
    }

    #[test]
    fn test_locate_in_listing_matches_basename() {
        let files = vec![
            TorrentFileEntry {
                length: 100,
                path: vec!["Show.S01E01.mkv".to_string()],
            },
            TorrentFileEntry {
                length: 200,
                path: vec!["Show.S01E02.mkv".to_string()],
            },
        ];

        assert_eq!(locate_in_listing(&files, "Show.S01E02.mkv"), Some(1));
        assert_eq!(locate_in_listing(&files, "Season 1/Show.S01E01.mkv"), Some(0));
        assert_eq!(locate_in_listing(&files, "Show.S01E09.mkv"), None);
        assert_eq!(locate_in_listing(&[], "anything.mkv"), None);
    }

    #[test]
    fn test_validate_field_requirements() {
        let resolver = PopcornResolver::new(&FetchConfig::default());

        let movie: ResolutionRequest =
            serde_json::from_str(r#"{"imdbId": "tt0111161", "cacheId": "x"}"#).unwrap();
        assert!(resolver.validate(&movie).is_ok());

        let no_imdb: ResolutionRequest = serde_json::from_str(r#"{"cacheId": "x"}"#).unwrap();
        assert!(matches!(
            resolver.validate(&no_imdb),
            Err(ResolveError::MissingField { field: "imdbId" })
        ));

        let episode_without_tvdb: ResolutionRequest = serde_json::from_str(
            r#"{"imdbId": "tt0903747", "seasonNum": 1, "episodeNum": 2, "cacheId": "x"}"#,
        )
        .unwrap();
        assert!(matches!(
            resolver.validate(&episode_without_tvdb),
            Err(ResolveError::MissingField { field: "tvdbId" })
        ));

        let episode: ResolutionRequest = serde_json::from_str(
            r#"{"imdbId": "tt0903747", "seasonNum": 1, "episodeNum": 2, "tvdbId": 349232, "cacheId": "x"}"#,
        )
        .unwrap();
        assert!(resolver.validate(&episode).is_ok());
    }
}
