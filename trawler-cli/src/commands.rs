//! CLI command implementations

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use tokio::fs;
use tracing::{info, warn};
use trawler_core::bus::{JsonlConsumer, PartitionConsumer, StdoutPublisher};
use trawler_core::config::TrawlerConfig;
use trawler_core::swarm::{HttpSwarmChecker, SwarmHealthChecker, TrackerList};
use trawler_core::torrent::{TorrentError, magnet_from_bytes, select_file_index};
use trawler_core::worker::ResolutionWorker;
use trawler_core::{Result, TrawlerError};
use trawler_resolvers::create_resolver;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the resolution worker over a stream of requests
    Run {
        /// Source to resolve against (yts, popcorntime)
        #[arg(short, long)]
        source: String,

        /// JSONL request file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Decode a torrent file and print its magnet metadata
    Decode {
        /// Path to the torrent file
        file: PathBuf,

        /// Season used for episode file selection
        #[arg(long)]
        season: Option<u32>,

        /// Episode used for episode file selection
        #[arg(long)]
        episode: Option<u32>,
    },

    /// Check swarm health for a magnet link
    Check {
        /// Magnet link to check
        magnet: String,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run { source, input } => run_worker(source, input).await,
        Commands::Decode {
            file,
            season,
            episode,
        } => decode_torrent(file, season, episode).await,
        Commands::Check { magnet } => check_magnet(magnet).await,
    }
}

/// Run the resolution worker until the request stream is exhausted
///
/// # Errors
/// - `TrawlerError::Resolve` - No resolver registered for the source
/// - `TrawlerError::Bus` - Request file could not be opened
pub async fn run_worker(source: String, input: Option<PathBuf>) -> Result<()> {
    let config = TrawlerConfig::from_env();
    let resolver = create_resolver(&source, &config)?;
    info!("Resolving against source: {}", resolver.name());

    let trackers = fetch_trackers(&config).await;
    let checker = Arc::new(HttpSwarmChecker::new(&config.swarm));
    let publisher = Arc::new(StdoutPublisher::new());
    let worker = ResolutionWorker::new(
        resolver,
        checker,
        publisher,
        trackers,
        config.bus.concurrent_partitions,
    );

    // Stdout carries the published records; operator output stays on the
    // log side.
    let consumer: Box<dyn PartitionConsumer> = match input {
        Some(path) => {
            info!("Reading requests from {}", path.display());
            Box::new(JsonlConsumer::open(&path).await?)
        }
        None => {
            info!("Reading requests from stdin");
            Box::new(JsonlConsumer::stdin())
        }
    };

    let processed = worker.run(vec![consumer]).await;
    info!("Worker finished after {} requests", processed);

    Ok(())
}

/// Decode a torrent file and print its magnet metadata
///
/// # Errors
/// - `TrawlerError::Io` - Torrent file could not be read
/// - `TrawlerError::Torrent` - File is not valid bencode
pub async fn decode_torrent(
    file: PathBuf,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<()> {
    let data = fs::read(&file).await?;
    let magnet = magnet_from_bytes(&data)?;

    println!("Info hash: {}", magnet.info_hash);
    println!("Magnet: {}", magnet.magnet_url);
    if let Some(size) = &magnet.size {
        println!("Size: {size}");
    }

    if magnet.files.is_empty() {
        println!("Single-file torrent");
        return Ok(());
    }

    println!("Files ({}):", magnet.files.len());
    for (index, entry) in magnet.files.iter().enumerate() {
        println!("  [{index}] {} ({} bytes)", entry.path.join("/"), entry.length);
    }

    match select_file_index(&magnet.files, season, episode) {
        Some(index) => println!("Selected file index: {index}"),
        None => println!("No file matches the requested selection"),
    }

    Ok(())
}

/// Check swarm health for a magnet link
///
/// # Errors
/// - `TrawlerError::Torrent` - The argument is not a magnet URI
pub async fn check_magnet(magnet: String) -> Result<()> {
    validate_magnet(&magnet)?;

    let config = TrawlerConfig::from_env();
    let trackers = fetch_trackers(&config).await;
    let checker = HttpSwarmChecker::new(&config.swarm);

    let health = checker.check(&magnet, &trackers).await;
    if health.is_empty() {
        println!("No swarm data available");
    } else {
        let count = |value: Option<u32>| {
            value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
        };
        println!("Seeds: {}", count(health.seed));
        println!("Peers: {}", count(health.peer));
    }

    Ok(())
}

/// Fetches the shared tracker list once at startup.
///
/// Failure is not fatal: swarm checks still run, just with fewer trackers.
async fn fetch_trackers(config: &TrawlerConfig) -> TrackerList {
    let client = reqwest::Client::new();
    match TrackerList::fetch(&client, &config.swarm.trackers_url).await {
        Ok(trackers) => {
            info!("Fetched {} trackers", trackers.tracker_count());
            trackers
        }
        Err(e) => {
            warn!("Failed to fetch tracker list: {}", e);
            TrackerList::empty()
        }
    }
}

/// Reject arguments that are not magnet URIs before any network call
fn validate_magnet(magnet: &str) -> Result<()> {
    if magnet.starts_with("magnet:?") {
        return Ok(());
    }

    Err(TrawlerError::Torrent(TorrentError::InvalidTorrentFile {
        reason: format!("Invalid magnet link: '{magnet}'. Expected a magnet:? URI."),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_FILE_TORRENT: &[u8] =
        b"d4:infod6:lengthi1048576e4:name9:movie.mkv12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";

    #[test]
    fn test_validate_magnet_accepts_magnet_uri() {
        let result = validate_magnet("magnet:?xt=urn:btih:0123456789abcdef");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_magnet_rejects_plain_text() {
        let result = validate_magnet("http://example.com/file.torrent");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_decode_torrent_single_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, SINGLE_FILE_TORRENT).unwrap();

        let result = decode_torrent(file.path().to_path_buf(), None, None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_decode_torrent_missing_file() {
        let result = decode_torrent(PathBuf::from("/nonexistent/file.torrent"), None, None).await;
        assert!(result.is_err());
    }
}
