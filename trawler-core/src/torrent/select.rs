//! Playable-file selection within multi-file torrents

use regex::Regex;

use super::metainfo::TorrentFileEntry;

const VIDEO_EXTENSIONS: &str = "mp4|mkv|avi";

/// Picks the file to play from a torrent's file list.
///
/// With both a season and an episode the matcher looks for an optional `S`,
/// the season number, an optional `E` or `x`, and the zero-padded two-digit
/// episode, followed by a video extension; without them any video file
/// qualifies. Release names bundle several quality variants of the same
/// content, so among matches the largest file wins, with ties keeping the
/// first in original order. Returns the index into `files`, or `None` when
/// nothing matches.
pub fn select_file_index(
    files: &[TorrentFileEntry],
    season: Option<u32>,
    episode: Option<u32>,
) -> Option<usize> {
    if files.is_empty() {
        return None;
    }

    let pattern = match (season, episode) {
        (Some(season), Some(episode)) => {
            format!(r"(?i)S?{season}[Ex]?{episode:02}.*\.({VIDEO_EXTENSIONS})$")
        }
        _ => format!(r"(?i)\.({VIDEO_EXTENSIONS})$"),
    };
    let matcher = Regex::new(&pattern).ok()?;

    let mut best: Option<(usize, i64)> = None;
    for (index, file) in files.iter().enumerate() {
        if !matcher.is_match(&file.joined_path()) {
            continue;
        }
        match best {
            Some((_, length)) if length >= file.length => {}
            _ => best = Some((index, file.length)),
        }
    }
    best.map(|(index, _)| index)
}
