//! Torrent decode to magnet pipeline checks
//!
//! Pins exact digests and magnet strings for fixed torrent buffers so the
//! canonical bencode re-encoding can never drift silently.

use sha1::{Digest, Sha1};
use trawler_core::torrent::{magnet_from_bytes, select_file_index};

const SINGLE_FILE_TORRENT: &[u8] = b"d8:announce30:udp://tracker.example.com:69694:infod6:lengthi1048576e4:name9:movie.mkv12:piece lengthi32768e6:pieces20:AAAAAAAAAAAAAAAAAAAAee";

const MULTI_FILE_TORRENT: &[u8] = b"d4:infod5:filesld6:lengthi500e4:pathl15:Show.S01E02.mp4eed6:lengthi1000e4:pathl20:Show.S01E02.720p.mp4eed6:lengthi2000e4:pathl21:Show.S01E02.1080p.mp4eee4:name8:Show S0110:name.utf-89:Sh\xc3\xb6w S0112:piece lengthi16384e6:pieces20:BBBBBBBBBBBBBBBBBBBBee";

#[test]
fn test_single_file_magnet_and_size() {
    let magnet = magnet_from_bytes(SINGLE_FILE_TORRENT).unwrap();

    assert_eq!(
        magnet.magnet_url,
        "magnet:?xt=urn:btih:c3141eaeedd49a964d2cb7b649085cb3a94b6284&dn=movie.mkv"
    );
    assert_eq!(magnet.size.as_deref(), Some("1.00 MB"));
    assert!(magnet.files.is_empty());
}

#[test]
fn test_multi_file_magnet_prefers_utf8_name() {
    let magnet = magnet_from_bytes(MULTI_FILE_TORRENT).unwrap();

    assert_eq!(magnet.info_hash.to_string(), "26375fe58036af6f2f6e430582d74745ae7b55d2");
    assert!(magnet.magnet_url.starts_with(
        "magnet:?xt=urn:btih:26375fe58036af6f2f6e430582d74745ae7b55d2&dn=Sh%C3%B6w+S01"
    ));
    assert_eq!(magnet.size, None);
    assert_eq!(magnet.files.len(), 3);
}

#[test]
fn test_info_digest_matches_canonical_slice() {
    // The fixture's info keys are already in canonical order, so hashing
    // the raw info slice must agree with the re-encoded digest.
    let start = MULTI_FILE_TORRENT.windows(6).position(|w| w == b"4:info").unwrap() + 6;
    let info_slice = &MULTI_FILE_TORRENT[start..MULTI_FILE_TORRENT.len() - 1];

    let digest = Sha1::digest(info_slice);
    let magnet = magnet_from_bytes(MULTI_FILE_TORRENT).unwrap();

    assert_eq!(hex::encode(digest), magnet.info_hash.to_string());
}

#[test]
fn test_episode_selection_prefers_largest_match() {
    let magnet = magnet_from_bytes(MULTI_FILE_TORRENT).unwrap();

    assert_eq!(select_file_index(&magnet.files, Some(1), Some(2)), Some(2));
    assert_eq!(select_file_index(&magnet.files, Some(2), Some(9)), None);
}
