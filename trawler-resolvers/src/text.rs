//! Text helpers shared by resolver implementations
//!
//! Release sites label their listings inconsistently: accented titles,
//! quality tokens buried mid-string, episode numbers as `1x05` or as ranges
//! spanning a whole disc. These helpers normalize that noise into values the
//! resolvers can compare.

use regex::Regex;

/// Reduces a title to bare lowercase alphanumerics.
///
/// Common Romance-language accents fold to their base letter, everything
/// else non-alphanumeric is dropped. Useful for comparing titles across
/// sites that disagree on punctuation and casing.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'ã' | 'â' => Some('a'),
            'é' | 'è' | 'ê' => Some('e'),
            'í' | 'ì' | 'î' => Some('i'),
            'ó' | 'ò' | 'ô' | 'õ' => Some('o'),
            'ú' | 'ù' | 'û' | 'ü' => Some('u'),
            'ç' => Some('c'),
            'ñ' => Some('n'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

/// Finds the quality or rip token in a release title.
///
/// Returns the last recognized token, preserving its original casing.
pub fn extract_quality(title: &str) -> Option<&str> {
    let pattern = r"(?i).*(720p|1080p|2160p|3D|4K|HDRip|HDTV|MicroHD|BDRip|BRRip|WEBRip|DVDRip|Screener|Bluray(?: ?Rip)?|CAM)";
    let re = Regex::new(pattern).ok()?;
    re.captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Inclusive episode range within one season, parsed from release labels.
///
/// Covers both single-episode labels (`1x05`) and disc ranges
/// (`1x02 - 1x05`). Containment is a plain integer comparison, so `1x10`
/// is inside `1x02 - 1x13` even though a substring check would miss it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRange {
    /// Season both endpoints belong to.
    pub season: u32,
    /// First episode of the range.
    pub from: u32,
    /// Last episode of the range, equal to `from` for single labels.
    pub to: u32,
}

impl EpisodeRange {
    /// Parses the first `NxMM` or `NxMM - NxMM` occurrence in `label`.
    ///
    /// Returns `None` when no episode label is present, or when a range
    /// spans two different seasons.
    pub fn parse(label: &str) -> Option<Self> {
        let re = Regex::new(r"(\d{1,2})x(\d{1,3})(?:\s*-\s*(\d{1,2})x(\d{1,3}))?").ok()?;
        let caps = re.captures(label)?;

        let season: u32 = caps.get(1)?.as_str().parse().ok()?;
        let from: u32 = caps.get(2)?.as_str().parse().ok()?;

        let Some(end_season) = caps.get(3) else {
            return Some(Self {
                season,
                from,
                to: from,
            });
        };
        let end_season: u32 = end_season.as_str().parse().ok()?;
        let to: u32 = caps.get(4)?.as_str().parse().ok()?;
        if end_season != season || to < from {
            return None;
        }

        Some(Self { season, from, to })
    }

    /// Checks whether the given episode falls inside this range.
    pub fn contains(&self, season: u32, episode: u32) -> bool {
        self.season == season && self.from <= episode && episode <= self.to
    }
}

/// Checks whether a release label covers the given season and episode.
pub fn episode_label_matches(label: &str, season: u32, episode: u32) -> bool {
    EpisodeRange::parse(label).is_some_and(|range| range.contains(season, episode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_strips() {
        assert_eq!(slugify("HELLO WORLD"), "helloworld");
        assert_eq!(slugify("Hello, World!"), "helloworld");
        assert_eq!(slugify("hello---world"), "helloworld");
        assert_eq!(
            slugify("The quick brown fox jumps over the lazy dog!"),
            "thequickbrownfoxjumpsoverthelazydog"
        );
    }

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("áéíóúçñ"), "aeioucn");
        assert_eq!(slugify("Crème Brûlée"), "cremebrulee");
    }

    #[test]
    fn test_slugify_degenerate_inputs() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!@#$%^&*()"), "");
    }

    #[test]
    fn test_extract_quality_tokens() {
        assert_eq!(extract_quality("Movie Title 1080p"), Some("1080p"));
        assert_eq!(extract_quality("TV Show S01E01 720p"), Some("720p"));
        assert_eq!(extract_quality("Series BDRip"), Some("BDRip"));
        assert_eq!(extract_quality("Show BlurayRip"), Some("BlurayRip"));
        assert_eq!(extract_quality("Film Bluray Rip"), Some("Bluray Rip"));
        assert_eq!(extract_quality("New Release CAM"), Some("CAM"));
    }

    #[test]
    fn test_extract_quality_takes_last_token() {
        assert_eq!(extract_quality("Movie 720p HDTV"), Some("HDTV"));
    }

    #[test]
    fn test_extract_quality_preserves_case() {
        assert_eq!(extract_quality("Movie microhd rip"), Some("microhd"));
    }

    #[test]
    fn test_extract_quality_no_token() {
        assert_eq!(extract_quality("Regular Movie Title"), None);
        assert_eq!(extract_quality(""), None);
    }

    #[test]
    fn test_range_parses_single_label() {
        let range = EpisodeRange::parse("Show 1x05 HDTV").unwrap();
        assert_eq!(
            range,
            EpisodeRange {
                season: 1,
                from: 5,
                to: 5
            }
        );
    }

    #[test]
    fn test_range_parses_span() {
        let range = EpisodeRange::parse("Temporada 1 [1x02 - 1x05]").unwrap();
        assert_eq!(
            range,
            EpisodeRange {
                season: 1,
                from: 2,
                to: 5
            }
        );
    }

    #[test]
    fn test_range_containment_is_numeric() {
        let range = EpisodeRange::parse("1x02 - 1x05").unwrap();
        assert!(range.contains(1, 3));
        assert!(range.contains(1, 2));
        assert!(range.contains(1, 5));
        assert!(!range.contains(1, 6));
        assert!(!range.contains(2, 3));

        // Two-digit episode inside a wide range, where substring matching fails.
        let wide = EpisodeRange::parse("1x02 - 1x13").unwrap();
        assert!(wide.contains(1, 10));
    }

    #[test]
    fn test_range_rejects_cross_season_span() {
        assert_eq!(EpisodeRange::parse("1x10 - 2x02"), None);
    }

    #[test]
    fn test_range_absent() {
        assert_eq!(EpisodeRange::parse("Movie 1080p"), None);
        assert_eq!(EpisodeRange::parse(""), None);
    }

    #[test]
    fn test_label_matching() {
        assert!(episode_label_matches("Show 1x05", 1, 5));
        assert!(episode_label_matches("Pack 1x01 - 1x13", 1, 10));
        assert!(!episode_label_matches("Show 1x05", 1, 6));
        assert!(!episode_label_matches("no episodes here", 1, 1));
    }
}
