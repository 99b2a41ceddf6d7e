//! Trawler Resolvers - Site-specific magnet discovery

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! One resolver per upstream source behind the core's `Resolver` trait, plus
//! the shared text helpers for site-side title handling (slugs, quality
//! tokens, episode ranges).

use std::sync::Arc;

use trawler_core::config::TrawlerConfig;
use trawler_core::resolve::{ResolveError, Resolver};

pub mod mock;
pub mod popcorn;
pub mod text;
pub mod yts;

// Re-export main types
pub use mock::StaticResolver;
pub use popcorn::PopcornResolver;
pub use yts::YtsResolver;

/// Builds the resolver registered under `source`.
///
/// Known sources are `yts` and `popcorntime` (alias `popcorn`); lookup is
/// case-insensitive.
///
/// # Errors
///
/// - `ResolveError::UnknownSource` - if no resolver is registered for `source`
pub fn create_resolver(
    source: &str,
    config: &TrawlerConfig,
) -> Result<Arc<dyn Resolver>, ResolveError> {
    match source.to_ascii_lowercase().as_str() {
        "yts" => Ok(Arc::new(YtsResolver::new(&config.fetch))),
        "popcorntime" | "popcorn" => Ok(Arc::new(PopcornResolver::new(&config.fetch))),
        _ => Err(ResolveError::UnknownSource {
            source: source.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resolver_known_sources() {
        let config = TrawlerConfig::default();

        assert_eq!(create_resolver("yts", &config).unwrap().name(), "yts");
        assert_eq!(create_resolver("PopcornTime", &config).unwrap().name(), "popcorntime");
        assert_eq!(create_resolver("popcorn", &config).unwrap().name(), "popcorntime");
    }

    #[test]
    fn test_create_resolver_unknown_source() {
        let config = TrawlerConfig::default();
        let result = create_resolver("kickass", &config);

        assert!(matches!(
            result,
            Err(ResolveError::UnknownSource { source }) if source == "kickass"
        ));
    }
}
