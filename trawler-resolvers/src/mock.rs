//! Fixed-response resolver for tests and demos

use async_trait::async_trait;

use trawler_core::bus::ResolutionRequest;
use trawler_core::resolve::{MagnetRecord, ResolveError, Resolver};

/// Resolver that returns a canned set of records.
///
/// Useful for exercising the worker pipeline without network access.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    name: String,
    records: Vec<MagnetRecord>,
    fail_validation: bool,
    fail_resolution: bool,
}

impl StaticResolver {
    /// Creates a resolver that always returns `records`.
    pub fn new(name: impl Into<String>, records: Vec<MagnetRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            fail_validation: false,
            fail_resolution: false,
        }
    }

    /// Creates a resolver that rejects every request during validation.
    pub fn failing_validation(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_validation: true,
            ..Self::default()
        }
    }

    /// Creates a resolver that accepts requests but fails resolution.
    pub fn failing_resolution(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_resolution: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, _request: &ResolutionRequest) -> Result<(), ResolveError> {
        if self.fail_validation {
            return Err(ResolveError::missing("imdbId"));
        }
        Ok(())
    }

    async fn resolve(
        &self,
        _request: &ResolutionRequest,
    ) -> Result<Vec<MagnetRecord>, ResolveError> {
        if self.fail_resolution {
            return Err(ResolveError::Http {
                url: "http://static.invalid/".to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(self.records.clone())
    }
}
