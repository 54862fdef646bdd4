//! Movie-metadata enrichment: release-name parsing and the external lookup
//! collaborator. The core treats enrichment payloads as opaque JSON; this
//! module only produces them.

mod filename;
mod tmdb;

pub use filename::{parse_release_name, ParsedName};
pub use tmdb::TmdbClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from enrichment lookups.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Enrichment not configured: {0}")]
    NotConfigured(String),

    #[error("Upstream rate limit exceeded")]
    RateLimited,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// External movie lookup, keyed by parsed title and year.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    async fn search(
        &self,
        title: &str,
        year: Option<u32>,
    ) -> Result<Option<serde_json::Value>, EnrichmentError>;
}

#[async_trait]
impl MovieLookup for TmdbClient {
    async fn search(
        &self,
        title: &str,
        year: Option<u32>,
    ) -> Result<Option<serde_json::Value>, EnrichmentError> {
        self.search_movie(title, year).await
    }
}

/// Deterministic response served when no lookup backend is configured.
pub fn placeholder_details(parsed: &ParsedName) -> serde_json::Value {
    serde_json::json!({
        "filename": parsed.title,
        "year": parsed.year.map(|y| y.to_string()).unwrap_or_default(),
        "overview": format!("No metadata source configured for '{}'.", parsed.title),
        "originalTitle": parsed.title,
        "genres": [],
        "rating": 0.0,
        "voteCount": 0,
        "status": "Unknown",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_details_shape() {
        let parsed = parse_release_name("The.Matrix.1999.1080p.mkv");
        let details = placeholder_details(&parsed);
        assert_eq!(details["filename"], "The Matrix");
        assert_eq!(details["year"], "1999");
        assert_eq!(details["status"], "Unknown");
    }
}
