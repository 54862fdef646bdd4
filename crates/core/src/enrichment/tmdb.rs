//! TMDB (The Movie Database) lookup client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::EnrichmentError;

/// TMDB API client. Requires an API key.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Result<Self, EnrichmentError> {
        Self::with_base_url(api_key, "https://api.themoviedb.org/3".to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, EnrichmentError> {
        if api_key.is_empty() {
            return Err(EnrichmentError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EnrichmentError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Search for a movie; returns the best match as an opaque payload.
    pub async fn search_movie(
        &self,
        title: &str,
        year: Option<u32>,
    ) -> Result<Option<serde_json::Value>, EnrichmentError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!(title, ?year, "TMDB movie search");

        let mut request = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", title)]);
        if let Some(y) = year {
            request = request.query(&[("year", y.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EnrichmentError::Upstream(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(EnrichmentError::NotConfigured(
                "invalid TMDB API key".to_string(),
            ));
        }
        if status.as_u16() == 429 {
            return Err(EnrichmentError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Upstream(format!(
                "TMDB returned {status}: {body}"
            )));
        }

        let search: TmdbSearchResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Upstream(format!("parse TMDB response: {e}")))?;

        Ok(search.results.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = TmdbClient::new(String::new());
        assert!(matches!(result, Err(EnrichmentError::NotConfigured(_))));
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let parsed: TmdbSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());

        let parsed: TmdbSearchResponse =
            serde_json::from_str(r#"{"results": [{"title": "The Matrix"}]}"#).unwrap();
        assert_eq!(parsed.results.len(), 1);
    }
}
