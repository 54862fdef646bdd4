use std::sync::Arc;

use magnetplay_core::{Config, MovieLookup, StreamingService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<StreamingService>,
    movie_lookup: Option<Arc<dyn MovieLookup>>,
}

impl AppState {
    pub fn new(
        config: Config,
        service: Arc<StreamingService>,
        movie_lookup: Option<Arc<dyn MovieLookup>>,
    ) -> Self {
        Self {
            config,
            service,
            movie_lookup,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &StreamingService {
        &self.service
    }

    /// The external movie lookup, if one is configured.
    pub fn movie_lookup(&self) -> Option<&Arc<dyn MovieLookup>> {
        self.movie_lookup.as_ref()
    }
}
