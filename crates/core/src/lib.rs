pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod media;
pub mod service;
pub mod session;
pub mod testing;
pub mod validation;

pub use catalog::{StoreError, TorrentRecord, TorrentStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    Environment, ServerConfig, TorrentConfig,
};
pub use enrichment::{parse_release_name, EnrichmentError, MovieLookup, TmdbClient};
pub use service::{ServiceError, StreamingService};
pub use session::{
    CloseHandle, FileEntry, LibrqbitSession, SessionError, StreamReader, TorrentInfo,
    TorrentSession, TorrentState,
};
pub use validation::{
    validate_info_hash, validate_magnet_uri, validate_stream_path, ValidationError,
};
