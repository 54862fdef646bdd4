//! Torrent session: swarm management, piece acquisition, and piece-aware
//! file readers.

mod librqbit;
mod reader;
mod registry;
mod types;

pub use librqbit::LibrqbitSession;
pub use reader::{CloseHandle, RawFileReader, StreamReader};
pub use registry::HandleRegistry;
pub use types::{FileEntry, SessionError, TorrentInfo, TorrentSession, TorrentState};
