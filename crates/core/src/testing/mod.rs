//! Test doubles: an in-memory torrent session and a gated file whose
//! availability can be raised byte by byte.

mod gated_file;
mod mock_session;

pub use gated_file::{GatedFile, GatedReader};
pub use mock_session::MockSession;
