//! HTTP surface: routing, range handling, and error mapping.

mod error;
mod handlers;
mod movies;
mod range;
mod routes;
mod stream;
mod torrents;

pub use error::{ApiError, ApiJson};
pub use routes::{create_router, MOUNT_PREFIX};
