//! The stream route: wires a piece-aware reader to an HTTP response body
//! with partial-content semantics.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use futures::StreamExt;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use magnetplay_core::media;

use super::error::ApiError;
use super::range::parse_range;
use crate::state::AppState;

/// GET /stream/{infoHash}/{fileName or fileIndex}
///
/// Serves one file out of a torrent, honoring a single `bytes=` range.
/// Reads block until the swarm delivers the requested pieces; the client
/// going away drops the reader and withdraws its prioritization hint.
pub async fn stream_file(
    State(state): State<Arc<AppState>>,
    Path((info_hash, file_ref)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (mut reader, entry) = state.service().open_stream(&info_hash, &file_ref).await?;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    let range = match parse_range(range_header, entry.length) {
        Ok(range) => range,
        Err(_) => {
            debug!(
                info_hash,
                file = entry.path,
                range = ?range_header,
                "unsatisfiable range"
            );
            return Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", entry.length))
                .body(Body::empty())
                .map_err(|e| ApiError::internal(e.to_string()));
        }
    };

    let content_type = media::content_type(&entry.path);

    let builder = match range {
        Some((start, end)) => {
            reader.seek(SeekFrom::Start(start)).await?;
            let content_length = end - start + 1;

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, content_length)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{}", entry.length),
                )
        }
        None => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_LENGTH, entry.length),
    };

    let copy_len = match range {
        Some((start, end)) => end - start + 1,
        None => entry.length,
    };

    let stream = ReaderStream::new(reader.take(copy_len)).map(|item| {
        if let Err(e) = &item {
            if is_benign_disconnect(e) {
                debug!(error = %e, "client disconnected during stream copy");
            } else {
                debug!(error = %e, "stream copy failed");
            }
        }
        item
    });

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Whether an I/O error just means the peer hung up.
fn is_benign_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_disconnect_kinds() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionAborted,
        ] {
            assert!(is_benign_disconnect(&io::Error::new(kind, "gone")));
        }
        assert!(!is_benign_disconnect(&io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "short read"
        )));
    }
}
