//! Error-to-status mapping for the HTTP boundary.
//!
//! Lower layers carry typed error kinds; this is the single place they are
//! turned into responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use magnetplay_core::{ServiceError, SessionError};
use magnetplay_core::{EnrichmentError, StoreError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error ready to leave the process as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = match &e {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Session(session) => session_status(session),
            ServiceError::Persistence(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::new(session_status(&e), e.to_string())
    }
}

fn session_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::InvalidMagnet(_) => StatusCode::BAD_REQUEST,
        SessionError::TorrentNotFound(_) | SessionError::FileNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::RangeOutOfBounds { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        SessionError::MetadataTimeout(_)
        | SessionError::MetadataIncomplete
        | SessionError::ReaderClosed
        | SessionError::Io(_)
        | SessionError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EnrichmentError> for ApiError {
    fn from(e: EnrichmentError) -> Self {
        Self::internal(e.to_string())
    }
}

/// JSON extractor whose rejections (wrong Content-Type, oversized or
/// malformed body) come back as 400 with a JSON error body.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        other => other.body_text(),
    })
}
