//! Request-level error taxonomy and its HTTP status mapping.

use crate::store::StoreError;
use crate::streaming::range::RangeError;
use crate::token::TokenError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Everything that can go wrong while serving a stream request.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The path does not look like either token form.
    #[error("invalid path format")]
    BadPath,

    #[error("link has expired")]
    Expired,

    #[error("integrity check failed")]
    SignatureMismatch,

    /// The encrypted blob could not be decoded.
    #[error("invalid stream token: {0}")]
    Token(#[from] TokenError),

    /// The path used a token form this deployment has no keys for.
    #[error("token format not enabled")]
    FormatDisabled,

    #[error("object not found")]
    NotFound,

    #[error("range not satisfiable for object of {size} bytes")]
    RangeUnsatisfiable { size: u64 },

    #[error("upstream failure: {0}")]
    Upstream(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for StreamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            other => Self::Upstream(other),
        }
    }
}

impl From<RangeError> for StreamError {
    fn from(err: RangeError) -> Self {
        let RangeError::Unsatisfiable { size } = err;
        Self::RangeUnsatisfiable { size }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadPath => StatusCode::BAD_REQUEST,
            Self::Expired | Self::SignatureMismatch | Self::Token(_) | Self::FormatDisabled => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RangeUnsatisfiable { size } => {
                // 416 carries the object size and no body.
                return (
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(header::CONTENT_RANGE, format!("bytes */{size}"))],
                )
                    .into_response();
            }
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
