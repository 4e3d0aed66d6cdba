use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Classified failure of a tagging request.
///
/// Every error on the request path is mapped to one of these kinds before
/// it is serialized for the client.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Empty, whitespace-only or over-length input text.
    #[error("{0}")]
    BadInput(String),
    /// Rejected by the sliding-window rate limiter.
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },
    /// The tag generator failed to initialize at startup.
    #[error("NLP tag generator is not initialized")]
    Unavailable,
    /// Unexpected failure while generating tags.
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_api_error(err: &ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::BadInput(_) => Self::new("bad_request", &message, 400),
            ApiError::RateLimited { .. } => Self::new("rate_limit_exceeded", &message, 429),
            ApiError::Unavailable => Self::new("service_unavailable", &message, 500),
            ApiError::Internal(_) => Self::new("internal_error", &message, 500),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from_api_error(&self);
        let status =
            StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_map_to_expected_codes() {
        let cases = [
            (ApiError::BadInput("Text cannot be empty".to_string()), "bad_request", 400),
            (
                ApiError::RateLimited {
                    message: "Rate limit exceeded".to_string(),
                    retry_after_secs: 30,
                },
                "rate_limit_exceeded",
                429,
            ),
            (ApiError::Unavailable, "service_unavailable", 500),
            (ApiError::Internal("boom".to_string()), "internal_error", 500),
        ];

        for (err, kind, code) in cases {
            let body = ErrorResponse::from_api_error(&err);
            assert_eq!(body.error, kind);
            assert_eq!(body.code, code);
        }
    }

    #[test]
    fn test_rate_limited_response_carries_retry_after_header() {
        let err = ApiError::RateLimited {
            message: "Rate limit exceeded".to_string(),
            retry_after_secs: 42,
        };
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from_static("42"))
        );
    }

    #[test]
    fn test_other_errors_have_no_retry_after_header() {
        let response = ApiError::Unavailable.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }
}
