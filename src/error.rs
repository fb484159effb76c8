use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Errors surfaced to HTTP clients. Every variant is terminal for the request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not Found")]
    NotFound,

    /// The detail is for logs only; clients see a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Internal(detail) => {
                tracing::error!("{}", detail);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_internal_detail_not_leaked() {
        let resp = ApiError::Internal("signing key exploded".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "Internal Server Error");
    }

    #[actix_web::test]
    async fn test_bad_request_carries_message() {
        let resp = ApiError::BadRequest("expected value at line 1".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(body, "expected value at line 1");
    }
}
