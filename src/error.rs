use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::WatchlistError;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

// Upstream keys travel in query strings; the URL never reaches an error message.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClient(err.without_url())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Watchlist(WatchlistError::Validation(_)) | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Watchlist(WatchlistError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Watchlist(WatchlistError::NotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Watchlist(WatchlistError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged here and replaced by a generic message
        let message = match &self {
            AppError::Watchlist(WatchlistError::Storage(_)) => {
                tracing::error!(error = %self, "Watchlist storage failure");
                "Could not access the watchlist, please try again later".to_string()
            }
            AppError::ExternalApi(_) | AppError::HttpClient(_) => {
                tracing::warn!(error = %self, "Upstream request failed");
                "Upstream service request failed".to_string()
            }
            AppError::Watchlist(err) => err.to_string(),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::NotConfigured(msg) => {
                msg.clone()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaId;

    #[test]
    fn test_watchlist_errors_map_to_status() {
        let cases = [
            (
                AppError::from(WatchlistError::Validation("Missing required field: id".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(WatchlistError::Conflict(MediaId(550))),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(WatchlistError::Storage("connection refused".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected);
        }
    }

    #[test]
    fn test_not_configured_is_service_unavailable() {
        let err = AppError::NotConfigured("GEMINI_API_KEY is not set".into());
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_not_found_is_not_found() {
        let err = AppError::NotFound("tv 1".into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_http_client_error_drops_request_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/movie/550")
            .query(&[("api_key", "SECRET123")])
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SECRET123"));

        let err = AppError::from(err);
        assert!(matches!(err, AppError::HttpClient(_)));
        assert!(!err.to_string().contains("SECRET123"));
        assert!(!format!("{:?}", err).contains("SECRET123"));
    }

    #[test]
    fn test_external_api_is_bad_gateway() {
        let err = AppError::ExternalApi("TMDb returned status 401".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
