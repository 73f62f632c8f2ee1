//! HTTP error mapping. Every error body is `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{AccountError, TradeError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Unprocessable(String),
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Unprocessable(m) => m.as_str(),
            ApiError::Internal => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}

impl From<TradeError> for ApiError {
    fn from(e: TradeError) -> Self {
        match e {
            TradeError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TradeError::InvalidQuantity => ApiError::BadRequest(e.to_string()),
            TradeError::InsufficientFunds { .. }
            | TradeError::InsufficientHoldings { .. }
            | TradeError::AmountOutOfRange => {
                ApiError::Unprocessable(e.to_string())
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Trade(trade) => trade.into(),
            AccountError::AccountNotFound => ApiError::NotFound(e.to_string()),
            AccountError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                ApiError::Internal
            }
        }
    }
}
