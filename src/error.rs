use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Milestone already released: {0}")]
    AlreadyReleased(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientFunds(_)
            | AppError::AlreadyProcessed(_)
            | AppError::AlreadyReleased(_) => StatusCode::CONFLICT,
            AppError::PaymentMethodNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let error = AppError::Validation("missing field".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let error = AppError::InvalidAmount("must be greater than zero".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn state_conflicts_map_to_conflict() {
        let error = AppError::InsufficientFunds("balance is 10.00".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        let error = AppError::AlreadyProcessed("TXN-1".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);

        let error = AppError::AlreadyReleased("milestone".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn gateway_errors_map_to_bad_gateway() {
        let error = AppError::Gateway(GatewayError::CircuitOpen("paypal"));
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn database_errors_map_to_internal() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn error_response_carries_failure_envelope() {
        let error = AppError::NotFound("wallet".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
