use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;

use super::ok;
use crate::AppState;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: BigDecimal,
}

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    pub order_id: String,
}

pub async fn create_order(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (order, transaction) = state
        .orchestrator
        .create_paypal_order(&principal, payload.amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        ok(json!({
            "order": order,
            "transaction": transaction,
        })),
    ))
}

pub async fn capture(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<CaptureRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .orchestrator
        .capture_paypal_payment(&principal, &payload.order_id)
        .await?;

    Ok(ok(transaction))
}
