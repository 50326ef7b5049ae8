use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use super::ok;
use crate::AppState;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub amount: BigDecimal,
    pub payment_method_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub amount: BigDecimal,
    pub payment_method_id: Uuid,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let wallet = state.orchestrator.get_wallet(&principal).await?;
    Ok(ok(wallet))
}

pub async fn deposit(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<DepositRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .orchestrator
        .add_funds(&principal, payload.amount, payload.payment_method_id)
        .await?;

    Ok((StatusCode::CREATED, ok(transaction)))
}

pub async fn withdraw(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .orchestrator
        .withdraw_funds(&principal, payload.amount, payload.payment_method_id)
        .await?;

    Ok((StatusCode::CREATED, ok(transaction)))
}
