use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use super::ok;
use crate::AppState;
use crate::db::models::TransactionType;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;
use crate::services::orchestrator::GiftCardWithdrawal;

#[derive(Debug, Deserialize)]
pub struct GiftCardWithdrawRequest {
    pub campaign_id: String,
    pub amount: BigDecimal,
    pub recipient_email: String,
    pub recipient_name: String,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn withdraw(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<GiftCardWithdrawRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .orchestrator
        .withdraw_as_gift_card(
            &principal,
            GiftCardWithdrawal {
                campaign_id: payload.campaign_id,
                amount: payload.amount,
                recipient_email: payload.recipient_email,
                recipient_name: payload.recipient_name,
                message: payload.message,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, ok(transaction)))
}

pub async fn order_status(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .reconciliation
        .check_external_order(&principal, &order_id)
        .await?;

    Ok(ok(view))
}

pub async fn history(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let views = state
        .reconciliation
        .list_history(
            &principal,
            Some(TransactionType::GiftCard),
            query.page,
            query.limit,
        )
        .await?;

    Ok(ok(views))
}
