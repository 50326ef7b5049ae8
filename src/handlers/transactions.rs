use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use super::ok;
use crate::AppState;
use crate::db::models::TransactionType;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tx_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tx_type = query
        .tx_type
        .as_deref()
        .map(|raw| raw.parse::<TransactionType>())
        .transpose()
        .map_err(AppError::Validation)?;

    let views = state
        .reconciliation
        .list_history(&principal, tx_type, query.page, query.limit)
        .await?;

    Ok(ok(views))
}

pub async fn status(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .reconciliation
        .check_status(&principal, &transaction_id)
        .await?;

    Ok(ok(view))
}
