use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::ok;
use crate::AppState;
use crate::db::queries;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;
use crate::services::orchestrator::CreateInvoiceInput;

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub payer_id: Uuid,
    #[serde(default)]
    pub line_items: serde_json::Value,
    pub subtotal: BigDecimal,
    #[serde(default)]
    pub tax: Option<BigDecimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayInvoiceRequest {
    pub payment_method_id: Option<Uuid>,
}

pub async fn create_invoice(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let line_items = if payload.line_items.is_null() {
        json!([])
    } else {
        payload.line_items
    };

    let invoice = state
        .orchestrator
        .create_invoice(
            &principal,
            CreateInvoiceInput {
                payer_id: payload.payer_id,
                line_items,
                subtotal: payload.subtotal,
                tax: payload.tax.unwrap_or_else(|| BigDecimal::from(0)),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, ok(invoice)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = queries::get_invoice(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {}", id)))?;

    let involved = invoice.payer_id == principal.user_id || invoice.payee_id == principal.user_id;
    if !involved && !principal.is_admin() {
        return Err(AppError::Forbidden(
            "invoice belongs to another user".to_string(),
        ));
    }

    Ok(ok(invoice))
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
    payload: Option<Json<PayInvoiceRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let payment_method_id = payload.and_then(|Json(p)| p.payment_method_id);

    let (invoice, transaction) = state
        .orchestrator
        .pay_invoice(&principal, id, payment_method_id)
        .await?;

    Ok(ok(json!({
        "invoice": invoice,
        "transaction": transaction,
    })))
}
