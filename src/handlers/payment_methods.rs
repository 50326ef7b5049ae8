use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::ok;
use crate::AppState;
use crate::db::models::{PaymentMethod, PaymentMethodType};
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub method_type: PaymentMethodType,
    pub label: String,
    /// Provider-side token for the instrument; raw credentials never land here.
    pub external_ref: String,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn list(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<impl IntoResponse, AppError> {
    let methods = state.orchestrator.list_payment_methods(&principal).await?;
    Ok(ok(methods))
}

pub async fn create(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> Result<impl IntoResponse, AppError> {
    let method = PaymentMethod {
        id: Uuid::new_v4(),
        user_id: principal.user_id,
        method_type: payload.method_type,
        label: payload.label,
        external_ref: payload.external_ref,
        is_default: payload.is_default,
        created_at: Utc::now(),
    };

    let inserted = state
        .orchestrator
        .add_payment_method(&principal, method)
        .await?;

    Ok((StatusCode::CREATED, ok(inserted)))
}

pub async fn remove(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .orchestrator
        .remove_payment_method(&principal, id)
        .await?;

    Ok(ok(deleted))
}
