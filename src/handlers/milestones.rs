use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use super::ok;
use crate::AppState;
use crate::error::AppError;
use crate::middleware::AuthenticatedPrincipal;
use crate::services::orchestrator::MilestoneGrant;

/// Release authorization forwarded from the project service: the parties and
/// amount come from the milestone record, not from user input fields the
/// payer could edit.
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: BigDecimal,
}

pub async fn release(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
    Path(milestone_id): Path<Uuid>,
    Json(payload): Json<ReleaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state
        .orchestrator
        .release_milestone(
            &principal,
            milestone_id,
            MilestoneGrant {
                client_id: payload.client_id,
                freelancer_id: payload.freelancer_id,
                amount: payload.amount,
            },
        )
        .await?;

    Ok(ok(transaction))
}
