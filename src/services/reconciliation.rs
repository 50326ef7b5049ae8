//! Read-only reconciliation layer. Gift-card and PayPal order lifecycles keep
//! changing after the local transaction is terminal (delivered, redeemed), so
//! status queries re-fetch remote state and merge it with the ledger view.
//! Nothing here mutates local state.

use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::db::models::{Transaction, TransactionType};
use crate::db::queries;
use crate::error::AppError;
use crate::gateway::{PaymentGateway, RemoteOrderStatus};
use crate::middleware::AuthenticatedPrincipal;
use crate::validation;

#[derive(Debug, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteOrderStatus>,
}

pub struct ReconciliationService {
    pool: PgPool,
    paypal: Arc<dyn PaymentGateway>,
    giftcard: Arc<dyn PaymentGateway>,
}

impl ReconciliationService {
    pub fn new(
        pool: PgPool,
        paypal: Arc<dyn PaymentGateway>,
        giftcard: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            pool,
            paypal,
            giftcard,
        }
    }

    /// Merged local + remote view of a single transaction owned by the caller.
    pub async fn check_status(
        &self,
        principal: &AuthenticatedPrincipal,
        transaction_id: &str,
    ) -> Result<TransactionView, AppError> {
        let transaction = queries::get_transaction_by_public_id(&self.pool, transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("transaction {}", transaction_id)))?;

        self.require_visible(principal, &transaction)?;

        let remote = self.fetch_remote(&transaction).await;
        Ok(TransactionView {
            transaction,
            remote,
        })
    }

    /// Merged view looked up by the provider-side order id, for callers that
    /// only hold the external reference.
    pub async fn check_external_order(
        &self,
        principal: &AuthenticatedPrincipal,
        external_order_id: &str,
    ) -> Result<TransactionView, AppError> {
        let transaction =
            queries::find_transaction_by_external_order(&self.pool, external_order_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("order {}", external_order_id)))?;

        self.require_visible(principal, &transaction)?;

        let remote = self.fetch_remote(&transaction).await;
        Ok(TransactionView {
            transaction,
            remote,
        })
    }

    /// Paginated transaction history, newest first, enriched with remote
    /// order snapshots where an external order id is present.
    pub async fn list_history(
        &self,
        principal: &AuthenticatedPrincipal,
        tx_type: Option<TransactionType>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<TransactionView>, AppError> {
        let (page, limit) = validation::clamp_pagination(page, limit);
        let offset = (page - 1) * limit;

        let transactions =
            queries::list_transactions(&self.pool, principal.user_id, tx_type, limit, offset)
                .await?;

        let views = join_all(transactions.into_iter().map(|transaction| async move {
            let remote = self.fetch_remote(&transaction).await;
            TransactionView {
                transaction,
                remote,
            }
        }))
        .await;

        Ok(views)
    }

    fn require_visible(
        &self,
        principal: &AuthenticatedPrincipal,
        transaction: &Transaction,
    ) -> Result<(), AppError> {
        let involved = transaction.user_id == principal.user_id
            || transaction.counterparty_id == Some(principal.user_id);

        if !involved && !principal.is_admin() {
            return Err(AppError::Forbidden(
                "transaction belongs to another user".to_string(),
            ));
        }

        Ok(())
    }

    fn adapter_for(&self, tx_type: TransactionType) -> Option<&Arc<dyn PaymentGateway>> {
        match tx_type {
            TransactionType::GiftCard => Some(&self.giftcard),
            TransactionType::Deposit => Some(&self.paypal),
            _ => None,
        }
    }

    /// Remote enrichment degrades gracefully: a gateway failure logs a
    /// warning and returns the local view unenriched.
    async fn fetch_remote(&self, transaction: &Transaction) -> Option<RemoteOrderStatus> {
        let order_id = transaction.external_order_id.as_deref()?;
        let adapter = self.adapter_for(transaction.tx_type)?;

        match adapter.get_order_status(order_id).await {
            Ok(remote) => Some(remote),
            Err(e) => {
                tracing::warn!(
                    "remote status lookup failed for {} ({}): {}",
                    transaction.transaction_id,
                    order_id,
                    e
                );
                None
            }
        }
    }
}

/// Pending transactions that never received a terminal update hold no locks
/// and are surfaced here for manual reconciliation.
pub async fn list_stuck_pending(
    pool: &PgPool,
    older_than_minutes: i32,
) -> Result<Vec<Transaction>, AppError> {
    let rows = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE status = 'pending'
        AND created_at < NOW() - make_interval(mins => $1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(older_than_minutes)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
