//! Ledger store queries. Every mutating query takes an open sqlx transaction
//! so that the orchestrator owns the atomic unit; the store itself performs no
//! cross-entity atomicity.

use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::models::{
    Invoice, PaymentMethod, Transaction, TransactionStatus, TransactionType, Wallet,
};

// --- Wallets ---

/// Wallets are created lazily on first financial operation.
pub async fn get_or_create_wallet(
    executor: &mut SqlxTransaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Wallet> {
    sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **executor)
        .await?;

    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut **executor)
        .await
}

pub async fn fetch_wallet(pool: &PgPool, user_id: Uuid) -> Result<Option<Wallet>> {
    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Conditional balance update: the check and the mutation are one statement,
/// so two concurrent debits cannot both observe sufficient funds. Returns
/// `None` when the guard rejects the write (would leave balance < 0).
pub async fn adjust_balance(
    executor: &mut SqlxTransaction<'_, Postgres>,
    user_id: Uuid,
    delta: &BigDecimal,
    earned_delta: &BigDecimal,
    spent_delta: &BigDecimal,
) -> Result<Option<Wallet>> {
    sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET balance = balance + $2,
            total_earned = total_earned + $3,
            total_spent = total_spent + $4,
            updated_at = NOW()
        WHERE user_id = $1 AND balance + $2 >= 0
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .bind(earned_delta)
    .bind(spent_delta)
    .fetch_optional(&mut **executor)
    .await
}

// --- Transactions ---

pub async fn insert_transaction(
    executor: &mut SqlxTransaction<'_, Postgres>,
    tx: &Transaction,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, transaction_id, user_id, counterparty_id, tx_type, status,
            amount, fee, net_amount, invoice_id, milestone_id, payment_method_id,
            external_order_id, metadata, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(&tx.transaction_id)
    .bind(tx.user_id)
    .bind(tx.counterparty_id)
    .bind(tx.tx_type)
    .bind(tx.status)
    .bind(&tx.amount)
    .bind(&tx.fee)
    .bind(&tx.net_amount)
    .bind(tx.invoice_id)
    .bind(tx.milestone_id)
    .bind(tx.payment_method_id)
    .bind(&tx.external_order_id)
    .bind(&tx.metadata)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_one(&mut **executor)
    .await
}

/// Advances a pending transaction to a terminal status. The `status = 'pending'`
/// guard makes terminal states immutable: a second update finds zero rows and
/// returns `None`. Metadata is merged, never replaced.
pub async fn mark_transaction_terminal(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    status: TransactionStatus,
    metadata: Option<serde_json::Value>,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions
        SET status = $2,
            metadata = COALESCE(metadata, '{}'::jsonb) || COALESCE($3, '{}'::jsonb),
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(metadata)
    .fetch_optional(&mut **executor)
    .await
}

pub async fn get_transaction_by_public_id(
    pool: &PgPool,
    transaction_id: &str,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(pool)
        .await
}

pub async fn lock_transaction_by_public_id(
    executor: &mut SqlxTransaction<'_, Postgres>,
    transaction_id: &str,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE transaction_id = $1 FOR UPDATE",
    )
    .bind(transaction_id)
    .fetch_optional(&mut **executor)
    .await
}

pub async fn find_transaction_by_external_order(
    pool: &PgPool,
    external_order_id: &str,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE external_order_id = $1")
        .bind(external_order_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_transactions(
    pool: &PgPool,
    user_id: Uuid,
    tx_type: Option<TransactionType>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE (user_id = $1 OR counterparty_id = $1)
        AND ($2::transaction_type IS NULL OR tx_type = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(tx_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

// --- Invoices ---

pub async fn insert_invoice(pool: &PgPool, invoice: &Invoice) -> Result<Invoice> {
    sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (
            id, invoice_number, payer_id, payee_id, line_items,
            subtotal, tax, total, platform_fee, status, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(invoice.id)
    .bind(&invoice.invoice_number)
    .bind(invoice.payer_id)
    .bind(invoice.payee_id)
    .bind(&invoice.line_items)
    .bind(&invoice.subtotal)
    .bind(&invoice.tax)
    .bind(&invoice.total)
    .bind(&invoice.platform_fee)
    .bind(invoice.status)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_invoice(pool: &PgPool, id: Uuid) -> Result<Option<Invoice>> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_invoice_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Invoice>> {
    sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

/// Transitions an invoice to paid exactly once; the pending-only guard means
/// a concurrent payer finds zero rows.
pub async fn mark_invoice_paid(
    executor: &mut SqlxTransaction<'_, Postgres>,
    invoice_id: Uuid,
    transaction_id: Uuid,
) -> Result<Option<Invoice>> {
    sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET status = 'paid', transaction_id = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(invoice_id)
    .bind(transaction_id)
    .fetch_optional(&mut **executor)
    .await
}

// --- Escrow releases ---

/// The `milestone_id` primary key is the at-most-once guard: a second release
/// attempt raises a unique violation and rolls back the whole unit.
pub async fn insert_escrow_release(
    executor: &mut SqlxTransaction<'_, Postgres>,
    milestone_id: Uuid,
    transaction_id: Uuid,
) -> Result<()> {
    sqlx::query("INSERT INTO escrow_releases (milestone_id, transaction_id) VALUES ($1, $2)")
        .bind(milestone_id)
        .bind(transaction_id)
        .execute(&mut **executor)
        .await?;

    Ok(())
}

// --- Payment methods ---

pub async fn insert_payment_method(
    executor: &mut SqlxTransaction<'_, Postgres>,
    method: &PaymentMethod,
) -> Result<PaymentMethod> {
    if method.is_default {
        sqlx::query("UPDATE payment_methods SET is_default = FALSE WHERE user_id = $1 AND is_default")
            .bind(method.user_id)
            .execute(&mut **executor)
            .await?;
    }

    sqlx::query_as::<_, PaymentMethod>(
        r#"
        INSERT INTO payment_methods (id, user_id, method_type, label, external_ref, is_default, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(method.id)
    .bind(method.user_id)
    .bind(method.method_type)
    .bind(&method.label)
    .bind(&method.external_ref)
    .bind(method.is_default)
    .bind(method.created_at)
    .fetch_one(&mut **executor)
    .await
}

pub async fn get_payment_method(pool: &PgPool, id: Uuid) -> Result<Option<PaymentMethod>> {
    sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_payment_methods(pool: &PgPool, user_id: Uuid) -> Result<Vec<PaymentMethod>> {
    sqlx::query_as::<_, PaymentMethod>(
        "SELECT * FROM payment_methods WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Deletes a method owned by the user. When the deleted method was the
/// default, the most recent remaining method is promoted.
pub async fn delete_payment_method(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<PaymentMethod>> {
    let deleted = sqlx::query_as::<_, PaymentMethod>(
        "DELETE FROM payment_methods WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **executor)
    .await?;

    if let Some(ref method) = deleted {
        if method.is_default {
            sqlx::query(
                r#"
                UPDATE payment_methods SET is_default = TRUE
                WHERE id = (
                    SELECT id FROM payment_methods
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                )
                "#,
            )
            .bind(user_id)
            .execute(&mut **executor)
            .await?;
        }
    }

    Ok(deleted)
}
