//! Transaction orchestrator: every public operation is a bounded protocol
//! over one atomic unit of work. Gateway calls always happen outside an open
//! database transaction; the short atomic unit that finalizes state opens
//! only once the external result is known.

use bigdecimal::BigDecimal;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::FeeSchedule;
use crate::db::models::{
    Invoice, InvoiceStatus, PaymentMethod, Transaction, TransactionStatus, TransactionType, Wallet,
    generate_transaction_id,
};
use crate::db::queries;
use crate::error::AppError;
use crate::gateway::{GiftCardOrder, OrderRef, PaymentGateway};
use crate::middleware::AuthenticatedPrincipal;
use crate::services::Notifier;
use crate::validation;

/// Release authorization supplied by the project/milestone service. The
/// orchestrator trusts the grant's amounts and parties and only executes the
/// fund movement.
#[derive(Debug, Clone)]
pub struct MilestoneGrant {
    pub client_id: Uuid,
    pub freelancer_id: Uuid,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct GiftCardWithdrawal {
    pub campaign_id: String,
    pub amount: BigDecimal,
    pub recipient_email: String,
    pub recipient_name: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub payer_id: Uuid,
    pub line_items: serde_json::Value,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
}

pub struct TransactionOrchestrator {
    pool: PgPool,
    paypal: Arc<dyn PaymentGateway>,
    giftcard: Arc<dyn PaymentGateway>,
    fees: FeeSchedule,
    notifier: Notifier,
}

fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

/// Fee for a given rate, rounded to cents.
pub fn apply_rate(amount: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    (amount * rate).round(2)
}

impl TransactionOrchestrator {
    pub fn new(
        pool: PgPool,
        paypal: Arc<dyn PaymentGateway>,
        giftcard: Arc<dyn PaymentGateway>,
        fees: FeeSchedule,
        notifier: Notifier,
    ) -> Self {
        Self {
            pool,
            paypal,
            giftcard,
            fees,
            notifier,
        }
    }

    pub async fn get_wallet(
        &self,
        principal: &AuthenticatedPrincipal,
    ) -> Result<Wallet, AppError> {
        let mut db_tx = self.pool.begin().await?;
        let wallet = queries::get_or_create_wallet(&mut db_tx, principal.user_id).await?;
        db_tx.commit().await?;
        Ok(wallet)
    }

    /// Deposit via a stored payment method. Purely internal: no gateway
    /// latency, so the transaction is created directly as completed.
    pub async fn add_funds(
        &self,
        principal: &AuthenticatedPrincipal,
        amount: BigDecimal,
        payment_method_id: Uuid,
    ) -> Result<Transaction, AppError> {
        validate_amount(&amount)?;
        let method = self
            .require_payment_method(payment_method_id, principal)
            .await?;

        let mut db_tx = self.pool.begin().await?;
        queries::get_or_create_wallet(&mut db_tx, principal.user_id).await?;
        queries::adjust_balance(&mut db_tx, principal.user_id, &amount, &zero(), &zero())
            .await?
            .ok_or_else(|| AppError::Internal("wallet credit rejected".to_string()))?;

        let record = Transaction::new(
            principal.user_id,
            TransactionType::Deposit,
            TransactionStatus::Completed,
            amount,
            zero(),
        )
        .with_payment_method(method.id);

        let inserted = queries::insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await?;

        tracing::info!("deposit {} completed for {}", inserted.transaction_id, principal.user_id);
        self.notifier.transaction_terminal(&inserted);
        Ok(inserted)
    }

    /// Two-phase by design: funds are reserved immediately (wallet debited,
    /// transaction pending); the payout to the external rail happens after
    /// review, via [`finalize_withdrawal`].
    pub async fn withdraw_funds(
        &self,
        principal: &AuthenticatedPrincipal,
        amount: BigDecimal,
        payment_method_id: Uuid,
    ) -> Result<Transaction, AppError> {
        validate_amount(&amount)?;
        if amount < self.fees.minimum_withdrawal {
            return Err(AppError::Validation(format!(
                "minimum withdrawal is {}",
                self.fees.minimum_withdrawal
            )));
        }
        let method = self
            .require_payment_method(payment_method_id, principal)
            .await?;

        let fee = apply_rate(&amount, &self.fees.withdrawal_fee_rate);
        let negated = -amount.clone();

        let mut db_tx = self.pool.begin().await?;
        queries::get_or_create_wallet(&mut db_tx, principal.user_id).await?;
        queries::adjust_balance(&mut db_tx, principal.user_id, &negated, &zero(), &zero())
            .await?
            .ok_or_else(|| {
                AppError::InsufficientFunds(format!("cannot withdraw {}", amount))
            })?;

        let record = Transaction::new(
            principal.user_id,
            TransactionType::Withdrawal,
            TransactionStatus::Pending,
            amount,
            fee,
        )
        .with_payment_method(method.id);

        let inserted = queries::insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await?;

        tracing::info!(
            "withdrawal {} pending review for {}",
            inserted.transaction_id,
            principal.user_id
        );
        Ok(inserted)
    }

    /// Advances a pending withdrawal after review. Rejection refunds the
    /// reserved amount in the same atomic unit that records the failure.
    pub async fn finalize_withdrawal(
        &self,
        transaction_id: &str,
        approve: bool,
    ) -> Result<Transaction, AppError> {
        let mut db_tx = self.pool.begin().await?;

        let existing = queries::lock_transaction_by_public_id(&mut db_tx, transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("transaction {}", transaction_id)))?;

        if existing.tx_type != TransactionType::Withdrawal {
            return Err(AppError::Validation(format!(
                "{} is not a withdrawal",
                transaction_id
            )));
        }

        let status = if approve {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };

        let updated = queries::mark_transaction_terminal(
            &mut db_tx,
            existing.id,
            status,
            Some(json!({"reviewed": true})),
        )
        .await?
        .ok_or_else(|| AppError::AlreadyProcessed(transaction_id.to_string()))?;

        if !approve {
            queries::adjust_balance(&mut db_tx, existing.user_id, &existing.amount, &zero(), &zero())
                .await?
                .ok_or_else(|| AppError::Internal("withdrawal refund rejected".to_string()))?;
        }

        db_tx.commit().await?;

        tracing::info!("withdrawal {} finalized as {:?}", transaction_id, status);
        self.notifier.transaction_terminal(&updated);
        Ok(updated)
    }

    /// Creates a provider-side PayPal order and records it as a pending
    /// deposit. The gateway call runs before the atomic unit opens.
    pub async fn create_paypal_order(
        &self,
        principal: &AuthenticatedPrincipal,
        amount: BigDecimal,
    ) -> Result<(OrderRef, Transaction), AppError> {
        validate_amount(&amount)?;

        let reference = generate_transaction_id(TransactionType::Deposit);
        let order = self.paypal.create_order(&amount, &reference).await?;

        let record = Transaction::new(
            principal.user_id,
            TransactionType::Deposit,
            TransactionStatus::Pending,
            amount,
            zero(),
        )
        .with_transaction_id(reference)
        .with_external_order(order.order_id.clone())
        .with_metadata(json!({
            "paypal_order_status": order.status,
            "approval_url": order.approval_url,
        }));

        let mut db_tx = self.pool.begin().await?;
        let inserted = queries::insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await?;

        tracing::info!(
            "paypal order {} created for {}",
            order.order_id,
            principal.user_id
        );
        Ok((order, inserted))
    }

    /// Captures an approved PayPal order. The capture call completes before
    /// the atomic unit opens; the pending-only status flip makes the credit
    /// happen at most once even under concurrent capture requests.
    pub async fn capture_paypal_payment(
        &self,
        principal: &AuthenticatedPrincipal,
        order_id: &str,
    ) -> Result<Transaction, AppError> {
        let existing = queries::find_transaction_by_external_order(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;

        if existing.user_id != principal.user_id && !principal.is_admin() {
            return Err(AppError::Forbidden("order belongs to another user".to_string()));
        }
        if existing.status != TransactionStatus::Pending {
            return Err(AppError::AlreadyProcessed(existing.transaction_id));
        }

        match self.paypal.capture_order(order_id).await {
            Ok(captured) => {
                let mut db_tx = self.pool.begin().await?;

                let updated = queries::mark_transaction_terminal(
                    &mut db_tx,
                    existing.id,
                    TransactionStatus::Completed,
                    Some(json!({
                        "paypal_capture_id": captured.external_transaction_id,
                        "paypal_status": captured.status,
                    })),
                )
                .await?
                .ok_or_else(|| AppError::AlreadyProcessed(existing.transaction_id.clone()))?;

                queries::get_or_create_wallet(&mut db_tx, existing.user_id).await?;
                queries::adjust_balance(
                    &mut db_tx,
                    existing.user_id,
                    &captured.amount,
                    &zero(),
                    &zero(),
                )
                .await?
                .ok_or_else(|| AppError::Internal("wallet credit rejected".to_string()))?;

                db_tx.commit().await?;

                tracing::info!("paypal order {} captured and credited", order_id);
                self.notifier.transaction_terminal(&updated);
                Ok(updated)
            }
            Err(gateway_error) => {
                // Wallet untouched; record the provider failure on the
                // transaction so diagnostics survive.
                let mut db_tx = self.pool.begin().await?;
                let failed = queries::mark_transaction_terminal(
                    &mut db_tx,
                    existing.id,
                    TransactionStatus::Failed,
                    Some(json!({
                        "error": gateway_error.to_string(),
                        "provider_status": gateway_error.provider_status(),
                    })),
                )
                .await?;
                db_tx.commit().await?;

                tracing::warn!("paypal capture failed for {}: {}", order_id, gateway_error);
                if let Some(failed) = failed {
                    self.notifier.transaction_terminal(&failed);
                }
                Err(AppError::Gateway(gateway_error))
            }
        }
    }

    pub async fn create_invoice(
        &self,
        principal: &AuthenticatedPrincipal,
        input: CreateInvoiceInput,
    ) -> Result<Invoice, AppError> {
        validate_amount(&input.subtotal)?;
        if input.tax < zero() {
            return Err(AppError::InvalidAmount("tax cannot be negative".to_string()));
        }
        if input.payer_id == principal.user_id {
            return Err(AppError::Validation(
                "an invoice cannot bill its own payee".to_string(),
            ));
        }

        let total = input.subtotal.clone() + input.tax.clone();
        let platform_fee = apply_rate(&total, &self.fees.platform_fee_rate);
        let token = Uuid::new_v4().simple().to_string().to_uppercase();
        let now = chrono::Utc::now();

        let invoice = Invoice {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-{}", &token[..10]),
            payer_id: input.payer_id,
            payee_id: principal.user_id,
            line_items: input.line_items,
            subtotal: input.subtotal,
            tax: input.tax,
            total,
            platform_fee,
            status: InvoiceStatus::Pending,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        let inserted = queries::insert_invoice(&self.pool, &invoice).await?;
        Ok(inserted)
    }

    /// Settles an invoice from the payer's wallet. One logical payment always
    /// produces two ledger entries, net transfer plus platform fee, whose
    /// amounts sum to the gross total.
    pub async fn pay_invoice(
        &self,
        principal: &AuthenticatedPrincipal,
        invoice_id: Uuid,
        payment_method_id: Option<Uuid>,
    ) -> Result<(Invoice, Transaction), AppError> {
        let method = match payment_method_id {
            Some(id) => Some(self.require_payment_method(id, principal).await?),
            None => None,
        };

        let mut db_tx = self.pool.begin().await?;

        let invoice = queries::get_invoice_for_update(&mut db_tx, invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invoice {}", invoice_id)))?;

        if invoice.payer_id != principal.user_id {
            return Err(AppError::Forbidden(
                "invoice is billed to another user".to_string(),
            ));
        }
        if invoice.status != InvoiceStatus::Pending {
            return Err(AppError::AlreadyProcessed(invoice.invoice_number));
        }

        let total = invoice.total.clone();
        let net = invoice.total.clone() - invoice.platform_fee.clone();
        let negated_total = -total.clone();

        queries::get_or_create_wallet(&mut db_tx, invoice.payer_id).await?;
        queries::get_or_create_wallet(&mut db_tx, invoice.payee_id).await?;

        queries::adjust_balance(&mut db_tx, invoice.payer_id, &negated_total, &zero(), &total)
            .await?
            .ok_or_else(|| {
                AppError::InsufficientFunds(format!(
                    "wallet does not cover invoice total {}",
                    invoice.total
                ))
            })?;

        queries::adjust_balance(&mut db_tx, invoice.payee_id, &net, &net, &zero())
            .await?
            .ok_or_else(|| AppError::Internal("payee credit rejected".to_string()))?;

        let mut payment = Transaction::new(
            invoice.payer_id,
            TransactionType::Payment,
            TransactionStatus::Completed,
            net.clone(),
            zero(),
        )
        .with_counterparty(invoice.payee_id)
        .with_invoice(invoice.id)
        .with_metadata(json!({"invoice_number": invoice.invoice_number.clone()}));
        if let Some(method) = method {
            payment = payment.with_payment_method(method.id);
        }
        let payment = queries::insert_transaction(&mut db_tx, &payment).await?;

        // fee rows carry a positive amount; a zero-fee schedule records none
        let fee_record = if invoice.platform_fee > zero() {
            let record = Transaction::new(
                invoice.payee_id,
                TransactionType::Fee,
                TransactionStatus::Completed,
                invoice.platform_fee.clone(),
                zero(),
            )
            .with_invoice(invoice.id)
            .with_metadata(json!({"invoice_number": invoice.invoice_number.clone()}));
            Some(queries::insert_transaction(&mut db_tx, &record).await?)
        } else {
            None
        };

        let paid = queries::mark_invoice_paid(&mut db_tx, invoice.id, payment.id)
            .await?
            .ok_or_else(|| AppError::AlreadyProcessed(invoice.invoice_number.clone()))?;

        db_tx.commit().await?;

        tracing::info!(
            "invoice {} paid: {} to payee, {} platform fee",
            paid.invoice_number,
            net,
            paid.platform_fee
        );
        self.notifier.transaction_terminal(&payment);
        if let Some(fee_record) = &fee_record {
            self.notifier.transaction_terminal(fee_record);
        }
        Ok((paid, payment))
    }

    /// Releases escrowed milestone funds, at most once per milestone. The
    /// escrow_releases primary key turns a double release into
    /// `AlreadyReleased` instead of a double payment.
    pub async fn release_milestone(
        &self,
        principal: &AuthenticatedPrincipal,
        milestone_id: Uuid,
        grant: MilestoneGrant,
    ) -> Result<Transaction, AppError> {
        validate_amount(&grant.amount)?;
        if principal.user_id != grant.client_id && !principal.is_admin() {
            return Err(AppError::Forbidden(
                "only the funding client may release this milestone".to_string(),
            ));
        }

        let platform_fee = apply_rate(&grant.amount, &self.fees.platform_fee_rate);
        let net = grant.amount.clone() - platform_fee.clone();
        let negated_amount = -grant.amount.clone();

        let mut db_tx = self.pool.begin().await?;

        queries::get_or_create_wallet(&mut db_tx, grant.client_id).await?;
        queries::get_or_create_wallet(&mut db_tx, grant.freelancer_id).await?;

        let release = Transaction::new(
            grant.client_id,
            TransactionType::MilestoneRelease,
            TransactionStatus::Completed,
            net.clone(),
            zero(),
        )
        .with_counterparty(grant.freelancer_id)
        .with_milestone(milestone_id);
        let release = queries::insert_transaction(&mut db_tx, &release).await?;

        queries::insert_escrow_release(&mut db_tx, milestone_id, release.id)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::AlreadyReleased(format!("milestone {}", milestone_id))
                }
                _ => AppError::Database(e),
            })?;

        queries::adjust_balance(
            &mut db_tx,
            grant.client_id,
            &negated_amount,
            &zero(),
            &grant.amount,
        )
        .await?
        .ok_or_else(|| {
            AppError::InsufficientFunds(format!(
                "wallet does not cover milestone amount {}",
                grant.amount
            ))
        })?;

        queries::adjust_balance(&mut db_tx, grant.freelancer_id, &net, &net, &zero())
            .await?
            .ok_or_else(|| AppError::Internal("freelancer credit rejected".to_string()))?;

        let fee_record = if platform_fee > zero() {
            let record = Transaction::new(
                grant.freelancer_id,
                TransactionType::Fee,
                TransactionStatus::Completed,
                platform_fee,
                zero(),
            )
            .with_milestone(milestone_id);
            Some(queries::insert_transaction(&mut db_tx, &record).await?)
        } else {
            None
        };

        db_tx.commit().await?;

        tracing::info!(
            "milestone {} released: {} to freelancer {}",
            milestone_id,
            net,
            grant.freelancer_id
        );
        self.notifier.transaction_terminal(&release);
        if let Some(fee_record) = &fee_record {
            self.notifier.transaction_terminal(fee_record);
        }
        Ok(release)
    }

    /// Converts wallet balance into a gift card. The external commitment is
    /// validated before funds leave the wallet: the issuance call happens
    /// first, and only on success does the debit run.
    pub async fn withdraw_as_gift_card(
        &self,
        principal: &AuthenticatedPrincipal,
        request: GiftCardWithdrawal,
    ) -> Result<Transaction, AppError> {
        validate_amount(&request.amount)?;
        validation::validate_required("campaign_id", &request.campaign_id)?;
        validation::validate_max_len(
            "campaign_id",
            &request.campaign_id,
            validation::CAMPAIGN_ID_MAX_LEN,
        )?;
        validation::validate_email("recipient_email", &request.recipient_email)?;
        validation::validate_required("recipient_name", &request.recipient_name)?;
        validation::validate_max_len(
            "recipient_name",
            &request.recipient_name,
            validation::RECIPIENT_NAME_MAX_LEN,
        )?;

        let wallet = queries::fetch_wallet(&self.pool, principal.user_id).await?;
        let balance = wallet.map(|w| w.balance).unwrap_or_else(zero);
        if balance < request.amount {
            return Err(AppError::InsufficientFunds(format!(
                "balance {} does not cover {}",
                balance, request.amount
            )));
        }

        // The generated transaction id doubles as the provider-side dedup
        // reference; a retried request reuses the provider's original order.
        let reference = generate_transaction_id(TransactionType::GiftCard);
        let order = GiftCardOrder {
            reference_id: reference.clone(),
            campaign_id: request.campaign_id.clone(),
            amount: request.amount.clone(),
            recipient_email: request.recipient_email.clone(),
            recipient_name: request.recipient_name.clone(),
            message: request.message.clone(),
        };

        let receipt = self.giftcard.issue_gift_card(&order).await?;

        let negated = -request.amount.clone();
        let metadata = json!({
            "campaign_id": request.campaign_id,
            "recipient_email": request.recipient_email,
            "giftogram_status": receipt.status,
        });

        let mut db_tx = self.pool.begin().await?;
        queries::get_or_create_wallet(&mut db_tx, principal.user_id).await?;

        let debited =
            queries::adjust_balance(&mut db_tx, principal.user_id, &negated, &zero(), &zero())
                .await?;

        if debited.is_none() {
            // The card is already issued but a concurrent operation drained
            // the wallet; keep the order id on a failed row for reconciliation.
            let failed = Transaction::new(
                principal.user_id,
                TransactionType::GiftCard,
                TransactionStatus::Failed,
                request.amount.clone(),
                zero(),
            )
            .with_transaction_id(reference)
            .with_external_order(receipt.external_order_id.clone())
            .with_metadata(json!({
                "campaign_id": request.campaign_id,
                "error": "balance drained before debit",
            }));
            let failed = queries::insert_transaction(&mut db_tx, &failed).await?;
            db_tx.commit().await?;

            tracing::error!(
                "gift card {} issued but wallet debit rejected for {}",
                receipt.external_order_id,
                principal.user_id
            );
            self.notifier.transaction_terminal(&failed);
            return Err(AppError::InsufficientFunds(format!(
                "cannot withdraw {}",
                request.amount
            )));
        }

        let record = Transaction::new(
            principal.user_id,
            TransactionType::GiftCard,
            TransactionStatus::Completed,
            request.amount,
            zero(),
        )
        .with_transaction_id(reference)
        .with_external_order(receipt.external_order_id)
        .with_metadata(metadata);

        let inserted = queries::insert_transaction(&mut db_tx, &record).await?;
        db_tx.commit().await?;

        tracing::info!(
            "gift card withdrawal {} completed for {}",
            inserted.transaction_id,
            principal.user_id
        );
        self.notifier.transaction_terminal(&inserted);
        Ok(inserted)
    }

    // --- Payment methods ---

    pub async fn list_payment_methods(
        &self,
        principal: &AuthenticatedPrincipal,
    ) -> Result<Vec<PaymentMethod>, AppError> {
        Ok(queries::list_payment_methods(&self.pool, principal.user_id).await?)
    }

    pub async fn add_payment_method(
        &self,
        principal: &AuthenticatedPrincipal,
        method: PaymentMethod,
    ) -> Result<PaymentMethod, AppError> {
        validation::validate_required("label", &method.label)?;
        validation::validate_max_len("label", &method.label, validation::LABEL_MAX_LEN)?;
        validation::validate_required("external_ref", &method.external_ref)?;

        let mut db_tx = self.pool.begin().await?;
        let inserted = queries::insert_payment_method(&mut db_tx, &method).await?;
        db_tx.commit().await?;
        tracing::info!("payment method {} added for {}", inserted.id, principal.user_id);
        Ok(inserted)
    }

    pub async fn remove_payment_method(
        &self,
        principal: &AuthenticatedPrincipal,
        id: Uuid,
    ) -> Result<PaymentMethod, AppError> {
        let mut db_tx = self.pool.begin().await?;
        let deleted = queries::delete_payment_method(&mut db_tx, id, principal.user_id)
            .await?
            .ok_or_else(|| AppError::PaymentMethodNotFound(id.to_string()))?;
        db_tx.commit().await?;
        Ok(deleted)
    }

    async fn require_payment_method(
        &self,
        id: Uuid,
        principal: &AuthenticatedPrincipal,
    ) -> Result<PaymentMethod, AppError> {
        let method = queries::get_payment_method(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::PaymentMethodNotFound(id.to_string()))?;

        if method.user_id != principal.user_id {
            return Err(AppError::Forbidden(
                "payment method belongs to another user".to_string(),
            ));
        }

        Ok(method)
    }
}

fn validate_amount(amount: &BigDecimal) -> Result<(), AppError> {
    validation::validate_positive_amount(amount)
        .map_err(|e| AppError::InvalidAmount(e.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn one_percent_withdrawal_fee() {
        let fee = apply_rate(&dec("30"), &dec("0.01"));
        assert_eq!(fee, dec("0.30"));
        assert_eq!(dec("30") - fee, dec("29.70"));
    }

    #[test]
    fn ten_percent_platform_fee() {
        let fee = apply_rate(&dec("500"), &dec("0.10"));
        assert_eq!(fee, dec("50.00"));
    }

    #[test]
    fn fee_rounds_to_cents() {
        let fee = apply_rate(&dec("33.33"), &dec("0.01"));
        assert_eq!(fee, dec("0.33"));

        let fee = apply_rate(&dec("99.99"), &dec("0.015"));
        assert_eq!(fee, dec("1.50"));
    }

    #[test]
    fn net_plus_fee_conserves_gross() {
        let gross = dec("512.77");
        let fee = apply_rate(&gross, &dec("0.10"));
        let net = gross.clone() - fee.clone();
        assert_eq!(net + fee, gross);
    }

    #[test]
    fn invalid_amounts_rejected() {
        assert!(matches!(
            validate_amount(&dec("0")),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_amount(&dec("-5")),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(validate_amount(&dec("0.01")).is_ok());
    }
}
