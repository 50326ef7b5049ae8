use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Payment,
    Fee,
    MilestoneRelease,
    GiftCard,
}

impl TransactionType {
    /// Prefix encoded into the human-readable transaction id.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEP",
            TransactionType::Withdrawal => "WTH",
            TransactionType::Payment => "PAY",
            TransactionType::Fee => "FEE",
            TransactionType::MilestoneRelease => "MLS",
            TransactionType::GiftCard => "GFT",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "payment" => Ok(TransactionType::Payment),
            "fee" => Ok(TransactionType::Fee),
            "milestone_release" => Ok(TransactionType::MilestoneRelease),
            "gift_card" => Ok(TransactionType::GiftCard),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Paypal,
    Bank,
}

/// Generates a human-readable transaction id whose prefix encodes the kind,
/// e.g. `WTH-3F9A1C0B2D4E6F80`.
pub fn generate_transaction_id(tx_type: TransactionType) -> String {
    let token = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}", tx_type.id_prefix(), &token[..16])
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: BigDecimal,
    pub total_earned: BigDecimal,
    pub total_spent: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_id: String,
    pub user_id: Uuid,
    pub counterparty_id: Option<Uuid>,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: BigDecimal,
    pub fee: BigDecimal,
    pub net_amount: BigDecimal,
    pub invoice_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub external_order_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        tx_type: TransactionType,
        status: TransactionStatus,
        amount: BigDecimal,
        fee: BigDecimal,
    ) -> Self {
        let now = Utc::now();
        let net_amount = amount.clone() - fee.clone();
        Self {
            id: Uuid::new_v4(),
            transaction_id: generate_transaction_id(tx_type),
            user_id,
            counterparty_id: None,
            tx_type,
            status,
            amount,
            fee,
            net_amount,
            invoice_id: None,
            milestone_id: None,
            payment_method_id: None,
            external_order_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: String) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    pub fn with_counterparty(mut self, counterparty_id: Uuid) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    pub fn with_invoice(mut self, invoice_id: Uuid) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn with_milestone(mut self, milestone_id: Uuid) -> Self {
        self.milestone_id = Some(milestone_id);
        self
    }

    pub fn with_payment_method(mut self, payment_method_id: Uuid) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    pub fn with_external_order(mut self, external_order_id: String) -> Self {
        self.external_order_id = Some(external_order_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub payer_id: Uuid,
    pub payee_id: Uuid,
    pub line_items: serde_json::Value,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub total: BigDecimal,
    pub platform_fee: BigDecimal,
    pub status: InvoiceStatus,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub method_type: PaymentMethodType,
    pub label: String,
    pub external_ref: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transaction_id_prefix_encodes_kind() {
        let id = generate_transaction_id(TransactionType::Withdrawal);
        assert!(id.starts_with("WTH-"));
        assert_eq!(id.len(), "WTH-".len() + 16);

        let id = generate_transaction_id(TransactionType::GiftCard);
        assert!(id.starts_with("GFT-"));
    }

    #[test]
    fn transaction_ids_are_unique() {
        let a = generate_transaction_id(TransactionType::Deposit);
        let b = generate_transaction_id(TransactionType::Deposit);
        assert_ne!(a, b);
    }

    #[test]
    fn net_amount_is_amount_minus_fee() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Withdrawal,
            TransactionStatus::Pending,
            BigDecimal::from_str("30").unwrap(),
            BigDecimal::from_str("0.30").unwrap(),
        );

        assert_eq!(tx.net_amount, BigDecimal::from_str("29.70").unwrap());
        assert_eq!(tx.amount, BigDecimal::from_str("30").unwrap());
    }

    #[test]
    fn builder_attaches_links() {
        let invoice_id = Uuid::new_v4();
        let counterparty = Uuid::new_v4();
        let tx = Transaction::new(
            Uuid::new_v4(),
            TransactionType::Payment,
            TransactionStatus::Completed,
            BigDecimal::from(450),
            BigDecimal::from(0),
        )
        .with_invoice(invoice_id)
        .with_counterparty(counterparty)
        .with_metadata(serde_json::json!({"source": "invoice"}));

        assert_eq!(tx.invoice_id, Some(invoice_id));
        assert_eq!(tx.counterparty_id, Some(counterparty));
        assert!(tx.metadata.is_some());
    }

    #[test]
    fn parses_transaction_type() {
        assert_eq!(
            TransactionType::from_str("gift_card").unwrap(),
            TransactionType::GiftCard
        );
        assert!(TransactionType::from_str("unknown").is_err());
    }
}
