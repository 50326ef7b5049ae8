//! Gateway adapters for external payment rails. Adapters normalize provider
//! payloads into fixed result types at this boundary; shape ambiguity in a
//! provider response never reaches the orchestrator.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod giftcard;
pub mod paypal;

pub use giftcard::GiftogramClient;
pub use paypal::PayPalClient;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{provider} request failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
        status_code: Option<u16>,
    },

    #[error("invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("circuit breaker open for {0}")]
    CircuitOpen(&'static str),

    #[error("{0} does not support this operation")]
    Unsupported(&'static str),
}

impl GatewayError {
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            GatewayError::Provider { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Reference to a provider-side order created but not yet captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
    pub status: String,
    pub approval_url: Option<String>,
}

/// Result of capturing a previously created order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedOrder {
    pub external_transaction_id: String,
    pub amount: BigDecimal,
    pub status: String,
}

/// Caller-supplied gift-card issuance request. `reference_id` is the unique
/// external-facing identifier, so a retried request after a timeout does not
/// create a duplicate remote order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardOrder {
    pub reference_id: String,
    pub campaign_id: String,
    pub amount: BigDecimal,
    pub recipient_email: String,
    pub recipient_name: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GiftCardReceipt {
    pub external_order_id: String,
    pub status: String,
}

/// Snapshot of remote order state, used by the reconciliation layer. Reading
/// it never mutates provider state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderStatus {
    pub external_order_id: String,
    pub status: String,
    pub raw: serde_json::Value,
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: &BigDecimal,
        reference_id: &str,
    ) -> Result<OrderRef, GatewayError>;

    async fn capture_order(&self, order_id: &str) -> Result<CapturedOrder, GatewayError>;

    async fn issue_gift_card(&self, order: &GiftCardOrder) -> Result<GiftCardReceipt, GatewayError>;

    async fn get_order_status(
        &self,
        external_order_id: &str,
    ) -> Result<RemoteOrderStatus, GatewayError>;
}
