use serde_json::json;

use crate::db::models::Transaction;

/// Fire-and-forget delivery to the platform notification service. Delivery
/// failure must never roll back or fail the financial operation, so sends run
/// in a detached task and errors are only logged.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl Notifier {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Announces a transaction that reached a terminal state.
    pub fn transaction_terminal(&self, tx: &Transaction) {
        let Some(url) = self.url.clone() else {
            return;
        };

        let payload = json!({
            "event": "transaction.terminal",
            "transaction_id": tx.transaction_id,
            "user_id": tx.user_id,
            "counterparty_id": tx.counterparty_id,
            "type": tx.tx_type,
            "status": tx.status,
            "amount": tx.amount.to_string(),
            "net_amount": tx.net_amount.to_string(),
        });

        let client = self.client.clone();
        let transaction_id = tx.transaction_id.clone();

        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&payload).send().await {
                tracing::warn!(
                    "notification delivery failed for {}: {}",
                    transaction_id,
                    e
                );
            }
        });
    }
}
