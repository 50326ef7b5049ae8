use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{Config, Error as FailsafeError, StateMachine, backoff, failure_policy};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::{
    GatewayError, GiftCardOrder, GiftCardReceipt, OrderRef, PaymentGateway, RemoteOrderStatus,
};

const PROVIDER: &str = "giftogram";

/// HTTP client for the Giftogram order API.
#[derive(Clone)]
pub struct GiftogramClient {
    client: Client,
    base_url: String,
    api_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl GiftogramClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        GiftogramClient {
            client,
            base_url,
            api_key,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for GiftogramClient {
    async fn create_order(
        &self,
        _amount: &BigDecimal,
        _reference_id: &str,
    ) -> Result<OrderRef, GatewayError> {
        Err(GatewayError::Unsupported(PROVIDER))
    }

    async fn capture_order(&self, _order_id: &str) -> Result<super::CapturedOrder, GatewayError> {
        Err(GatewayError::Unsupported(PROVIDER))
    }

    async fn issue_gift_card(&self, order: &GiftCardOrder) -> Result<GiftCardReceipt, GatewayError> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = self.api_url("/api/v1/order");
        let body = json!({
            "external_id": order.reference_id,
            "campaign_id": order.campaign_id,
            "denomination": order.amount.to_string(),
            "message": order.message.clone().unwrap_or_default(),
            "recipients": [{
                "email": order.recipient_email,
                "name": order.recipient_name,
            }],
        });

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header("Authorization", api_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(request_error)?;

                if !response.status().is_success() {
                    return Err(error_from_response(response).await);
                }

                let value: serde_json::Value = response.json().await.map_err(request_error)?;
                parse_receipt(&value)
            })
            .await;

        unwrap_breaker(result)
    }

    async fn get_order_status(
        &self,
        external_order_id: &str,
    ) -> Result<RemoteOrderStatus, GatewayError> {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let url = self.api_url(&format!("/api/v1/order?order_id={}", external_order_id));
        let order_id = external_order_id.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .get(&url)
                    .header("Authorization", api_key)
                    .send()
                    .await
                    .map_err(request_error)?;

                if !response.status().is_success() {
                    return Err(error_from_response(response).await);
                }

                let value: serde_json::Value = response.json().await.map_err(request_error)?;
                let data = order_data(&value).ok_or_else(|| GatewayError::InvalidResponse {
                    provider: PROVIDER,
                    message: "status response missing data".to_string(),
                })?;

                let status = data["status"].as_str().unwrap_or("unknown").to_string();

                Ok(RemoteOrderStatus {
                    external_order_id: order_id,
                    status,
                    raw: data.clone(),
                })
            })
            .await;

        unwrap_breaker(result)
    }
}

fn request_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Provider {
        provider: PROVIDER,
        message: e.to_string(),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

async fn error_from_response(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value["message"]
                .as_str()
                .or_else(|| value["error"].as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail provided".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    GatewayError::Provider {
        provider: PROVIDER,
        message,
        status_code: Some(status),
    }
}

fn unwrap_breaker<T>(result: Result<T, FailsafeError<GatewayError>>) -> Result<T, GatewayError> {
    match result {
        Ok(value) => Ok(value),
        Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen(PROVIDER)),
        Err(FailsafeError::Inner(e)) => Err(e),
    }
}

/// Giftogram wraps results in `data`, which is sometimes a bare object and
/// sometimes a one-element array. Normalize before reading fields.
fn order_data(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match &value["data"] {
        serde_json::Value::Array(items) => items.first(),
        serde_json::Value::Null => None,
        other => Some(other),
    }
}

fn parse_receipt(value: &serde_json::Value) -> Result<GiftCardReceipt, GatewayError> {
    let data = order_data(value).ok_or_else(|| GatewayError::InvalidResponse {
        provider: PROVIDER,
        message: "order response missing data".to_string(),
    })?;

    let external_order_id = data["order_id"]
        .as_str()
        .or_else(|| data["id"].as_str())
        .ok_or_else(|| GatewayError::InvalidResponse {
            provider: PROVIDER,
            message: "order response missing order_id".to_string(),
        })?
        .to_string();

    let status = data["status"].as_str().unwrap_or("pending").to_string();

    Ok(GiftCardReceipt {
        external_order_id,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_starts_with_closed_breaker() {
        let client = GiftogramClient::new(
            "https://api.giftogram.com".to_string(),
            "api-key".to_string(),
        );
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn parses_receipt_from_object_data() {
        let value = json!({
            "success": true,
            "data": {"order_id": "go-123", "status": "processing"}
        });

        let receipt = parse_receipt(&value).unwrap();
        assert_eq!(receipt.external_order_id, "go-123");
        assert_eq!(receipt.status, "processing");
    }

    #[test]
    fn parses_receipt_from_array_data() {
        let value = json!({
            "success": true,
            "data": [{"id": "go-456", "status": "delivered"}]
        });

        let receipt = parse_receipt(&value).unwrap();
        assert_eq!(receipt.external_order_id, "go-456");
        assert_eq!(receipt.status, "delivered");
    }

    #[test]
    fn rejects_receipt_without_data() {
        let value = json!({"success": false});
        assert!(matches!(
            parse_receipt(&value),
            Err(GatewayError::InvalidResponse { .. })
        ));
    }
}
