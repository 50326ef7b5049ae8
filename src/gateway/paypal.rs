use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{Config, Error as FailsafeError, StateMachine, backoff, failure_policy};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{CapturedOrder, GatewayError, OrderRef, PaymentGateway, RemoteOrderStatus};

const PROVIDER: &str = "paypal";

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// HTTP client for the PayPal Orders API. OAuth client-credentials tokens are
/// cached until shortly before expiry.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Arc<Mutex<Option<CachedToken>>>,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PayPalClient {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PayPalClient {
            client,
            base_url,
            client_id,
            client_secret,
            token: Arc::new(Mutex::new(None)),
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

    async fn access_token(&self) -> Result<String, GatewayError> {
        {
            let guard = self.token.lock().await;
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let response = self
            .client
            .post(self.api_url("/v1/oauth2/token"))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let token: TokenResponse = response.json().await.map_err(request_error)?;

        let mut guard = self.token.lock().await;
        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            // refresh a minute early so in-flight requests never race expiry
            expires_at: Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60)),
        });

        Ok(token.access_token)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for PayPalClient {
    async fn create_order(
        &self,
        amount: &BigDecimal,
        reference_id: &str,
    ) -> Result<OrderRef, GatewayError> {
        let token = self.access_token().await?;
        let client = self.client.clone();
        let url = self.api_url("/v2/checkout/orders");
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference_id,
                "amount": {
                    "currency_code": "USD",
                    "value": amount.to_string(),
                },
            }],
        });

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .bearer_auth(&token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(request_error)?;

                if !response.status().is_success() {
                    return Err(error_from_response(response).await);
                }

                let value: serde_json::Value = response.json().await.map_err(request_error)?;
                parse_order_ref(&value)
            })
            .await;

        unwrap_breaker(result)
    }

    async fn capture_order(&self, order_id: &str) -> Result<CapturedOrder, GatewayError> {
        let token = self.access_token().await?;
        let client = self.client.clone();
        let url = self.api_url(&format!("/v2/checkout/orders/{}/capture", order_id));

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .bearer_auth(&token)
                    .header("Content-Type", "application/json")
                    .send()
                    .await
                    .map_err(request_error)?;

                if !response.status().is_success() {
                    return Err(error_from_response(response).await);
                }

                let value: serde_json::Value = response.json().await.map_err(request_error)?;
                parse_captured_order(&value)
            })
            .await;

        unwrap_breaker(result)
    }

    async fn issue_gift_card(
        &self,
        _order: &super::GiftCardOrder,
    ) -> Result<super::GiftCardReceipt, GatewayError> {
        Err(GatewayError::Unsupported(PROVIDER))
    }

    async fn get_order_status(
        &self,
        external_order_id: &str,
    ) -> Result<RemoteOrderStatus, GatewayError> {
        let token = self.access_token().await?;
        let client = self.client.clone();
        let url = self.api_url(&format!("/v2/checkout/orders/{}", external_order_id));
        let order_id = external_order_id.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .get(&url)
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(request_error)?;

                if !response.status().is_success() {
                    return Err(error_from_response(response).await);
                }

                let value: serde_json::Value = response.json().await.map_err(request_error)?;
                let status = value["status"].as_str().unwrap_or("UNKNOWN").to_string();

                Ok(RemoteOrderStatus {
                    external_order_id: order_id,
                    status,
                    raw: value,
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

    GatewayError::Provider {
        provider: PROVIDER,
        message: extract_provider_message(&body),
        status_code: Some(status),
    }
}

/// PayPal error bodies vary: `message`, `error_description`, or a `details`
/// array. Pull the most specific field available.
fn extract_provider_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value["details"][0]["description"].as_str() {
            return detail.to_string();
        }
        if let Some(message) = value["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = value["error_description"].as_str() {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error detail provided".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

fn unwrap_breaker<T>(result: Result<T, FailsafeError<GatewayError>>) -> Result<T, GatewayError> {
    match result {
        Ok(value) => Ok(value),
        Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen(PROVIDER)),
        Err(FailsafeError::Inner(e)) => Err(e),
    }
}

/// Some PayPal fields arrive as an array in one API version and a bare object
/// in another; normalize to the first element either way.
fn first_element(value: &serde_json::Value) -> Option<&serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items.first(),
        serde_json::Value::Null => None,
        other => Some(other),
    }
}

fn parse_order_ref(value: &serde_json::Value) -> Result<OrderRef, GatewayError> {
    let order_id = value["id"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse {
            provider: PROVIDER,
            message: "order response missing id".to_string(),
        })?
        .to_string();

    let status = value["status"].as_str().unwrap_or("CREATED").to_string();

    let approval_url = value["links"]
        .as_array()
        .and_then(|links| {
            links
                .iter()
                .find(|link| link["rel"].as_str() == Some("approve"))
        })
        .and_then(|link| link["href"].as_str())
        .map(|href| href.to_string());

    Ok(OrderRef {
        order_id,
        status,
        approval_url,
    })
}

fn parse_captured_order(value: &serde_json::Value) -> Result<CapturedOrder, GatewayError> {
    let invalid = |message: &str| GatewayError::InvalidResponse {
        provider: PROVIDER,
        message: message.to_string(),
    };

    let unit = first_element(&value["purchase_units"])
        .ok_or_else(|| invalid("capture response missing purchase_units"))?;

    let capture = first_element(&unit["payments"]["captures"])
        .ok_or_else(|| invalid("capture response missing captures"))?;

    let external_transaction_id = capture["id"]
        .as_str()
        .ok_or_else(|| invalid("capture missing id"))?
        .to_string();

    let amount_raw = capture["amount"]["value"]
        .as_str()
        .ok_or_else(|| invalid("capture missing amount.value"))?;

    let amount = BigDecimal::from_str(amount_raw)
        .map_err(|e| invalid(&format!("capture amount is not a decimal: {}", e)))?;

    let status = capture["status"].as_str().unwrap_or("COMPLETED").to_string();

    Ok(CapturedOrder {
        external_transaction_id,
        amount,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_starts_with_closed_breaker() {
        let client = PayPalClient::new(
            "https://api-m.sandbox.paypal.com".to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
        );
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn parses_order_ref_with_approval_link() {
        let value = json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"rel": "self", "href": "https://api.paypal.com/v2/checkout/orders/5O190127TN364715T"},
                {"rel": "approve", "href": "https://www.paypal.com/checkoutnow?token=5O190127TN364715T"}
            ]
        });

        let order = parse_order_ref(&value).unwrap();
        assert_eq!(order.order_id, "5O190127TN364715T");
        assert_eq!(order.status, "CREATED");
        assert_eq!(
            order.approval_url.as_deref(),
            Some("https://www.paypal.com/checkoutnow?token=5O190127TN364715T")
        );
    }

    #[test]
    fn rejects_order_ref_without_id() {
        let value = json!({"status": "CREATED"});
        assert!(matches!(
            parse_order_ref(&value),
            Err(GatewayError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn parses_captured_order_from_array_shape() {
        let value = json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "3C679366HH908993F",
                        "status": "COMPLETED",
                        "amount": {"currency_code": "USD", "value": "100.00"}
                    }]
                }
            }]
        });

        let captured = parse_captured_order(&value).unwrap();
        assert_eq!(captured.external_transaction_id, "3C679366HH908993F");
        assert_eq!(captured.amount, BigDecimal::from_str("100.00").unwrap());
        assert_eq!(captured.status, "COMPLETED");
    }

    #[test]
    fn parses_captured_order_from_object_shape() {
        let value = json!({
            "purchase_units": {
                "payments": {
                    "captures": {
                        "id": "3C679366HH908993F",
                        "status": "COMPLETED",
                        "amount": {"value": "42.50"}
                    }
                }
            }
        });

        let captured = parse_captured_order(&value).unwrap();
        assert_eq!(captured.amount, BigDecimal::from_str("42.50").unwrap());
    }

    #[test]
    fn extracts_provider_message_from_details() {
        let body = r#"{"name":"UNPROCESSABLE_ENTITY","details":[{"issue":"ORDER_ALREADY_CAPTURED","description":"Order already captured."}],"message":"The requested action could not be performed."}"#;
        assert_eq!(extract_provider_message(body), "Order already captured.");
    }

    #[test]
    fn extracts_provider_message_fallback() {
        assert_eq!(
            extract_provider_message("not json at all"),
            "not json at all"
        );
        assert_eq!(extract_provider_message(""), "no error detail provided");
    }
}
