use bigdecimal::BigDecimal;
use payline_core::gateway::{
    GatewayError, GiftCardOrder, GiftogramClient, PayPalClient, PaymentGateway,
};
use std::str::FromStr;

fn paypal_client(server: &mockito::ServerGuard) -> PayPalClient {
    PayPalClient::new(
        server.url(),
        "client-id".to_string(),
        "client-secret".to_string(),
    )
}

fn giftogram_client(server: &mockito::ServerGuard) -> GiftogramClient {
    GiftogramClient::new(server.url(), "api-key".to_string())
}

async fn token_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/v1/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"test-token","token_type":"Bearer","expires_in":32400}"#)
        .create_async()
        .await
}

#[tokio::test]
async fn paypal_creates_order_with_reference() {
    let mut server = mockito::Server::new_async().await;
    let _token = token_mock(&mut server).await;

    let _create = server
        .mock("POST", "/v2/checkout/orders")
        .match_header("authorization", "Bearer test-token")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "ORDER-1",
                "status": "CREATED",
                "links": [
                    {"rel": "approve", "href": "https://www.paypal.com/checkoutnow?token=ORDER-1"}
                ]
            }"#,
        )
        .create_async()
        .await;

    let client = paypal_client(&server);
    let order = client
        .create_order(&BigDecimal::from(100), "DEP-TESTREFERENCE1")
        .await
        .unwrap();

    assert_eq!(order.order_id, "ORDER-1");
    assert_eq!(order.status, "CREATED");
    assert!(order.approval_url.unwrap().contains("ORDER-1"));
}

#[tokio::test]
async fn paypal_captures_order_and_reports_amount() {
    let mut server = mockito::Server::new_async().await;
    let _token = token_mock(&mut server).await;

    let _capture = server
        .mock("POST", "/v2/checkout/orders/ORDER-1/capture")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "ORDER-1",
                "status": "COMPLETED",
                "purchase_units": [{
                    "payments": {
                        "captures": [{
                            "id": "CAPTURE-9",
                            "status": "COMPLETED",
                            "amount": {"currency_code": "USD", "value": "100.00"}
                        }]
                    }
                }]
            }"#,
        )
        .create_async()
        .await;

    let client = paypal_client(&server);
    let captured = client.capture_order("ORDER-1").await.unwrap();

    assert_eq!(captured.external_transaction_id, "CAPTURE-9");
    assert_eq!(captured.amount, BigDecimal::from_str("100.00").unwrap());
    assert_eq!(captured.status, "COMPLETED");
}

#[tokio::test]
async fn paypal_capture_failure_is_structured() {
    let mut server = mockito::Server::new_async().await;
    let _token = token_mock(&mut server).await;

    let _capture = server
        .mock("POST", "/v2/checkout/orders/ORDER-2/capture")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "name": "UNPROCESSABLE_ENTITY",
                "details": [{"issue": "ORDER_ALREADY_CAPTURED", "description": "Order already captured."}],
                "message": "The requested action could not be performed."
            }"#,
        )
        .create_async()
        .await;

    let client = paypal_client(&server);
    let result = client.capture_order("ORDER-2").await;

    match result {
        Err(GatewayError::Provider {
            message,
            status_code,
            ..
        }) => {
            assert_eq!(message, "Order already captured.");
            assert_eq!(status_code, Some(422));
        }
        other => panic!("expected provider error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn paypal_token_is_cached_between_calls() {
    let mut server = mockito::Server::new_async().await;

    let token = server
        .mock("POST", "/v1/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"test-token","token_type":"Bearer","expires_in":32400}"#)
        .expect(1)
        .create_async()
        .await;

    let _status = server
        .mock("GET", "/v2/checkout/orders/ORDER-3")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "ORDER-3", "status": "APPROVED"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = paypal_client(&server);
    client.get_order_status("ORDER-3").await.unwrap();
    client.get_order_status("ORDER-3").await.unwrap();

    token.assert_async().await;
}

#[tokio::test]
async fn paypal_does_not_issue_gift_cards() {
    let server = mockito::Server::new_async().await;
    let client = paypal_client(&server);

    let order = GiftCardOrder {
        reference_id: "GFT-TESTREFERENCE1".to_string(),
        campaign_id: "campaign-1".to_string(),
        amount: BigDecimal::from(25),
        recipient_email: "dev@example.com".to_string(),
        recipient_name: "Dev".to_string(),
        message: None,
    };

    assert!(matches!(
        client.issue_gift_card(&order).await,
        Err(GatewayError::Unsupported(_))
    ));
}

#[tokio::test]
async fn giftogram_issues_gift_card() {
    let mut server = mockito::Server::new_async().await;

    let _order = server
        .mock("POST", "/api/v1/order")
        .match_header("authorization", "api-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"order_id": "go-123", "status": "processing"}}"#)
        .create_async()
        .await;

    let client = giftogram_client(&server);
    let order = GiftCardOrder {
        reference_id: "GFT-TESTREFERENCE1".to_string(),
        campaign_id: "campaign-1".to_string(),
        amount: BigDecimal::from(50),
        recipient_email: "dev@example.com".to_string(),
        recipient_name: "Dev".to_string(),
        message: Some("thanks".to_string()),
    };

    let receipt = client.issue_gift_card(&order).await.unwrap();
    assert_eq!(receipt.external_order_id, "go-123");
    assert_eq!(receipt.status, "processing");
}

#[tokio::test]
async fn giftogram_reports_provider_error() {
    let mut server = mockito::Server::new_async().await;

    let _order = server
        .mock("POST", "/api/v1/order")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "message": "Campaign not found"}"#)
        .create_async()
        .await;

    let client = giftogram_client(&server);
    let order = GiftCardOrder {
        reference_id: "GFT-TESTREFERENCE2".to_string(),
        campaign_id: "missing".to_string(),
        amount: BigDecimal::from(50),
        recipient_email: "dev@example.com".to_string(),
        recipient_name: "Dev".to_string(),
        message: None,
    };

    match client.issue_gift_card(&order).await {
        Err(GatewayError::Provider {
            message,
            status_code,
            ..
        }) => {
            assert_eq!(message, "Campaign not found");
            assert_eq!(status_code, Some(400));
        }
        other => panic!("expected provider error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn giftogram_reads_order_status_from_array_payload() {
    let mut server = mockito::Server::new_async().await;

    let _status = server
        .mock("GET", "/api/v1/order")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": [{"order_id": "go-123", "status": "delivered"}]}"#)
        .create_async()
        .await;

    let client = giftogram_client(&server);
    let remote = client.get_order_status("go-123").await.unwrap();

    assert_eq!(remote.external_order_id, "go-123");
    assert_eq!(remote.status, "delivered");
}
