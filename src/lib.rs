pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::services::{ReconciliationService, TransactionOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub reconciliation: Arc<ReconciliationService>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/wallet", get(handlers::wallet::get_wallet))
        .route("/funds/deposit", post(handlers::wallet::deposit))
        .route("/funds/withdraw", post(handlers::wallet::withdraw))
        .route("/invoices", post(handlers::invoices::create_invoice))
        .route("/invoices/:id", get(handlers::invoices::get_invoice))
        .route("/invoices/:id/pay", post(handlers::invoices::pay_invoice))
        .route("/paypal/create-order", post(handlers::paypal::create_order))
        .route("/paypal/capture", post(handlers::paypal::capture))
        .route("/milestones/:id/release", post(handlers::milestones::release))
        .route("/gift-cards/withdraw", post(handlers::giftcards::withdraw))
        .route(
            "/gift-cards/order/:order_id/status",
            get(handlers::giftcards::order_status),
        )
        .route("/gift-cards/history", get(handlers::giftcards::history))
        .route("/transactions", get(handlers::transactions::list))
        .route(
            "/transactions/:transaction_id/status",
            get(handlers::transactions::status),
        )
        .route(
            "/payment-methods",
            get(handlers::payment_methods::list).post(handlers::payment_methods::create),
        )
        .route(
            "/payment-methods/:id",
            delete(handlers::payment_methods::remove),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
