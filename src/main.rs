use clap::Parser;
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payline_core::cli::{Cli, Commands, DbCommands, TxCommands, WithdrawalCommands};
use payline_core::config::Config;
use payline_core::gateway::{GiftogramClient, PayPalClient, PaymentGateway};
use payline_core::services::{Notifier, ReconciliationService, TransactionOrchestrator};
use payline_core::{AppState, cli, create_app, db, startup};

fn build_state(pool: sqlx::PgPool, config: &Config) -> AppState {
    let paypal: Arc<dyn PaymentGateway> = Arc::new(PayPalClient::new(
        config.paypal_api_url.clone(),
        config.paypal_client_id.clone(),
        config.paypal_client_secret.clone(),
    ));
    let giftcard: Arc<dyn PaymentGateway> = Arc::new(GiftogramClient::new(
        config.giftogram_api_url.clone(),
        config.giftogram_api_key.clone(),
    ));
    let notifier = Notifier::new(config.notification_url.clone());

    let orchestrator = Arc::new(TransactionOrchestrator::new(
        pool.clone(),
        paypal.clone(),
        giftcard.clone(),
        config.fees.clone(),
        notifier,
    ));
    let reconciliation = Arc::new(ReconciliationService::new(pool.clone(), paypal, giftcard));

    AppState {
        db: pool,
        orchestrator,
        reconciliation,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::create_pool(&config).await?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let migrator = Migrator::new(Path::new("./migrations")).await?;
            migrator.run(&pool).await?;
            tracing::info!("database migrations completed");

            let state = build_state(pool, &config);
            let app = create_app(state);

            let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
            tracing::info!("listening on {}", addr);

            axum::Server::bind(&addr)
                .serve(app.into_make_service())
                .await?;
        }
        Commands::Db(DbCommands::Migrate) => {
            let migrator = Migrator::new(Path::new("./migrations")).await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::Config => {
            let report = startup::validate_environment(&config, &pool).await?;
            report.print();
            if !report.is_valid() {
                anyhow::bail!("configuration validation failed");
            }
        }
        Commands::Withdrawal(command) => {
            let state = build_state(pool, &config);
            let (transaction_id, approve) = match command {
                WithdrawalCommands::Approve { transaction_id } => (transaction_id, true),
                WithdrawalCommands::Reject { transaction_id } => (transaction_id, false),
            };
            cli::handle_withdrawal_review(&state.orchestrator, &transaction_id, approve).await?;
        }
        Commands::Tx(TxCommands::Stuck { minutes }) => {
            cli::handle_tx_stuck(&pool, minutes).await?;
        }
    }

    Ok(())
}
