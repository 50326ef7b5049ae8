use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::error::AppError;
use crate::services::TransactionOrchestrator;
use crate::services::reconciliation;

#[derive(Parser)]
#[command(name = "payline-core")]
#[command(about = "Payline Core - Wallet and Transaction Ledger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Withdrawal review commands
    #[command(subcommand)]
    Withdrawal(WithdrawalCommands),

    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum WithdrawalCommands {
    /// Approve a pending withdrawal (funds were already reserved)
    Approve {
        /// Human-readable transaction id, e.g. WTH-3F9A1C0B2D4E6F80
        #[arg(value_name = "TRANSACTION_ID")]
        transaction_id: String,
    },

    /// Reject a pending withdrawal and refund the reserved amount
    Reject {
        #[arg(value_name = "TRANSACTION_ID")]
        transaction_id: String,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// List pending transactions older than the given age, for reconciliation
    Stuck {
        /// Minimum age in minutes
        #[arg(short, long, default_value = "60")]
        minutes: i32,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_withdrawal_review(
    orchestrator: &TransactionOrchestrator,
    transaction_id: &str,
    approve: bool,
) -> anyhow::Result<()> {
    match orchestrator
        .finalize_withdrawal(transaction_id, approve)
        .await
    {
        Ok(tx) => {
            println!(
                "Withdrawal {} marked {:?} (amount {}, net {})",
                tx.transaction_id, tx.status, tx.amount, tx.net_amount
            );
            Ok(())
        }
        Err(AppError::NotFound(msg)) => {
            anyhow::bail!("not found: {}", msg)
        }
        Err(AppError::AlreadyProcessed(msg)) => {
            anyhow::bail!("already processed: {}", msg)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_tx_stuck(pool: &PgPool, minutes: i32) -> anyhow::Result<()> {
    let stuck = reconciliation::list_stuck_pending(pool, minutes).await?;

    if stuck.is_empty() {
        println!("No pending transactions older than {} minutes", minutes);
        return Ok(());
    }

    println!("{} pending transaction(s):", stuck.len());
    for tx in stuck {
        println!(
            "  {}  {:?}  amount={}  user={}  external_order={}",
            tx.transaction_id,
            tx.tx_type,
            tx.amount,
            tx.user_id,
            tx.external_order_id.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
