pub mod notifier;
pub mod orchestrator;
pub mod reconciliation;

pub use notifier::Notifier;
pub use orchestrator::TransactionOrchestrator;
pub use reconciliation::ReconciliationService;
