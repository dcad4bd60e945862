pub mod in_memory;

use async_trait::async_trait;

use crate::core::errors::LedgerError;

/// Best-effort push delivery to a user's devices. The service never lets a
/// notifier failure roll back or fail a ledger mutation: errors are logged
/// and swallowed, and dispatch happens only after the store call committed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<(), LedgerError>;
}
