use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::errors::LedgerError;
use crate::infrastructure::notify::Notifier;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushMessage {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

/// Recording notifier for tests. Can be flipped into a failing mode to
/// exercise the swallow-and-log dispatch policy.
#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    sent: Arc<RwLock<Vec<PushMessage>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<PushMessage> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, user_id: &str) -> Vec<PushMessage> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::NotificationError(
                "push channel unavailable".to_string(),
            ));
        }
        self.sent.write().await.push(PushMessage {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            payload,
        });
        Ok(())
    }
}
