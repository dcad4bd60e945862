pub mod debts;
pub mod expenses;
pub mod groups;
pub mod reports;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::Account;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::store::LedgerStore;

const MAX_AMOUNT: i64 = 1_000_000;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The settlement core: debt and group-share state machines, the split
/// allocator and the ledger aggregator, generic over the storage backend and
/// the push channel.
pub struct LedgerService<S: LedgerStore, N: Notifier> {
    store: S,
    notifier: N,
}

impl<S: LedgerStore, N: Notifier> LedgerService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        LedgerService { store, notifier }
    }

    pub async fn register_account(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Account, LedgerError> {
        self.validate_text("username", username, 100)?;
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(LedgerError::InvalidInput(format!(
                "invalid email format: {email}"
            )));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email: email.to_string(),
        };
        if !self.store.insert_account(account.clone()).await? {
            return Err(LedgerError::EmailAlreadyRegistered(email.to_string()));
        }
        Ok(account)
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LedgerError> {
        self.store.get_account(account_id).await
    }

    pub async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Account>, LedgerError> {
        self.store.get_account_by_email(email).await
    }

    async fn require_account(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.store
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Fire-and-forget push dispatch. Always called after the store mutation
    /// committed; a notifier failure is logged and swallowed so it can never
    /// fail or roll back the transition.
    async fn dispatch(&self, user_id: &str, title: &str, body: &str, payload: serde_json::Value) {
        if let Err(err) = self.notifier.notify(user_id, title, body, payload).await {
            warn!(user_id, error = %err, "notification dispatch failed");
        }
    }

    fn validate_amount(&self, field: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "{field} must be greater than 0"
            )));
        }
        self.validate_amount_shape(field, amount)
    }

    fn validate_target_amount(&self, field: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "{field} must be non-negative"
            )));
        }
        self.validate_amount_shape(field, amount)
    }

    fn validate_amount_shape(&self, field: &str, amount: Decimal) -> Result<(), LedgerError> {
        if amount > Decimal::from(MAX_AMOUNT) {
            return Err(LedgerError::InvalidAmount(format!(
                "{field} cannot exceed {MAX_AMOUNT}"
            )));
        }
        if amount.normalize().scale() > 2 {
            return Err(LedgerError::InvalidAmount(format!(
                "{field} cannot have more than 2 decimal places"
            )));
        }
        Ok(())
    }

    fn validate_text(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::InvalidInput(format!("{field} cannot be empty")));
        }
        if value.len() > max_length {
            return Err(LedgerError::InvalidInput(format!(
                "{field} cannot exceed {max_length} characters"
            )));
        }
        Ok(())
    }

    fn parse_date(&self, field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, LedgerError> {
        value.map(|v| self.parse_required_date(field, v)).transpose()
    }

    fn parse_required_date(&self, field: &str, value: &str) -> Result<NaiveDate, LedgerError> {
        NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|_| LedgerError::InvalidDate(format!("invalid {field} format: {value}")))
    }
}
