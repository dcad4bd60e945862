use serde::Serialize;
use thiserror::Error;

/// User-facing failures of ledger operations. All variants except
/// `StoreError` and `NotificationError` map to a 4xx-equivalent outcome and
/// must not be retried. `StoreError` is the 5xx-equivalent wrapper for any
/// underlying storage failure; `NotificationError` never leaves the service,
/// it is logged and swallowed.
#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account {0} not found")]
    AccountNotFound(String),

    #[error("Debt {0} not found")]
    DebtNotFound(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Member {0} not found in group")]
    MemberNotFound(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Precondition on the current status was not met, or a concurrent
    /// transition won the race.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shares do not decompose the expense total.
    #[error("Share mismatch: {0}")]
    ShareMismatch(String),

    #[error("Account {0} is already a group member")]
    AlreadyMember(String),

    #[error("Debt {0} is already marked as paid")]
    AlreadyPaid(String),

    /// Mutation attempted on a finalized entity.
    #[error("Immutable: {0}")]
    Immutable(String),

    #[error("Proof image URL is required")]
    MissingProof,

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}
