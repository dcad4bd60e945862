use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A cost paid by one member on behalf of a group, decomposed into shares.
/// The shares of an expense at rest always sum to `total_amount` within the
/// 0.01 tolerance; the store only ever writes expense and shares together.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupExpense {
    pub id: String,
    pub group_id: String,
    pub payer_id: String,
    pub total_amount: Decimal,
    pub description: Option<String>,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// The portion of one expense attributed to one member.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub group_expense_id: String,
    pub account_id: String,
    pub shared_amount: Decimal,
}

/// Caller-supplied share of an expense, prior to validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareInput {
    pub account_id: String,
    pub shared_amount: Decimal,
}
