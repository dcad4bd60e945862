use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the counterparty has acknowledged the debt itself.
/// Terminal once it leaves `Pending`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebtConfirmStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaidStatus {
    Unpaid,
    Paid,
}

/// The creditor's acknowledgement of a reported payment. Terminal once
/// `Confirmed`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentConfirmStatus {
    Unconfirmed,
    Confirmed,
}

/// A one-to-one obligation from `debtor_id` to `creditor_id`.
///
/// `confirm_status` and `payment_confirm_status` are independent axes, but the
/// service keeps the chain `payment confirmed => paid => accepted` intact: a
/// payment can only be reported on an accepted debt, and only a reported
/// payment can be confirmed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub confirm_status: DebtConfirmStatus,
    pub paid_status: PaidStatus,
    pub payment_confirm_status: PaymentConfirmStatus,
    pub proof_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Debt {
    pub fn is_party(&self, account_id: &str) -> bool {
        self.creditor_id == account_id || self.debtor_id == account_id
    }

    /// The other party of the debt, from `account_id`'s point of view.
    pub fn counterparty_of(&self, account_id: &str) -> &str {
        if self.creditor_id == account_id {
            &self.debtor_id
        } else {
            &self.creditor_id
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.paid_status == PaidStatus::Unpaid && self.due_date.is_some_and(|d| d < today)
    }
}
