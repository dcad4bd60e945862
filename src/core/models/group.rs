use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberPaymentStatus {
    Unpaid,
    Paid,
}

/// The owner's verdict on a member's submitted payment proof. A `Rejected`
/// verdict re-opens the payment so the member can resubmit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OwnerConfirmStatus {
    Unconfirmed,
    Confirmed,
    Rejected,
}

/// A group of accounts sharing expenses. Only the owner may mutate group
/// metadata and membership economics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpenseGroup {
    pub id: String,
    pub group_name: String,
    pub owner_id: String,
    pub payment_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// One account's standing inside a group, unique per (group, account). The
/// owner is implicitly a member with a zero target amount.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: String,
    pub account_id: String,
    /// Target amount this member owes for the current settlement cycle.
    pub amount: Decimal,
    pub join_status: JoinStatus,
    pub payment_status: MemberPaymentStatus,
    pub owner_confirm_status: OwnerConfirmStatus,
    pub proof_image_url: Option<String>,
    pub payment_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn is_accepted(&self) -> bool {
        self.join_status == JoinStatus::Accepted
    }

    /// Deadline that applies to this member, falling back to the group-wide
    /// one when no per-member override is set.
    pub fn effective_deadline(&self, group: &ExpenseGroup) -> Option<NaiveDate> {
        self.payment_deadline.or(group.payment_deadline)
    }

    pub fn is_overdue(&self, group: &ExpenseGroup, today: NaiveDate) -> bool {
        self.payment_status == MemberPaymentStatus::Unpaid
            && self.effective_deadline(group).is_some_and(|d| d < today)
    }
}
