//! Aggregator inputs and outputs. All report types are plain data computed
//! from a single point-in-time snapshot of the store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::debt::{DebtConfirmStatus, PaidStatus, PaymentConfirmStatus};
use super::group::{MemberPaymentStatus, OwnerConfirmStatus};

/// Optional constraints applied to debt reports. A `None` field matches
/// every debt.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DebtFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub confirm_status: Option<DebtConfirmStatus>,
    pub paid_status: Option<PaidStatus>,
    pub payment_confirm_status: Option<PaymentConfirmStatus>,
}

/// Counts and sums for one side of the user's ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleTotals {
    pub count: u64,
    pub paid_count: u64,
    pub unpaid_count: u64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub unpaid_amount: Decimal,
}

/// Per-user debt summary, split by the role the user plays.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebtSummary {
    /// Debts where the user is the creditor.
    pub receivable: RoleTotals,
    /// Debts where the user is the debtor.
    pub payable: RoleTotals,
}

/// One counterparty's subtotal block in the per-counterparty report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CounterpartyEntry {
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub receivable_unpaid: Decimal,
    pub receivable_paid: Decimal,
    pub payable_unpaid: Decimal,
    pub payable_paid: Decimal,
    pub total_amount: Decimal,
}

impl CounterpartyEntry {
    pub fn unpaid_amount(&self) -> Decimal {
        self.receivable_unpaid + self.payable_unpaid
    }
}

/// Debt volume inside one time bucket (a month of a year, or a whole year).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebtVolume {
    pub year: i32,
    /// 1-12 for monthly buckets, 0 for yearly buckets.
    pub month: u32,
    pub count: u64,
    pub total_amount: Decimal,
    pub receivable_amount: Decimal,
    pub payable_amount: Decimal,
}

/// Creditor-side standing over accepted debts.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreditorReport {
    pub total_paid_amount: Decimal,
    pub total_unpaid_amount: Decimal,
    pub unpaid_emails: Vec<String>,
    pub overdue_emails: Vec<String>,
}

/// Debtor-side standing over accepted debts.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebtorReport {
    pub total_unpaid_amount: Decimal,
    pub unpaid_emails: Vec<String>,
    pub overdue_emails: Vec<String>,
}

/// The user's own standing inside one group, joined with group-wide totals
/// computed over every member row of that group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupTargetRow {
    pub group_id: String,
    pub group_name: String,
    pub target_amount: Decimal,
    pub payment_status: MemberPaymentStatus,
    pub owner_confirm_status: OwnerConfirmStatus,
    pub payment_deadline: Option<NaiveDate>,
    pub group_total_amount: Decimal,
    pub group_unpaid_amount: Decimal,
}

/// Monthly group-target report for one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupTargetReport {
    pub year: i32,
    pub month: u32,
    /// Sum of the user's own target amounts across the listed groups.
    pub total_target_amount: Decimal,
    /// Sum of the user's own still-unpaid targets.
    pub total_unpaid_amount: Decimal,
    pub groups: Vec<GroupTargetRow>,
}

/// One owned group that still has unpaid accepted members.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DelinquentGroup {
    pub group_id: String,
    pub group_name: String,
    pub unpaid_member_count: u64,
    pub unpaid_amount: Decimal,
    pub overdue_emails: Vec<String>,
}

/// Owner view over all owned groups with outstanding member payments.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OwnerUnpaidReport {
    pub total_unpaid_amount: Decimal,
    pub unpaid_emails: Vec<String>,
    pub groups: Vec<DelinquentGroup>,
}

/// Member view over the user's accepted group rows, partitioned by payment
/// state. Overdue rows also appear in `unpaid`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemberPaymentReport {
    pub total_unpaid_amount: Decimal,
    pub unpaid: Vec<GroupTargetRow>,
    pub paid: Vec<GroupTargetRow>,
    pub overdue: Vec<GroupTargetRow>,
}

/// Aggregate statistics over one group's member rows.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupStats {
    pub total_members: u64,
    pub paid_members: u64,
    pub unpaid_members: u64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub unpaid_amount: Decimal,
}
