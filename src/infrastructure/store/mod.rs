use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::errors::LedgerError;
use crate::core::models::views::{
    DebtWithParties, ExpenseWithShares, MemberProfile, MembershipRow, ShareProfile,
};
use crate::core::models::{
    Account, Debt, DebtConfirmStatus, ExpenseGroup, ExpenseShare, GroupExpense, GroupMember,
    JoinStatus, OwnerConfirmStatus,
};

/// Outcome of a guarded (compare-and-set) store mutation. Every mutation
/// executes atomically against one snapshot, so two racing transitions can
/// never both observe `Applied` for the same guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The guard matched and the new state was written.
    Applied,
    /// The row exists but its current state failed the guard.
    Conflict,
    /// The referenced row does not exist.
    Missing,
}

/// Durable storage for the ledger. Implementations must make every method a
/// single atomic unit (one transaction, or one lock acquisition for the
/// in-memory store): guarded transitions re-check their precondition inside
/// that unit, and multi-row writes commit or fail as a whole. Read methods
/// returning joined rows assemble them from one snapshot.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // accounts

    /// Inserts the account unless the email is already registered; returns
    /// whether the insert happened.
    async fn insert_account(&self, account: Account) -> Result<bool, LedgerError>;
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LedgerError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, LedgerError>;

    // debts

    async fn insert_debt(&self, debt: Debt) -> Result<(), LedgerError>;
    async fn get_debt(&self, debt_id: &str) -> Result<Option<Debt>, LedgerError>;
    async fn get_debt_with_parties(
        &self,
        debt_id: &str,
    ) -> Result<Option<DebtWithParties>, LedgerError>;
    /// Every debt where the user is a party, newest first.
    async fn debts_for_user(&self, user_id: &str) -> Result<Vec<DebtWithParties>, LedgerError>;
    /// Moves `confirm_status` from `from` to `to` if it currently is `from`.
    async fn transition_debt_confirm(
        &self,
        debt_id: &str,
        from: DebtConfirmStatus,
        to: DebtConfirmStatus,
    ) -> Result<Transition, LedgerError>;
    /// Records a reported payment: requires an accepted, unpaid debt; sets
    /// `paid_status = paid`, resets `payment_confirm_status = unconfirmed`
    /// and stores the proof.
    async fn mark_debt_paid(
        &self,
        debt_id: &str,
        proof_image_url: &str,
    ) -> Result<Transition, LedgerError>;
    /// Confirms a reported payment: requires `paid` and `unconfirmed`.
    async fn confirm_debt_payment(&self, debt_id: &str) -> Result<Transition, LedgerError>;
    /// Overwrites amount/note/due date unless the payment is confirmed.
    async fn update_debt_terms(
        &self,
        debt_id: &str,
        amount: Decimal,
        note: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError>;
    /// Hard delete, guarded against confirmed payments.
    async fn delete_debt(&self, debt_id: &str) -> Result<Transition, LedgerError>;

    // groups and members

    /// Inserts the group and its initial member rows as one unit.
    async fn insert_group(
        &self,
        group: ExpenseGroup,
        members: Vec<GroupMember>,
    ) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<ExpenseGroup>, LedgerError>;
    async fn update_group_terms(
        &self,
        group_id: &str,
        group_name: String,
        payment_deadline: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError>;
    async fn get_member(
        &self,
        group_id: &str,
        account_id: &str,
    ) -> Result<Option<GroupMember>, LedgerError>;
    /// All member rows of the group with their accounts, oldest first.
    async fn members_for_group(&self, group_id: &str) -> Result<Vec<MemberProfile>, LedgerError>;
    /// Inserts the member unless a (group, account) row already exists;
    /// returns whether the insert happened.
    async fn insert_member(&self, member: GroupMember) -> Result<bool, LedgerError>;
    async fn remove_member(
        &self,
        group_id: &str,
        account_id: &str,
    ) -> Result<Transition, LedgerError>;
    async fn update_member_terms(
        &self,
        group_id: &str,
        account_id: &str,
        amount: Decimal,
        payment_deadline: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError>;
    async fn transition_member_join(
        &self,
        group_id: &str,
        account_id: &str,
        from: JoinStatus,
        to: JoinStatus,
    ) -> Result<Transition, LedgerError>;
    /// Records a payment proof: requires the payment not to be owner-
    /// confirmed yet; sets `payment_status = paid`, stores the proof and
    /// resets `owner_confirm_status = unconfirmed`.
    async fn record_member_proof(
        &self,
        group_id: &str,
        account_id: &str,
        proof_image_url: &str,
    ) -> Result<Transition, LedgerError>;
    /// Owner verdict on a reported payment: requires `payment_status = paid`.
    /// A `Rejected` verdict resets `payment_status` to `unpaid` so the
    /// member can resubmit.
    async fn resolve_member_payment(
        &self,
        group_id: &str,
        account_id: &str,
        outcome: OwnerConfirmStatus,
    ) -> Result<Transition, LedgerError>;
    /// Groups the user belongs to (any join status), newest first.
    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<ExpenseGroup>, LedgerError>;
    /// Every member row of every group the user belongs to, joined with
    /// group and account, from one snapshot.
    async fn group_rows_for_user(&self, user_id: &str)
        -> Result<Vec<MembershipRow>, LedgerError>;
    /// Every member row of every group the user owns.
    async fn member_rows_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<MembershipRow>, LedgerError>;

    // expenses and shares

    /// Inserts the expense and its full share set as one unit.
    async fn insert_expense(
        &self,
        expense: GroupExpense,
        shares: Vec<ExpenseShare>,
    ) -> Result<(), LedgerError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<GroupExpense>, LedgerError>;
    /// Expenses of a group, newest expense date first.
    async fn expenses_for_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<ExpenseWithShares>, LedgerError>;
    /// Shares of one expense with their accounts, largest share first.
    async fn shares_for_expense(
        &self,
        expense_id: &str,
    ) -> Result<Vec<ShareProfile>, LedgerError>;
    /// Replaces the whole share set of an expense atomically.
    async fn replace_shares(
        &self,
        expense_id: &str,
        shares: Vec<ExpenseShare>,
    ) -> Result<Transition, LedgerError>;
    async fn update_expense_terms(
        &self,
        expense_id: &str,
        total_amount: Decimal,
        description: Option<String>,
        expense_date: NaiveDate,
    ) -> Result<Transition, LedgerError>;
    /// Deletes the expense and all of its shares as one unit.
    async fn delete_expense(&self, expense_id: &str) -> Result<Transition, LedgerError>;
}

pub mod in_memory;
