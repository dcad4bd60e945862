use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::core::errors::LedgerError;
use crate::core::models::views::{
    DebtWithParties, ExpenseWithShares, MemberProfile, MembershipRow, ShareProfile,
};
use crate::core::models::{
    Account, Debt, DebtConfirmStatus, ExpenseGroup, ExpenseShare, GroupExpense, GroupMember,
    JoinStatus, MemberPaymentStatus, OwnerConfirmStatus, PaidStatus, PaymentConfirmStatus,
};
use crate::infrastructure::store::{LedgerStore, Transition};

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    accounts_by_email: HashMap<String, String>,
    debts: HashMap<String, Debt>,
    groups: HashMap<String, ExpenseGroup>,
    // keyed by (group_id, account_id)
    members: HashMap<(String, String), GroupMember>,
    expenses: HashMap<String, GroupExpense>,
    // keyed by expense id
    shares: HashMap<String, Vec<ExpenseShare>>,
}

impl State {
    fn account(&self, account_id: &str) -> Result<Account, LedgerError> {
        self.accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| LedgerError::StoreError(format!("dangling account reference {account_id}")))
    }

    fn join_debt(&self, debt: &Debt) -> Result<DebtWithParties, LedgerError> {
        Ok(DebtWithParties {
            debt: debt.clone(),
            creditor: self.account(&debt.creditor_id)?,
            debtor: self.account(&debt.debtor_id)?,
        })
    }

    fn group_members(&self, group_id: &str) -> Vec<&GroupMember> {
        let mut rows: Vec<&GroupMember> = self
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows
    }

    fn join_expense(&self, expense: &GroupExpense) -> Result<ExpenseWithShares, LedgerError> {
        let mut shares = self.shares.get(&expense.id).cloned().unwrap_or_default();
        shares.sort_by(|a, b| b.shared_amount.cmp(&a.shared_amount));
        let shares = shares
            .into_iter()
            .map(|share| {
                Ok(ShareProfile {
                    account: self.account(&share.account_id)?,
                    share,
                })
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;
        Ok(ExpenseWithShares {
            expense: expense.clone(),
            shares,
        })
    }

    fn membership_rows<F>(&self, keep_group: F) -> Result<Vec<MembershipRow>, LedgerError>
    where
        F: Fn(&ExpenseGroup) -> bool,
    {
        let mut rows = Vec::new();
        for member in self.members.values() {
            let Some(group) = self.groups.get(&member.group_id) else {
                continue;
            };
            if keep_group(group) {
                rows.push(MembershipRow {
                    group: group.clone(),
                    member: member.clone(),
                    account: self.account(&member.account_id)?,
                });
            }
        }
        rows.sort_by(|a, b| {
            b.group
                .created_at
                .cmp(&a.group.created_at)
                .then_with(|| a.member.created_at.cmp(&b.member.created_at))
        });
        Ok(rows)
    }
}

/// Reference `LedgerStore` over a single `RwLock`-guarded state. One lock
/// acquisition per call makes each method a transaction-equivalent unit: a
/// write holds the exclusive lock across its read-check-write sequence, and
/// every read method assembles its rows from one snapshot.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn insert_account(&self, account: Account) -> Result<bool, LedgerError> {
        let mut state = self.state.write().await;
        if state.accounts_by_email.contains_key(&account.email) {
            return Ok(false);
        }
        state
            .accounts_by_email
            .insert(account.email.clone(), account.id.clone());
        state.accounts.insert(account.id.clone(), account);
        Ok(true)
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.accounts.get(account_id).cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .accounts_by_email
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn insert_debt(&self, debt: Debt) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.debts.insert(debt.id.clone(), debt);
        Ok(())
    }

    async fn get_debt(&self, debt_id: &str) -> Result<Option<Debt>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.debts.get(debt_id).cloned())
    }

    async fn get_debt_with_parties(
        &self,
        debt_id: &str,
    ) -> Result<Option<DebtWithParties>, LedgerError> {
        let state = self.state.read().await;
        state
            .debts
            .get(debt_id)
            .map(|debt| state.join_debt(debt))
            .transpose()
    }

    async fn debts_for_user(&self, user_id: &str) -> Result<Vec<DebtWithParties>, LedgerError> {
        let state = self.state.read().await;
        let mut rows = state
            .debts
            .values()
            .filter(|d| d.is_party(user_id))
            .map(|d| state.join_debt(d))
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by(|a, b| b.debt.created_at.cmp(&a.debt.created_at));
        Ok(rows)
    }

    async fn transition_debt_confirm(
        &self,
        debt_id: &str,
        from: DebtConfirmStatus,
        to: DebtConfirmStatus,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(debt) = state.debts.get_mut(debt_id) else {
            return Ok(Transition::Missing);
        };
        if debt.confirm_status != from {
            return Ok(Transition::Conflict);
        }
        debt.confirm_status = to;
        Ok(Transition::Applied)
    }

    async fn mark_debt_paid(
        &self,
        debt_id: &str,
        proof_image_url: &str,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(debt) = state.debts.get_mut(debt_id) else {
            return Ok(Transition::Missing);
        };
        if debt.confirm_status != DebtConfirmStatus::Accepted
            || debt.paid_status != PaidStatus::Unpaid
        {
            return Ok(Transition::Conflict);
        }
        debt.paid_status = PaidStatus::Paid;
        debt.payment_confirm_status = PaymentConfirmStatus::Unconfirmed;
        debt.proof_image_url = Some(proof_image_url.to_string());
        Ok(Transition::Applied)
    }

    async fn confirm_debt_payment(&self, debt_id: &str) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(debt) = state.debts.get_mut(debt_id) else {
            return Ok(Transition::Missing);
        };
        if debt.paid_status != PaidStatus::Paid
            || debt.payment_confirm_status != PaymentConfirmStatus::Unconfirmed
        {
            return Ok(Transition::Conflict);
        }
        debt.payment_confirm_status = PaymentConfirmStatus::Confirmed;
        Ok(Transition::Applied)
    }

    async fn update_debt_terms(
        &self,
        debt_id: &str,
        amount: Decimal,
        note: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(debt) = state.debts.get_mut(debt_id) else {
            return Ok(Transition::Missing);
        };
        if debt.payment_confirm_status == PaymentConfirmStatus::Confirmed {
            return Ok(Transition::Conflict);
        }
        debt.amount = amount;
        debt.note = note;
        debt.due_date = due_date;
        Ok(Transition::Applied)
    }

    async fn delete_debt(&self, debt_id: &str) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(debt) = state.debts.get(debt_id) else {
            return Ok(Transition::Missing);
        };
        if debt.payment_confirm_status == PaymentConfirmStatus::Confirmed {
            return Ok(Transition::Conflict);
        }
        state.debts.remove(debt_id);
        Ok(Transition::Applied)
    }

    async fn insert_group(
        &self,
        group: ExpenseGroup,
        members: Vec<GroupMember>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.groups.insert(group.id.clone(), group);
        for member in members {
            state
                .members
                .insert((member.group_id.clone(), member.account_id.clone()), member);
        }
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<ExpenseGroup>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.groups.get(group_id).cloned())
    }

    async fn update_group_terms(
        &self,
        group_id: &str,
        group_name: String,
        payment_deadline: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(group) = state.groups.get_mut(group_id) else {
            return Ok(Transition::Missing);
        };
        group.group_name = group_name;
        group.payment_deadline = payment_deadline;
        Ok(Transition::Applied)
    }

    async fn get_member(
        &self,
        group_id: &str,
        account_id: &str,
    ) -> Result<Option<GroupMember>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .members
            .get(&(group_id.to_string(), account_id.to_string()))
            .cloned())
    }

    async fn members_for_group(&self, group_id: &str) -> Result<Vec<MemberProfile>, LedgerError> {
        let state = self.state.read().await;
        state
            .group_members(group_id)
            .into_iter()
            .map(|member| {
                Ok(MemberProfile {
                    account: state.account(&member.account_id)?,
                    member: member.clone(),
                })
            })
            .collect()
    }

    async fn insert_member(&self, member: GroupMember) -> Result<bool, LedgerError> {
        let mut state = self.state.write().await;
        let key = (member.group_id.clone(), member.account_id.clone());
        if state.members.contains_key(&key) {
            return Ok(false);
        }
        state.members.insert(key, member);
        Ok(true)
    }

    async fn remove_member(
        &self,
        group_id: &str,
        account_id: &str,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let key = (group_id.to_string(), account_id.to_string());
        Ok(if state.members.remove(&key).is_some() {
            Transition::Applied
        } else {
            Transition::Missing
        })
    }

    async fn update_member_terms(
        &self,
        group_id: &str,
        account_id: &str,
        amount: Decimal,
        payment_deadline: Option<NaiveDate>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let key = (group_id.to_string(), account_id.to_string());
        let Some(member) = state.members.get_mut(&key) else {
            return Ok(Transition::Missing);
        };
        member.amount = amount;
        member.payment_deadline = payment_deadline;
        Ok(Transition::Applied)
    }

    async fn transition_member_join(
        &self,
        group_id: &str,
        account_id: &str,
        from: JoinStatus,
        to: JoinStatus,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let key = (group_id.to_string(), account_id.to_string());
        let Some(member) = state.members.get_mut(&key) else {
            return Ok(Transition::Missing);
        };
        if member.join_status != from {
            return Ok(Transition::Conflict);
        }
        member.join_status = to;
        Ok(Transition::Applied)
    }

    async fn record_member_proof(
        &self,
        group_id: &str,
        account_id: &str,
        proof_image_url: &str,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let key = (group_id.to_string(), account_id.to_string());
        let Some(member) = state.members.get_mut(&key) else {
            return Ok(Transition::Missing);
        };
        if member.owner_confirm_status == OwnerConfirmStatus::Confirmed {
            return Ok(Transition::Conflict);
        }
        member.payment_status = MemberPaymentStatus::Paid;
        member.owner_confirm_status = OwnerConfirmStatus::Unconfirmed;
        member.proof_image_url = Some(proof_image_url.to_string());
        Ok(Transition::Applied)
    }

    async fn resolve_member_payment(
        &self,
        group_id: &str,
        account_id: &str,
        outcome: OwnerConfirmStatus,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let key = (group_id.to_string(), account_id.to_string());
        let Some(member) = state.members.get_mut(&key) else {
            return Ok(Transition::Missing);
        };
        if member.payment_status != MemberPaymentStatus::Paid
            || member.owner_confirm_status != OwnerConfirmStatus::Unconfirmed
        {
            return Ok(Transition::Conflict);
        }
        member.owner_confirm_status = outcome;
        if outcome == OwnerConfirmStatus::Rejected {
            // re-open so the member can resubmit proof
            member.payment_status = MemberPaymentStatus::Unpaid;
        }
        Ok(Transition::Applied)
    }

    async fn groups_for_user(&self, user_id: &str) -> Result<Vec<ExpenseGroup>, LedgerError> {
        let state = self.state.read().await;
        let mut groups: Vec<ExpenseGroup> = state
            .groups
            .values()
            .filter(|g| {
                g.owner_id == user_id
                    || state
                        .members
                        .contains_key(&(g.id.clone(), user_id.to_string()))
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(groups)
    }

    async fn group_rows_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<MembershipRow>, LedgerError> {
        let state = self.state.read().await;
        state.membership_rows(|group| {
            state
                .members
                .contains_key(&(group.id.clone(), user_id.to_string()))
        })
    }

    async fn member_rows_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<MembershipRow>, LedgerError> {
        let state = self.state.read().await;
        state.membership_rows(|group| group.owner_id == owner_id)
    }

    async fn insert_expense(
        &self,
        expense: GroupExpense,
        shares: Vec<ExpenseShare>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.shares.insert(expense.id.clone(), shares);
        state.expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<GroupExpense>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.expenses.get(expense_id).cloned())
    }

    async fn expenses_for_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<ExpenseWithShares>, LedgerError> {
        let state = self.state.read().await;
        let mut rows = state
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| state.join_expense(e))
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by(|a, b| {
            b.expense
                .expense_date
                .cmp(&a.expense.expense_date)
                .then_with(|| b.expense.created_at.cmp(&a.expense.created_at))
        });
        Ok(rows)
    }

    async fn shares_for_expense(
        &self,
        expense_id: &str,
    ) -> Result<Vec<ShareProfile>, LedgerError> {
        let state = self.state.read().await;
        match state.expenses.get(expense_id) {
            Some(expense) => Ok(state.join_expense(expense)?.shares),
            None => Ok(Vec::new()),
        }
    }

    async fn replace_shares(
        &self,
        expense_id: &str,
        shares: Vec<ExpenseShare>,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        if !state.expenses.contains_key(expense_id) {
            return Ok(Transition::Missing);
        }
        state.shares.insert(expense_id.to_string(), shares);
        Ok(Transition::Applied)
    }

    async fn update_expense_terms(
        &self,
        expense_id: &str,
        total_amount: Decimal,
        description: Option<String>,
        expense_date: NaiveDate,
    ) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        let Some(expense) = state.expenses.get_mut(expense_id) else {
            return Ok(Transition::Missing);
        };
        expense.total_amount = total_amount;
        expense.description = description;
        expense.expense_date = expense_date;
        Ok(Transition::Applied)
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<Transition, LedgerError> {
        let mut state = self.state.write().await;
        if state.expenses.remove(expense_id).is_none() {
            return Ok(Transition::Missing);
        }
        state.shares.remove(expense_id);
        Ok(Transition::Applied)
    }
}
