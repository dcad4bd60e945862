use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::views::{ExpenseWithShares, MemberProfile};
use crate::core::models::{ExpenseShare, GroupExpense, ShareInput};
use crate::core::service::LedgerService;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::store::{LedgerStore, Transition};

/// Two shares that sum to within a cent of the total are considered an exact
/// decomposition.
const SHARE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Group expenses and the split allocator.
impl<S: LedgerStore, N: Notifier> LedgerService<S, N> {
    /// Records an expense paid by the actor. With explicit shares, each
    /// target must be an accepted member and the shares must decompose the
    /// total; without shares the total is split evenly across all accepted
    /// members, the payer absorbing the rounding residual.
    pub async fn create_expense(
        &self,
        group_id: &str,
        total_amount: Decimal,
        description: Option<String>,
        expense_date: &str,
        shares: Option<Vec<ShareInput>>,
        actor_id: &str,
    ) -> Result<GroupExpense, LedgerError> {
        self.validate_amount("total_amount", total_amount)?;
        let expense_date = self.parse_required_date("expense_date", expense_date)?;
        let group = self.require_group(group_id).await?;

        let members = self.store.members_for_group(group_id).await?;
        let accepted: Vec<&MemberProfile> =
            members.iter().filter(|m| m.member.is_accepted()).collect();
        if !accepted.iter().any(|m| m.member.account_id == actor_id) {
            return Err(LedgerError::Forbidden(
                "only accepted group members can record expenses".to_string(),
            ));
        }

        let expense_id = Uuid::new_v4().to_string();
        let rows = match shares {
            Some(inputs) => {
                self.validate_shares(&expense_id, total_amount, &inputs, &accepted)?
            }
            None => split_evenly(&expense_id, total_amount, actor_id, &accepted),
        };

        let expense = GroupExpense {
            id: expense_id,
            group_id: group_id.to_string(),
            payer_id: actor_id.to_string(),
            total_amount,
            description,
            expense_date,
            created_at: Utc::now(),
        };
        self.store.insert_expense(expense.clone(), rows).await?;
        info!(expense_id = %expense.id, group_id, %total_amount, "expense recorded");

        for row in &accepted {
            if row.member.account_id != actor_id {
                self.dispatch(
                    &row.member.account_id,
                    "New group expense",
                    &format!("{}: {}", group.group_name, total_amount),
                    json!({ "group_id": group_id, "expense_id": expense.id }),
                )
                .await;
            }
        }
        Ok(expense)
    }

    /// Replaces the full share set of an expense. Payer only; the new shares
    /// must still decompose the recorded total.
    pub async fn update_shares(
        &self,
        expense_id: &str,
        shares: Vec<ShareInput>,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        if shares.is_empty() {
            return Err(LedgerError::InvalidInput(
                "shares cannot be empty".to_string(),
            ));
        }
        let expense = self.require_expense(expense_id).await?;
        if actor_id != expense.payer_id {
            return Err(LedgerError::Forbidden(
                "only the payer can update the shares".to_string(),
            ));
        }

        let members = self.store.members_for_group(&expense.group_id).await?;
        let accepted: Vec<&MemberProfile> =
            members.iter().filter(|m| m.member.is_accepted()).collect();
        let rows = self.validate_shares(expense_id, expense.total_amount, &shares, &accepted)?;

        match self.store.replace_shares(expense_id, rows).await? {
            Transition::Applied => Ok(()),
            Transition::Conflict | Transition::Missing => {
                Err(LedgerError::ExpenseNotFound(expense_id.to_string()))
            }
        }
    }

    /// Rewrites total, description and date. Payer only; a changed total
    /// must still match the existing shares, so callers grow or shrink the
    /// shares first via `update_shares`.
    pub async fn update_expense(
        &self,
        expense_id: &str,
        total_amount: Decimal,
        description: Option<String>,
        expense_date: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        self.validate_amount("total_amount", total_amount)?;
        let expense_date = self.parse_required_date("expense_date", expense_date)?;
        let expense = self.require_expense(expense_id).await?;
        if actor_id != expense.payer_id {
            return Err(LedgerError::Forbidden(
                "only the payer can update the expense".to_string(),
            ));
        }

        let shares = self.store.shares_for_expense(expense_id).await?;
        let share_sum: Decimal = shares.iter().map(|s| s.share.shared_amount).sum();
        if (share_sum - total_amount).abs() > SHARE_TOLERANCE {
            return Err(LedgerError::ShareMismatch(format!(
                "shares sum to {share_sum} but the new total is {total_amount}"
            )));
        }

        match self
            .store
            .update_expense_terms(expense_id, total_amount, description, expense_date)
            .await?
        {
            Transition::Applied => Ok(()),
            Transition::Conflict | Transition::Missing => {
                Err(LedgerError::ExpenseNotFound(expense_id.to_string()))
            }
        }
    }

    /// Deletes the expense and all of its shares. Payer only.
    pub async fn delete_expense(
        &self,
        expense_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let expense = self.require_expense(expense_id).await?;
        if actor_id != expense.payer_id {
            return Err(LedgerError::Forbidden(
                "only the payer can delete the expense".to_string(),
            ));
        }
        match self.store.delete_expense(expense_id).await? {
            Transition::Applied => {
                info!(expense_id, "expense deleted");
                Ok(())
            }
            Transition::Conflict | Transition::Missing => {
                Err(LedgerError::ExpenseNotFound(expense_id.to_string()))
            }
        }
    }

    /// One expense with its shares, visible to group members only.
    pub async fn get_expense(
        &self,
        expense_id: &str,
        actor_id: &str,
    ) -> Result<ExpenseWithShares, LedgerError> {
        let expense = self.require_expense(expense_id).await?;
        self.require_membership(&expense.group_id, actor_id).await?;
        let shares = self.store.shares_for_expense(expense_id).await?;
        Ok(ExpenseWithShares { expense, shares })
    }

    /// All expenses of a group, newest expense date first. Members only.
    pub async fn group_expenses(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<Vec<ExpenseWithShares>, LedgerError> {
        self.require_group(group_id).await?;
        self.require_membership(group_id, actor_id).await?;
        self.store.expenses_for_group(group_id).await
    }

    async fn require_expense(&self, expense_id: &str) -> Result<GroupExpense, LedgerError> {
        self.store
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    async fn require_membership(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        self.store
            .get_member(group_id, actor_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Forbidden("only group members can view expenses".to_string())
            })?;
        Ok(())
    }

    fn validate_shares(
        &self,
        expense_id: &str,
        total_amount: Decimal,
        inputs: &[ShareInput],
        accepted: &[&MemberProfile],
    ) -> Result<Vec<ExpenseShare>, LedgerError> {
        let mut rows: Vec<ExpenseShare> = Vec::with_capacity(inputs.len());
        for input in inputs {
            if !accepted
                .iter()
                .any(|m| m.member.account_id == input.account_id)
            {
                return Err(LedgerError::MemberNotFound(input.account_id.clone()));
            }
            if rows.iter().any(|r| r.account_id == input.account_id) {
                return Err(LedgerError::ShareMismatch(format!(
                    "duplicate share for account {}",
                    input.account_id
                )));
            }
            self.validate_target_amount("shared_amount", input.shared_amount)?;
            rows.push(ExpenseShare {
                group_expense_id: expense_id.to_string(),
                account_id: input.account_id.clone(),
                shared_amount: input.shared_amount,
            });
        }

        let sum: Decimal = rows.iter().map(|r| r.shared_amount).sum();
        if (sum - total_amount).abs() > SHARE_TOLERANCE {
            return Err(LedgerError::ShareMismatch(format!(
                "shares sum to {sum} but the total is {total_amount}"
            )));
        }
        Ok(rows)
    }
}

/// Even split across the accepted members: every non-payer owes
/// `total / n` truncated to cents, the payer absorbs the residual so the
/// shares sum to the total exactly.
fn split_evenly(
    expense_id: &str,
    total_amount: Decimal,
    payer_id: &str,
    accepted: &[&MemberProfile],
) -> Vec<ExpenseShare> {
    let n = Decimal::from(accepted.len());
    let per_head =
        (total_amount / n).round_dp_with_strategy(2, RoundingStrategy::ToZero);

    let mut rows: Vec<ExpenseShare> = accepted
        .iter()
        .filter(|m| m.member.account_id != payer_id)
        .map(|m| ExpenseShare {
            group_expense_id: expense_id.to_string(),
            account_id: m.member.account_id.clone(),
            shared_amount: per_head,
        })
        .collect();
    let allocated: Decimal = rows.iter().map(|r| r.shared_amount).sum();
    rows.push(ExpenseShare {
        group_expense_id: expense_id.to_string(),
        account_id: payer_id.to_string(),
        shared_amount: total_amount - allocated,
    });
    rows
}
