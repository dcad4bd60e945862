use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::views::DebtWithParties;
use crate::core::models::{Debt, DebtConfirmStatus, PaidStatus, PaymentConfirmStatus};
use crate::core::service::LedgerService;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::store::{LedgerStore, Transition};

/// Debt state machine.
///
/// `confirm_status`: pending -> accepted (debtor) | rejected (creditor),
/// both terminal. Payment: (unpaid, unconfirmed) -> (paid, unconfirmed) via
/// the debtor's report -> (paid, confirmed) via the creditor, terminal.
/// A payment can only be reported on an accepted debt, which keeps
/// `payment confirmed => paid => accepted` across every valid sequence.
impl<S: LedgerStore, N: Notifier> LedgerService<S, N> {
    pub async fn create_debt(
        &self,
        creditor_id: &str,
        debtor_id: &str,
        amount: Decimal,
        note: Option<String>,
        due_date: Option<&str>,
        actor_id: &str,
    ) -> Result<Debt, LedgerError> {
        if actor_id != creditor_id && actor_id != debtor_id {
            return Err(LedgerError::Forbidden(
                "you can only create debts involving yourself".to_string(),
            ));
        }
        if creditor_id == debtor_id {
            return Err(LedgerError::Forbidden(
                "a debt cannot have the same account on both sides".to_string(),
            ));
        }
        self.validate_amount("amount", amount)?;
        let due_date = self.parse_date("due_date", due_date)?;
        self.require_account(creditor_id).await?;
        self.require_account(debtor_id).await?;

        let debt = Debt {
            id: Uuid::new_v4().to_string(),
            creditor_id: creditor_id.to_string(),
            debtor_id: debtor_id.to_string(),
            amount,
            note,
            due_date,
            confirm_status: DebtConfirmStatus::Pending,
            paid_status: PaidStatus::Unpaid,
            payment_confirm_status: PaymentConfirmStatus::Unconfirmed,
            proof_image_url: None,
            created_at: Utc::now(),
        };
        self.store.insert_debt(debt.clone()).await?;
        info!(debt_id = %debt.id, %amount, "debt created");

        let counterparty = debt.counterparty_of(actor_id);
        self.dispatch(
            counterparty,
            "New debt awaiting confirmation",
            &format!("Amount: {amount}"),
            json!({ "debt_id": debt.id }),
        )
        .await;

        Ok(debt)
    }

    /// Debtor reports the debt as paid, attaching proof. Requires an
    /// accepted, still-unpaid debt.
    pub async fn report_payment(
        &self,
        debt_id: &str,
        proof_image_url: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        if proof_image_url.trim().is_empty() {
            return Err(LedgerError::MissingProof);
        }
        let debt = self.require_debt(debt_id).await?;
        if actor_id != debt.debtor_id {
            return Err(LedgerError::Forbidden(
                "only the debtor can report payment".to_string(),
            ));
        }
        if debt.paid_status == PaidStatus::Paid {
            return Err(LedgerError::AlreadyPaid(debt_id.to_string()));
        }
        if debt.confirm_status != DebtConfirmStatus::Accepted {
            return Err(LedgerError::InvalidState(
                "debt must be accepted before a payment can be reported".to_string(),
            ));
        }

        match self.store.mark_debt_paid(debt_id, proof_image_url).await? {
            Transition::Applied => {}
            Transition::Conflict => return Err(LedgerError::AlreadyPaid(debt_id.to_string())),
            Transition::Missing => return Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
        info!(debt_id, "payment reported");

        self.dispatch(
            &debt.creditor_id,
            "Payment report received",
            &format!("Amount: {} - awaiting confirmation", debt.amount),
            json!({ "debt_id": debt_id }),
        )
        .await;
        Ok(())
    }

    /// Debtor accepts the debt request.
    pub async fn confirm_debt(&self, debt_id: &str, actor_id: &str) -> Result<(), LedgerError> {
        let debt = self.require_debt(debt_id).await?;
        if actor_id != debt.debtor_id {
            return Err(LedgerError::Forbidden(
                "only the debtor can confirm the debt".to_string(),
            ));
        }

        match self
            .store
            .transition_debt_confirm(debt_id, DebtConfirmStatus::Pending, DebtConfirmStatus::Accepted)
            .await?
        {
            Transition::Applied => {}
            Transition::Conflict => {
                return Err(LedgerError::InvalidState(
                    "debt is not in pending status".to_string(),
                ))
            }
            Transition::Missing => return Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
        info!(debt_id, "debt accepted by debtor");

        self.dispatch(
            &debt.creditor_id,
            "Debt confirmed by debtor",
            &format!("Amount: {}", debt.amount),
            json!({ "debt_id": debt_id }),
        )
        .await;
        Ok(())
    }

    /// Creditor acknowledges a reported payment. Terminal.
    pub async fn confirm_payment(&self, debt_id: &str, actor_id: &str) -> Result<(), LedgerError> {
        let debt = self.require_debt(debt_id).await?;
        if actor_id != debt.creditor_id {
            return Err(LedgerError::Forbidden(
                "only the creditor can confirm payment".to_string(),
            ));
        }

        match self.store.confirm_debt_payment(debt_id).await? {
            Transition::Applied => {}
            Transition::Conflict => {
                return Err(LedgerError::InvalidState(
                    "payment is not waiting for confirmation".to_string(),
                ))
            }
            Transition::Missing => return Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
        info!(debt_id, "payment confirmed");

        self.dispatch(
            &debt.debtor_id,
            "Payment confirmed",
            &format!("Amount: {}", debt.amount),
            json!({ "debt_id": debt_id }),
        )
        .await;
        Ok(())
    }

    /// Creditor declines the debt request.
    pub async fn reject_debt(&self, debt_id: &str, actor_id: &str) -> Result<(), LedgerError> {
        let debt = self.require_debt(debt_id).await?;
        if actor_id != debt.creditor_id {
            return Err(LedgerError::Forbidden(
                "only the creditor can reject the debt".to_string(),
            ));
        }

        match self
            .store
            .transition_debt_confirm(debt_id, DebtConfirmStatus::Pending, DebtConfirmStatus::Rejected)
            .await?
        {
            Transition::Applied => {}
            Transition::Conflict => {
                return Err(LedgerError::InvalidState(
                    "debt is not in pending status".to_string(),
                ))
            }
            Transition::Missing => return Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
        info!(debt_id, "debt rejected");

        self.dispatch(
            &debt.debtor_id,
            "Debt request rejected",
            &format!("Amount: {}", debt.amount),
            json!({ "debt_id": debt_id }),
        )
        .await;
        Ok(())
    }

    /// Overwrites amount, note and due date. Forbidden once the payment has
    /// been confirmed.
    pub async fn update_debt(
        &self,
        debt_id: &str,
        amount: Decimal,
        note: Option<String>,
        due_date: Option<&str>,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let debt = self.require_debt(debt_id).await?;
        if !debt.is_party(actor_id) {
            return Err(LedgerError::Forbidden(
                "you don't have permission to update this debt".to_string(),
            ));
        }
        self.validate_amount("amount", amount)?;
        let due_date = self.parse_date("due_date", due_date)?;

        match self
            .store
            .update_debt_terms(debt_id, amount, note, due_date)
            .await?
        {
            Transition::Applied => Ok(()),
            Transition::Conflict => Err(LedgerError::Immutable(
                "cannot update a debt whose payment has been confirmed".to_string(),
            )),
            Transition::Missing => Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
    }

    /// Hard delete by either party, refused once the payment is confirmed.
    pub async fn delete_debt(&self, debt_id: &str, actor_id: &str) -> Result<(), LedgerError> {
        let debt = self.require_debt(debt_id).await?;
        if !debt.is_party(actor_id) {
            return Err(LedgerError::Forbidden(
                "only a party of the debt can delete it".to_string(),
            ));
        }

        match self.store.delete_debt(debt_id).await? {
            Transition::Applied => {
                info!(debt_id, "debt deleted");
                Ok(())
            }
            Transition::Conflict => Err(LedgerError::Immutable(
                "cannot delete a debt whose payment has been confirmed".to_string(),
            )),
            Transition::Missing => Err(LedgerError::DebtNotFound(debt_id.to_string())),
        }
    }

    pub async fn get_debt(
        &self,
        debt_id: &str,
        actor_id: &str,
    ) -> Result<DebtWithParties, LedgerError> {
        let row = self
            .store
            .get_debt_with_parties(debt_id)
            .await?
            .ok_or_else(|| LedgerError::DebtNotFound(debt_id.to_string()))?;
        if !row.debt.is_party(actor_id) {
            return Err(LedgerError::Forbidden(
                "only a party of the debt can view it".to_string(),
            ));
        }
        Ok(row)
    }

    /// All debts the user takes part in, newest first.
    pub async fn debts_for_user(
        &self,
        actor_id: &str,
    ) -> Result<Vec<DebtWithParties>, LedgerError> {
        self.store.debts_for_user(actor_id).await
    }

    /// Debts still waiting for the debtor's confirmation.
    pub async fn pending_debts(
        &self,
        actor_id: &str,
    ) -> Result<Vec<DebtWithParties>, LedgerError> {
        let mut rows = self.store.debts_for_user(actor_id).await?;
        rows.retain(|r| r.debt.confirm_status == DebtConfirmStatus::Pending);
        Ok(rows)
    }

    pub async fn unpaid_debts(
        &self,
        actor_id: &str,
    ) -> Result<Vec<DebtWithParties>, LedgerError> {
        let mut rows = self.store.debts_for_user(actor_id).await?;
        rows.retain(|r| r.debt.paid_status == PaidStatus::Unpaid);
        Ok(rows)
    }

    async fn require_debt(&self, debt_id: &str) -> Result<Debt, LedgerError> {
        self.store
            .get_debt(debt_id)
            .await?
            .ok_or_else(|| LedgerError::DebtNotFound(debt_id.to_string()))
    }
}
