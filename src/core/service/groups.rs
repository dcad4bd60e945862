use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::reports::GroupStats;
use crate::core::models::views::{GroupDetails, MemberProfile};
use crate::core::models::{
    ExpenseGroup, GroupMember, JoinStatus, MemberPaymentStatus, OwnerConfirmStatus,
};
use crate::core::service::LedgerService;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::store::{LedgerStore, Transition};

/// Group membership and the member-share state machine.
///
/// `join_status`: pending -> accepted | rejected by the invitee, both
/// terminal. Per-member payment: (unpaid, unconfirmed) -> (paid,
/// unconfirmed) via proof submission -> confirmed (terminal) or rejected
/// (re-opens to unpaid) via the owner's verdict.
impl<S: LedgerStore, N: Notifier> LedgerService<S, N> {
    /// Creates a group owned by the actor and invites the given accounts.
    /// The owner gets an accepted member row with a zero target; invitees
    /// start pending.
    pub async fn create_group(
        &self,
        group_name: &str,
        payment_deadline: Option<&str>,
        invitee_ids: &[String],
        owner_id: &str,
    ) -> Result<ExpenseGroup, LedgerError> {
        self.validate_text("group_name", group_name, 100)?;
        let payment_deadline = self.parse_date("payment_deadline", payment_deadline)?;
        self.require_account(owner_id).await?;

        let mut invitees: Vec<&String> = Vec::new();
        for id in invitee_ids {
            if id != owner_id && !invitees.contains(&id) {
                self.require_account(id).await?;
                invitees.push(id);
            }
        }

        let group = ExpenseGroup {
            id: Uuid::new_v4().to_string(),
            group_name: group_name.trim().to_string(),
            owner_id: owner_id.to_string(),
            payment_deadline,
            created_at: Utc::now(),
        };
        let mut members = vec![GroupMember {
            group_id: group.id.clone(),
            account_id: owner_id.to_string(),
            amount: Decimal::ZERO,
            join_status: JoinStatus::Accepted,
            payment_status: MemberPaymentStatus::Unpaid,
            owner_confirm_status: OwnerConfirmStatus::Unconfirmed,
            proof_image_url: None,
            payment_deadline: None,
            created_at: group.created_at,
        }];
        for id in &invitees {
            members.push(GroupMember {
                group_id: group.id.clone(),
                account_id: (*id).clone(),
                amount: Decimal::ZERO,
                join_status: JoinStatus::Pending,
                payment_status: MemberPaymentStatus::Unpaid,
                owner_confirm_status: OwnerConfirmStatus::Unconfirmed,
                proof_image_url: None,
                payment_deadline: None,
                created_at: Utc::now(),
            });
        }
        self.store.insert_group(group.clone(), members).await?;
        info!(group_id = %group.id, invitees = invitees.len(), "group created");

        for id in &invitees {
            self.dispatch(
                id,
                "You have been invited to a group",
                &format!("Group: {}", group.group_name),
                json!({ "group_id": group.id }),
            )
            .await;
        }
        Ok(group)
    }

    /// Owner invites one more account into an existing group.
    pub async fn add_member(
        &self,
        group_id: &str,
        account_id: &str,
        amount: Decimal,
        payment_deadline: Option<&str>,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id {
            return Err(LedgerError::Forbidden(
                "only the group owner can add members".to_string(),
            ));
        }
        self.validate_target_amount("amount", amount)?;
        let payment_deadline = self.parse_date("payment_deadline", payment_deadline)?;
        self.require_account(account_id).await?;

        let member = GroupMember {
            group_id: group_id.to_string(),
            account_id: account_id.to_string(),
            amount,
            join_status: JoinStatus::Pending,
            payment_status: MemberPaymentStatus::Unpaid,
            owner_confirm_status: OwnerConfirmStatus::Unconfirmed,
            proof_image_url: None,
            payment_deadline,
            created_at: Utc::now(),
        };
        if !self.store.insert_member(member).await? {
            return Err(LedgerError::AlreadyMember(account_id.to_string()));
        }
        info!(group_id, account_id, "member invited");

        self.dispatch(
            account_id,
            "You have been invited to a group",
            &format!("Group: {}", group.group_name),
            json!({ "group_id": group_id }),
        )
        .await;
        Ok(())
    }

    /// Removes a member row. The owner can remove anyone but themselves; a
    /// member can leave on their own, which notifies the owner.
    pub async fn remove_member(
        &self,
        group_id: &str,
        account_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id && actor_id != account_id {
            return Err(LedgerError::Forbidden(
                "only the group owner or the member themselves can remove a member".to_string(),
            ));
        }
        if account_id == group.owner_id {
            return Err(LedgerError::Forbidden(
                "the group owner cannot be removed".to_string(),
            ));
        }

        match self.store.remove_member(group_id, account_id).await? {
            Transition::Applied => {}
            Transition::Conflict | Transition::Missing => {
                return Err(LedgerError::MemberNotFound(account_id.to_string()))
            }
        }
        info!(group_id, account_id, "member removed");

        if actor_id == account_id {
            let username = self
                .require_account(account_id)
                .await
                .map(|a| a.username)
                .unwrap_or_else(|_| account_id.to_string());
            self.dispatch(
                &group.owner_id,
                "Member left group",
                &format!("{} left group: {}", username, group.group_name),
                json!({ "group_id": group_id }),
            )
            .await;
        }
        Ok(())
    }

    /// Invitee accepts a pending invitation.
    pub async fn accept_invitation(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        self.answer_invitation(group_id, actor_id, JoinStatus::Accepted)
            .await
    }

    /// Invitee declines a pending invitation.
    pub async fn reject_invitation(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        self.answer_invitation(group_id, actor_id, JoinStatus::Rejected)
            .await
    }

    async fn answer_invitation(
        &self,
        group_id: &str,
        actor_id: &str,
        answer: JoinStatus,
    ) -> Result<(), LedgerError> {
        let group = self.require_group(group_id).await?;
        self.store
            .get_member(group_id, actor_id)
            .await?
            .ok_or_else(|| LedgerError::MemberNotFound(actor_id.to_string()))?;

        match self
            .store
            .transition_member_join(group_id, actor_id, JoinStatus::Pending, answer)
            .await?
        {
            Transition::Applied => {}
            Transition::Conflict => {
                return Err(LedgerError::InvalidState(
                    "invitation is not pending".to_string(),
                ))
            }
            Transition::Missing => return Err(LedgerError::MemberNotFound(actor_id.to_string())),
        }

        let account = self.require_account(actor_id).await?;
        let (title, body) = if answer == JoinStatus::Accepted {
            (
                "Invitation accepted",
                format!("{} joined group: {}", account.username, group.group_name),
            )
        } else {
            (
                "Invitation declined",
                format!("{} declined group: {}", account.username, group.group_name),
            )
        };
        info!(group_id, actor_id, ?answer, "invitation answered");
        self.dispatch(&group.owner_id, title, &body, json!({ "group_id": group_id }))
            .await;
        Ok(())
    }

    /// Owner sets a member's target amount and optional per-member deadline.
    pub async fn update_member_amount(
        &self,
        group_id: &str,
        account_id: &str,
        amount: Decimal,
        payment_deadline: Option<&str>,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id {
            return Err(LedgerError::Forbidden(
                "only the group owner can set member amounts".to_string(),
            ));
        }
        self.validate_target_amount("amount", amount)?;
        let payment_deadline = self.parse_date("payment_deadline", payment_deadline)?;

        match self
            .store
            .update_member_terms(group_id, account_id, amount, payment_deadline)
            .await?
        {
            Transition::Applied => Ok(()),
            Transition::Conflict | Transition::Missing => {
                Err(LedgerError::MemberNotFound(account_id.to_string()))
            }
        }
    }

    /// Member submits payment proof against their target. Allowed again after
    /// an owner rejection, refused once confirmed.
    pub async fn submit_proof(
        &self,
        group_id: &str,
        proof_image_url: &str,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        if proof_image_url.trim().is_empty() {
            return Err(LedgerError::MissingProof);
        }
        self.require_group(group_id).await?;
        let member = self
            .store
            .get_member(group_id, actor_id)
            .await?
            .ok_or_else(|| LedgerError::MemberNotFound(actor_id.to_string()))?;
        if !member.is_accepted() {
            return Err(LedgerError::InvalidState(
                "only accepted members can submit payment proof".to_string(),
            ));
        }

        match self
            .store
            .record_member_proof(group_id, actor_id, proof_image_url)
            .await?
        {
            Transition::Applied => {
                info!(group_id, actor_id, "payment proof submitted");
                Ok(())
            }
            Transition::Conflict => Err(LedgerError::InvalidState(
                "payment has already been confirmed".to_string(),
            )),
            Transition::Missing => Err(LedgerError::MemberNotFound(actor_id.to_string())),
        }
    }

    /// Owner verdict on a reported member payment. A rejection re-opens the
    /// payment so the member can resubmit proof.
    pub async fn confirm_member_payment(
        &self,
        group_id: &str,
        account_id: &str,
        outcome: OwnerConfirmStatus,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        if outcome == OwnerConfirmStatus::Unconfirmed {
            return Err(LedgerError::InvalidInput(
                "outcome must be confirmed or rejected".to_string(),
            ));
        }
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id {
            return Err(LedgerError::Forbidden(
                "only the group owner can confirm member payments".to_string(),
            ));
        }

        match self
            .store
            .resolve_member_payment(group_id, account_id, outcome)
            .await?
        {
            Transition::Applied => {}
            Transition::Conflict => {
                return Err(LedgerError::InvalidState(
                    "member has not reported payment yet".to_string(),
                ))
            }
            Transition::Missing => return Err(LedgerError::MemberNotFound(account_id.to_string())),
        }
        info!(group_id, account_id, ?outcome, "member payment resolved");

        let (title, body) = if outcome == OwnerConfirmStatus::Confirmed {
            (
                "Payment confirmed",
                format!("Your payment for {} was confirmed", group.group_name),
            )
        } else {
            (
                "Payment rejected",
                format!(
                    "Your payment for {} was rejected, please resubmit proof",
                    group.group_name
                ),
            )
        };
        self.dispatch(account_id, title, &body, json!({ "group_id": group_id }))
            .await;
        Ok(())
    }

    /// Owner renames the group or moves the group-wide deadline.
    pub async fn update_group(
        &self,
        group_id: &str,
        group_name: &str,
        payment_deadline: Option<&str>,
        actor_id: &str,
    ) -> Result<(), LedgerError> {
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id {
            return Err(LedgerError::Forbidden(
                "only the group owner can update the group".to_string(),
            ));
        }
        self.validate_text("group_name", group_name, 100)?;
        let payment_deadline = self.parse_date("payment_deadline", payment_deadline)?;

        match self
            .store
            .update_group_terms(group_id, group_name.trim().to_string(), payment_deadline)
            .await?
        {
            Transition::Applied => Ok(()),
            Transition::Conflict | Transition::Missing => {
                Err(LedgerError::GroupNotFound(group_id.to_string()))
            }
        }
    }

    /// Group with roster and payment statistics, visible to members only.
    /// Statistics cover accepted members.
    pub async fn get_group(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<GroupDetails, LedgerError> {
        let group = self.require_group(group_id).await?;
        self.store
            .get_member(group_id, actor_id)
            .await?
            .ok_or_else(|| {
                LedgerError::Forbidden("only group members can view the group".to_string())
            })?;

        let members = self.store.members_for_group(group_id).await?;
        let stats = group_stats(&members);
        Ok(GroupDetails {
            group,
            members,
            stats,
        })
    }

    /// Groups the user belongs to with any join status, newest first.
    pub async fn groups_for_user(
        &self,
        actor_id: &str,
    ) -> Result<Vec<ExpenseGroup>, LedgerError> {
        self.store.groups_for_user(actor_id).await
    }

    /// Invitations of an owned group that are still unanswered.
    pub async fn pending_invitations(
        &self,
        group_id: &str,
        actor_id: &str,
    ) -> Result<Vec<MemberProfile>, LedgerError> {
        let group = self.require_group(group_id).await?;
        if actor_id != group.owner_id {
            return Err(LedgerError::Forbidden(
                "only the group owner can list pending invitations".to_string(),
            ));
        }
        let mut members = self.store.members_for_group(group_id).await?;
        members.retain(|m| m.member.join_status == JoinStatus::Pending);
        Ok(members)
    }

    pub(crate) async fn require_group(
        &self,
        group_id: &str,
    ) -> Result<ExpenseGroup, LedgerError> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }
}

fn group_stats(members: &[MemberProfile]) -> GroupStats {
    let mut stats = GroupStats::default();
    for row in members.iter().filter(|m| m.member.is_accepted()) {
        stats.total_members += 1;
        stats.total_amount += row.member.amount;
        if row.member.payment_status == MemberPaymentStatus::Paid {
            stats.paid_members += 1;
            stats.paid_amount += row.member.amount;
        } else {
            stats.unpaid_members += 1;
            stats.unpaid_amount += row.member.amount;
        }
    }
    stats
}
