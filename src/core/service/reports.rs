use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use crate::core::errors::LedgerError;
use crate::core::models::reports::{
    CounterpartyEntry, CreditorReport, DebtFilter, DebtSummary, DebtVolume, DebtorReport,
    DelinquentGroup, GroupTargetReport, GroupTargetRow, MemberPaymentReport, OwnerUnpaidReport,
    RoleTotals,
};
use crate::core::models::views::{DebtWithParties, MembershipRow};
use crate::core::models::{Debt, DebtConfirmStatus, MemberPaymentStatus, PaidStatus};
use crate::core::service::LedgerService;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::store::LedgerStore;

const MIN_REPORT_YEAR: i32 = 2020;
const MAX_REPORT_YEAR: i32 = 2035;

/// The ledger aggregator. Every report folds over one point-in-time store
/// snapshot; nothing here mutates state.
impl<S: LedgerStore, N: Notifier> LedgerService<S, N> {
    /// Counts and sums of the user's debts on both sides of the ledger,
    /// restricted by the filter.
    pub async fn debt_summary(
        &self,
        user_id: &str,
        filter: &DebtFilter,
    ) -> Result<DebtSummary, LedgerError> {
        let rows = self.store.debts_for_user(user_id).await?;
        let mut summary = DebtSummary::default();
        for row in rows.iter().filter(|r| matches_filter(&r.debt, filter)) {
            let side = if row.debt.creditor_id == user_id {
                &mut summary.receivable
            } else {
                &mut summary.payable
            };
            accumulate(side, row);
        }
        Ok(summary)
    }

    /// Per-counterparty subtotals, sorted by outstanding amount, then total
    /// volume, then account id for a stable order.
    pub async fn counterparty_report(
        &self,
        user_id: &str,
    ) -> Result<Vec<CounterpartyEntry>, LedgerError> {
        let rows = self.store.debts_for_user(user_id).await?;
        let mut entries: Vec<CounterpartyEntry> = Vec::new();
        for row in &rows {
            let (counterparty, receivable) = if row.debt.creditor_id == user_id {
                (&row.debtor, true)
            } else {
                (&row.creditor, false)
            };
            let entry = match entries.iter_mut().find(|e| e.account_id == counterparty.id) {
                Some(entry) => entry,
                None => {
                    entries.push(CounterpartyEntry {
                        account_id: counterparty.id.clone(),
                        username: counterparty.username.clone(),
                        email: counterparty.email.clone(),
                        receivable_unpaid: Decimal::ZERO,
                        receivable_paid: Decimal::ZERO,
                        payable_unpaid: Decimal::ZERO,
                        payable_paid: Decimal::ZERO,
                        total_amount: Decimal::ZERO,
                    });
                    entries.last_mut().unwrap()
                }
            };
            entry.total_amount += row.debt.amount;
            let paid = row.debt.paid_status == PaidStatus::Paid;
            match (receivable, paid) {
                (true, true) => entry.receivable_paid += row.debt.amount,
                (true, false) => entry.receivable_unpaid += row.debt.amount,
                (false, true) => entry.payable_paid += row.debt.amount,
                (false, false) => entry.payable_unpaid += row.debt.amount,
            }
        }
        entries.sort_by(|a, b| {
            b.unpaid_amount()
                .cmp(&a.unpaid_amount())
                .then(b.total_amount.cmp(&a.total_amount))
                .then(a.account_id.cmp(&b.account_id))
        });
        Ok(entries)
    }

    /// Debt volume per month of one year. Empty months are omitted.
    pub async fn monthly_debt_report(
        &self,
        user_id: &str,
        year: i32,
    ) -> Result<Vec<DebtVolume>, LedgerError> {
        validate_year(year)?;
        let rows = self.store.debts_for_user(user_id).await?;
        let mut buckets: Vec<DebtVolume> = Vec::new();
        for row in &rows {
            let created = row.debt.created_at.date_naive();
            if created.year() != year {
                continue;
            }
            bucket(&mut buckets, year, created.month(), row, user_id);
        }
        buckets.sort_by_key(|b| b.month);
        Ok(buckets)
    }

    /// Debt volume per year across the user's whole history.
    pub async fn yearly_debt_report(
        &self,
        user_id: &str,
    ) -> Result<Vec<DebtVolume>, LedgerError> {
        let rows = self.store.debts_for_user(user_id).await?;
        let mut buckets: Vec<DebtVolume> = Vec::new();
        for row in &rows {
            let year = row.debt.created_at.date_naive().year();
            bucket(&mut buckets, year, 0, row, user_id);
        }
        buckets.sort_by_key(|b| b.year);
        Ok(buckets)
    }

    /// The user's standing as a creditor over accepted debts: what was
    /// collected, what is outstanding, and who still owes.
    pub async fn creditor_report(&self, user_id: &str) -> Result<CreditorReport, LedgerError> {
        let rows = self.store.debts_for_user(user_id).await?;
        let today = Utc::now().date_naive();
        let mut report = CreditorReport::default();
        for row in rows.iter().filter(|r| {
            r.debt.creditor_id == user_id && r.debt.confirm_status == DebtConfirmStatus::Accepted
        }) {
            if row.debt.paid_status == PaidStatus::Paid {
                report.total_paid_amount += row.debt.amount;
            } else {
                report.total_unpaid_amount += row.debt.amount;
                push_unique(&mut report.unpaid_emails, &row.debtor.email);
                if row.debt.is_overdue(today) {
                    push_unique(&mut report.overdue_emails, &row.debtor.email);
                }
            }
        }
        Ok(report)
    }

    /// The user's standing as a debtor over accepted debts.
    pub async fn debtor_report(&self, user_id: &str) -> Result<DebtorReport, LedgerError> {
        let rows = self.store.debts_for_user(user_id).await?;
        let today = Utc::now().date_naive();
        let mut report = DebtorReport::default();
        for row in rows.iter().filter(|r| {
            r.debt.debtor_id == user_id
                && r.debt.confirm_status == DebtConfirmStatus::Accepted
                && r.debt.paid_status == PaidStatus::Unpaid
        }) {
            report.total_unpaid_amount += row.debt.amount;
            push_unique(&mut report.unpaid_emails, &row.creditor.email);
            if row.debt.is_overdue(today) {
                push_unique(&mut report.overdue_emails, &row.creditor.email);
            }
        }
        Ok(report)
    }

    /// The user's group targets whose effective deadline falls inside the
    /// given month, with group-wide totals alongside each row.
    pub async fn group_target_report(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<GroupTargetReport, LedgerError> {
        validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidDate(format!("invalid month: {month}")));
        }

        let rows = self.store.group_rows_for_user(user_id).await?;
        let mut report = GroupTargetReport {
            year,
            month,
            total_target_amount: Decimal::ZERO,
            total_unpaid_amount: Decimal::ZERO,
            groups: Vec::new(),
        };
        for chunk in chunk_by_group(&rows) {
            let Some(own) = chunk
                .iter()
                .find(|r| r.member.account_id == user_id && r.member.is_accepted())
            else {
                continue;
            };
            let in_month = own
                .member
                .effective_deadline(&own.group)
                .is_some_and(|d| d.year() == year && d.month() == month);
            if !in_month {
                continue;
            }
            let row = target_row(own, chunk);
            report.total_target_amount += row.target_amount;
            if row.payment_status == MemberPaymentStatus::Unpaid {
                report.total_unpaid_amount += row.target_amount;
            }
            report.groups.push(row);
        }
        Ok(report)
    }

    /// Owner view: which owned groups still have unpaid accepted members,
    /// and who they are. The owner's own zero-target row is ignored.
    pub async fn owner_unpaid_report(
        &self,
        owner_id: &str,
    ) -> Result<OwnerUnpaidReport, LedgerError> {
        let rows = self.store.member_rows_for_owner(owner_id).await?;
        let today = Utc::now().date_naive();
        let mut report = OwnerUnpaidReport::default();
        for chunk in chunk_by_group(&rows) {
            let mut group = DelinquentGroup {
                group_id: chunk[0].group.id.clone(),
                group_name: chunk[0].group.group_name.clone(),
                unpaid_member_count: 0,
                unpaid_amount: Decimal::ZERO,
                overdue_emails: Vec::new(),
            };
            for row in chunk.iter().filter(|r| {
                r.member.is_accepted()
                    && r.member.account_id != owner_id
                    && r.member.payment_status == MemberPaymentStatus::Unpaid
            }) {
                group.unpaid_member_count += 1;
                group.unpaid_amount += row.member.amount;
                if row.member.is_overdue(&row.group, today) {
                    push_unique(&mut group.overdue_emails, &row.account.email);
                }
                push_unique(&mut report.unpaid_emails, &row.account.email);
            }
            if group.unpaid_member_count > 0 {
                report.total_unpaid_amount += group.unpaid_amount;
                report.groups.push(group);
            }
        }
        Ok(report)
    }

    /// Member view: the user's accepted targets in groups they do not own,
    /// partitioned into unpaid / paid, with the overdue subset called out.
    pub async fn member_payment_report(
        &self,
        user_id: &str,
    ) -> Result<MemberPaymentReport, LedgerError> {
        let rows = self.store.group_rows_for_user(user_id).await?;
        let today = Utc::now().date_naive();
        let mut report = MemberPaymentReport::default();
        for chunk in chunk_by_group(&rows) {
            if chunk[0].group.owner_id == user_id {
                continue;
            }
            let Some(own) = chunk
                .iter()
                .find(|r| r.member.account_id == user_id && r.member.is_accepted())
            else {
                continue;
            };
            let row = target_row(own, chunk);
            if own.member.payment_status == MemberPaymentStatus::Unpaid {
                report.total_unpaid_amount += row.target_amount;
                if own.member.is_overdue(&own.group, today) {
                    report.overdue.push(row.clone());
                }
                report.unpaid.push(row);
            } else {
                report.paid.push(row);
            }
        }
        Ok(report)
    }
}

fn matches_filter(debt: &Debt, filter: &DebtFilter) -> bool {
    let created = debt.created_at.date_naive();
    if filter.from.is_some_and(|from| created < from) {
        return false;
    }
    if filter.to.is_some_and(|to| created > to) {
        return false;
    }
    if filter.confirm_status.is_some_and(|s| debt.confirm_status != s) {
        return false;
    }
    if filter.paid_status.is_some_and(|s| debt.paid_status != s) {
        return false;
    }
    filter
        .payment_confirm_status
        .map_or(true, |s| debt.payment_confirm_status == s)
}

fn accumulate(side: &mut RoleTotals, row: &DebtWithParties) {
    side.count += 1;
    side.total_amount += row.debt.amount;
    if row.debt.paid_status == PaidStatus::Paid {
        side.paid_count += 1;
        side.paid_amount += row.debt.amount;
    } else {
        side.unpaid_count += 1;
        side.unpaid_amount += row.debt.amount;
    }
}

fn bucket(
    buckets: &mut Vec<DebtVolume>,
    year: i32,
    month: u32,
    row: &DebtWithParties,
    user_id: &str,
) {
    let bucket = match buckets.iter_mut().find(|b| b.year == year && b.month == month) {
        Some(b) => b,
        None => {
            buckets.push(DebtVolume {
                year,
                month,
                count: 0,
                total_amount: Decimal::ZERO,
                receivable_amount: Decimal::ZERO,
                payable_amount: Decimal::ZERO,
            });
            buckets.last_mut().unwrap()
        }
    };
    bucket.count += 1;
    bucket.total_amount += row.debt.amount;
    if row.debt.creditor_id == user_id {
        bucket.receivable_amount += row.debt.amount;
    } else {
        bucket.payable_amount += row.debt.amount;
    }
}

fn push_unique(emails: &mut Vec<String>, email: &str) {
    if !emails.iter().any(|e| e == email) {
        emails.push(email.to_string());
    }
}

fn validate_year(year: i32) -> Result<(), LedgerError> {
    if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
        return Err(LedgerError::InvalidDate(format!("invalid year: {year}")));
    }
    Ok(())
}

/// Splits rows (already ordered by group) into per-group slices.
fn chunk_by_group(rows: &[MembershipRow]) -> Vec<&[MembershipRow]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || rows[i].group.id != rows[start].group.id {
            chunks.push(&rows[start..i]);
            start = i;
        }
    }
    chunks
}

fn target_row(own: &MembershipRow, chunk: &[MembershipRow]) -> GroupTargetRow {
    let mut group_total = Decimal::ZERO;
    let mut group_unpaid = Decimal::ZERO;
    for row in chunk.iter().filter(|r| r.member.is_accepted()) {
        group_total += row.member.amount;
        if row.member.payment_status == MemberPaymentStatus::Unpaid {
            group_unpaid += row.member.amount;
        }
    }
    GroupTargetRow {
        group_id: own.group.id.clone(),
        group_name: own.group.group_name.clone(),
        target_amount: own.member.amount,
        payment_status: own.member.payment_status,
        owner_confirm_status: own.member.owner_confirm_status,
        payment_deadline: own.member.effective_deadline(&own.group),
        group_total_amount: group_total,
        group_unpaid_amount: group_unpaid,
    }
}
