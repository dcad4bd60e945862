use chrono::{Datelike, Utc};
use rust_decimal_macros::dec;

use crate::core::models::reports::DebtFilter;
use crate::core::models::{MemberPaymentStatus, OwnerConfirmStatus, PaidStatus};
use crate::tests::{create_test_service, register, TestService};
use crate::LedgerError;

async fn settle(service: &TestService, debt_id: &str, creditor: &str, debtor: &str) {
    service.confirm_debt(debt_id, debtor).await.unwrap();
    service
        .report_payment(debt_id, "proof.png", debtor)
        .await
        .unwrap();
    service.confirm_payment(debt_id, creditor).await.unwrap();
}

#[tokio::test]
async fn debt_summary_splits_by_role() {
    let (service, _) = create_test_service();
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    let owed_to_alice = service
        .create_debt(&alice.id, &bob.id, dec!(50), None, None, &alice.id)
        .await
        .unwrap();
    settle(&service, &owed_to_alice.id, &alice.id, &bob.id).await;
    service
        .create_debt(&alice.id, &bob.id, dec!(30), None, None, &alice.id)
        .await
        .unwrap();
    service
        .create_debt(&bob.id, &alice.id, dec!(20), None, None, &bob.id)
        .await
        .unwrap();

    let summary = service
        .debt_summary(&alice.id, &DebtFilter::default())
        .await
        .unwrap();
    assert_eq!(summary.receivable.count, 2);
    assert_eq!(summary.receivable.total_amount, dec!(80));
    assert_eq!(summary.receivable.paid_amount, dec!(50));
    assert_eq!(summary.receivable.unpaid_amount, dec!(30));
    assert_eq!(summary.payable.count, 1);
    assert_eq!(summary.payable.unpaid_amount, dec!(20));

    let filter = DebtFilter {
        paid_status: Some(PaidStatus::Paid),
        ..Default::default()
    };
    let paid_only = service.debt_summary(&alice.id, &filter).await.unwrap();
    assert_eq!(paid_only.receivable.count, 1);
    assert_eq!(paid_only.payable.count, 0);
}

#[tokio::test]
async fn counterparties_rank_by_outstanding_amount() {
    let (service, _) = create_test_service();
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    let carol = register(&service, "carol").await;

    service
        .create_debt(&alice.id, &carol.id, dec!(20), None, None, &alice.id)
        .await
        .unwrap();
    service
        .create_debt(&alice.id, &bob.id, dec!(50), None, None, &alice.id)
        .await
        .unwrap();

    let entries = service.counterparty_report(&alice.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].account_id, bob.id);
    assert_eq!(entries[0].receivable_unpaid, dec!(50));
    assert_eq!(entries[1].account_id, carol.id);
    assert_eq!(entries[1].receivable_unpaid, dec!(20));
}

#[tokio::test]
async fn volume_reports_bucket_by_period() {
    let (service, _) = create_test_service();
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    service
        .create_debt(&alice.id, &bob.id, dec!(50), None, None, &alice.id)
        .await
        .unwrap();
    service
        .create_debt(&bob.id, &alice.id, dec!(20), None, None, &bob.id)
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let monthly = service
        .monthly_debt_report(&alice.id, today.year())
        .await
        .unwrap();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].month, today.month());
    assert_eq!(monthly[0].count, 2);
    assert_eq!(monthly[0].total_amount, dec!(70));
    assert_eq!(monthly[0].receivable_amount, dec!(50));
    assert_eq!(monthly[0].payable_amount, dec!(20));

    let yearly = service.yearly_debt_report(&alice.id).await.unwrap();
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].year, today.year());
    assert_eq!(yearly[0].month, 0);

    let result = service.monthly_debt_report(&alice.id, 1999).await;
    assert!(matches!(result, Err(LedgerError::InvalidDate(_))));
}

#[tokio::test]
async fn creditor_and_debtor_reports_cover_accepted_debts_only() {
    let (service, _) = create_test_service();
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    let carol = register(&service, "carol").await;

    // never accepted, must not show up anywhere
    service
        .create_debt(&alice.id, &bob.id, dec!(999), None, None, &alice.id)
        .await
        .unwrap();

    let overdue = service
        .create_debt(&alice.id, &bob.id, dec!(50), None, Some("2024-01-31"), &alice.id)
        .await
        .unwrap();
    service.confirm_debt(&overdue.id, &bob.id).await.unwrap();

    let current = service
        .create_debt(&alice.id, &carol.id, dec!(30), None, Some("2030-01-01"), &alice.id)
        .await
        .unwrap();
    service.confirm_debt(&current.id, &carol.id).await.unwrap();

    let paid = service
        .create_debt(&alice.id, &carol.id, dec!(10), None, None, &alice.id)
        .await
        .unwrap();
    settle(&service, &paid.id, &alice.id, &carol.id).await;

    let report = service.creditor_report(&alice.id).await.unwrap();
    assert_eq!(report.total_paid_amount, dec!(10));
    assert_eq!(report.total_unpaid_amount, dec!(80));
    assert_eq!(report.unpaid_emails, vec!["bob@example.com", "carol@example.com"]);
    assert_eq!(report.overdue_emails, vec!["bob@example.com"]);

    let report = service.debtor_report(&bob.id).await.unwrap();
    assert_eq!(report.total_unpaid_amount, dec!(50));
    assert_eq!(report.unpaid_emails, vec!["alice@example.com"]);
    assert_eq!(report.overdue_emails, vec!["alice@example.com"]);
}

#[tokio::test]
async fn group_targets_follow_the_effective_deadline() {
    let (service, _) = create_test_service();
    let owner = register(&service, "owner").await;
    let bob = register(&service, "bob").await;
    let group = service
        .create_group("Rent", Some("2026-09-01"), &[bob.id.clone()], &owner.id)
        .await
        .unwrap();
    service.accept_invitation(&group.id, &bob.id).await.unwrap();
    service
        .update_member_amount(&group.id, &bob.id, dec!(300), None, &owner.id)
        .await
        .unwrap();

    // falls back to the group-wide deadline
    let report = service.group_target_report(&bob.id, 2026, 9).await.unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.total_target_amount, dec!(300));
    assert_eq!(report.total_unpaid_amount, dec!(300));
    assert_eq!(report.groups[0].group_total_amount, dec!(300));

    // a per-member override moves the row to another month
    service
        .update_member_amount(&group.id, &bob.id, dec!(300), Some("2026-10-15"), &owner.id)
        .await
        .unwrap();
    let report = service.group_target_report(&bob.id, 2026, 9).await.unwrap();
    assert!(report.groups.is_empty());
    let report = service.group_target_report(&bob.id, 2026, 10).await.unwrap();
    assert_eq!(report.groups.len(), 1);

    let result = service.group_target_report(&bob.id, 2026, 13).await;
    assert!(matches!(result, Err(LedgerError::InvalidDate(_))));
}

#[tokio::test]
async fn owner_unpaid_report_lists_delinquent_groups() {
    let (service, _) = create_test_service();
    let owner = register(&service, "owner").await;
    let bob = register(&service, "bob").await;
    let carol = register(&service, "carol").await;
    let group = service
        .create_group(
            "Rent",
            Some("2025-01-01"),
            &[bob.id.clone(), carol.id.clone()],
            &owner.id,
        )
        .await
        .unwrap();
    service.accept_invitation(&group.id, &bob.id).await.unwrap();
    service.accept_invitation(&group.id, &carol.id).await.unwrap();
    service
        .update_member_amount(&group.id, &bob.id, dec!(100), None, &owner.id)
        .await
        .unwrap();
    service
        .update_member_amount(&group.id, &carol.id, dec!(150), None, &owner.id)
        .await
        .unwrap();

    // carol settles, bob does not
    service
        .submit_proof(&group.id, "proof.png", &carol.id)
        .await
        .unwrap();
    service
        .confirm_member_payment(&group.id, &carol.id, OwnerConfirmStatus::Confirmed, &owner.id)
        .await
        .unwrap();

    let report = service.owner_unpaid_report(&owner.id).await.unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].unpaid_member_count, 1);
    assert_eq!(report.groups[0].unpaid_amount, dec!(100));
    assert_eq!(report.groups[0].overdue_emails, vec!["bob@example.com"]);
    assert_eq!(report.total_unpaid_amount, dec!(100));
    assert_eq!(report.unpaid_emails, vec!["bob@example.com"]);
}

#[tokio::test]
async fn member_payment_report_partitions_by_state() {
    let (service, _) = create_test_service();
    let owner = register(&service, "owner").await;
    let bob = register(&service, "bob").await;

    // a group bob owns must not appear in his member report
    service
        .create_group("Bob's own", None, &[owner.id.clone()], &bob.id)
        .await
        .unwrap();

    let overdue = service
        .create_group("Rent", Some("2025-01-01"), &[bob.id.clone()], &owner.id)
        .await
        .unwrap();
    service.accept_invitation(&overdue.id, &bob.id).await.unwrap();
    service
        .update_member_amount(&overdue.id, &bob.id, dec!(100), None, &owner.id)
        .await
        .unwrap();

    let settled = service
        .create_group("Trip", None, &[bob.id.clone()], &owner.id)
        .await
        .unwrap();
    service.accept_invitation(&settled.id, &bob.id).await.unwrap();
    service
        .update_member_amount(&settled.id, &bob.id, dec!(40), None, &owner.id)
        .await
        .unwrap();
    service
        .submit_proof(&settled.id, "proof.png", &bob.id)
        .await
        .unwrap();

    let report = service.member_payment_report(&bob.id).await.unwrap();
    assert_eq!(report.total_unpaid_amount, dec!(100));
    assert_eq!(report.unpaid.len(), 1);
    assert_eq!(report.unpaid[0].group_id, overdue.id);
    assert_eq!(report.paid.len(), 1);
    assert_eq!(report.paid[0].group_id, settled.id);
    assert_eq!(report.overdue.len(), 1);
    assert_eq!(report.overdue[0].group_id, overdue.id);
    assert_eq!(
        report.unpaid[0].payment_status,
        MemberPaymentStatus::Unpaid
    );
}
