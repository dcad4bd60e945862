use rust_decimal_macros::dec;

use crate::core::models::ShareInput;
use crate::tests::{create_test_service, register, TestService};
use crate::LedgerError;

/// Group with an owner and two accepted members plus one pending invitee.
async fn seed_group(service: &TestService) -> (String, String, String, String, String) {
    let owner = register(service, "owner").await;
    let bob = register(service, "bob").await;
    let carol = register(service, "carol").await;
    let dave = register(service, "dave").await;
    let group = service
        .create_group(
            "Trip",
            None,
            &[bob.id.clone(), carol.id.clone(), dave.id.clone()],
            &owner.id,
        )
        .await
        .unwrap();
    service.accept_invitation(&group.id, &bob.id).await.unwrap();
    service.accept_invitation(&group.id, &carol.id).await.unwrap();
    (group.id, owner.id, bob.id, carol.id, dave.id)
}

#[tokio::test]
async fn even_split_excludes_pending_members() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, dave_id) = seed_group(&service).await;

    let expense = service
        .create_expense(&group_id, dec!(90), None, "2026-08-01", None, &owner_id)
        .await
        .unwrap();

    let row = service.get_expense(&expense.id, &bob_id).await.unwrap();
    assert_eq!(row.shares.len(), 3);
    assert!(row.shares.iter().all(|s| s.share.shared_amount == dec!(30)));
    assert!(!row.shares.iter().any(|s| s.share.account_id == dave_id));
    let _ = carol_id;
}

#[tokio::test]
async fn uneven_split_residual_goes_to_the_payer() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, _) = seed_group(&service).await;

    let expense = service
        .create_expense(&group_id, dec!(100), None, "2026-08-01", None, &owner_id)
        .await
        .unwrap();

    let row = service.get_expense(&expense.id, &owner_id).await.unwrap();
    let share_of = |id: &str| {
        row.shares
            .iter()
            .find(|s| s.share.account_id == id)
            .unwrap()
            .share
            .shared_amount
    };
    assert_eq!(share_of(&bob_id), dec!(33.33));
    assert_eq!(share_of(&carol_id), dec!(33.33));
    assert_eq!(share_of(&owner_id), dec!(33.34));

    let sum: rust_decimal::Decimal = row.shares.iter().map(|s| s.share.shared_amount).sum();
    assert_eq!(sum, dec!(100));
}

#[tokio::test]
async fn mismatched_shares_leave_no_trace() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, _) = seed_group(&service).await;

    let shares = vec![
        ShareInput { account_id: owner_id.clone(), shared_amount: dec!(40) },
        ShareInput { account_id: bob_id.clone(), shared_amount: dec!(40) },
        ShareInput { account_id: carol_id.clone(), shared_amount: dec!(10) },
    ];
    let result = service
        .create_expense(&group_id, dec!(100), None, "2026-08-01", Some(shares), &owner_id)
        .await;
    assert!(matches!(result, Err(LedgerError::ShareMismatch(_))));

    // nothing was persisted
    let expenses = service.group_expenses(&group_id, &owner_id).await.unwrap();
    assert!(expenses.is_empty());
}

#[tokio::test]
async fn shares_within_a_cent_are_accepted() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, _) = seed_group(&service).await;

    let shares = vec![
        ShareInput { account_id: owner_id.clone(), shared_amount: dec!(33.33) },
        ShareInput { account_id: bob_id.clone(), shared_amount: dec!(33.33) },
        ShareInput { account_id: carol_id.clone(), shared_amount: dec!(33.33) },
    ];
    service
        .create_expense(&group_id, dec!(100), None, "2026-08-01", Some(shares), &owner_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn share_targets_must_be_accepted_members() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, _, dave_id) = seed_group(&service).await;

    // dave never accepted his invitation
    let shares = vec![
        ShareInput { account_id: owner_id.clone(), shared_amount: dec!(50) },
        ShareInput { account_id: dave_id.clone(), shared_amount: dec!(50) },
    ];
    let result = service
        .create_expense(&group_id, dec!(100), None, "2026-08-01", Some(shares), &owner_id)
        .await;
    assert!(matches!(result, Err(LedgerError::MemberNotFound(_))));

    let shares = vec![
        ShareInput { account_id: bob_id.clone(), shared_amount: dec!(50) },
        ShareInput { account_id: bob_id.clone(), shared_amount: dec!(50) },
    ];
    let result = service
        .create_expense(&group_id, dec!(100), None, "2026-08-01", Some(shares), &owner_id)
        .await;
    assert!(matches!(result, Err(LedgerError::ShareMismatch(_))));
}

#[tokio::test]
async fn non_members_cannot_record_or_view_expenses() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, _, _, dave_id) = seed_group(&service).await;
    let outsider = register(&service, "outsider").await;

    let result = service
        .create_expense(&group_id, dec!(50), None, "2026-08-01", None, &outsider.id)
        .await;
    assert!(matches!(result, Err(LedgerError::Forbidden(_))));

    // pending members cannot pay either
    let result = service
        .create_expense(&group_id, dec!(50), None, "2026-08-01", None, &dave_id)
        .await;
    assert!(matches!(result, Err(LedgerError::Forbidden(_))));

    service
        .create_expense(&group_id, dec!(50), None, "2026-08-01", None, &owner_id)
        .await
        .unwrap();
    let result = service.group_expenses(&group_id, &outsider.id).await;
    assert!(matches!(result, Err(LedgerError::Forbidden(_))));
}

#[tokio::test]
async fn expense_mutation_is_payer_only() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, _) = seed_group(&service).await;
    let expense = service
        .create_expense(&group_id, dec!(90), None, "2026-08-01", None, &owner_id)
        .await
        .unwrap();

    let new_shares = vec![
        ShareInput { account_id: owner_id.clone(), shared_amount: dec!(45) },
        ShareInput { account_id: bob_id.clone(), shared_amount: dec!(45) },
    ];
    let result = service
        .update_shares(&expense.id, new_shares.clone(), &bob_id)
        .await;
    assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    service
        .update_shares(&expense.id, new_shares, &owner_id)
        .await
        .unwrap();

    let row = service.get_expense(&expense.id, &carol_id).await.unwrap();
    assert_eq!(row.shares.len(), 2);

    let result = service.update_shares(&expense.id, vec![], &owner_id).await;
    assert!(matches!(result, Err(LedgerError::InvalidInput(_))));

    let result = service.delete_expense(&expense.id, &bob_id).await;
    assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    service.delete_expense(&expense.id, &owner_id).await.unwrap();
    let expenses = service.group_expenses(&group_id, &owner_id).await.unwrap();
    assert!(expenses.is_empty());
}

#[tokio::test]
async fn total_changes_must_match_the_shares() {
    let (service, _) = create_test_service();
    let (group_id, owner_id, _, _, _) = seed_group(&service).await;
    let expense = service
        .create_expense(
            &group_id,
            dec!(90),
            Some("dinner".to_string()),
            "2026-08-01",
            None,
            &owner_id,
        )
        .await
        .unwrap();

    let result = service
        .update_expense(&expense.id, dec!(120), None, "2026-08-02", &owner_id)
        .await;
    assert!(matches!(result, Err(LedgerError::ShareMismatch(_))));

    service
        .update_expense(
            &expense.id,
            dec!(90),
            Some("team dinner".to_string()),
            "2026-08-02",
            &owner_id,
        )
        .await
        .unwrap();
    let row = service.get_expense(&expense.id, &owner_id).await.unwrap();
    assert_eq!(row.expense.description.as_deref(), Some("team dinner"));
}

#[tokio::test]
async fn expense_notifications_skip_the_payer() {
    let (service, notifier) = create_test_service();
    let (group_id, owner_id, bob_id, carol_id, dave_id) = seed_group(&service).await;
    let before = notifier.sent().await.len();

    service
        .create_expense(&group_id, dec!(60), None, "2026-08-01", None, &bob_id)
        .await
        .unwrap();

    let after = notifier.sent().await;
    let new: Vec<_> = after[before..]
        .iter()
        .filter(|m| m.title == "New group expense")
        .collect();
    assert_eq!(new.len(), 2);
    assert!(new.iter().any(|m| m.user_id == owner_id));
    assert!(new.iter().any(|m| m.user_id == carol_id));
    assert!(!new.iter().any(|m| m.user_id == bob_id));
    assert!(!new.iter().any(|m| m.user_id == dave_id));
}
