//! Ledger tests - transaction creation and the conditional status transitions

#[path = "../common/mod.rs"]
mod common;

use common::*;
use rusqlite::params;

// ============ Creation ============

#[test]
fn test_create_transaction_defaults_to_pending() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    let tx = create_subscription_tx(&conn, "abuja_sub1", &profile.id, "pro", BillingCycle::Monthly);

    assert!(!tx.id.is_empty(), "transaction should have a generated ID");
    assert_eq!(tx.reference, "abuja_sub1", "reference should match input");
    assert_eq!(
        tx.status,
        TransactionStatus::Pending,
        "new transaction should start pending"
    );
    assert_eq!(tx.amount_kobo, 500_000, "amount should match input");
    assert_eq!(
        tx.subscription_tier.as_deref(),
        Some("pro"),
        "tier should match input"
    );
    assert_eq!(
        tx.billing_cycle,
        Some(BillingCycle::Monthly),
        "billing cycle should match input"
    );
    assert!(tx.verified_at.is_none(), "unreconciled row has no verified_at");
    assert!(
        tx.webhook_received_at.is_none(),
        "unreconciled row has no webhook_received_at"
    );
    assert!(
        tx.gateway_response.is_none(),
        "unreconciled row has no gateway snapshot"
    );
    assert!(tx.created_at > 0, "created_at should be stamped");
    assert_eq!(
        tx.created_at, tx.updated_at,
        "fresh row has matching timestamps"
    );
}

#[test]
fn test_create_boost_transaction_round_trips() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    let property = create_test_property(&conn, &profile.id, "3 bed terrace, Lekki Phase 1");
    let tx = create_boost_tx(&conn, "abuja_boost1", &profile.id, &property.id, 7);

    assert_eq!(
        tx.transaction_type,
        TransactionType::Boost,
        "type should be boost"
    );
    assert_eq!(
        tx.property_id.as_deref(),
        Some(property.id.as_str()),
        "property ID should match input"
    );
    assert_eq!(
        tx.boost_duration_days,
        Some(7),
        "boost duration should match input"
    );
    assert!(
        tx.subscription_tier.is_none(),
        "boost rows carry no subscription fields"
    );
    assert!(
        tx.billing_cycle.is_none(),
        "boost rows carry no billing cycle"
    );
}

#[test]
fn test_duplicate_reference_is_rejected() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_dup", &profile.id, "pro", BillingCycle::Monthly);

    let result = queries::create_transaction(
        &conn,
        &CreateTransaction {
            reference: "abuja_dup".to_string(),
            profile_id: profile.id.clone(),
            transaction_type: TransactionType::Subscription,
            amount_kobo: 500_000,
            subscription_tier: Some("premium".to_string()),
            billing_cycle: Some(BillingCycle::Annual),
            property_id: None,
            boost_duration_days: None,
        },
    );

    assert!(result.is_err(), "reusing a reference should fail");
}

#[test]
fn test_find_transaction_by_reference() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    let created =
        create_subscription_tx(&conn, "abuja_find", &profile.id, "pro", BillingCycle::Monthly);

    let fetched = queries::find_transaction_by_reference(&conn, "abuja_find")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(fetched.id, created.id, "fetched row should match created");

    let missing =
        queries::find_transaction_by_reference(&conn, "abuja_nope").expect("Query failed");
    assert!(missing.is_none(), "unknown reference should find nothing");
}

// ============ Success transition ============

#[test]
fn test_mark_success_transitions_pending_row() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_ok", &profile.id, "pro", BillingCycle::Monthly);

    let won = queries::try_mark_transaction_success(&conn, "abuja_ok", r#"{"status":"success"}"#)
        .expect("Update failed");
    assert!(won, "pending row should transition");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_ok")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(tx.status, TransactionStatus::Success, "status should be success");
    assert!(tx.verified_at.is_some(), "verified_at should be stamped");
    assert_eq!(
        tx.verified_at, tx.webhook_received_at,
        "both reconciliation timestamps come from the same instant"
    );
    assert_eq!(
        tx.gateway_response.as_deref(),
        Some(r#"{"status":"success"}"#),
        "gateway payload should be stored for audit"
    );
    assert!(
        tx.updated_at >= tx.created_at,
        "updated_at should move forward"
    );
}

#[test]
fn test_mark_success_second_delivery_loses() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_dup_ok", &profile.id, "pro", BillingCycle::Monthly);

    let first = queries::try_mark_transaction_success(&conn, "abuja_dup_ok", r#"{"n":1}"#)
        .expect("Update failed");
    let second = queries::try_mark_transaction_success(&conn, "abuja_dup_ok", r#"{"n":2}"#)
        .expect("Update failed");

    assert!(first, "first delivery should win");
    assert!(!second, "redelivery should see zero rows affected");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_dup_ok")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(
        tx.gateway_response.as_deref(),
        Some(r#"{"n":1}"#),
        "losing delivery must not overwrite the stored snapshot"
    );
}

#[test]
fn test_mark_success_overrides_earlier_failure() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_late", &profile.id, "pro", BillingCycle::Monthly);

    let failed = queries::try_mark_transaction_failed(&conn, "abuja_late", r#"{"declined":true}"#)
        .expect("Update failed");
    assert!(failed, "pending row should mark failed");

    // The success guard is `status != 'success'`, not `status = 'pending'`.
    // A late success event reconciles a row the gateway first reported
    // failed, since the money did move.
    let won = queries::try_mark_transaction_success(&conn, "abuja_late", r#"{"ok":true}"#)
        .expect("Update failed");
    assert!(won, "success should override a failed row");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_late")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(tx.status, TransactionStatus::Success, "status should end success");
    assert!(tx.verified_at.is_some(), "verified_at should be stamped");
}

// ============ Failed / abandoned transitions ============

#[test]
fn test_mark_failed_requires_pending() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_fail", &profile.id, "pro", BillingCycle::Monthly);

    let first = queries::try_mark_transaction_failed(&conn, "abuja_fail", r#"{"declined":true}"#)
        .expect("Update failed");
    assert!(first, "pending row should mark failed");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_fail")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(tx.status, TransactionStatus::Failed, "status should be failed");
    assert!(
        tx.webhook_received_at.is_some(),
        "failure still records webhook receipt"
    );
    assert!(
        tx.verified_at.is_none(),
        "failed rows are never marked verified"
    );

    let second = queries::try_mark_transaction_failed(&conn, "abuja_fail", r#"{"n":2}"#)
        .expect("Update failed");
    assert!(!second, "row is no longer pending");
}

#[test]
fn test_mark_failed_cannot_downgrade_success() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_down", &profile.id, "pro", BillingCycle::Monthly);
    queries::try_mark_transaction_success(&conn, "abuja_down", r#"{"ok":true}"#)
        .expect("Update failed");

    let downgraded =
        queries::try_mark_transaction_failed(&conn, "abuja_down", r#"{"declined":true}"#)
            .expect("Update failed");
    assert!(!downgraded, "late failure must not touch a reconciled row");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_down")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(
        tx.status,
        TransactionStatus::Success,
        "status should stay success"
    );
}

#[test]
fn test_mark_abandoned_requires_pending() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_timeout", &profile.id, "pro", BillingCycle::Monthly);

    let first = queries::try_mark_transaction_abandoned(&conn, "abuja_timeout", r#"{}"#)
        .expect("Update failed");
    assert!(first, "pending row should mark abandoned");

    let tx = queries::find_transaction_by_reference(&conn, "abuja_timeout")
        .expect("Query failed")
        .expect("Transaction not found");
    assert_eq!(
        tx.status,
        TransactionStatus::Abandoned,
        "status should be abandoned"
    );

    let second = queries::try_mark_transaction_abandoned(&conn, "abuja_timeout", r#"{}"#)
        .expect("Update failed");
    assert!(!second, "row is no longer pending");
}

#[test]
fn test_mark_abandoned_cannot_downgrade_success() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_late_to", &profile.id, "pro", BillingCycle::Monthly);
    queries::try_mark_transaction_success(&conn, "abuja_late_to", r#"{"ok":true}"#)
        .expect("Update failed");

    let abandoned = queries::try_mark_transaction_abandoned(&conn, "abuja_late_to", r#"{}"#)
        .expect("Update failed");
    assert!(!abandoned, "late timeout must not touch a reconciled row");
}

// ============ Listing ============

fn backdate(conn: &rusqlite::Connection, reference: &str, created_at: i64) {
    conn.execute(
        "UPDATE transactions SET created_at = ?1 WHERE reference = ?2",
        params![created_at, reference],
    )
    .expect("Backdate failed");
}

#[test]
fn test_list_transactions_newest_first() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    let base = now();
    for (i, reference) in ["abuja_t1", "abuja_t2", "abuja_t3"].iter().enumerate() {
        create_subscription_tx(&conn, reference, &profile.id, "pro", BillingCycle::Monthly);
        backdate(&conn, reference, base - 100 + i as i64);
    }

    let (items, total) =
        queries::list_transactions(&conn, &TransactionFilters::default(), 50, 0)
            .expect("Query failed");

    assert_eq!(total, 3, "total should count every row");
    let references: Vec<&str> = items.iter().map(|t| t.reference.as_str()).collect();
    assert_eq!(
        references,
        vec!["abuja_t3", "abuja_t2", "abuja_t1"],
        "listing should be newest first"
    );
}

#[test]
fn test_list_transactions_filters_by_status() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    create_subscription_tx(&conn, "abuja_p1", &profile.id, "pro", BillingCycle::Monthly);
    create_subscription_tx(&conn, "abuja_p2", &profile.id, "pro", BillingCycle::Monthly);
    create_subscription_tx(&conn, "abuja_s1", &profile.id, "pro", BillingCycle::Monthly);
    queries::try_mark_transaction_success(&conn, "abuja_s1", r#"{}"#).expect("Update failed");

    let filters = TransactionFilters {
        status: Some(TransactionStatus::Success),
        ..Default::default()
    };
    let (items, total) = queries::list_transactions(&conn, &filters, 50, 0).expect("Query failed");

    assert_eq!(total, 1, "only the reconciled row should count");
    assert_eq!(items.len(), 1, "only the reconciled row should list");
    assert_eq!(items[0].reference, "abuja_s1", "filter should pick the success row");
}

#[test]
fn test_list_transactions_filters_by_type_and_profile() {
    let conn = setup_test_db();
    let seller = create_test_profile(&conn, "seller@example.ng");
    let buyer = create_test_profile(&conn, "buyer@example.ng");
    let property = create_test_property(&conn, &seller.id, "Corner plot, Gwarinpa");
    create_subscription_tx(&conn, "abuja_sub_a", &seller.id, "pro", BillingCycle::Monthly);
    create_boost_tx(&conn, "abuja_boost_a", &seller.id, &property.id, 7);
    create_subscription_tx(&conn, "abuja_sub_b", &buyer.id, "premium", BillingCycle::Annual);

    let boosts = TransactionFilters {
        transaction_type: Some(TransactionType::Boost),
        ..Default::default()
    };
    let (items, total) = queries::list_transactions(&conn, &boosts, 50, 0).expect("Query failed");
    assert_eq!(total, 1, "one boost row expected");
    assert_eq!(items[0].reference, "abuja_boost_a", "type filter should match");

    let buyers = TransactionFilters {
        profile_id: Some(buyer.id.clone()),
        ..Default::default()
    };
    let (items, total) = queries::list_transactions(&conn, &buyers, 50, 0).expect("Query failed");
    assert_eq!(total, 1, "one row for the buyer expected");
    assert_eq!(items[0].reference, "abuja_sub_b", "profile filter should match");
}

#[test]
fn test_list_transactions_paginates_with_total() {
    let conn = setup_test_db();
    let profile = create_test_profile(&conn, "agent@example.ng");
    let base = now();
    for i in 0..5 {
        let reference = format!("abuja_page{}", i);
        create_subscription_tx(&conn, &reference, &profile.id, "pro", BillingCycle::Monthly);
        backdate(&conn, &reference, base - 100 + i);
    }

    let (page1, total) =
        queries::list_transactions(&conn, &TransactionFilters::default(), 2, 0)
            .expect("Query failed");
    assert_eq!(total, 5, "total should be the unpaged count");
    assert_eq!(page1.len(), 2, "page size should be honored");
    assert_eq!(page1[0].reference, "abuja_page4", "first page starts at newest");

    let (page3, total) =
        queries::list_transactions(&conn, &TransactionFilters::default(), 2, 4)
            .expect("Query failed");
    assert_eq!(total, 5, "total is stable across pages");
    assert_eq!(page3.len(), 1, "last page holds the remainder");
    assert_eq!(page3[0].reference, "abuja_page0", "last page ends at oldest");
}
