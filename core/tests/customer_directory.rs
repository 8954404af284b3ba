//! Customer directory behaviour through the Ledger API.

use ledger_core::{
    clock::ManualClock,
    config::LedgerConfig,
    customer_directory::CustomerDirectory,
    customer::Customer,
    rng::SeededTiebreaker,
    transaction::TransactionDraft,
    Ledger, LedgerError,
};

fn build_ledger(config: LedgerConfig) -> Ledger {
    Ledger::new(config, Box::new(ManualClock::new(1_700_000_000)), Box::new(SeededTiebreaker::new(42)))
}

#[test]
fn chained_bucket_holds_colliding_ids() {
    let mut ledger = build_ledger(LedgerConfig::default_test());
    for id in [1, 11, 21] {
        ledger.add_customer(id, &format!("c{id}"), 0.0, 0.0).unwrap();
    }
    for id in [1, 11, 21] {
        let c = ledger.get_customer(id).expect("colliding id retrievable");
        assert_eq!(c.id(), id);
    }

    let dir = ledger.directory();
    assert_eq!(dir.bucket_of(11), 1);
    let mut chain: Vec<i64> = dir.bucket(1).map(|c| c.id()).collect();
    assert_eq!(chain, vec![21, 11, 1], "chain walks newest first");
    chain.sort_unstable();
    assert_eq!(chain, vec![1, 11, 21]);
}

#[test]
fn duplicate_customer_is_rejected() {
    let mut ledger = build_ledger(LedgerConfig::default());
    ledger.add_customer(1001, "Alice Johnson", 5_000.0, 5_000.0).unwrap();
    let err = ledger.add_customer(1001, "Impostor", 1.0, 1.0).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCustomer { id: 1001 }));
    assert_eq!(ledger.customer_count(), 1);
    assert_eq!(ledger.get_customer(1001).map(|c| c.name()), Some("Alice Johnson"));
}

#[test]
fn repeated_lookup_returns_same_record() {
    let mut ledger = build_ledger(LedgerConfig::default());
    ledger.add_customer(7, "Seven", 1.0, 1.0).unwrap();
    let a = ledger.get_customer(7).unwrap() as *const Customer;
    let b = ledger.get_customer(7).unwrap() as *const Customer;
    assert_eq!(a, b);
    assert!(ledger.get_customer(8).is_none());
}

#[test]
fn inserting_for_one_customer_leaves_others_alone() {
    let mut ledger = build_ledger(LedgerConfig::default_test());
    // Same bucket on purpose.
    ledger.add_customer(3, "A", 1.0, 1.0).unwrap();
    ledger.add_customer(13, "B", 1.0, 1.0).unwrap();
    for id in 0..5 {
        ledger.add_transaction(13, TransactionDraft::debit(id, 1.0)).unwrap();
    }
    let before: Vec<_> = ledger.history(13).unwrap().cloned().collect();

    for id in 0..40 {
        ledger.add_transaction(3, TransactionDraft::credit(id, 2.0)).unwrap();
    }
    let after: Vec<_> = ledger.history(13).unwrap().cloned().collect();
    assert_eq!(before, after);
    assert_eq!(ledger.history(3).unwrap().len(), 40);
}

#[test]
fn transaction_ids_are_scoped_per_customer() {
    let mut ledger = build_ledger(LedgerConfig::default());
    ledger.add_customer(1, "A", 1.0, 1.0).unwrap();
    ledger.add_customer(2, "B", 1.0, 1.0).unwrap();
    ledger.add_transaction(1, TransactionDraft::debit(99, 1.0)).unwrap();
    ledger
        .add_transaction(2, TransactionDraft::debit(99, 1.0))
        .expect("same id under another customer is fine");
}

#[test]
fn default_directory_has_hundred_buckets() {
    let mut dir = CustomerDirectory::default();
    assert_eq!(dir.bucket_count(), 100);
    dir.insert(Customer::new(-250, "Negative", 0.0, 0.0));
    assert_eq!(dir.bucket_of(-250), 50);
    assert!(dir.find(-250).is_some());
}

#[test]
fn teardown_releases_everything() {
    let mut ledger = build_ledger(LedgerConfig::default());
    for id in 0..12 {
        ledger.add_customer(id, "c", 1.0, 1.0).unwrap();
        ledger.add_transaction(id, TransactionDraft::debit(1, 1.0)).unwrap();
    }
    assert_eq!(ledger.teardown(), 12);
}
