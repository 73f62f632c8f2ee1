//! Account store tests: per-account serialization, isolation between accounts, lookups.

mod common;

use std::sync::Arc;

use common::fixture_catalog;
use paper_trader::accounts::AccountStore;
use paper_trader::catalog::{SharedCatalog, StaticCatalog};
use paper_trader::error::{AccountError, TradeError};
use paper_trader::types::instrument::InstrumentKind;
use paper_trader::types::price::from_units;
use paper_trader::types::transaction::TradeSide;
use uuid::Uuid;

fn store_with(catalog: Arc<StaticCatalog>) -> Arc<AccountStore> {
    let shared: SharedCatalog = catalog;
    Arc::new(AccountStore::new(shared, None))
}

#[tokio::test]
async fn open_account_is_idempotent() {
    let store = store_with(Arc::new(fixture_catalog()));
    let user = Uuid::new_v4();

    assert!(store.open_account(user, from_units(500)).await);
    assert!(!store.open_account(user, from_units(9_999)).await);
    assert_eq!(store.balance(user).await.unwrap(), from_units(500));
}

#[tokio::test]
async fn unknown_account_is_reported() {
    let store = store_with(Arc::new(fixture_catalog()));
    let err = store.balance(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AccountError::AccountNotFound));

    let err = store
        .execute(Uuid::new_v4(), "acme", TradeSide::Buy, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::AccountNotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_buys_never_overdraw() {
    let store = store_with(Arc::new(fixture_catalog()));
    let user = Uuid::new_v4();
    // Room for exactly 25 single-unit buys at 40.
    store.open_account(user, from_units(1_000)).await;

    let mut handles = Vec::new();
    for _ in 0..40 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.execute(user, "bolt", TradeSide::Buy, 1).await
        }));
    }

    let mut ok = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AccountError::Trade(TradeError::InsufficientFunds { .. })) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(ok, 25);
    assert_eq!(rejected, 15);
    assert_eq!(store.balance(user).await.unwrap(), 0);
    let positions = store.list_positions(user, None).await.unwrap();
    assert_eq!(positions[0].quantity, 25);
    assert_eq!(store.list_transactions(user, None, None).await.unwrap().len(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn accounts_are_independent() {
    let store = store_with(Arc::new(fixture_catalog()));
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    store.open_account(alice, from_units(1_000)).await;
    store.open_account(bob, from_units(1_000)).await;

    let (a, b) = tokio::join!(
        store.execute(alice, "acme", TradeSide::Buy, 3),
        store.execute(bob, "idx", TradeSide::Buy, 50),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.balance(alice).await.unwrap(), from_units(700));
    assert_eq!(store.balance(bob).await.unwrap(), from_units(500));
    assert!(store.list_positions(alice, Some(InstrumentKind::MutualFund)).await.unwrap().is_empty());
    assert_eq!(store.list_positions(bob, None).await.unwrap()[0].instrument.id, "idx");
}

#[tokio::test]
async fn listings_follow_price_moves() {
    let catalog = Arc::new(fixture_catalog());
    let store = store_with(catalog.clone());
    let user = Uuid::new_v4();
    store.open_account(user, from_units(1_000)).await;
    store.execute(user, "acme", TradeSide::Buy, 2).await.unwrap();

    catalog.set_price("acme", from_units(150));

    let positions = store.list_positions(user, None).await.unwrap();
    assert_eq!(positions[0].current_value, from_units(300));
    assert_eq!(positions[0].profit_loss, from_units(100));

    let summary = store.summary(user).await.unwrap();
    assert_eq!(summary.total_value, from_units(800 + 300));
}

#[tokio::test]
async fn lookups_by_id() {
    let store = store_with(Arc::new(fixture_catalog()));
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    store.open_account(user, from_units(1_000)).await;
    store.open_account(other, from_units(1_000)).await;

    let t = store.execute(user, "acme", TradeSide::Buy, 1).await.unwrap();
    let position = store.list_positions(user, None).await.unwrap().remove(0);

    assert_eq!(store.transaction(user, t.id).await.unwrap(), Some(t.clone()));
    assert_eq!(store.position(user, position.id).await.unwrap().map(|p| p.id), Some(position.id));
    assert_eq!(store.transaction(other, t.id).await.unwrap(), None);
    assert!(store.position(other, position.id).await.unwrap().is_none());
}
