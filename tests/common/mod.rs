#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use paper_trader::accounts::AccountStore;
use paper_trader::api::routes::{AppState, UserStore, app_router};
use paper_trader::catalog::{SharedCatalog, StaticCatalog};
use paper_trader::types::instrument::{Instrument, InstrumentKind};
use paper_trader::types::price::{Price, from_units};
use tokio::sync::RwLock;

pub fn instrument(id: &str, kind: InstrumentKind, price: Price) -> Instrument {
    Instrument {
        id: id.to_string(),
        symbol: id.to_uppercase(),
        name: format!("{} Corp", id.to_uppercase()),
        kind,
        price,
        change: 0,
        change_percent: 0.0,
        fund: None,
    }
}

/// Two stocks and one fund with round prices.
pub fn fixture_catalog() -> StaticCatalog {
    StaticCatalog::new([
        instrument("acme", InstrumentKind::Stock, from_units(100)),
        instrument("bolt", InstrumentKind::Stock, from_units(40)),
        instrument("idx", InstrumentKind::MutualFund, from_units(10)),
    ])
}

pub const TEST_SECRET: &[u8] = b"test-jwt-secret";

pub fn test_app_state(catalog: SharedCatalog, user_store: UserStore) -> AppState {
    AppState {
        accounts: Arc::new(AccountStore::new(catalog, None)),
        user_store,
        jwt_secret: TEST_SECRET.to_vec(),
        starting_balance: from_units(100_000),
        db: None,
    }
}

pub fn empty_user_store() -> UserStore {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Spawn app on a random port and return (base_url, guard that keeps server running).
pub async fn spawn_app(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let app = app_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}
