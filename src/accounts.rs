//! Account store: one ledger per user, trades serialized per account.
//!
//! The account map is behind a `RwLock` that is held only for lookups and inserts.
//! Each ledger sits behind its own `Mutex`, held for the whole plan -> persist -> apply
//! sequence, so trades on different accounts never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::catalog::SharedCatalog;
use crate::error::AccountError;
use crate::ledger::Ledger;
use crate::persistence::{self, PgPool};
use crate::types::instrument::InstrumentKind;
use crate::types::position::{PortfolioSummary, Position};
use crate::types::price::{Price, Qty};
use crate::types::transaction::{TradeSide, Transaction};

pub type SharedLedger = Arc<Mutex<Ledger>>;

pub struct AccountStore {
    accounts: RwLock<HashMap<Uuid, SharedLedger>>,
    catalog: SharedCatalog,
    db: Option<PgPool>,
}

impl AccountStore {
    pub fn new(catalog: SharedCatalog, db: Option<PgPool>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            catalog,
            db,
        }
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// Create an in-memory account funded with `starting_cash`. Returns false and leaves
    /// the existing account untouched when `user_id` already has one.
    pub async fn open_account(&self, user_id: Uuid, starting_cash: Price) -> bool {
        let mut guard = self.accounts.write().await;
        if guard.contains_key(&user_id) {
            return false;
        }
        guard.insert(user_id, Arc::new(Mutex::new(Ledger::new(user_id, starting_cash))));
        tracing::debug!(%user_id, starting_cash, "account opened");
        true
    }

    async fn ledger(&self, user_id: Uuid) -> Result<SharedLedger, AccountError> {
        self.accounts
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(AccountError::AccountNotFound)
    }

    /// Execute one BUY/SELL at the catalog's current price.
    pub async fn execute(
        &self,
        user_id: Uuid,
        instrument_id: &str,
        side: TradeSide,
        quantity: Qty,
    ) -> Result<Transaction, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let mut guard = ledger.lock().await;

        let plan = match guard.plan(self.catalog.as_ref(), instrument_id, side, quantity) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::info!(%user_id, instrument_id, side = side.as_str(), quantity, reason = e.code(), "trade rejected");
                return Err(e.into());
            }
        };

        if let Some(pool) = &self.db {
            if let Err(e) = persistence::persist_trade(pool, &plan).await {
                tracing::error!(%user_id, transaction_id = %plan.transaction.id, error = %e, "failed to persist trade");
                return Err(e.into());
            }
        }

        let transaction = guard.apply(plan, self.catalog.as_ref());
        tracing::info!(
            %user_id,
            transaction_id = %transaction.id,
            symbol = %transaction.instrument.symbol,
            side = transaction.side.as_str(),
            quantity = transaction.quantity,
            price = transaction.price,
            cash = guard.cash(),
            "trade executed"
        );
        Ok(transaction)
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<Price, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let cash = ledger.lock().await.cash();
        Ok(cash)
    }

    /// Positions revalued at current catalog prices.
    pub async fn list_positions(
        &self,
        user_id: Uuid,
        kind: Option<InstrumentKind>,
    ) -> Result<Vec<Position>, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let mut guard = ledger.lock().await;
        guard.refresh_valuations(self.catalog.as_ref());
        Ok(guard.positions(kind))
    }

    pub async fn position(&self, user_id: Uuid, position_id: Uuid) -> Result<Option<Position>, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let mut guard = ledger.lock().await;
        guard.refresh_valuations(self.catalog.as_ref());
        Ok(guard.position(position_id))
    }

    /// Transactions, most recent first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        kind: Option<InstrumentKind>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let guard = ledger.lock().await;
        Ok(guard.transactions(kind, limit))
    }

    pub async fn transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let guard = ledger.lock().await;
        Ok(guard.transaction(transaction_id))
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<PortfolioSummary, AccountError> {
        let ledger = self.ledger(user_id).await?;
        let mut guard = ledger.lock().await;
        guard.refresh_valuations(self.catalog.as_ref());
        Ok(guard.summary())
    }

    /// Load every stored account with its positions and transactions. Returns the
    /// number of accounts loaded.
    pub async fn hydrate(&self, pool: &PgPool) -> Result<usize, sqlx::Error> {
        let accounts = persistence::list_accounts(pool).await?;
        let position_rows = persistence::list_positions(pool).await?;
        let transaction_rows = persistence::list_transactions(pool).await?;

        let mut positions: HashMap<Uuid, Vec<Position>> = HashMap::new();
        for row in &position_rows {
            match persistence::position_row_to_position(row) {
                Some(p) => positions.entry(row.user_id).or_default().push(p),
                None => tracing::warn!(position_id = %row.id, "skipping invalid position row"),
            }
        }
        let mut transactions: HashMap<Uuid, Vec<Transaction>> = HashMap::new();
        for row in &transaction_rows {
            match persistence::transaction_row_to_transaction(row) {
                Some(t) => transactions.entry(row.user_id).or_default().push(t),
                None => tracing::warn!(transaction_id = %row.id, "skipping invalid transaction row"),
            }
        }

        let mut guard = self.accounts.write().await;
        for account in &accounts {
            let mut ledger = Ledger::restore(
                account.user_id,
                account.cash,
                positions.remove(&account.user_id).unwrap_or_default(),
                transactions.remove(&account.user_id).unwrap_or_default(),
            );
            ledger.refresh_valuations(self.catalog.as_ref());
            guard.insert(account.user_id, Arc::new(Mutex::new(ledger)));
        }
        Ok(accounts.len())
    }
}
