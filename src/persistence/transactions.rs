//! Transaction persistence: rows for hydration. Inserts go through `persist_trade`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::instrument::{InstrumentKind, InstrumentRef};
use crate::types::transaction::{TradeSide, Transaction};

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument_id: String,
    pub symbol: String,
    pub name: String,
    pub kind: String,
    pub side: String,
    pub quantity: i64,
    pub price: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// All transactions, oldest first.
pub async fn list_transactions(pool: &PgPool) -> Result<Vec<TransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRow>(
        "SELECT id, user_id, instrument_id, symbol, name, kind, side, quantity, price, total, created_at \
         FROM transactions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

/// Convert a row to a Transaction. Skips rows with an unknown side or kind.
pub fn transaction_row_to_transaction(row: &TransactionRow) -> Option<Transaction> {
    let side = TradeSide::parse(&row.side)?;
    let kind = InstrumentKind::parse(&row.kind)?;
    Some(Transaction {
        id: row.id,
        side,
        instrument: InstrumentRef {
            id: row.instrument_id.clone(),
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            kind,
        },
        quantity: row.quantity.max(0) as u64,
        price: row.price,
        total: row.total,
        timestamp: row.created_at,
    })
}
