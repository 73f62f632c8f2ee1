//! Account persistence: cash balances, and the write-through of a whole trade.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::ledger::{PositionChange, TradePlan};

#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub user_id: Uuid,
    pub cash: i64,
}

pub async fn list_accounts(pool: &PgPool) -> Result<Vec<AccountRow>, sqlx::Error> {
    sqlx::query_as::<_, AccountRow>("SELECT user_id, cash FROM accounts")
        .fetch_all(pool)
        .await
}

/// Write every effect of a planned trade in one database transaction:
/// cash balance, position upsert or delete, and the transaction record.
pub async fn persist_trade(pool: &PgPool, plan: &TradePlan) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE accounts SET cash = $1, updated_at = now() WHERE user_id = $2")
        .bind(plan.cash_after)
        .bind(plan.user_id)
        .execute(&mut *tx)
        .await?;

    match &plan.change {
        PositionChange::Upsert(position) => {
            sqlx::query(
                "INSERT INTO positions (id, user_id, instrument_id, symbol, name, kind, quantity, average_cost, total_investment) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (user_id, instrument_id) DO UPDATE SET quantity = $7, average_cost = $8, total_investment = $9",
            )
            .bind(position.id)
            .bind(plan.user_id)
            .bind(&position.instrument.id)
            .bind(&position.instrument.symbol)
            .bind(&position.instrument.name)
            .bind(position.instrument.kind.as_str())
            .bind(position.quantity as i64)
            .bind(position.average_cost)
            .bind(position.total_investment)
            .execute(&mut *tx)
            .await?;
        }
        PositionChange::Remove { instrument_id, .. } => {
            sqlx::query("DELETE FROM positions WHERE user_id = $1 AND instrument_id = $2")
                .bind(plan.user_id)
                .bind(instrument_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    let t = &plan.transaction;
    sqlx::query(
        "INSERT INTO transactions (id, user_id, instrument_id, symbol, name, kind, side, quantity, price, total, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(t.id)
    .bind(plan.user_id)
    .bind(&t.instrument.id)
    .bind(&t.instrument.symbol)
    .bind(&t.instrument.name)
    .bind(t.instrument.kind.as_str())
    .bind(t.side.as_str())
    .bind(t.quantity as i64)
    .bind(t.price)
    .bind(t.total)
    .bind(t.timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}
