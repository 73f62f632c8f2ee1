//! Position persistence: rows for hydration. Writes go through `persist_trade`.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::instrument::{InstrumentKind, InstrumentRef};
use crate::types::position::Position;

#[derive(Debug, FromRow)]
pub struct PositionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub instrument_id: String,
    pub symbol: String,
    pub name: String,
    pub kind: String,
    pub quantity: i64,
    pub average_cost: i64,
    pub total_investment: i64,
}

/// List all positions for hydration.
pub async fn list_positions(pool: &PgPool) -> Result<Vec<PositionRow>, sqlx::Error> {
    sqlx::query_as::<_, PositionRow>(
        "SELECT id, user_id, instrument_id, symbol, name, kind, quantity, average_cost, total_investment \
         FROM positions",
    )
    .fetch_all(pool)
    .await
}

/// Convert a row to a Position valued at its average cost. Skips rows with an unknown
/// kind or a non-positive quantity.
pub fn position_row_to_position(row: &PositionRow) -> Option<Position> {
    let kind = InstrumentKind::parse(&row.kind)?;
    let quantity = row.quantity.try_into().ok().filter(|&q: &u64| q > 0)?;
    let mut position = Position {
        id: row.id,
        instrument: InstrumentRef {
            id: row.instrument_id.clone(),
            symbol: row.symbol.clone(),
            name: row.name.clone(),
            kind,
        },
        quantity,
        average_cost: row.average_cost,
        total_investment: row.total_investment,
        current_price: row.average_cost,
        current_value: 0,
        profit_loss: 0,
        profit_loss_percent: 0.0,
    };
    position.revalue(row.average_cost);
    Some(position)
}
