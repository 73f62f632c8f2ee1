use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::instrument::InstrumentRef;
use crate::types::price::{self, Price, Qty};

/// Holding of one instrument. Quantity is always positive; flat positions are removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub instrument: InstrumentRef,
    pub quantity: Qty,
    pub average_cost: Price,
    pub total_investment: Price,
    pub current_price: Price,
    pub current_value: Price,
    pub profit_loss: Price,
    pub profit_loss_percent: f64,
}

impl Position {
    pub fn open(instrument: InstrumentRef, quantity: Qty, price: Price, total: Price) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument,
            quantity,
            average_cost: price,
            total_investment: total,
            current_price: price,
            current_value: total,
            profit_loss: 0,
            profit_loss_percent: 0.0,
        }
    }

    /// Recompute the derived valuation fields against `current_price`.
    pub fn revalue(&mut self, current_price: Price) {
        self.current_price = current_price;
        self.current_value = price::checked_total(current_price, self.quantity).unwrap_or(Price::MAX);
        self.profit_loss = self.current_value.saturating_sub(self.total_investment);
        self.profit_loss_percent = percent_of(self.profit_loss, self.total_investment);
    }
}

/// `part / whole × 100`, zero when `whole` is zero.
pub fn percent_of(part: Price, whole: Price) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    price::to_f64(part) / price::to_f64(whole) * 100.0
}

/// Account-wide valuation, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub cash: Price,
    pub stocks_value: Price,
    pub mutual_funds_value: Price,
    pub holdings_value: Price,
    pub total_investment: Price,
    pub total_value: Price,
    pub profit_loss: Price,
    pub profit_loss_percent: f64,
}
