//! Per-account ledger: cash, positions keyed by instrument id, and the transaction log.
//! Testable without HTTP or a database.
//!
//! Trades run in two steps. `plan` validates the intent and computes every effect
//! without touching state; `apply` commits a plan. A rejected plan leaves the ledger
//! exactly as it was.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::InstrumentCatalog;
use crate::error::TradeError;
use crate::types::instrument::InstrumentKind;
use crate::types::position::{PortfolioSummary, Position, percent_of};
use crate::types::price::{self, Price, Qty};
use crate::types::transaction::{TradeSide, Transaction};

/// What a trade does to the position of the traded instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionChange {
    Upsert(Position),
    Remove { instrument_id: String, position_id: Uuid },
}

/// Fully computed effect of one trade. Must be applied to the ledger it was planned on
/// with no other mutation in between.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub user_id: Uuid,
    pub transaction: Transaction,
    pub cash_after: Price,
    pub change: PositionChange,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    user_id: Uuid,
    cash: Price,
    positions: HashMap<String, Position>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(user_id: Uuid, cash: Price) -> Self {
        Self {
            user_id,
            cash,
            positions: HashMap::new(),
            transactions: Vec::new(),
        }
    }

    /// Rebuild a ledger from stored state. Transactions are sorted oldest first;
    /// flat positions are dropped.
    pub fn restore(
        user_id: Uuid,
        cash: Price,
        positions: impl IntoIterator<Item = Position>,
        mut transactions: Vec<Transaction>,
    ) -> Self {
        transactions.sort_by_key(|t| t.timestamp);
        Self {
            user_id,
            cash,
            positions: positions
                .into_iter()
                .filter(|p| p.quantity > 0)
                .map(|p| (p.instrument.id.clone(), p))
                .collect(),
            transactions,
        }
    }

    pub fn cash(&self) -> Price {
        self.cash
    }

    /// Current positions, optionally of one instrument kind, ordered by symbol.
    pub fn positions(&self, kind: Option<InstrumentKind>) -> Vec<Position> {
        let mut list: Vec<Position> = self
            .positions
            .values()
            .filter(|p| kind.is_none_or(|k| p.instrument.kind == k))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.instrument.symbol.cmp(&b.instrument.symbol));
        list
    }

    pub fn position(&self, position_id: Uuid) -> Option<Position> {
        self.positions.values().find(|p| p.id == position_id).cloned()
    }

    pub fn position_for(&self, instrument_id: &str) -> Option<&Position> {
        self.positions.get(instrument_id)
    }

    /// Executed trades, most recent first.
    pub fn transactions(&self, kind: Option<InstrumentKind>, limit: Option<usize>) -> Vec<Transaction> {
        self.transactions
            .iter()
            .rev()
            .filter(|t| kind.is_none_or(|k| t.instrument.kind == k))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn transaction(&self, transaction_id: Uuid) -> Option<Transaction> {
        self.transactions.iter().find(|t| t.id == transaction_id).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Validate a trade and compute its effects. Never mutates.
    pub fn plan(
        &self,
        catalog: &dyn InstrumentCatalog,
        instrument_id: &str,
        side: TradeSide,
        quantity: Qty,
    ) -> Result<TradePlan, TradeError> {
        let instrument = catalog
            .instrument(instrument_id)
            .ok_or_else(|| TradeError::NotFound(instrument_id.to_string()))?;
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }

        let exec_price = instrument.price;
        let existing = self.positions.get(&instrument.id);

        let (cash_after, change, total) = match side {
            TradeSide::Buy => {
                let total = price::checked_total(exec_price, quantity).ok_or(TradeError::AmountOutOfRange)?;
                if total > self.cash {
                    return Err(TradeError::InsufficientFunds {
                        required: total,
                        available: self.cash,
                    });
                }

                let position = match existing {
                    Some(pos) => {
                        let new_qty = pos.quantity.checked_add(quantity).ok_or(TradeError::InvalidQuantity)?;
                        let new_investment = pos
                            .total_investment
                            .checked_add(total)
                            .ok_or(TradeError::AmountOutOfRange)?;
                        let divisor = i64::try_from(new_qty).map_err(|_| TradeError::InvalidQuantity)?;
                        let mut next = pos.clone();
                        next.quantity = new_qty;
                        next.total_investment = new_investment;
                        next.average_cost = new_investment / divisor;
                        next.revalue(exec_price);
                        next
                    }
                    None => Position::open(instrument.to_ref(), quantity, exec_price, total),
                };

                (self.cash - total, PositionChange::Upsert(position), total)
            }
            TradeSide::Sell => {
                let held = existing.map(|p| p.quantity).unwrap_or(0);
                let pos = existing
                    .filter(|p| p.quantity >= quantity)
                    .ok_or(TradeError::InsufficientHoldings {
                        requested: quantity,
                        held,
                    })?;
                let total = price::checked_total(exec_price, quantity).ok_or(TradeError::AmountOutOfRange)?;
                let cash_after = self.cash.checked_add(total).ok_or(TradeError::AmountOutOfRange)?;

                let remaining = pos.quantity - quantity;
                let change = if remaining == 0 {
                    PositionChange::Remove {
                        instrument_id: instrument.id.clone(),
                        position_id: pos.id,
                    }
                } else {
                    let mut next = pos.clone();
                    next.quantity = remaining;
                    // average_cost × remaining never exceeds the previous total_investment.
                    next.total_investment = price::checked_total(pos.average_cost, remaining)
                        .ok_or(TradeError::AmountOutOfRange)?;
                    next.revalue(exec_price);
                    PositionChange::Upsert(next)
                };

                (cash_after, change, total)
            }
        };

        let transaction = Transaction {
            id: Uuid::new_v4(),
            side,
            instrument: instrument.to_ref(),
            quantity,
            price: exec_price,
            total,
            timestamp: Utc::now(),
        };

        Ok(TradePlan {
            user_id: self.user_id,
            transaction,
            cash_after,
            change,
        })
    }

    /// Commit a plan: cash, position, valuations of every position, then the log entry.
    pub fn apply(&mut self, plan: TradePlan, catalog: &dyn InstrumentCatalog) -> Transaction {
        self.cash = plan.cash_after;
        match plan.change {
            PositionChange::Upsert(position) => {
                self.positions.insert(position.instrument.id.clone(), position);
            }
            PositionChange::Remove { instrument_id, .. } => {
                self.positions.remove(&instrument_id);
            }
        }
        self.refresh_valuations(catalog);
        self.transactions.push(plan.transaction.clone());
        plan.transaction
    }

    /// Plan and apply in one step.
    pub fn execute(
        &mut self,
        catalog: &dyn InstrumentCatalog,
        instrument_id: &str,
        side: TradeSide,
        quantity: Qty,
    ) -> Result<Transaction, TradeError> {
        let plan = self.plan(catalog, instrument_id, side, quantity)?;
        Ok(self.apply(plan, catalog))
    }

    /// Revalue every position at the catalog's current price. Positions whose instrument
    /// has left the catalog keep their last known price.
    pub fn refresh_valuations(&mut self, catalog: &dyn InstrumentCatalog) {
        for (instrument_id, position) in self.positions.iter_mut() {
            let current = catalog.price(instrument_id).unwrap_or(position.current_price);
            position.revalue(current);
        }
    }

    /// Totals over cash and the stored valuations. Call `refresh_valuations` first for
    /// up-to-date prices.
    pub fn summary(&self) -> PortfolioSummary {
        let mut stocks_value: Price = 0;
        let mut mutual_funds_value: Price = 0;
        let mut total_investment: Price = 0;
        for position in self.positions.values() {
            match position.instrument.kind {
                InstrumentKind::Stock => stocks_value = stocks_value.saturating_add(position.current_value),
                InstrumentKind::MutualFund => {
                    mutual_funds_value = mutual_funds_value.saturating_add(position.current_value)
                }
            }
            total_investment = total_investment.saturating_add(position.total_investment);
        }
        let holdings_value = stocks_value.saturating_add(mutual_funds_value);
        let profit_loss = holdings_value.saturating_sub(total_investment);
        PortfolioSummary {
            cash: self.cash,
            stocks_value,
            mutual_funds_value,
            holdings_value,
            total_investment,
            total_value: self.cash.saturating_add(holdings_value),
            profit_loss,
            profit_loss_percent: percent_of(profit_loss, total_investment),
        }
    }
}

/// Validate a quantity arriving as JSON: a number that is finite, whole and at least one.
/// Strings, missing values and anything beyond 2^53 are rejected.
pub fn whole_quantity(raw: &serde_json::Value) -> Result<Qty, TradeError> {
    const MAX_EXACT: u64 = 1 << 53;
    let number = raw.as_number().ok_or(TradeError::InvalidQuantity)?;
    let quantity = match number.as_u64() {
        Some(q) => q,
        None => {
            let f = number.as_f64().ok_or(TradeError::InvalidQuantity)?;
            if !f.is_finite() || f < 1.0 || f.fract() != 0.0 || f > MAX_EXACT as f64 {
                return Err(TradeError::InvalidQuantity);
            }
            f as Qty
        }
    };
    if quantity == 0 || quantity > MAX_EXACT {
        return Err(TradeError::InvalidQuantity);
    }
    Ok(quantity)
}
