//! Instrument catalog: the price source trades execute against.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::instrument::{
    AssetAllocation, FundProfile, Instrument, InstrumentKind, RiskLevel,
};
use crate::types::position::percent_of;
use crate::types::price::{Price, from_cents};

/// Read access to instruments and their current prices.
pub trait InstrumentCatalog: Send + Sync {
    fn instrument(&self, id: &str) -> Option<Instrument>;

    /// All instruments, optionally restricted to one kind, ordered by kind then symbol.
    fn instruments(&self, kind: Option<InstrumentKind>) -> Vec<Instrument>;

    fn price(&self, id: &str) -> Option<Price> {
        self.instrument(id).map(|i| i.price)
    }
}

pub type SharedCatalog = Arc<dyn InstrumentCatalog>;

/// In-memory catalog. Prices can be moved by an external feed through `set_price`.
#[derive(Default)]
pub struct StaticCatalog {
    instruments: RwLock<HashMap<String, Instrument>>,
}

impl StaticCatalog {
    /// Ids are stored lowercase; lookups are case-insensitive.
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let map = instruments
            .into_iter()
            .map(|mut i| {
                i.id = i.id.to_lowercase();
                (i.id.clone(), i)
            })
            .collect();
        Self {
            instruments: RwLock::new(map),
        }
    }

    /// Catalog seeded with the default stock and mutual fund universe.
    pub fn with_defaults() -> Self {
        Self::new(default_stocks().into_iter().chain(default_mutual_funds()))
    }

    /// Update an instrument's price; `change` and `change_percent` follow the move.
    /// Returns false, changing nothing, when the id is unknown or the price is not positive.
    pub fn set_price(&self, id: &str, price: Price) -> bool {
        if price <= 0 {
            return false;
        }
        let mut guard = self.instruments.write().unwrap_or_else(|e| e.into_inner());
        let Some(instrument) = guard.get_mut(&id.to_lowercase()) else {
            return false;
        };
        let previous = instrument.price;
        instrument.change = price - previous;
        instrument.change_percent = percent_of(instrument.change, previous);
        instrument.price = price;
        true
    }
}

impl InstrumentCatalog for StaticCatalog {
    fn instrument(&self, id: &str) -> Option<Instrument> {
        let guard = self.instruments.read().unwrap_or_else(|e| e.into_inner());
        guard.get(&id.to_lowercase()).cloned()
    }

    fn instruments(&self, kind: Option<InstrumentKind>) -> Vec<Instrument> {
        let guard = self.instruments.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<Instrument> = guard
            .values()
            .filter(|i| kind.is_none_or(|k| i.kind == k))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            (a.kind != InstrumentKind::Stock, &a.symbol).cmp(&(b.kind != InstrumentKind::Stock, &b.symbol))
        });
        list
    }
}

fn stock(id: &str, symbol: &str, name: &str, price_cents: i64, change_cents: i64, change_percent: f64) -> Instrument {
    Instrument {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        kind: InstrumentKind::Stock,
        price: from_cents(price_cents),
        change: from_cents(change_cents),
        change_percent,
        fund: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn fund(
    id: &str,
    symbol: &str,
    name: &str,
    price_cents: i64,
    change_cents: i64,
    change_percent: f64,
    category: &str,
    risk: RiskLevel,
    expense_ratio: f64,
    returns: [f64; 4],
    allocation: [f64; 4],
    description: &str,
) -> Instrument {
    Instrument {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        kind: InstrumentKind::MutualFund,
        price: from_cents(price_cents),
        change: from_cents(change_cents),
        change_percent,
        fund: Some(FundProfile {
            category: category.to_string(),
            risk,
            expense_ratio,
            ytd_return: returns[0],
            one_year_return: returns[1],
            three_year_return: returns[2],
            five_year_return: returns[3],
            asset_allocation: AssetAllocation {
                stocks: allocation[0],
                bonds: allocation[1],
                cash: allocation[2],
                other: allocation[3],
            },
            description: description.to_string(),
        }),
    }
}

pub fn default_stocks() -> Vec<Instrument> {
    vec![
        stock("aapl", "AAPL", "Apple Inc.", 18263, 125, 0.69),
        stock("msft", "MSFT", "Microsoft Corporation", 37528, -285, -0.75),
        stock("amzn", "AMZN", "Amazon.com Inc.", 17815, 342, 1.96),
        stock("googl", "GOOGL", "Alphabet Inc.", 14396, -128, -0.88),
        stock("meta", "META", "Meta Platforms Inc.", 47105, 523, 1.12),
        stock("tsla", "TSLA", "Tesla Inc.", 18005, -345, -1.88),
        stock("nvda", "NVDA", "NVIDIA Corporation", 92479, 1563, 1.72),
        stock("wmt", "WMT", "Walmart Inc.", 6045, 32, 0.53),
    ]
}

pub fn default_mutual_funds() -> Vec<Instrument> {
    vec![
        fund(
            "vfiax",
            "VFIAX",
            "Vanguard 500 Index Fund Admiral",
            43126,
            215,
            0.50,
            "Large Blend",
            RiskLevel::Medium,
            0.04,
            [8.15, 15.23, 10.56, 12.83],
            [98.5, 0.0, 1.5, 0.0],
            "Tracks the S&P 500 Index, providing diversified exposure to large U.S. companies.",
        ),
        fund(
            "vbtlx",
            "VBTLX",
            "Vanguard Total Bond Market Index Fund Admiral",
            1071,
            -2,
            -0.19,
            "Intermediate Core Bond",
            RiskLevel::Low,
            0.05,
            [1.25, 2.83, 1.56, 3.21],
            [0.0, 97.5, 2.5, 0.0],
            "Broad exposure to U.S. investment-grade bonds across a wide range of maturities.",
        ),
        fund(
            "vtsax",
            "VTSAX",
            "Vanguard Total Stock Market Index Fund Admiral",
            11987,
            57,
            0.48,
            "Large Blend",
            RiskLevel::Medium,
            0.04,
            [7.92, 14.56, 9.87, 11.92],
            [99.0, 0.0, 1.0, 0.0],
            "Tracks the CRSP US Total Market Index, covering the entire U.S. equity market.",
        ),
        fund(
            "vwigx",
            "VWIGX",
            "Vanguard International Growth Fund",
            3852,
            -26,
            -0.67,
            "Foreign Large Growth",
            RiskLevel::High,
            0.43,
            [6.43, 18.76, 7.19, 13.45],
            [95.0, 0.0, 5.0, 0.0],
            "Actively managed fund seeking long-term growth from companies outside the United States.",
        ),
        fund(
            "vgslx",
            "VGSLX",
            "Vanguard Real Estate Index Fund Admiral",
            10236,
            112,
            1.11,
            "Real Estate",
            RiskLevel::Medium,
            0.12,
            [5.76, 9.34, 3.67, 7.51],
            [97.0, 0.0, 3.0, 0.0],
            "Tracks the MSCI US Investable Market Real Estate 25/50 Index of real estate investment trusts.",
        ),
        fund(
            "fsptx",
            "FSPTX",
            "Fidelity Select Technology Portfolio",
            2585,
            32,
            1.25,
            "Technology",
            RiskLevel::High,
            0.69,
            [10.54, 22.37, 15.82, 20.15],
            [92.0, 0.0, 8.0, 0.0],
            "Invests in companies offering, using or developing technology products and services.",
        ),
        fund(
            "prhyx",
            "PRHYX",
            "T. Rowe Price High Yield Fund",
            642,
            -1,
            -0.16,
            "High Yield Bond",
            RiskLevel::Medium,
            0.72,
            [3.15, 7.26, 4.53, 5.89],
            [0.0, 92.0, 8.0, 0.0],
            "Diversified portfolio of high-yield corporate bonds.",
        ),
        fund(
            "vghcx",
            "VGHCX",
            "Vanguard Health Care Fund",
            23894,
            76,
            0.32,
            "Health",
            RiskLevel::Medium,
            0.32,
            [4.25, 9.87, 7.65, 11.24],
            [94.0, 0.0, 6.0, 0.0],
            "Invests in companies engaged in developing, producing or distributing health care services.",
        ),
    ]
}
