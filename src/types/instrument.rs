use serde::{Deserialize, Serialize};

use crate::types::price::Price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Stock,
    MutualFund,
}

impl InstrumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentKind::Stock => "stock",
            InstrumentKind::MutualFund => "mutual_fund",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock" => Some(InstrumentKind::Stock),
            "mutual_fund" => Some(InstrumentKind::MutualFund),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub stocks: f64,
    pub bonds: f64,
    pub cash: f64,
    pub other: f64,
}

/// Descriptive data carried only by mutual funds. Percentages are plain numbers (0.04 = 0.04%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundProfile {
    pub category: String,
    pub risk: RiskLevel,
    pub expense_ratio: f64,
    pub ytd_return: f64,
    pub one_year_return: f64,
    pub three_year_return: f64,
    pub five_year_return: f64,
    pub asset_allocation: AssetAllocation,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub kind: InstrumentKind,
    pub price: Price,
    pub change: Price,
    pub change_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fund: Option<FundProfile>,
}

impl Instrument {
    pub fn to_ref(&self) -> InstrumentRef {
        InstrumentRef {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

/// Identity of an instrument as embedded in positions and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRef {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub kind: InstrumentKind,
}
