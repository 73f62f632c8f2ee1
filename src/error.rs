//! Error types for trade execution and account access.

use thiserror::Error;

use crate::types::price::{Price, Qty};

/// Rejection of a single trade. A rejected trade has no side effects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TradeError {
    #[error("Instrument '{0}' not found")]
    NotFound(String),

    #[error("Quantity must be a positive whole number")]
    InvalidQuantity,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Price, available: Price },

    #[error("Insufficient holdings: requested {requested}, held {held}")]
    InsufficientHoldings { requested: Qty, held: Qty },

    #[error("Trade amount exceeds the supported range")]
    AmountOutOfRange,
}

impl TradeError {
    /// Short code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            TradeError::NotFound(_) => "not_found",
            TradeError::InvalidQuantity => "invalid_quantity",
            TradeError::InsufficientFunds { .. } => "insufficient_funds",
            TradeError::InsufficientHoldings { .. } => "insufficient_holdings",
            TradeError::AmountOutOfRange => "amount_out_of_range",
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error("Account not found")]
    AccountNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
