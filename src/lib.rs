pub mod accounts;
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod persistence;
pub mod types;
