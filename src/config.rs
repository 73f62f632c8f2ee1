//! Runtime configuration from the environment (`.env` is loaded first when present).

use std::env;

use thiserror::Error;

use crate::types::price::{self, Price};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STARTING_BALANCE: Price = price::from_units(100_000);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEV_JWT_SECRET: &str = "dev-only-insecure-jwt-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("SEED_USERNAME and SEED_PASSWORD must be set together")]
    IncompleteSeedUser,
}

/// Optional user created at startup so a fresh instance has a working login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: Vec<u8>,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub starting_balance: Price,
    pub seed_user: Option<SeedUser>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => {
                tracing::warn!("JWT_SECRET not set, using an insecure development secret");
                DEV_JWT_SECRET.as_bytes().to_vec()
            }
        };

        let starting_balance = match get("STARTING_BALANCE") {
            Some(raw) => price::parse_decimal(&raw).ok_or(ConfigError::Invalid {
                name: "STARTING_BALANCE",
                value: raw,
            })?,
            None => DEFAULT_STARTING_BALANCE,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|&n: &u32| n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DB_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let seed_user = match (get("SEED_USERNAME"), get("SEED_PASSWORD")) {
            (Some(username), Some(password)) => Some(SeedUser { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteSeedUser),
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            database_url: get("DATABASE_URL"),
            db_max_connections,
            starting_balance,
            seed_user,
        })
    }
}
