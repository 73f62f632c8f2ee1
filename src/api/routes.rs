use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::accounts::AccountStore;
use crate::api::auth::{self, AuthUser, AuthUserCredential};
use crate::api::error::ApiError;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::TradeError;
use crate::ledger::whole_quantity;
use crate::persistence::{self, PgPool};
use crate::types::instrument::{Instrument, InstrumentKind};
use crate::types::position::{PortfolioSummary, Position};
use crate::types::price::Price;
use crate::types::transaction::{TradeSide, Transaction};

/// Login credentials keyed by lowercase username.
pub type UserStore = Arc<RwLock<HashMap<String, AuthUserCredential>>>;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub user_store: UserStore,
    pub jwt_secret: Vec<u8>,
    pub starting_balance: Price,
    pub db: Option<PgPool>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub balance: Price,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Price,
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub instrument_id: String,
    pub side: String,
    /// Any JSON value; anything but a positive whole number is an invalid quantity.
    #[serde(default)]
    pub quantity: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    fn kind(&self) -> Result<Option<InstrumentKind>, ApiError> {
        match self.kind.as_deref() {
            None => Ok(None),
            Some(raw) => InstrumentKind::parse(raw)
                .map(Some)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown instrument kind '{raw}'"))),
        }
    }
}

async fn health() -> &'static str {
    "healthy"
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    let key = username.to_lowercase();

    if state.user_store.read().await.contains_key(&key) {
        return Err(ApiError::BadRequest("Username already taken".to_string()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ApiError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ApiError::Internal
        })?;
    let user_id = Uuid::new_v4();

    if let Some(pool) = &state.db {
        persistence::insert_user(pool, user_id, &key, &password_hash, state.starting_balance)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ApiError::BadRequest("Username already taken".to_string())
                }
                e => {
                    tracing::error!(error = %e, "failed to persist user");
                    ApiError::Internal
                }
            })?;
    }

    {
        // Re-checked: a concurrent registration may have won while hashing.
        let mut users = state.user_store.write().await;
        if users.contains_key(&key) {
            return Err(ApiError::BadRequest("Username already taken".to_string()));
        }
        users.insert(
            key.clone(),
            AuthUserCredential {
                user_id,
                username: key.clone(),
                password_hash,
            },
        );
    }

    state
        .accounts
        .open_account(user_id, state.starting_balance)
        .await;
    tracing::info!(%user_id, username = %key, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            username: key,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let key = req.username.trim().to_lowercase();
    let credential = state.user_store.read().await.get(&key).cloned();

    let credential = match credential {
        Some(c) if auth::verify_password(&req.password, &c.password_hash) => c,
        _ => {
            tracing::info!(username = %key, "login failed");
            return Err(ApiError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }
    };

    let token = auth::create_token(&state.jwt_secret, credential.user_id).map_err(|e| {
        tracing::error!(error = %e, "token creation failed");
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        token,
        user_id: credential.user_id,
    }))
}

async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<MeResponse>, ApiError> {
    let username = state
        .user_store
        .read()
        .await
        .values()
        .find(|c| c.user_id == user.user_id)
        .map(|c| c.username.clone())
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let balance = state.accounts.balance(user.user_id).await?;
    Ok(Json(MeResponse {
        user_id: user.user_id,
        username,
        balance,
    }))
}

async fn list_instruments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Instrument>>, ApiError> {
    let kind = query.kind()?;
    Ok(Json(state.accounts.catalog().instruments(kind)))
}

async fn get_instrument(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Instrument>, ApiError> {
    state
        .accounts
        .catalog()
        .instrument(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Instrument '{id}' not found")))
}

async fn get_balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.accounts.balance(user.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

async fn list_positions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let kind = query.kind()?;
    let positions = state.accounts.list_positions(user.user_id, kind).await?;
    Ok(Json(positions))
}

async fn get_position(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(position_id): ApiPath<Uuid>,
) -> Result<Json<Position>, ApiError> {
    state
        .accounts
        .position(user.user_id, position_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Position not found".to_string()))
}

async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let kind = query.kind()?;
    let transactions = state
        .accounts
        .list_transactions(user.user_id, kind, query.limit)
        .await?;
    Ok(Json(transactions))
}

async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(transaction_id): ApiPath<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    state
        .accounts
        .transaction(user.user_id, transaction_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))
}

async fn create_trade(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<TradeRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let side = TradeSide::parse(&req.side.to_uppercase())
        .ok_or_else(|| ApiError::BadRequest("Side must be BUY or SELL".to_string()))?;
    let quantity = match whole_quantity(&req.quantity) {
        Ok(quantity) => quantity,
        // An unknown instrument is reported ahead of a bad quantity.
        Err(e) => {
            if state.accounts.catalog().instrument(&req.instrument_id).is_none() {
                return Err(TradeError::NotFound(req.instrument_id).into());
            }
            return Err(e.into());
        }
    };
    let transaction = state
        .accounts
        .execute(user.user_id, &req.instrument_id, side, quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn portfolio_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PortfolioSummary>, ApiError> {
    let summary = state.accounts.summary(user.user_id).await?;
    Ok(Json(summary))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/instruments", get(list_instruments))
        .route("/instruments/{id}", get(get_instrument))
        .route("/account/balance", get(get_balance))
        .route("/positions", get(list_positions))
        .route("/positions/{id}", get(get_position))
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .route("/trades", post(create_trade))
        .route("/portfolio/summary", get(portfolio_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
