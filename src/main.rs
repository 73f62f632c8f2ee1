use std::collections::HashMap;
use std::sync::Arc;

use paper_trader::accounts::AccountStore;
use paper_trader::api::auth::{self, AuthUserCredential};
use paper_trader::api::routes::{AppState, UserStore, app_router};
use paper_trader::catalog::{SharedCatalog, StaticCatalog};
use paper_trader::config::Config;
use paper_trader::persistence::{self, PgPool};
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_trader=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db: Option<PgPool> = match &config.database_url {
        Some(url) => Some(persistence::create_pool_and_migrate(url, config.db_max_connections).await?),
        None => {
            tracing::info!("DATABASE_URL not set, running in memory only");
            None
        }
    };

    let catalog: SharedCatalog = Arc::new(StaticCatalog::with_defaults());
    let accounts = Arc::new(AccountStore::new(catalog, db.clone()));
    let user_store: UserStore = Arc::new(RwLock::new(HashMap::new()));

    if let Some(pool) = &db {
        let mut users = user_store.write().await;
        for row in persistence::list_users(pool).await? {
            users.insert(
                row.username.clone(),
                AuthUserCredential {
                    user_id: row.id,
                    username: row.username,
                    password_hash: row.password_hash,
                },
            );
        }
        let loaded = accounts.hydrate(pool).await?;
        tracing::info!(users = users.len(), accounts = loaded, "state loaded from database");
    }

    if let Some(seed) = &config.seed_user {
        let key = seed.username.trim().to_lowercase();
        let mut users = user_store.write().await;
        if !users.contains_key(&key) {
            let user_id = Uuid::new_v4();
            let password_hash = auth::hash_password(&seed.password)?;
            if let Some(pool) = &db {
                persistence::insert_user(pool, user_id, &key, &password_hash, config.starting_balance).await?;
            }
            users.insert(
                key.clone(),
                AuthUserCredential {
                    user_id,
                    username: key.clone(),
                    password_hash,
                },
            );
            accounts.open_account(user_id, config.starting_balance).await;
            tracing::info!(username = %key, "seed user created");
        }
    }

    let app_state = AppState {
        accounts,
        user_store,
        jwt_secret: config.jwt_secret.clone(),
        starting_balance: config.starting_balance,
        db,
    };

    let app = app_router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
