//! User persistence: list and insert.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Row returned from DB (username is stored lowercase).
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// All users, for hydrating the in-memory credential store at startup.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, username, password_hash FROM users")
        .fetch_all(pool)
        .await
}

/// Insert a user together with its funded account. Username must already be lowercase.
pub async fn insert_user(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    password_hash: &str,
    starting_cash: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO accounts (user_id, cash) VALUES ($1, $2)")
        .bind(id)
        .bind(starting_cash)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
