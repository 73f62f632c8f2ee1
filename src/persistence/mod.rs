//! Database layer: pool, migrations, and access for users, accounts, positions, transactions.

mod accounts;
mod pool;
mod positions;
mod transactions;
mod users;

pub use accounts::{AccountRow, list_accounts, persist_trade};
pub use pool::{create_pool_and_migrate, run_migrations};
pub use positions::{PositionRow, list_positions, position_row_to_position};
pub use sqlx::PgPool;
pub use transactions::{TransactionRow, list_transactions, transaction_row_to_transaction};
pub use users::{UserRow, insert_user, list_users};
