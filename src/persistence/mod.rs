//! Database layer: pool, migrations, and access for users, stocks,
//! portfolios, positions, and the transaction log.

mod pool;
mod portfolios;
mod positions;
mod stocks;
mod transactions;
mod users;

pub use pool::{create_pool_and_migrate, run_migrations};
pub use portfolios::{get_portfolio_for_user, insert_portfolio};
pub use positions::{
    delete_position, get_position_for_update, insert_position, list_position_views,
    update_position,
};
pub use sqlx::PgPool;
pub use stocks::{get_stock_by_id, get_stock_by_symbol, insert_stock, list_stocks};
pub use transactions::{insert_transaction, list_transactions_for_user};
pub use users::{UserRow, get_user_by_email, get_user_by_id, insert_user};
