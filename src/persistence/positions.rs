//! Position persistence: the per-(portfolio, stock) rows the ledger
//! reads and writes inside its buy/sell transactions.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::position::{Position, PositionView};

/// Get the position for (portfolio, stock), locking the row for the
/// rest of the transaction. Concurrent buys/sells on the same pair
/// queue behind the lock instead of racing the read-modify-write.
pub async fn get_position_for_update(
    conn: &mut PgConnection,
    portfolio_id: Uuid,
    stock_id: Uuid,
) -> Result<Option<Position>, sqlx::Error> {
    let row = sqlx::query_as::<_, Position>(
        "SELECT id, portfolio_id, stock_id, quantity, average_price FROM portfolio_positions \
         WHERE portfolio_id = $1 AND stock_id = $2 FOR UPDATE",
    )
    .bind(portfolio_id)
    .bind(stock_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Insert a fresh position opened by a first buy.
pub async fn insert_position(
    conn: &mut PgConnection,
    id: Uuid,
    portfolio_id: Uuid,
    stock_id: Uuid,
    quantity: i64,
    average_price: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO portfolio_positions (id, portfolio_id, stock_id, quantity, average_price) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(portfolio_id)
    .bind(stock_id)
    .bind(quantity)
    .bind(average_price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Overwrite quantity and average after a blend or partial sell.
pub async fn update_position(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: i64,
    average_price: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE portfolio_positions SET quantity = $1, average_price = $2 WHERE id = $3")
        .bind(quantity)
        .bind(average_price)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Delete a position closed by selling its full quantity.
pub async fn delete_position(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM portfolio_positions WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// List a portfolio's positions joined with catalog data (for GET /api/portfolios).
pub async fn list_position_views(
    pool: &PgPool,
    portfolio_id: Uuid,
) -> Result<Vec<PositionView>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PositionView>(
        "SELECT s.symbol AS stock_symbol, s.name AS stock_name, s.last_price AS current_price, \
         p.quantity, p.average_price AS average_cost \
         FROM portfolio_positions p JOIN stocks s ON s.id = p.stock_id \
         WHERE p.portfolio_id = $1",
    )
    .bind(portfolio_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
