//! Stock catalog persistence: insert, lookup, list.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::stock::Stock;

/// Get a stock by id. Takes a connection so callers inside a
/// transaction can resolve the stock on the same scope.
pub async fn get_stock_by_id(
    conn: &mut PgConnection,
    stock_id: Uuid,
) -> Result<Option<Stock>, sqlx::Error> {
    let row = sqlx::query_as::<_, Stock>(
        "SELECT id, symbol, name, currency, last_price, last_updated FROM stocks WHERE id = $1",
    )
    .bind(stock_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Get a stock by symbol. For the duplicate check on create.
pub async fn get_stock_by_symbol(
    pool: &PgPool,
    symbol: &str,
) -> Result<Option<Stock>, sqlx::Error> {
    let row = sqlx::query_as::<_, Stock>(
        "SELECT id, symbol, name, currency, last_price, last_updated FROM stocks WHERE symbol = $1",
    )
    .bind(symbol)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// List the whole catalog. No ordering is guaranteed.
pub async fn list_stocks(pool: &PgPool) -> Result<Vec<Stock>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Stock>(
        "SELECT id, symbol, name, currency, last_price, last_updated FROM stocks",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Insert a stock. The symbol's unique index backs the caller's
/// duplicate check.
pub async fn insert_stock(pool: &PgPool, stock: &Stock) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stocks (id, symbol, name, currency, last_price, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(stock.id)
    .bind(&stock.symbol)
    .bind(&stock.name)
    .bind(&stock.currency)
    .bind(stock.last_price)
    .bind(stock.last_updated)
    .execute(pool)
    .await?;
    Ok(())
}
