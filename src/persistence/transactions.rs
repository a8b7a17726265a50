//! Transaction log persistence: append on execution, history for the API.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::types::transaction::{TransactionHistory, TransactionRecord, TransactionSide};

fn side_to_str(side: TransactionSide) -> &'static str {
    match side {
        TransactionSide::Buy => "BUY",
        TransactionSide::Sell => "SELL",
    }
}

fn str_to_side(s: &str) -> Option<TransactionSide> {
    match s {
        "BUY" => Some(TransactionSide::Buy),
        "SELL" => Some(TransactionSide::Sell),
        _ => None,
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    stock_symbol: String,
    stock_name: String,
    stock_last_price: f64,
    amount: i64,
    price: f64,
    side: String,
    created_at: DateTime<Utc>,
}

/// Convert a joined history row. Skips rows with an unknown side.
fn history_row_to_view(row: &HistoryRow) -> Option<TransactionHistory> {
    let side = str_to_side(&row.side)?;
    Some(TransactionHistory {
        stock_symbol: row.stock_symbol.clone(),
        stock_name: row.stock_name.clone(),
        stock_last_price: row.stock_last_price,
        amount: row.amount,
        price: row.price,
        side,
        created_at: row.created_at,
    })
}

/// Append one executed transaction. The caller (the ledger) has done
/// all validation; this is a pure insert on the ledger's transaction
/// scope so the record commits with the position change or not at all.
pub async fn insert_transaction(
    conn: &mut PgConnection,
    record: &TransactionRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transactions (id, user_id, stock_id, side, amount, price, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.stock_id)
    .bind(side_to_str(record.side))
    .bind(record.amount)
    .bind(record.price)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// List a user's transactions joined with catalog data, newest first
/// (for GET /api/transactions/history).
pub async fn list_transactions_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<TransactionHistory>, sqlx::Error> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT s.symbol AS stock_symbol, s.name AS stock_name, s.last_price AS stock_last_price, \
         t.amount, t.price, t.side, t.created_at \
         FROM transactions t JOIN stocks s ON s.id = t.stock_id \
         WHERE t.user_id = $1 ORDER BY t.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().filter_map(history_row_to_view).collect())
}
