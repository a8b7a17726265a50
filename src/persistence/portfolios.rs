//! Portfolio persistence: one row per user, enforced by a unique index.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::types::portfolio::Portfolio;

/// Get the caller's portfolio, if one was created. Connection-scoped so
/// buy/sell can resolve it inside their transaction.
pub async fn get_portfolio_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Portfolio>, sqlx::Error> {
    let row = sqlx::query_as::<_, Portfolio>(
        "SELECT id, user_id, created_at FROM portfolios WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Insert a portfolio bound to its owner.
pub async fn insert_portfolio(pool: &PgPool, portfolio: &Portfolio) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO portfolios (id, user_id, created_at) VALUES ($1, $2, $3)")
        .bind(portfolio.id)
        .bind(portfolio.user_id)
        .bind(portfolio.created_at)
        .execute(pool)
        .await?;
    Ok(())
}
