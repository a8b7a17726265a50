//! Position accounting: weighted-average cost maintenance, applied as
//! one database transaction per buy/sell. The blend math is kept free
//! of IO so it is testable without a database.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::persistence;
use crate::types::position::PositionView;
use crate::types::transaction::{TransactionRecord, TransactionSide};

/// Quantity and average after adding `amount` units at `price` to an
/// existing holding. Inputs are the pre-update quantity and average;
/// the new average is the quantity-weighted blend of the prior holding
/// and the incoming lot.
pub fn buy_blend(old_qty: i64, old_avg: f64, amount: i64, price: f64) -> (i64, f64) {
    let new_qty = old_qty + amount;
    let new_avg = (old_avg * old_qty as f64 + price * amount as f64) / new_qty as f64;
    (new_qty, new_avg)
}

/// Outcome of reducing a holding by a sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SellOutcome {
    /// The whole holding was sold; the position row must be deleted.
    Closed,
    Open { quantity: i64, average_price: f64 },
}

/// Quantity and average after selling `amount` units at `price`. The
/// sold lot's cost is backed out of the stored average, so a sell at a
/// price other than the held average shifts the average of what
/// remains. Caller guarantees `amount <= old_qty`.
pub fn sell_remainder(old_qty: i64, old_avg: f64, amount: i64, price: f64) -> SellOutcome {
    let remaining = old_qty - amount;
    if remaining == 0 {
        return SellOutcome::Closed;
    }
    let average_price =
        (old_avg * (old_qty + amount) as f64 - price * amount as f64) / remaining as f64;
    SellOutcome::Open {
        quantity: remaining,
        average_price,
    }
}

/// Execute a buy: blend into (or open) the caller's position and append
/// the transaction record, all inside one database transaction. Any
/// failure before commit rolls the whole operation back.
pub async fn execute_buy(
    pool: &PgPool,
    user_id: Uuid,
    stock_id: Uuid,
    amount: i64,
    price: f64,
) -> Result<TransactionRecord, AppError> {
    let mut tx = pool.begin().await?;
    if persistence::get_stock_by_id(&mut tx, stock_id).await?.is_none() {
        return Err(AppError::NotFound("stock not found"));
    }
    if amount <= 0 {
        return Err(AppError::InvalidInput("amount must be positive".into()));
    }
    let portfolio = persistence::get_portfolio_for_user(&mut tx, user_id)
        .await?
        .ok_or(AppError::NotFound("portfolio not found"))?;

    match persistence::get_position_for_update(&mut tx, portfolio.id, stock_id).await? {
        Some(position) => {
            let (quantity, average_price) =
                buy_blend(position.quantity, position.average_price, amount, price);
            persistence::update_position(&mut tx, position.id, quantity, average_price).await?;
        }
        None => {
            persistence::insert_position(&mut tx, Uuid::new_v4(), portfolio.id, stock_id, amount, price)
                .await?;
        }
    }

    let record = TransactionRecord {
        id: Uuid::new_v4(),
        user_id,
        stock_id,
        side: TransactionSide::Buy,
        amount,
        price,
        created_at: Utc::now(),
    };
    persistence::insert_transaction(&mut tx, &record).await?;
    tx.commit().await?;
    Ok(record)
}

/// Execute a sell: reduce or close the caller's position and append the
/// transaction record, all inside one database transaction.
pub async fn execute_sell(
    pool: &PgPool,
    user_id: Uuid,
    stock_id: Uuid,
    amount: i64,
    price: f64,
) -> Result<TransactionRecord, AppError> {
    let mut tx = pool.begin().await?;
    if persistence::get_stock_by_id(&mut tx, stock_id).await?.is_none() {
        return Err(AppError::NotFound("stock not found"));
    }
    if amount <= 0 {
        return Err(AppError::InvalidInput("amount must be positive".into()));
    }
    let portfolio = persistence::get_portfolio_for_user(&mut tx, user_id)
        .await?
        .ok_or(AppError::NotFound("portfolio not found"))?;

    let position = persistence::get_position_for_update(&mut tx, portfolio.id, stock_id)
        .await?
        .ok_or(AppError::InsufficientHoldings)?;
    if position.quantity < amount {
        return Err(AppError::InsufficientHoldings);
    }
    match sell_remainder(position.quantity, position.average_price, amount, price) {
        SellOutcome::Closed => {
            persistence::delete_position(&mut tx, position.id).await?;
        }
        SellOutcome::Open {
            quantity,
            average_price,
        } => {
            persistence::update_position(&mut tx, position.id, quantity, average_price).await?;
        }
    }

    let record = TransactionRecord {
        id: Uuid::new_v4(),
        user_id,
        stock_id,
        side: TransactionSide::Sell,
        amount,
        price,
        created_at: Utc::now(),
    };
    persistence::insert_transaction(&mut tx, &record).await?;
    tx.commit().await?;
    Ok(record)
}

/// Read-only join of a portfolio's positions with catalog data.
pub async fn portfolio_positions(
    pool: &PgPool,
    portfolio_id: Uuid,
) -> Result<Vec<PositionView>, AppError> {
    let views = persistence::list_position_views(pool, portfolio_id).await?;
    Ok(views)
}
