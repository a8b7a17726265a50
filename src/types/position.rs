use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Holding per (portfolio, stock). Quantity is strictly positive while
/// the row exists; a position sold down to zero is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub stock_id: Uuid,
    pub quantity: i64,
    pub average_price: f64,
}

/// Position joined with catalog data for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PositionView {
    pub stock_symbol: String,
    pub stock_name: String,
    pub current_price: f64,
    pub quantity: i64,
    pub average_cost: f64,
}
