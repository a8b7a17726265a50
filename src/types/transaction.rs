use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

/// One executed buy or sell. Append-only: records are never updated or
/// deleted after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stock_id: Uuid,
    #[serde(rename = "type")]
    pub side: TransactionSide,
    pub amount: i64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Transaction joined with catalog data for the history feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHistory {
    pub stock_symbol: String,
    pub stock_name: String,
    pub stock_last_price: f64,
    pub amount: i64,
    pub price: f64,
    #[serde(rename = "type")]
    pub side: TransactionSide,
    pub created_at: DateTime<Utc>,
}
