use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tradable instrument in the catalog. `last_price` is the most recent
/// known quote in `currency`, not a live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub currency: String,
    pub last_price: f64,
    pub last_updated: DateTime<Utc>,
}
