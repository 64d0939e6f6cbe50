//! Order Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::orders::Order;

/// Order record as stored in a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRecord {
    /// Order identifier
    pub id: String,

    /// Order value
    pub value: Decimal,

    /// Identifiers of instruments with a promotion for this order
    #[serde(default)]
    pub promotions: Vec<String>,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        Order::with_promotions(record.id, record.value, record.promotions)
    }
}
