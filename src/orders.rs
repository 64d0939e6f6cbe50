//! Orders

use rust_decimal::Decimal;
use smallvec::SmallVec;

/// A customer order that must be paid in full by exactly one payment composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: String,
    value: Decimal,
    promotions: SmallVec<[String; 4]>,
}

impl Order {
    /// Create a new order without any promotions.
    pub fn new(id: impl Into<String>, value: Decimal) -> Self {
        Self {
            id: id.into(),
            value,
            promotions: SmallVec::new(),
        }
    }

    /// Create a new order whose value qualifies for the promotional rate of the given instruments.
    ///
    /// Promotions form a set: repeated instrument ids are dropped, keeping the first occurrence.
    pub fn with_promotions<I, S>(id: impl Into<String>, value: Decimal, promotions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: SmallVec<[String; 4]> = SmallVec::new();

        for promotion in promotions {
            let promotion = promotion.into();

            if !unique.contains(&promotion) {
                unique.push(promotion);
            }
        }

        Self {
            id: id.into(),
            value,
            promotions: unique,
        }
    }

    /// Order identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Nominal order value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Instrument ids eligible for a promotional rate on this order.
    pub fn promotions(&self) -> &[String] {
        &self.promotions
    }

    /// Whether the instrument with the given id is eligible for a promotional rate.
    pub fn has_promotion(&self, instrument_id: &str) -> bool {
        self.promotions.iter().any(|id| id == instrument_id)
    }
}

/// Sum of the nominal values of all orders.
pub fn total_value(orders: &[Order]) -> Decimal {
    orders.iter().map(Order::value).sum()
}
