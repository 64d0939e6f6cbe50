//! Payment Variants
//!
//! A variant is one candidate way to pay a single order in full: either one instrument covers the
//! whole value, or the points pool covers a fixed share and one other instrument the rest.

use std::fmt;

use rust_decimal::Decimal;
use smallvec::{SmallVec, smallvec};

use crate::{
    instruments::{InstrumentBook, InstrumentKey},
    orders::Order,
};

/// Share of the order value paid with points in a split composition (10%).
pub const SPLIT_POINTS_SHARE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Flat discount earned by a split composition, as a share of the order value (10%).
pub const SPLIT_DISCOUNT_SHARE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Per-instrument amounts charged by a variant. A variant never uses more than two instruments.
pub type VariantMethods = SmallVec<[(InstrumentKey, Decimal); 2]>;

/// How a variant pays for its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Whole order on a promotion-eligible instrument at its discounted rate.
    Promotional,

    /// Whole order with points at the pool's discounted rate.
    Points,

    /// Minimum points share plus one other instrument, flat discount.
    PointsSplit,

    /// Whole order on a non-promotional instrument, no discount.
    FullPrice,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VariantKind::Promotional => "promotional",
            VariantKind::Points => "points",
            VariantKind::PointsSplit => "points split",
            VariantKind::FullPrice => "full price",
        };

        f.write_str(label)
    }
}

/// Candidate payment composition for exactly one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    order_id: String,
    kind: VariantKind,
    methods: VariantMethods,
    discount: Decimal,
}

impl Variant {
    /// Create a variant from its parts.
    pub fn new(
        order_id: impl Into<String>,
        kind: VariantKind,
        methods: VariantMethods,
        discount: Decimal,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            kind,
            methods,
            discount,
        }
    }

    /// Identifier of the order this variant pays for.
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// How this variant pays.
    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    /// Amount charged to each instrument.
    pub fn methods(&self) -> &[(InstrumentKey, Decimal)] {
        &self.methods
    }

    /// Discount earned by choosing this variant.
    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Amount charged to the given instrument, if the variant uses it.
    pub fn amount_for(&self, key: InstrumentKey) -> Option<Decimal> {
        self.methods
            .iter()
            .find(|(method, _)| *method == key)
            .map(|(_, amount)| *amount)
    }

    /// Whether the variant charges the given instrument.
    pub fn uses(&self, key: InstrumentKey) -> bool {
        self.amount_for(key).is_some()
    }

    /// Sum of all charged amounts.
    pub fn charged_total(&self) -> Decimal {
        self.methods.iter().map(|(_, amount)| *amount).sum()
    }

    /// Nominal order value covered by this variant: charged amounts plus discount earned.
    pub fn covered_value(&self) -> Decimal {
        self.charged_total() + self.discount
    }

    /// First instrument other than `points` charged by this variant, with its amount.
    pub fn co_instrument(&self, points: InstrumentKey) -> Option<(InstrumentKey, Decimal)> {
        self.methods.iter().copied().find(|(key, _)| *key != points)
    }

    /// Move `amount` from the `from` instrument to the `to` instrument.
    ///
    /// Both instruments must already be charged by this variant; otherwise nothing changes and
    /// `false` is returned.
    pub(crate) fn shift(&mut self, from: InstrumentKey, to: InstrumentKey, amount: Decimal) -> bool {
        if !self.uses(from) || !self.uses(to) {
            return false;
        }

        for (key, charged) in &mut self.methods {
            if *key == from {
                *charged -= amount;
            } else if *key == to {
                *charged += amount;
            }
        }

        true
    }
}

/// Generate every structurally valid payment composition for `order`.
///
/// Generation only looks at nominal limits, so it does not depend on other orders. Candidates are
/// emitted in rule order: promotional full payments (in the order's promotion order), full payment
/// with points, points splits (in instrument order), then undiscounted full payments on
/// instruments the order has no promotion for. Orders with a non-positive value have no variants.
pub fn generate(order: &Order, instruments: &InstrumentBook) -> Vec<Variant> {
    let value = order.value();

    if value <= Decimal::ZERO {
        return Vec::new();
    }

    let mut variants = Vec::new();

    for promotion in order.promotions() {
        let Some(key) = instruments.key_of(promotion) else {
            continue;
        };

        // Paying with points at the pool's rate is covered below.
        if instruments.is_points(key) {
            continue;
        }

        let Some(instrument) = instruments.get(key) else {
            continue;
        };

        if instrument.limit() >= value {
            let pay = instrument.discounted_price(value);

            variants.push(Variant::new(
                order.id(),
                VariantKind::Promotional,
                smallvec![(key, pay)],
                value - pay,
            ));
        }
    }

    if let Some(points_key) = instruments.points_key()
        && let Some(points) = instruments.get(points_key)
    {
        if points.limit() >= value {
            let pay = points.discounted_price(value);

            variants.push(Variant::new(
                order.id(),
                VariantKind::Points,
                smallvec![(points_key, pay)],
                value - pay,
            ));
        }

        let min_points = SPLIT_POINTS_SHARE * value;

        if points.limit() >= min_points {
            // The split discount is subtracted from the cash part as well, leaving 80% on the card.
            let cash_part = value - min_points - SPLIT_DISCOUNT_SHARE * value;

            for (key, instrument) in instruments.non_points() {
                if instrument.limit() >= cash_part {
                    variants.push(Variant::new(
                        order.id(),
                        VariantKind::PointsSplit,
                        smallvec![(points_key, min_points), (key, cash_part)],
                        SPLIT_DISCOUNT_SHARE * value,
                    ));
                }
            }
        }
    }

    for (key, instrument) in instruments.non_points() {
        if order.has_promotion(instrument.id()) {
            continue;
        }

        if instrument.limit() >= value {
            variants.push(Variant::new(
                order.id(),
                VariantKind::FullPrice,
                smallvec![(key, value)],
                Decimal::ZERO,
            ));
        }
    }

    variants
}
