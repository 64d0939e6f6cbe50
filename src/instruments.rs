//! Payment Instruments

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

/// Identifier of the loyalty points pool when none is configured.
pub const DEFAULT_POINTS_ID: &str = "PUNKTY";

new_key_type! {
    /// Instrument Key
    pub struct InstrumentKey;
}

/// Errors raised while building or mutating the instrument book.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstrumentError {
    /// Discount percentage outside `[0, 100]`.
    #[error("instrument {id} has discount {discount}%, expected a value between 0 and 100")]
    InvalidDiscount {
        /// Instrument identifier
        id: String,
        /// Offending discount percentage
        discount: Decimal,
    },

    /// Negative spending limit.
    #[error("instrument {id} has negative limit {limit}")]
    NegativeLimit {
        /// Instrument identifier
        id: String,
        /// Offending limit
        limit: Decimal,
    },

    /// Two instruments share the same identifier.
    #[error("instrument {0} is defined more than once")]
    Duplicate(String),

    /// Key does not belong to this book.
    #[error("instrument key {0:?} is not part of the book")]
    UnknownKey(InstrumentKey),

    /// Debit larger than the remaining capacity.
    #[error("instrument {id} cannot be charged {amount}, only {remaining} remains")]
    InsufficientCapacity {
        /// Instrument identifier
        id: String,
        /// Requested amount
        amount: Decimal,
        /// Remaining capacity at the time of the request
        remaining: Decimal,
    },

    /// Credit that would push the remaining capacity above the limit.
    #[error("instrument {id} cannot be credited {amount} above its limit {limit}")]
    ExcessCredit {
        /// Instrument identifier
        id: String,
        /// Requested amount
        amount: Decimal,
        /// Nominal limit
        limit: Decimal,
    },
}

/// A funding source with a promotional discount rate and a spending cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    id: String,
    discount: Decimal,
    limit: Decimal,
    remaining_limit: Decimal,
}

impl Instrument {
    /// Create an instrument whose remaining limit equals its nominal limit.
    ///
    /// # Errors
    ///
    /// Returns an [`InstrumentError`] if the discount is outside `[0, 100]` or the limit is negative.
    pub fn new(
        id: impl Into<String>,
        discount: Decimal,
        limit: Decimal,
    ) -> Result<Self, InstrumentError> {
        let id = id.into();

        if discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED {
            return Err(InstrumentError::InvalidDiscount { id, discount });
        }

        if limit < Decimal::ZERO {
            return Err(InstrumentError::NegativeLimit { id, limit });
        }

        Ok(Self {
            id,
            discount,
            limit,
            remaining_limit: limit,
        })
    }

    /// Instrument identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Discount percentage in `[0, 100]`.
    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Discount as a fraction in `[0, 1]`.
    pub fn discount_rate(&self) -> Decimal {
        self.discount / Decimal::ONE_HUNDRED
    }

    /// Nominal spending limit.
    pub fn limit(&self) -> Decimal {
        self.limit
    }

    /// Capacity left after the allocations made so far.
    pub fn remaining_limit(&self) -> Decimal {
        self.remaining_limit
    }

    /// Amount charged to this instrument so far.
    pub fn consumed(&self) -> Decimal {
        self.limit - self.remaining_limit
    }

    /// Amount charged when paying `value` in full at this instrument's discount rate.
    pub fn discounted_price(&self, value: Decimal) -> Decimal {
        value * (Decimal::ONE - self.discount_rate())
    }
}

/// The single owner of every instrument taking part in an allocation run.
///
/// Iteration follows insertion order. One identifier is reserved for the loyalty points pool;
/// the pool exists only if an instrument with that identifier has been inserted.
#[derive(Debug, Clone)]
pub struct InstrumentBook {
    instruments: SlotMap<InstrumentKey, Instrument>,
    order: Vec<InstrumentKey>,
    ids: FxHashMap<String, InstrumentKey>,
    points_id: String,
    points: Option<InstrumentKey>,
}

impl InstrumentBook {
    /// Create an empty book whose points pool uses [`DEFAULT_POINTS_ID`].
    pub fn new() -> Self {
        Self::with_points_id(DEFAULT_POINTS_ID)
    }

    /// Create an empty book with a custom points pool identifier.
    pub fn with_points_id(points_id: impl Into<String>) -> Self {
        Self {
            instruments: SlotMap::with_key(),
            order: Vec::new(),
            ids: FxHashMap::default(),
            points_id: points_id.into(),
            points: None,
        }
    }

    /// Build a book from instruments, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::Duplicate`] if two instruments share an identifier.
    pub fn from_instruments(
        instruments: impl IntoIterator<Item = Instrument>,
        points_id: impl Into<String>,
    ) -> Result<Self, InstrumentError> {
        let mut book = Self::with_points_id(points_id);

        for instrument in instruments {
            book.insert(instrument)?;
        }

        Ok(book)
    }

    /// Add an instrument to the book.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::Duplicate`] if the identifier is already present.
    pub fn insert(&mut self, instrument: Instrument) -> Result<InstrumentKey, InstrumentError> {
        if self.ids.contains_key(instrument.id()) {
            return Err(InstrumentError::Duplicate(instrument.id));
        }

        let id = instrument.id.clone();
        let is_points = id == self.points_id;
        let key = self.instruments.insert(instrument);

        self.order.push(key);
        self.ids.insert(id, key);

        if is_points {
            self.points = Some(key);
        }

        Ok(key)
    }

    /// Get an instrument by key.
    pub fn get(&self, key: InstrumentKey) -> Option<&Instrument> {
        self.instruments.get(key)
    }

    /// Get an instrument by key, or fail with [`InstrumentError::UnknownKey`].
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::UnknownKey`] if the key is not part of this book.
    pub fn try_get(&self, key: InstrumentKey) -> Result<&Instrument, InstrumentError> {
        self.instruments
            .get(key)
            .ok_or(InstrumentError::UnknownKey(key))
    }

    /// Look up the key of an instrument by its identifier.
    pub fn key_of(&self, id: &str) -> Option<InstrumentKey> {
        self.ids.get(id).copied()
    }

    /// Look up an instrument by its identifier.
    pub fn get_by_id(&self, id: &str) -> Option<&Instrument> {
        self.key_of(id).and_then(|key| self.get(key))
    }

    /// Identifier reserved for the points pool.
    pub fn points_id(&self) -> &str {
        &self.points_id
    }

    /// Key of the points pool, if the book has one.
    pub fn points_key(&self) -> Option<InstrumentKey> {
        self.points
    }

    /// The points pool, if the book has one.
    pub fn points(&self) -> Option<&Instrument> {
        self.points.and_then(|key| self.get(key))
    }

    /// Whether the key refers to the points pool.
    pub fn is_points(&self, key: InstrumentKey) -> bool {
        self.points == Some(key)
    }

    /// Iterate over instruments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (InstrumentKey, &Instrument)> {
        self.order
            .iter()
            .filter_map(|&key| self.instruments.get(key).map(|instrument| (key, instrument)))
    }

    /// Iterate over every instrument except the points pool, in insertion order.
    pub fn non_points(&self) -> impl Iterator<Item = (InstrumentKey, &Instrument)> {
        self.iter().filter(|&(key, _)| !self.is_points(key))
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the book has no instruments.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of every instrument's nominal limit.
    pub fn total_limit(&self) -> Decimal {
        self.iter().map(|(_, instrument)| instrument.limit()).sum()
    }

    /// Charge `amount` against the instrument's remaining capacity.
    pub(crate) fn debit(
        &mut self,
        key: InstrumentKey,
        amount: Decimal,
    ) -> Result<(), InstrumentError> {
        let instrument = self
            .instruments
            .get_mut(key)
            .ok_or(InstrumentError::UnknownKey(key))?;

        if amount > instrument.remaining_limit {
            return Err(InstrumentError::InsufficientCapacity {
                id: instrument.id.clone(),
                amount,
                remaining: instrument.remaining_limit,
            });
        }

        instrument.remaining_limit -= amount;

        Ok(())
    }

    /// Return `amount` to the instrument's remaining capacity.
    pub(crate) fn credit(
        &mut self,
        key: InstrumentKey,
        amount: Decimal,
    ) -> Result<(), InstrumentError> {
        let instrument = self
            .instruments
            .get_mut(key)
            .ok_or(InstrumentError::UnknownKey(key))?;

        if instrument.remaining_limit + amount > instrument.limit {
            return Err(InstrumentError::ExcessCredit {
                id: instrument.id.clone(),
                amount,
                limit: instrument.limit,
            });
        }

        instrument.remaining_limit += amount;

        Ok(())
    }

    /// Mark the instrument's capacity as fully used.
    pub(crate) fn exhaust(&mut self, key: InstrumentKey) -> Result<(), InstrumentError> {
        let instrument = self
            .instruments
            .get_mut(key)
            .ok_or(InstrumentError::UnknownKey(key))?;

        instrument.remaining_limit = Decimal::ZERO;

        Ok(())
    }
}

impl Default for InstrumentBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use super::*;

    fn book() -> Result<InstrumentBook, InstrumentError> {
        InstrumentBook::from_instruments(
            [
                Instrument::new("KARTA1", dec!(5), dec!(100))?,
                Instrument::new("PUNKTY", dec!(10), dec!(50))?,
                Instrument::new("KARTA2", dec!(15), dec!(100))?,
            ],
            DEFAULT_POINTS_ID,
        )
    }

    #[test]
    fn new_instrument_starts_with_full_capacity() -> TestResult {
        let instrument = Instrument::new("KARTA1", dec!(5), dec!(100))?;

        assert_eq!(instrument.remaining_limit(), instrument.limit());
        assert_eq!(instrument.consumed(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn new_instrument_rejects_out_of_range_discount() {
        let result = Instrument::new("BAD", dec!(100.5), dec!(10));

        assert!(matches!(
            result,
            Err(InstrumentError::InvalidDiscount { .. })
        ));

        let result = Instrument::new("BAD", dec!(-1), dec!(10));

        assert!(matches!(
            result,
            Err(InstrumentError::InvalidDiscount { .. })
        ));
    }

    #[test]
    fn new_instrument_rejects_negative_limit() {
        let result = Instrument::new("BAD", dec!(5), dec!(-0.01));

        assert!(matches!(result, Err(InstrumentError::NegativeLimit { .. })));
    }

    #[test]
    fn discounted_price_applies_rate_exactly() -> TestResult {
        let instrument = Instrument::new("KARTA1", dec!(5), dec!(100))?;

        assert_eq!(instrument.discounted_price(dec!(30)), dec!(28.5));

        Ok(())
    }

    #[test]
    fn book_keeps_insertion_order_and_finds_points() -> TestResult {
        let book = book()?;

        let ids: Vec<&str> = book.iter().map(|(_, i)| i.id()).collect();
        assert_eq!(ids, ["KARTA1", "PUNKTY", "KARTA2"]);

        let non_points: Vec<&str> = book.non_points().map(|(_, i)| i.id()).collect();
        assert_eq!(non_points, ["KARTA1", "KARTA2"]);

        assert_eq!(book.points().map(Instrument::id), Some("PUNKTY"));
        assert_eq!(book.total_limit(), dec!(250));

        Ok(())
    }

    #[test]
    fn book_without_points_instrument_has_no_pool() -> TestResult {
        let book = InstrumentBook::from_instruments(
            [Instrument::new("KARTA1", dec!(5), dec!(100))?],
            DEFAULT_POINTS_ID,
        )?;

        assert!(book.points_key().is_none());

        Ok(())
    }

    #[test]
    fn book_rejects_duplicate_ids() -> TestResult {
        let result = InstrumentBook::from_instruments(
            [
                Instrument::new("KARTA1", dec!(5), dec!(100))?,
                Instrument::new("KARTA1", dec!(10), dec!(10))?,
            ],
            DEFAULT_POINTS_ID,
        );

        assert_eq!(
            result.err(),
            Some(InstrumentError::Duplicate("KARTA1".to_string()))
        );

        Ok(())
    }

    #[test]
    fn debit_and_credit_stay_within_limit() -> TestResult {
        let mut book = book()?;
        let key = book.key_of("KARTA1").ok_or("missing KARTA1")?;

        book.debit(key, dec!(60))?;
        assert_eq!(book.try_get(key)?.remaining_limit(), dec!(40));

        assert!(matches!(
            book.debit(key, dec!(40.01)),
            Err(InstrumentError::InsufficientCapacity { .. })
        ));

        book.credit(key, dec!(10))?;
        assert_eq!(book.try_get(key)?.consumed(), dec!(50));

        assert!(matches!(
            book.credit(key, dec!(50.01)),
            Err(InstrumentError::ExcessCredit { .. })
        ));

        book.exhaust(key)?;
        assert_eq!(book.try_get(key)?.remaining_limit(), Decimal::ZERO);

        Ok(())
    }
}
