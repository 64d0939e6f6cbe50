//! Instrument Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::instruments::{Instrument, InstrumentError};

/// Instrument record as stored in a fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentRecord {
    /// Instrument identifier
    pub id: String,

    /// Discount percentage
    pub discount: Decimal,

    /// Spending limit
    pub limit: Decimal,
}

impl TryFrom<InstrumentRecord> for Instrument {
    type Error = InstrumentError;

    fn try_from(record: InstrumentRecord) -> Result<Self, Self::Error> {
        Instrument::new(record.id, record.discount, record.limit)
    }
}
