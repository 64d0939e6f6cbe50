//! Shared test fixtures

use rust_decimal_macros::dec;

use crate::{
    instruments::{DEFAULT_POINTS_ID, Instrument, InstrumentBook, InstrumentError},
    orders::Order,
};

/// Two cards and a points pool: KARTA1 (5%, 100), KARTA2 (15%, 100), PUNKTY (10%, 50).
pub(crate) fn sample_book() -> Result<InstrumentBook, InstrumentError> {
    InstrumentBook::from_instruments(
        [
            Instrument::new("KARTA1", dec!(5), dec!(100))?,
            Instrument::new("KARTA2", dec!(15), dec!(100))?,
            Instrument::new("PUNKTY", dec!(10), dec!(50))?,
        ],
        DEFAULT_POINTS_ID,
    )
}

/// Four orders worth 130 in total, exercising every promotion combination.
pub(crate) fn sample_orders() -> Vec<Order> {
    vec![
        Order::with_promotions("ORDER1", dec!(30), ["KARTA1"]),
        Order::with_promotions("ORDER2", dec!(40), ["KARTA2"]),
        Order::with_promotions("ORDER3", dec!(10), ["KARTA1", "KARTA2"]),
        Order::new("ORDER4", dec!(50)),
    ]
}
