//! Points Rebalancing
//!
//! After allocation, leftover points are moved onto the first selected variant that pairs the
//! points pool with another instrument, replacing part of that instrument's charge. This runs
//! once per allocation and touches at most one variant.

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    allocation::SelectedVariant,
    error::AllocationError,
    instruments::{InstrumentBook, InstrumentKey},
};

/// What the rebalancing pass changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebalanceOutcome {
    /// Nothing was moved.
    Untouched,

    /// Leftover points replaced part of one variant's co-instrument charge.
    Shifted {
        /// Order whose variant was changed
        order_id: String,

        /// Co-instrument whose charge was reduced
        instrument: InstrumentKey,

        /// Amount moved onto points
        amount: Decimal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Done,
}

/// Move leftover points onto the first eligible selected variant.
///
/// Variants charging the points pool are visited in selection order. The first one with a
/// non-points co-instrument charged more than the leftover points absorbs all of them: its points
/// amount grows by the leftover, its co-instrument amount shrinks by the same, the co-instrument
/// gets that capacity back and the points pool is marked exhausted. Variants whose co-instrument
/// charge does not exceed the leftover are skipped.
///
/// # Errors
///
/// Returns [`AllocationError::Instrument`] if crediting the co-instrument would exceed its limit,
/// or [`AllocationError::InvariantViolation`] if the selected variant cannot be updated.
pub fn rebalance(
    selected: &mut [SelectedVariant],
    instruments: &mut InstrumentBook,
) -> Result<RebalanceOutcome, AllocationError> {
    let Some(points) = instruments.points_key() else {
        return Ok(RebalanceOutcome::Untouched);
    };

    let remaining_points = instruments.try_get(points)?.remaining_limit();

    let mut state = State::Scanning;
    let mut outcome = RebalanceOutcome::Untouched;

    for selection in selected
        .iter_mut()
        .filter(|selection| selection.variant().uses(points))
    {
        if state == State::Done {
            break;
        }

        let Some((co_instrument, co_amount)) = selection.variant().co_instrument(points) else {
            continue;
        };

        if remaining_points >= co_amount {
            continue;
        }

        if !selection
            .variant_mut()
            .shift(co_instrument, points, remaining_points)
        {
            return Err(AllocationError::InvariantViolation {
                message: "rebalanced variant does not charge both instruments",
            });
        }

        instruments.credit(co_instrument, remaining_points)?;
        instruments.exhaust(points)?;

        debug!(
            order = selection.order_id(),
            amount = %remaining_points,
            "moved leftover points onto variant"
        );

        outcome = RebalanceOutcome::Shifted {
            order_id: selection.order_id().to_string(),
            instrument: co_instrument,
            amount: remaining_points,
        };
        state = State::Done;
    }

    Ok(outcome)
}
