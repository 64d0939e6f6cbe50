//! Allocation
//!
//! Turns a solved assignment program into selected variants and charges the instruments.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    error::AllocationError,
    instruments::{InstrumentBook, InstrumentKey},
    solvers::{
        SolverOutcome,
        ilp::model::{AssignmentModel, VariantRef},
    },
    variants::Variant,
};

/// The variant chosen to pay one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedVariant {
    reference: VariantRef,
    variant: Variant,
}

impl SelectedVariant {
    /// Create a selection.
    pub fn new(reference: VariantRef, variant: Variant) -> Self {
        Self { reference, variant }
    }

    /// Position of the variant in the assignment program.
    pub fn reference(&self) -> VariantRef {
        self.reference
    }

    /// The selected variant.
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Identifier of the paid order.
    pub fn order_id(&self) -> &str {
        self.variant.order_id()
    }

    pub(crate) fn variant_mut(&mut self) -> &mut Variant {
        &mut self.variant
    }
}

/// Read the selected variants from `outcome` and charge their amounts to `instruments`.
///
/// Selections are returned by order index, then variant index. Nothing is charged unless every
/// check passes.
///
/// # Errors
///
/// Returns [`AllocationError::SolverFailure`] if the solver did not prove optimality,
/// [`AllocationError::InvariantViolation`] if an order does not have exactly one selected variant
/// or a charge would exceed an instrument's remaining capacity, and
/// [`AllocationError::UnknownInstrument`] if a variant charges an instrument missing from the book.
pub fn extract(
    outcome: &SolverOutcome,
    model: &AssignmentModel,
    instruments: &mut InstrumentBook,
) -> Result<Vec<SelectedVariant>, AllocationError> {
    if !outcome.is_optimal() {
        warn!(status = %outcome.status(), "solver did not find an optimal assignment");

        return Err(AllocationError::SolverFailure {
            status: outcome.status(),
        });
    }

    let mut selected = Vec::with_capacity(model.order_count());
    let mut per_order: SmallVec<[usize; 16]> = SmallVec::from_elem(0, model.order_count());

    for &(reference, var) in model.variables() {
        if !outcome.is_selected(var) {
            continue;
        }

        let variant = model
            .variant(reference)
            .ok_or(AllocationError::InvariantViolation {
                message: "selected variable does not refer to a variant",
            })?;

        let count = per_order
            .get_mut(reference.order)
            .ok_or(AllocationError::InvariantViolation {
                message: "selected variant refers to an unknown order",
            })?;

        *count += 1;

        selected.push(SelectedVariant::new(reference, variant.clone()));
    }

    if per_order.iter().any(|&count| count != 1) {
        return Err(AllocationError::InvariantViolation {
            message: "every order must have exactly one selected variant",
        });
    }

    let charges = charges_by_instrument(&selected);

    for &(key, amount) in &charges {
        let instrument = instruments
            .get(key)
            .ok_or(AllocationError::UnknownInstrument(key))?;

        if amount > instrument.remaining_limit() {
            return Err(AllocationError::InvariantViolation {
                message: "selected variants exceed an instrument's remaining capacity",
            });
        }
    }

    for (key, amount) in charges {
        instruments.debit(key, amount)?;
    }

    debug!(selected = selected.len(), "charged selected variants");

    Ok(selected)
}

/// Total charged per instrument, in first-use order.
fn charges_by_instrument(selected: &[SelectedVariant]) -> Vec<(InstrumentKey, Decimal)> {
    let mut positions: FxHashMap<InstrumentKey, usize> = FxHashMap::default();
    let mut charges: Vec<(InstrumentKey, Decimal)> = Vec::new();

    for selection in selected {
        for &(key, amount) in selection.variant().methods() {
            match positions.get(&key).and_then(|&idx| charges.get_mut(idx)) {
                Some((_, total)) => *total += amount,
                None => {
                    positions.insert(key, charges.len());
                    charges.push((key, amount));
                }
            }
        }
    }

    charges
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        instruments::Instrument,
        orders::Order,
        solvers::{SolverStatus, ilp::GoodLpSolver, ilp::NoopObserver},
        test_support::{sample_book, sample_orders},
        variants::generate,
    };

    use super::*;

    fn build(
        orders: &[Order],
        book: &InstrumentBook,
    ) -> Result<AssignmentModel, AllocationError> {
        let variants = orders.iter().map(|order| generate(order, book)).collect();

        AssignmentModel::build(
            orders,
            variants,
            book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        )
    }

    /// Outcome selecting the given variant index for every order.
    fn outcome_selecting(model: &AssignmentModel, choice: &[usize]) -> SolverOutcome {
        let values = model
            .variables()
            .iter()
            .map(|(reference, _)| {
                if choice.get(reference.order) == Some(&reference.variant) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();

        SolverOutcome::new(SolverStatus::Optimal, values)
    }

    #[test]
    fn non_optimal_outcome_fails_without_charging() -> TestResult {
        let mut book = sample_book()?;
        let orders = sample_orders();
        let model = build(&orders, &book)?;

        let result = extract(
            &SolverOutcome::without_solution(SolverStatus::Infeasible),
            &model,
            &mut book,
        );

        assert!(matches!(
            result,
            Err(AllocationError::SolverFailure {
                status: SolverStatus::Infeasible
            })
        ));
        assert!(book.iter().all(|(_, i)| i.consumed() == Decimal::ZERO));

        Ok(())
    }

    #[test]
    fn selected_variants_are_charged() -> TestResult {
        let mut book = sample_book()?;
        let orders = sample_orders();
        let model = build(&orders, &book)?;

        // Promotional variant for every order with a promotion, points for ORDER4.
        let selected = extract(&outcome_selecting(&model, &[0, 0, 1, 0]), &model, &mut book)?;

        let ids: Vec<&str> = selected.iter().map(SelectedVariant::order_id).collect();
        assert_eq!(ids, ["ORDER1", "ORDER2", "ORDER3", "ORDER4"]);

        let consumed = |id: &str| book.get_by_id(id).map(Instrument::consumed);

        assert_eq!(consumed("KARTA1"), Some(dec!(28.5)));
        assert_eq!(consumed("KARTA2"), Some(dec!(42.5)));
        assert_eq!(consumed("PUNKTY"), Some(dec!(45)));

        Ok(())
    }

    #[test]
    fn order_without_selection_is_rejected() -> TestResult {
        let mut book = sample_book()?;
        let orders = sample_orders();
        let model = build(&orders, &book)?;

        let result = extract(&outcome_selecting(&model, &[0, 0, 1]), &model, &mut book);

        assert!(matches!(
            result,
            Err(AllocationError::InvariantViolation { .. })
        ));
        assert!(book.iter().all(|(_, i)| i.consumed() == Decimal::ZERO));

        Ok(())
    }

    #[test]
    fn over_capacity_selection_is_rejected_without_charging() -> TestResult {
        let mut book = sample_book()?;
        let orders = vec![
            Order::new("A", dec!(40)),
            Order::new("B", dec!(40)),
        ];
        let model = build(&orders, &book)?;

        // Variant 0 of each order pays in full with points: 36 + 36 > 50.
        let result = extract(&outcome_selecting(&model, &[0, 0]), &model, &mut book);

        assert!(matches!(
            result,
            Err(AllocationError::InvariantViolation { .. })
        ));
        assert!(book.iter().all(|(_, i)| i.consumed() == Decimal::ZERO));

        Ok(())
    }
}
