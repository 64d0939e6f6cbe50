//! Assignment Model
//!
//! Declares the binary assignment program on a [`MilpSolver`]: one variable per (order, variant)
//! pair, one exact-cover constraint per order and one capacity constraint per instrument.
//!
//! The objective is the total discount earned. Several assignments can earn the same total, so
//! every coefficient also carries a tie-break term preferring to charge instruments with higher
//! discount rates. The whole tie-break contribution stays below half of the smallest possible
//! difference between two discount totals, so it never changes which total is optimal.

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    error::AllocationError,
    instruments::{InstrumentBook, InstrumentKey},
    orders::{Order, total_value},
    solvers::{DecisionVar, MilpSolver, ObjectiveSense, decimal_to_f64, ilp::ILPObserver},
    variants::Variant,
};

/// Identity of one (order, variant) pair by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantRef {
    /// Index of the order in the input slice
    pub order: usize,

    /// Index of the variant among the order's variants
    pub variant: usize,
}

impl VariantRef {
    /// Create a reference from its parts.
    pub const fn new(order: usize, variant: usize) -> Self {
        Self { order, variant }
    }
}

/// Exactly one of `members` must be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactCoverConstraint {
    /// Index of the covered order
    pub order: usize,

    /// Every candidate variant of the order
    pub members: Vec<VariantRef>,
}

/// Sum of the amounts charged to `instrument` by selected variants must stay within `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityConstraint {
    /// Constrained instrument
    pub instrument: InstrumentKey,

    /// Nominal limit of the instrument
    pub capacity: Decimal,

    /// Variants charging the instrument, with the charged amount
    pub terms: Vec<(VariantRef, Decimal)>,
}

/// The assignment program as declared on a solver.
#[derive(Debug)]
pub struct AssignmentModel {
    variants: Vec<Vec<Variant>>,
    variables: Vec<(VariantRef, DecisionVar)>,
    exact_cover: Vec<ExactCoverConstraint>,
    capacity: Vec<CapacityConstraint>,
    tie_break_weight: f64,
}

impl AssignmentModel {
    /// Declare the assignment program for `orders` on `solver`.
    ///
    /// `variants[i]` holds the candidates of `orders[i]`. An order without candidates still gets
    /// its exact-cover constraint, which makes the program infeasible.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvariantViolation`] if `variants` does not line up with
    /// `orders`, [`AllocationError::UnknownInstrument`] if a variant charges an instrument that
    /// is not in `instruments`, and [`AllocationError::NonRepresentable`] if an amount has no
    /// `f64` representation.
    pub fn build<S, O>(
        orders: &[Order],
        variants: Vec<Vec<Variant>>,
        instruments: &InstrumentBook,
        solver: &mut S,
        observer: &mut O,
    ) -> Result<Self, AllocationError>
    where
        S: MilpSolver + ?Sized,
        O: ILPObserver + ?Sized,
    {
        if orders.len() != variants.len() {
            return Err(AllocationError::InvariantViolation {
                message: "variant list count does not match order count",
            });
        }

        let tie_break_weight = tie_break_weight(orders, &variants)?;

        let mut variables = Vec::new();
        let mut objective = Vec::new();
        let mut exact_cover = Vec::with_capacity(orders.len());

        for (order_idx, (order, candidates)) in orders.iter().zip(&variants).enumerate() {
            let mut members = Vec::with_capacity(candidates.len());
            let mut cover_terms = Vec::with_capacity(candidates.len());

            for (variant_idx, variant) in candidates.iter().enumerate() {
                let reference = VariantRef::new(order_idx, variant_idx);
                let var = solver.add_binary_variable(&format!("x_{}_{variant_idx}", order.id()));

                let discount = to_coefficient(variant.discount())?;
                let coefficient =
                    discount + tie_break_weight * rate_weighted_charge(variant, instruments)?;

                observer.on_assignment_variable(reference, var, discount);
                observer.on_objective_term(var, coefficient);

                variables.push((reference, var));
                objective.push((var, coefficient));
                members.push(reference);
                cover_terms.push((var, 1.0));
            }

            observer.on_exclusivity_constraint(order_idx, &cover_terms);
            solver.add_linear_constraint(1.0, 1.0, &cover_terms);

            exact_cover.push(ExactCoverConstraint {
                order: order_idx,
                members,
            });
        }

        let mut capacity = Vec::with_capacity(instruments.len());

        for (key, instrument) in instruments.iter() {
            let mut terms = Vec::new();
            let mut solver_terms = Vec::new();

            for &(reference, var) in &variables {
                let amount = variant_at(&variants, reference)
                    .and_then(|variant| variant.amount_for(key));

                if let Some(amount) = amount {
                    terms.push((reference, amount));
                    solver_terms.push((var, to_coefficient(amount)?));
                }
            }

            let limit = to_coefficient(instrument.limit())?;

            observer.on_capacity_constraint(key, &solver_terms, limit);
            solver.add_linear_constraint(0.0, limit, &solver_terms);

            capacity.push(CapacityConstraint {
                instrument: key,
                capacity: instrument.limit(),
                terms,
            });
        }

        solver.set_objective(&objective, ObjectiveSense::Maximise);

        debug!(
            orders = orders.len(),
            variables = variables.len(),
            capacity_constraints = capacity.len(),
            tie_break_weight,
            "declared assignment program"
        );

        Ok(Self {
            variants,
            variables,
            exact_cover,
            capacity,
            tie_break_weight,
        })
    }

    /// Declared decision variables, ordered by order index then variant index.
    pub fn variables(&self) -> &[(VariantRef, DecisionVar)] {
        &self.variables
    }

    /// The variant a reference points to.
    pub fn variant(&self, reference: VariantRef) -> Option<&Variant> {
        variant_at(&self.variants, reference)
    }

    /// Candidates of one order.
    pub fn variants_of(&self, order: usize) -> &[Variant] {
        self.variants.get(order).map_or(&[], Vec::as_slice)
    }

    /// Number of orders in the program.
    pub fn order_count(&self) -> usize {
        self.variants.len()
    }

    /// Exact-cover constraints, one per order.
    pub fn exact_cover_constraints(&self) -> &[ExactCoverConstraint] {
        &self.exact_cover
    }

    /// Capacity constraints, one per instrument in book order.
    pub fn capacity_constraints(&self) -> &[CapacityConstraint] {
        &self.capacity
    }

    /// Weight applied to the rate-weighted charge in each objective coefficient.
    pub fn tie_break_weight(&self) -> f64 {
        self.tie_break_weight
    }
}

fn variant_at(variants: &[Vec<Variant>], reference: VariantRef) -> Option<&Variant> {
    variants
        .get(reference.order)
        .and_then(|candidates| candidates.get(reference.variant))
}

fn to_coefficient(amount: Decimal) -> Result<f64, AllocationError> {
    decimal_to_f64(amount).map_err(AllocationError::NonRepresentable)
}

/// `sum(amount * discount rate)` over the instruments a variant charges.
fn rate_weighted_charge(
    variant: &Variant,
    instruments: &InstrumentBook,
) -> Result<f64, AllocationError> {
    let mut weighted = Decimal::ZERO;

    for &(key, amount) in variant.methods() {
        let instrument = instruments
            .get(key)
            .ok_or(AllocationError::UnknownInstrument(key))?;

        weighted += amount * instrument.discount_rate();
    }

    to_coefficient(weighted)
}

/// `1/2 * 10^-s / total order value`, where `s` is the largest decimal scale among the
/// candidate discounts.
///
/// Discount totals differ by multiples of `10^-s` and the rate-weighted charge of a full
/// assignment never exceeds the total order value.
fn tie_break_weight(orders: &[Order], variants: &[Vec<Variant>]) -> Result<f64, AllocationError> {
    let total = total_value(orders);

    if total <= Decimal::ZERO {
        return Ok(0.0);
    }

    let scale = variants
        .iter()
        .flatten()
        .map(|variant| variant.discount().normalize().scale())
        .max()
        .unwrap_or(0);

    let exponent = i32::try_from(scale).map_err(|_err| AllocationError::InvariantViolation {
        message: "discount scale out of range",
    })?;

    Ok(0.5 * 10_f64.powi(-exponent) / to_coefficient(total)?)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        solvers::ilp::{GoodLpSolver, NoopObserver},
        test_support::{sample_book, sample_orders},
        variants::{VariantKind, generate},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct CountingObserver {
        assignment_variables: usize,
        objective_terms: usize,
        exclusivity_constraints: usize,
        capacity_constraints: usize,
    }

    impl ILPObserver for CountingObserver {
        fn on_assignment_variable(&mut self, _: VariantRef, _: DecisionVar, _: f64) {
            self.assignment_variables += 1;
        }

        fn on_objective_term(&mut self, _: DecisionVar, _: f64) {
            self.objective_terms += 1;
        }

        fn on_exclusivity_constraint(&mut self, _: usize, _: &[(DecisionVar, f64)]) {
            self.exclusivity_constraints += 1;
        }

        fn on_capacity_constraint(&mut self, _: InstrumentKey, _: &[(DecisionVar, f64)], _: f64) {
            self.capacity_constraints += 1;
        }
    }

    fn sample_variants(orders: &[Order], book: &InstrumentBook) -> Vec<Vec<Variant>> {
        orders.iter().map(|order| generate(order, book)).collect()
    }

    #[test]
    fn declares_variables_and_constraints_for_every_candidate() -> TestResult {
        let book = sample_book()?;
        let orders = sample_orders();
        let variants = sample_variants(&orders, &book);

        let mut solver = GoodLpSolver::new();
        let mut observer = CountingObserver::default();

        let model = AssignmentModel::build(&orders, variants, &book, &mut solver, &mut observer)?;

        assert_eq!(model.variables().len(), 20);
        assert_eq!(model.exact_cover_constraints().len(), 4);
        assert_eq!(model.capacity_constraints().len(), 3);
        assert_eq!(model.order_count(), 4);

        assert_eq!(observer.assignment_variables, 20);
        assert_eq!(observer.objective_terms, 20);
        assert_eq!(observer.exclusivity_constraints, 4);
        assert_eq!(observer.capacity_constraints, 3);

        Ok(())
    }

    #[test]
    fn variables_follow_order_then_variant_index() -> TestResult {
        let book = sample_book()?;
        let orders = sample_orders();
        let variants = sample_variants(&orders, &book);

        let model = AssignmentModel::build(
            &orders,
            variants,
            &book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        )?;

        let refs: Vec<VariantRef> = model.variables().iter().map(|(r, _)| *r).collect();
        let mut sorted = refs.clone();
        sorted.sort();

        assert_eq!(refs, sorted);
        assert_eq!(refs.first(), Some(&VariantRef::new(0, 0)));
        assert_eq!(model.variants_of(3).len(), 5);
        assert_eq!(
            model.variant(VariantRef::new(1, 0)).map(Variant::order_id),
            Some("ORDER2")
        );
        assert!(model.variant(VariantRef::new(4, 0)).is_none());

        Ok(())
    }

    #[test]
    fn capacity_terms_carry_charged_amounts() -> TestResult {
        let book = sample_book()?;
        let points = book.points_key().ok_or("missing points")?;
        let orders = vec![Order::new("ORDER4", dec!(50))];
        let variants = sample_variants(&orders, &book);

        let model = AssignmentModel::build(
            &orders,
            variants,
            &book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        )?;

        let constraint = model
            .capacity_constraints()
            .iter()
            .find(|c| c.instrument == points)
            .ok_or("missing points constraint")?;

        let amounts: Vec<Decimal> = constraint.terms.iter().map(|(_, a)| *a).collect();

        assert_eq!(constraint.capacity, dec!(50));
        assert_eq!(amounts, [dec!(45), dec!(5), dec!(5)]);

        Ok(())
    }

    #[test]
    fn tie_break_weight_stays_below_half_a_discount_step() -> TestResult {
        let book = sample_book()?;
        let orders = sample_orders();
        let variants = sample_variants(&orders, &book);

        let model = AssignmentModel::build(
            &orders,
            variants,
            &book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        )?;

        // Largest discount scale in the sample is one decimal place, total value is 130.
        let expected = 0.05 / 130.0;

        assert!((model.tie_break_weight() - expected).abs() < 1e-12);
        assert!(model.tie_break_weight() * 130.0 < 0.05 + 1e-12);

        Ok(())
    }

    #[test]
    fn mismatched_variant_lists_are_rejected() -> TestResult {
        let book = sample_book()?;
        let orders = sample_orders();

        let result = AssignmentModel::build(
            &orders,
            Vec::new(),
            &book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        );

        assert!(matches!(
            result,
            Err(AllocationError::InvariantViolation { .. })
        ));

        Ok(())
    }

    #[test]
    fn variant_with_foreign_instrument_is_rejected() -> TestResult {
        let book = sample_book()?;
        let mut other = sample_book()?;
        let foreign = other.insert(crate::instruments::Instrument::new(
            "OTHER",
            dec!(1),
            dec!(100),
        )?)?;

        let orders = vec![Order::new("O", dec!(10))];
        let variants = vec![vec![Variant::new(
            "O",
            VariantKind::FullPrice,
            smallvec![(foreign, dec!(10))],
            Decimal::ZERO,
        )]];

        let result = AssignmentModel::build(
            &orders,
            variants,
            &book,
            &mut GoodLpSolver::new(),
            &mut NoopObserver,
        );

        assert!(matches!(result, Err(AllocationError::UnknownInstrument(key)) if key == foreign));

        Ok(())
    }
}
