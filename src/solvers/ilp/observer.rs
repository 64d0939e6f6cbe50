//! ILP Observer
//!
//! Callbacks fired while the assignment program is being declared. Used for tracing the
//! formulation and for asserting on it in tests.

use tracing::trace;

use crate::{
    instruments::InstrumentKey,
    solvers::{DecisionVar, ilp::model::VariantRef},
};

/// Observer for the assignment program formulation.
pub trait ILPObserver {
    /// Called after the decision variable for an (order, variant) pair is declared.
    fn on_assignment_variable(&mut self, variant: VariantRef, var: DecisionVar, discount: f64);

    /// Called for each term added to the objective.
    fn on_objective_term(&mut self, _var: DecisionVar, _coefficient: f64) {}

    /// Called when an order's exact-cover constraint is declared.
    fn on_exclusivity_constraint(&mut self, order_idx: usize, terms: &[(DecisionVar, f64)]);

    /// Called when an instrument's capacity constraint is declared.
    fn on_capacity_constraint(
        &mut self,
        instrument: InstrumentKey,
        terms: &[(DecisionVar, f64)],
        capacity: f64,
    );
}

/// Observer that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ILPObserver for NoopObserver {
    fn on_assignment_variable(&mut self, _variant: VariantRef, _var: DecisionVar, _discount: f64) {
    }

    fn on_exclusivity_constraint(&mut self, _order_idx: usize, _terms: &[(DecisionVar, f64)]) {}

    fn on_capacity_constraint(
        &mut self,
        _instrument: InstrumentKey,
        _terms: &[(DecisionVar, f64)],
        _capacity: f64,
    ) {
    }
}

/// Observer that emits every callback as a `trace` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ILPObserver for TracingObserver {
    fn on_assignment_variable(&mut self, variant: VariantRef, var: DecisionVar, discount: f64) {
        trace!(
            order = variant.order,
            variant = variant.variant,
            var = var.index(),
            discount,
            "assignment variable"
        );
    }

    fn on_objective_term(&mut self, var: DecisionVar, coefficient: f64) {
        trace!(var = var.index(), coefficient, "objective term");
    }

    fn on_exclusivity_constraint(&mut self, order_idx: usize, terms: &[(DecisionVar, f64)]) {
        trace!(order = order_idx, terms = terms.len(), "exact cover constraint");
    }

    fn on_capacity_constraint(
        &mut self,
        instrument: InstrumentKey,
        terms: &[(DecisionVar, f64)],
        capacity: f64,
    ) {
        trace!(
            ?instrument,
            terms = terms.len(),
            capacity,
            "capacity constraint"
        );
    }
}
