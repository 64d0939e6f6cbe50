//! Allocator
//!
//! Runs the whole allocation pipeline: feasibility check, variant generation, program
//! declaration, solving, charging and points rebalancing.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    allocation::{SelectedVariant, extract},
    error::AllocationError,
    instruments::InstrumentBook,
    orders::{Order, total_value},
    rebalance::{RebalanceOutcome, rebalance},
    solvers::{
        MilpSolver,
        ilp::{AssignmentModel, GoodLpSolver, ILPObserver, NoopObserver},
    },
    variants::{Variant, generate},
};

/// Result of a successful allocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Selected variant per order, in order input order
    pub selections: Vec<SelectedVariant>,

    /// Sum of the discounts earned by the selected variants
    pub total_discount: Decimal,

    /// What the points rebalancing pass changed
    pub rebalance: RebalanceOutcome,
}

impl Settlement {
    /// Settlement for a run without orders.
    pub fn empty() -> Self {
        Self {
            selections: Vec::new(),
            total_discount: Decimal::ZERO,
            rebalance: RebalanceOutcome::Untouched,
        }
    }
}

/// Allocates orders to payment instruments, generic over the solver backend.
#[derive(Debug, Default)]
pub struct Allocator<S = GoodLpSolver> {
    solver: S,
}

impl Allocator<GoodLpSolver> {
    /// Allocator using the `good_lp` backend.
    pub fn new() -> Self {
        Self {
            solver: GoodLpSolver::new(),
        }
    }
}

impl<S: MilpSolver> Allocator<S> {
    /// Allocator using a custom solver.
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Choose one payment variant per order, maximising the total discount, and charge the
    /// instruments accordingly.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::CapacityExceeded`] before any other work if the orders are worth
    /// more than all instrument limits together, [`AllocationError::SolverFailure`] if no optimal
    /// assignment exists, and other [`AllocationError`]s on internal inconsistencies. Instruments
    /// are only charged once an optimal assignment has been validated.
    pub fn solve(
        &mut self,
        orders: &[Order],
        instruments: &mut InstrumentBook,
    ) -> Result<Settlement, AllocationError> {
        self.solve_with_observer(orders, instruments, &mut NoopObserver)
    }

    /// [`Allocator::solve`] with an observer notified while the program is declared.
    ///
    /// # Errors
    ///
    /// See [`Allocator::solve`].
    pub fn solve_with_observer<O: ILPObserver + ?Sized>(
        &mut self,
        orders: &[Order],
        instruments: &mut InstrumentBook,
        observer: &mut O,
    ) -> Result<Settlement, AllocationError> {
        info!(
            orders = orders.len(),
            instruments = instruments.len(),
            "allocating payments"
        );

        if orders.is_empty() {
            return Ok(Settlement::empty());
        }

        let demand = total_value(orders);
        let capacity = instruments.total_limit();

        if demand > capacity {
            return Err(AllocationError::CapacityExceeded { demand, capacity });
        }

        let variants: Vec<Vec<Variant>> = orders
            .iter()
            .map(|order| generate(order, instruments))
            .collect();

        debug!(
            candidates = variants.iter().map(Vec::len).sum::<usize>(),
            "generated payment variants"
        );

        let model =
            AssignmentModel::build(orders, variants, instruments, &mut self.solver, observer)?;

        let outcome = self.solver.solve();

        debug!(status = %outcome.status(), "solver finished");

        let mut selections = extract(&outcome, &model, instruments)?;
        let rebalanced = rebalance(&mut selections, instruments)?;

        let total_discount: Decimal = selections
            .iter()
            .map(|selection| selection.variant().discount())
            .sum();

        info!(
            selected = selections.len(),
            %total_discount,
            "allocation finished"
        );

        Ok(Settlement {
            selections,
            total_discount,
            rebalance: rebalanced,
        })
    }
}
