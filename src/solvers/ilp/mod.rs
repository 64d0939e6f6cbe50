//! ILP Solver

use good_lp::{ResolutionError, Solution, SolverModel};
use tracing::{debug, warn};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::solvers::{
    DecisionVar, MilpSolver, ObjectiveSense, SolverOutcome, SolverStatus,
    ilp::state::{ConstraintRelation, ILPConstraint, ILPState},
};

pub mod model;
pub mod observer;
pub(crate) mod state;

pub use model::{AssignmentModel, CapacityConstraint, ExactCoverConstraint, VariantRef};
pub use observer::{ILPObserver, NoopObserver, TracingObserver};

/// [`MilpSolver`] backed by `good_lp`.
///
/// The backend is chosen at compile time: `HiGHS` with the `solver-highs` feature, otherwise the
/// pure-Rust microlp solver. Each call to [`MilpSolver::solve`] consumes the program declared so
/// far, leaving the solver empty for the next one.
#[derive(Debug)]
pub struct GoodLpSolver {
    state: ILPState,
}

impl GoodLpSolver {
    /// Create a solver with an empty program.
    pub fn new() -> Self {
        Self {
            state: ILPState::new(),
        }
    }
}

impl Default for GoodLpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MilpSolver for GoodLpSolver {
    fn add_binary_variable(&mut self, label: &str) -> DecisionVar {
        self.state.add_binary(label)
    }

    fn add_linear_constraint(&mut self, lower: f64, upper: f64, terms: &[(DecisionVar, f64)]) {
        self.state.add_range_constraint(terms, lower, upper);
    }

    fn set_objective(&mut self, terms: &[(DecisionVar, f64)], sense: ObjectiveSense) {
        self.state.set_objective(terms, sense);
    }

    fn solve(&mut self) -> SolverOutcome {
        let state = std::mem::replace(&mut self.state, ILPState::new());

        if state.unknown_variables() > 0 {
            warn!(
                unknown = state.unknown_variables(),
                "program references undeclared variables"
            );

            return SolverOutcome::without_solution(SolverStatus::Abnormal);
        }

        if state.is_trivially_infeasible() {
            return SolverOutcome::without_solution(SolverStatus::Infeasible);
        }

        debug!(constraints = state.constraint_count(), "solving program");

        let (pb, vars, objective, sense, constraints) = state.into_parts();

        let result = match sense {
            ObjectiveSense::Maximise => {
                let model = pb.maximise(objective).using(default_solver);

                apply_recorded_constraints(model, constraints).solve()
            }
            ObjectiveSense::Minimise => {
                let model = pb.minimise(objective).using(default_solver);

                apply_recorded_constraints(model, constraints).solve()
            }
        };

        match result {
            Ok(solution) => {
                let values = vars.iter().map(|&var| solution.value(var)).collect();

                SolverOutcome::new(SolverStatus::Optimal, values)
            }
            Err(ResolutionError::Infeasible) => {
                SolverOutcome::without_solution(SolverStatus::Infeasible)
            }
            Err(ResolutionError::Unbounded) => {
                SolverOutcome::without_solution(SolverStatus::Unbounded)
            }
            Err(error) => {
                warn!(%error, "solver stopped abnormally");

                SolverOutcome::without_solution(SolverStatus::Abnormal)
            }
        }
    }
}

fn apply_recorded_constraints<S: SolverModel>(mut model: S, constraints: Vec<ILPConstraint>) -> S {
    for constraint in constraints {
        model = match constraint.relation {
            ConstraintRelation::Eq => model.with(constraint.lhs.eq(constraint.rhs)),
            ConstraintRelation::Leq => model.with(constraint.lhs.leq(constraint.rhs)),
            ConstraintRelation::Geq => model.with(constraint.lhs.geq(constraint.rhs)),
        };
    }

    model
}
