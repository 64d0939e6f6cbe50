//! Solvers
//!
//! The allocation model is expressed against the [`MilpSolver`] capability: declare binary
//! variables, declare bounded linear constraints, declare the objective, solve. The
//! [`ilp::GoodLpSolver`] implementation hands the program to `good_lp`.

use std::fmt;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

pub mod ilp;

/// Binary threshold for determining truthiness
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Handle to a decision variable declared on a [`MilpSolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionVar(usize);

impl DecisionVar {
    /// Create a handle from its declaration index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Declaration index of this variable.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Direction of the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// Maximise the objective.
    Maximise,

    /// Minimise the objective.
    Minimise,
}

/// Termination status reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// Proven optimal solution.
    Optimal,

    /// Feasible solution without an optimality proof.
    Feasible,

    /// No assignment satisfies the constraints.
    Infeasible,

    /// The objective can grow without bound.
    Unbounded,

    /// The solver stopped on an internal error.
    Abnormal,

    /// The solver was never run.
    NotSolved,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Feasible => "feasible",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::Abnormal => "abnormal",
            SolverStatus::NotSolved => "not solved",
        };

        f.write_str(label)
    }
}

/// Status plus per-variable values returned by [`MilpSolver::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    status: SolverStatus,
    values: Vec<f64>,
}

impl SolverOutcome {
    /// Create an outcome; `values` is indexed by [`DecisionVar::index`].
    pub fn new(status: SolverStatus, values: Vec<f64>) -> Self {
        Self { status, values }
    }

    /// Outcome for a run that produced no solution.
    pub fn without_solution(status: SolverStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
        }
    }

    /// Termination status.
    pub fn status(&self) -> SolverStatus {
        self.status
    }

    /// Whether the solver proved optimality.
    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }

    /// Solution value of a variable, if the solver reported one.
    pub fn value(&self, var: DecisionVar) -> Option<f64> {
        self.values.get(var.index()).copied()
    }

    /// Whether a binary variable was set to one.
    ///
    /// Solvers return floats, so values greater than [`BINARY_THRESHOLD`] count as selected to
    /// tolerate numerical noise.
    pub fn is_selected(&self, var: DecisionVar) -> bool {
        self.value(var).is_some_and(|value| value > BINARY_THRESHOLD)
    }
}

/// Generic integer/linear program solver capability.
pub trait MilpSolver {
    /// Declare a binary (0/1) decision variable. The label is informational only.
    fn add_binary_variable(&mut self, label: &str) -> DecisionVar;

    /// Declare `lower <= sum(coefficient * variable) <= upper`.
    fn add_linear_constraint(&mut self, lower: f64, upper: f64, terms: &[(DecisionVar, f64)]);

    /// Declare the objective, replacing any earlier one.
    fn set_objective(&mut self, terms: &[(DecisionVar, f64)], sense: ObjectiveSense);

    /// Solve the program declared so far.
    fn solve(&mut self) -> SolverOutcome;
}

/// Convert a decimal amount to a solver coefficient.
///
/// `good_lp` stores coefficients as `f64`; the conversion fails only for values outside the `f64`
/// range, so the returned error carries the original amount.
///
/// # Errors
///
/// Returns the original amount if it has no finite `f64` representation.
pub fn decimal_to_f64(amount: Decimal) -> Result<f64, Decimal> {
    amount
        .to_f64()
        .filter(|value| value.is_finite())
        .ok_or(amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn outcome_treats_values_above_threshold_as_selected() {
        let outcome = SolverOutcome::new(SolverStatus::Optimal, vec![0.0, 0.999_999, 0.4]);

        assert!(!outcome.is_selected(DecisionVar::new(0)));
        assert!(outcome.is_selected(DecisionVar::new(1)));
        assert!(!outcome.is_selected(DecisionVar::new(2)));
        assert!(!outcome.is_selected(DecisionVar::new(3)));
        assert!(outcome.is_optimal());
    }

    #[test]
    fn outcome_without_solution_has_no_values() {
        let outcome = SolverOutcome::without_solution(SolverStatus::Infeasible);

        assert!(!outcome.is_optimal());
        assert_eq!(outcome.value(DecisionVar::new(0)), None);
        assert_eq!(outcome.status().to_string(), "infeasible");
    }

    #[test]
    fn decimal_to_f64_converts_amounts() {
        assert!(decimal_to_f64(dec!(28.5)).is_ok_and(|v| (v - 28.5).abs() < f64::EPSILON));
        assert!(decimal_to_f64(Decimal::ZERO).is_ok_and(|v| v.abs() < f64::EPSILON));
    }
}
