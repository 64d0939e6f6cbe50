//! ILP State

use std::fmt;

use good_lp::{Expression, ProblemVariables, Variable, variable};

use crate::solvers::{DecisionVar, ObjectiveSense};

/// Relation operator for a linear ILP constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintRelation {
    /// Equality (`lhs == rhs`)
    Eq,

    /// Less than or equal (`lhs <= rhs`)
    Leq,

    /// Greater than or equal (`lhs >= rhs`)
    Geq,
}

/// Recorded linear ILP constraint emitted during model construction.
#[derive(Debug, Clone)]
pub(crate) struct ILPConstraint {
    /// Left-hand side expression
    pub(crate) lhs: Expression,

    /// Relation operator
    pub(crate) relation: ConstraintRelation,

    /// Right-hand side scalar
    pub(crate) rhs: f64,
}

/// Builder state for ILP problem variables, constraints and objective
pub(crate) struct ILPState {
    pb: ProblemVariables,
    vars: Vec<Variable>,
    objective: Expression,
    sense: ObjectiveSense,
    constraints: Vec<ILPConstraint>,
    infeasible: bool,
    unknown_variables: usize,
}

impl fmt::Debug for ILPState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ILPState")
            .field("pb", &"<ProblemVariables>")
            .field("objective", &"<Expression>")
            .field("sense", &self.sense)
            .field("vars", &format!("[{} variables]", self.vars.len()))
            .field(
                "constraints",
                &format!("[{} constraints]", self.constraints.len()),
            )
            .field("infeasible", &self.infeasible)
            .field("unknown_variables", &self.unknown_variables)
            .finish()
    }
}

impl ILPState {
    /// Create an empty state that maximises a zero objective.
    pub(crate) fn new() -> Self {
        Self {
            pb: ProblemVariables::new(),
            vars: Vec::new(),
            objective: Expression::default(),
            sense: ObjectiveSense::Maximise,
            constraints: Vec::new(),
            infeasible: false,
            unknown_variables: 0,
        }
    }

    /// Add a binary decision variable.
    pub(crate) fn add_binary(&mut self, label: &str) -> DecisionVar {
        let var = self.pb.add(variable().binary().name(label));
        let handle = DecisionVar::new(self.vars.len());

        self.vars.push(var);

        handle
    }

    /// Build `sum(coefficient * variable)`, counting references to undeclared variables.
    pub(crate) fn expression(&mut self, terms: &[(DecisionVar, f64)]) -> Expression {
        let mut expr = Expression::default();

        for &(handle, coefficient) in terms {
            match self.vars.get(handle.index()) {
                Some(var) => expr += *var * coefficient,
                None => self.unknown_variables += 1,
            }
        }

        expr
    }

    /// Record `lower <= lhs <= upper`.
    ///
    /// A constraint without terms is checked here instead: if zero lies outside the bounds the
    /// whole program is infeasible.
    pub(crate) fn add_range_constraint(
        &mut self,
        terms: &[(DecisionVar, f64)],
        lower: f64,
        upper: f64,
    ) {
        if terms.is_empty() {
            if lower > 0.0 || upper < 0.0 {
                self.infeasible = true;
            }

            return;
        }

        let lhs = self.expression(terms);

        if (upper - lower).abs() <= f64::EPSILON {
            self.push(lhs, ConstraintRelation::Eq, lower);

            return;
        }

        if lower.is_finite() {
            self.push(lhs.clone(), ConstraintRelation::Geq, lower);
        }

        if upper.is_finite() {
            self.push(lhs, ConstraintRelation::Leq, upper);
        }
    }

    /// Replace the objective.
    pub(crate) fn set_objective(&mut self, terms: &[(DecisionVar, f64)], sense: ObjectiveSense) {
        self.objective = self.expression(terms);
        self.sense = sense;
    }

    /// Whether a term-less constraint already rules out every assignment.
    pub(crate) fn is_trivially_infeasible(&self) -> bool {
        self.infeasible
    }

    /// Number of terms that referenced variables this state never declared.
    pub(crate) fn unknown_variables(&self) -> usize {
        self.unknown_variables
    }

    /// Number of recorded constraints.
    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Extract the problem variables, declared variables, objective, sense and constraints.
    pub(crate) fn into_parts(
        self,
    ) -> (
        ProblemVariables,
        Vec<Variable>,
        Expression,
        ObjectiveSense,
        Vec<ILPConstraint>,
    ) {
        (
            self.pb,
            self.vars,
            self.objective,
            self.sense,
            self.constraints,
        )
    }

    fn push(&mut self, lhs: Expression, relation: ConstraintRelation, rhs: f64) {
        self.constraints.push(ILPConstraint { lhs, relation, rhs });
    }
}
