//! Allocation Errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    instruments::{InstrumentError, InstrumentKey},
    solvers::SolverStatus,
};

/// Errors that abort an allocation run.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// The orders are worth more than every instrument can cover together.
    #[error("orders total {demand} exceeds the combined instrument limit {capacity}")]
    CapacityExceeded {
        /// Sum of order values
        demand: Decimal,
        /// Sum of instrument limits
        capacity: Decimal,
    },

    /// The solver did not prove an optimal assignment.
    #[error("no optimal payment assignment found (solver status: {status})")]
    SolverFailure {
        /// Termination status reported by the solver
        status: SolverStatus,
    },

    /// Internal consistency check failed (this is a bug).
    #[error("allocation invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },

    /// A variant refers to an instrument that is not in the book.
    #[error("instrument key {0:?} is not part of the book")]
    UnknownInstrument(InstrumentKey),

    /// Amount cannot be represented as a solver coefficient.
    #[error("amount {0} cannot be represented as a solver coefficient")]
    NonRepresentable(Decimal),

    /// Wrapped instrument book error
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}
