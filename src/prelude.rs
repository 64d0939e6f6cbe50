//! Paysplit prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    allocation::SelectedVariant,
    allocator::{Allocator, Settlement},
    error::AllocationError,
    fixtures::{LoadError, load_instruments, load_orders},
    instruments::{DEFAULT_POINTS_ID, Instrument, InstrumentBook, InstrumentError, InstrumentKey},
    orders::Order,
    rebalance::RebalanceOutcome,
    report::{Report, ReportError},
    solvers::{
        DecisionVar, MilpSolver, ObjectiveSense, SolverOutcome, SolverStatus,
        ilp::{GoodLpSolver, ILPObserver, NoopObserver, TracingObserver},
    },
    variants::{Variant, VariantKind},
};
