//! Paysplit
//!
//! Paysplit chooses how to pay for a batch of orders with a set of payment instruments so that
//! the total promotional discount is maximised without exceeding any instrument's limit.

pub mod allocation;
pub mod allocator;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod instruments;
pub mod logging;
pub mod orders;
pub mod prelude;
pub mod rebalance;
pub mod report;
pub mod solvers;
pub mod variants;

#[cfg(test)]
mod test_support;
