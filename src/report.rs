//! Report
//!
//! Per-instrument consumption after an allocation run.

use std::io;

use rust_decimal::{Decimal, RoundingStrategy};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::instruments::InstrumentBook;

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output could not be written.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// One instrument's consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Instrument identifier
    pub id: String,

    /// Amount charged
    pub consumed: Decimal,

    /// Nominal limit
    pub limit: Decimal,

    /// Capacity left
    pub remaining: Decimal,
}

/// Consumption of every instrument, in book order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    /// Snapshot the book's current consumption.
    pub fn from_book(book: &InstrumentBook) -> Self {
        let rows = book
            .iter()
            .map(|(_, instrument)| ReportRow {
                id: instrument.id().to_string(),
                consumed: instrument.consumed(),
                limit: instrument.limit(),
                remaining: instrument.remaining_limit(),
            })
            .collect();

        Self { rows }
    }

    /// Rows in book order.
    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Write one `<id> <consumed>` line per instrument.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_plain(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        for row in &self.rows {
            writeln!(out, "{} {}", row.id, format_amount(row.consumed))?;
        }

        Ok(())
    }

    /// Write the report as a table with limit and remaining columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_table(&self, mut out: impl io::Write) -> Result<(), ReportError> {
        let mut builder = Builder::default();

        builder.push_record(["Instrument", "Consumed", "Limit", "Remaining"]);

        for row in &self.rows {
            builder.push_record([
                row.id.clone(),
                format_amount(row.consumed),
                format_amount(row.limit),
                format_amount(row.remaining),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..4), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "{table}")?;

        Ok(())
    }
}

/// Two decimal places, midpoints rounded away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    format!("{rounded:.2}")
}
