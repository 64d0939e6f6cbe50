//! Fixtures
//!
//! Loads orders and instruments from JSON or YAML files. Files ending in `.yml` or `.yaml` are
//! read as YAML, anything else as JSON. Both formats hold a top-level list of records.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    fixtures::{instruments::InstrumentRecord, orders::OrderRecord},
    instruments::{Instrument, InstrumentBook, InstrumentError},
    orders::Order,
};

pub mod instruments;
pub mod orders;

/// Fixture Loading Errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// Input file does not exist
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// IO error reading an input file
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Instrument record with an invalid discount or limit
    #[error("invalid instrument: {0}")]
    InvalidInstrument(InstrumentError),

    /// Two instrument records share an identifier
    #[error("instrument {0} is defined more than once")]
    DuplicateInstrument(String),
}

impl From<InstrumentError> for LoadError {
    fn from(error: InstrumentError) -> Self {
        match error {
            InstrumentError::Duplicate(id) => LoadError::DuplicateInstrument(id),
            other => LoadError::InvalidInstrument(other),
        }
    }
}

/// Load orders from `path`.
///
/// # Errors
///
/// Returns [`LoadError::MissingInput`] if the file does not exist, or an IO or parse error.
pub fn load_orders(path: impl AsRef<Path>) -> Result<Vec<Order>, LoadError> {
    let records: Vec<OrderRecord> = read_records(path.as_ref())?;

    debug!(path = %path.as_ref().display(), orders = records.len(), "loaded orders");

    Ok(records.into_iter().map(Order::from).collect())
}

/// Load instruments from `path` into a book whose points pool is `points_id`.
///
/// Every loaded instrument starts with its full limit available.
///
/// # Errors
///
/// Returns [`LoadError::MissingInput`] if the file does not exist, an IO or parse error,
/// [`LoadError::InvalidInstrument`] for an out-of-range discount or negative limit, and
/// [`LoadError::DuplicateInstrument`] if an identifier repeats.
pub fn load_instruments(
    path: impl AsRef<Path>,
    points_id: &str,
) -> Result<InstrumentBook, LoadError> {
    let records: Vec<InstrumentRecord> = read_records(path.as_ref())?;

    let instruments = records
        .into_iter()
        .map(Instrument::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let book = InstrumentBook::from_instruments(instruments, points_id)?;

    debug!(
        path = %path.as_ref().display(),
        instruments = book.len(),
        points = book.points_key().is_some(),
        "loaded instruments"
    );

    Ok(book)
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingInput(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;

    if is_yaml(path) {
        Ok(serde_norway::from_str(&contents)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}
