//! Paysplit command-line entry point

use std::{io, process::ExitCode};

use thiserror::Error;
use tracing::{error, info};

use paysplit::{
    allocator::Allocator,
    config::{Config, OutputFormat, USAGE},
    error::AllocationError,
    fixtures::{self, LoadError},
    logging,
    report::{Report, ReportError},
    solvers::ilp::TracingObserver,
};

/// Errors that end a run.
#[derive(Debug, Error)]
enum RunError {
    /// Input could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Allocation failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Report could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(parse_error) if Config::is_usage_error(&parse_error) => {
            #[expect(
                clippy::print_stdout,
                reason = "usage goes to stdout before logging is initialised"
            )]
            {
                println!("{USAGE}");
            }

            return ExitCode::SUCCESS;
        }
        Err(parse_error) => {
            _ = parse_error.print();

            return if parse_error.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(init_error) = logging::init(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("{init_error}");
        }

        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!("{run_error}");

            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), RunError> {
    let orders = fixtures::load_orders(&config.orders)?;
    let mut instruments = fixtures::load_instruments(&config.instruments, &config.points_id)?;

    info!(
        orders = %config.orders.display(),
        instruments = %config.instruments.display(),
        "loaded inputs"
    );

    Allocator::new().solve_with_observer(&orders, &mut instruments, &mut TracingObserver)?;

    let report = Report::from_book(&instruments);
    let out = io::stdout().lock();

    match config.format {
        OutputFormat::Plain => report.write_plain(out)?,
        OutputFormat::Table => report.write_table(out)?,
    }

    Ok(())
}
