//! Command-line configuration

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use crate::instruments::DEFAULT_POINTS_ID;

/// Usage line printed when the input files are not given.
pub const USAGE: &str = "Usage: paysplit <orders> <instruments>";

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `<id> <consumed>` line per instrument.
    Plain,

    /// Table with limit and remaining columns.
    Table,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Paysplit configuration
#[derive(Debug, Parser)]
#[command(
    name = "paysplit",
    about = "Split order payments across instruments for the largest discount",
    long_about = None
)]
pub struct Config {
    /// Orders file (JSON, or YAML with a .yml/.yaml extension)
    pub orders: PathBuf,

    /// Payment instruments file (JSON, or YAML with a .yml/.yaml extension)
    pub instruments: PathBuf,

    /// Identifier of the loyalty points instrument
    #[arg(long, env = "PAYSPLIT_POINTS_ID", default_value = DEFAULT_POINTS_ID)]
    pub points_id: String,

    /// Report format (plain, table)
    #[arg(short, long, env = "PAYSPLIT_FORMAT", value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Whether a parse error means the input files were missing or too many were given.
    pub fn is_usage_error(error: &clap::Error) -> bool {
        matches!(
            error.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
                | clap::error::ErrorKind::UnknownArgument
                | clap::error::ErrorKind::TooManyValues
                | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        )
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn parses_positional_inputs_and_flags() -> TestResult {
        let config = Config::try_parse_from([
            "paysplit",
            "orders.json",
            "paymentmethods.json",
            "--points-id",
            "POINTS",
            "--format",
            "table",
            "--log-format",
            "json",
        ])?;

        assert_eq!(config.orders, PathBuf::from("orders.json"));
        assert_eq!(config.instruments, PathBuf::from("paymentmethods.json"));
        assert_eq!(config.points_id, "POINTS");
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(config.logging.log_format, LogFormat::Json);

        Ok(())
    }

    #[test]
    fn wrong_argument_count_is_a_usage_error() {
        let missing = Config::try_parse_from(["paysplit", "orders.json"]);
        let extra = Config::try_parse_from(["paysplit", "a.json", "b.json", "c.json"]);

        assert!(missing.is_err_and(|e| Config::is_usage_error(&e)));
        assert!(extra.is_err_and(|e| Config::is_usage_error(&e)));
    }
}
