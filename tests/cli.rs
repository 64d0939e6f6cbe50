//! Integration tests for the command-line binary

use std::process::{Command, Output};

use testresult::TestResult;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

fn paysplit(args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_paysplit"))
        .args(args)
        .env_remove("PAYSPLIT_POINTS_ID")
        .env_remove("PAYSPLIT_FORMAT")
        .env("RUST_LOG", "error")
        .output()
}

#[test]
fn prints_consumption_per_instrument() -> TestResult {
    let output = paysplit(&[
        &format!("{FIXTURES}/orders/sample.json"),
        &format!("{FIXTURES}/instruments/sample.json"),
    ])?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        "PUNKTY 50.00\nKARTA1 0.00\nKARTA2 64.50\n"
    );

    Ok(())
}

#[test]
fn wrong_argument_count_prints_usage_and_succeeds() -> TestResult {
    let output = paysplit(&["only-one.json"])?;

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.starts_with("Usage: paysplit"));

    Ok(())
}

#[test]
fn missing_input_file_fails() -> TestResult {
    let output = paysplit(&[
        &format!("{FIXTURES}/orders/absent.json"),
        &format!("{FIXTURES}/instruments/sample.json"),
    ])?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn table_format_renders_limits() -> TestResult {
    let output = paysplit(&[
        &format!("{FIXTURES}/orders/sample.yml"),
        &format!("{FIXTURES}/instruments/sample.yml"),
        "--format",
        "table",
    ])?;

    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert!(stdout.contains("Remaining"));
    assert!(stdout.contains("64.50"));

    Ok(())
}
