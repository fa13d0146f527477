#![forbid(unsafe_code)]

//! Fixture replay runner.
//!
//! # Running
//!
//! ```sh
//! cargo run -p qcaps-harness
//! cargo run -p qcaps-harness -- path/to/fixtures
//! QCAPS_TEST_DEBUG=1 cargo run -p qcaps-harness
//! ```
//!
//! Prints one JSON object per case on stdout and exits with status 1 when
//! any case fails or a fixture cannot be loaded.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use qcaps_harness::{default_fixture_dir, is_debug_mode, run_manifest};

fn main() -> ExitCode {
    init_logging();

    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_fixture_dir);

    let reports = match run_manifest(&dir) {
        Ok(reports) => reports,
        Err(err) => {
            eprintln!("qcaps-harness: {err}");
            return ExitCode::FAILURE;
        }
    };

    let debug = is_debug_mode();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;
    for report in &reports {
        if writeln!(out, "{}", report.to_json()).is_err() {
            return ExitCode::FAILURE;
        }
        if !report.is_pass() {
            failures += 1;
            if debug {
                for discrepancy in report.discrepancies() {
                    eprintln!("{}: {discrepancy}", report.name);
                }
            }
        }
    }

    if failures > 0 {
        eprintln!("qcaps-harness: {failures} of {} cases failed", reports.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(feature = "tracing")]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("QCAPS_LOG"))
        .with_writer(io::stderr)
        .try_init();
}

#[cfg(not(feature = "tracing"))]
fn init_logging() {}
