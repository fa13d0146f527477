#![forbid(unsafe_code)]

//! Regression harness for `qcaps-core`.
//!
//! Replays help text captured from historical emulator releases through the
//! capability parser and compares each result with the fixture table in
//! `manifest.json`. Every release that was ever supported stays in the
//! table, so a rule change that alters any historical result shows up here.
//!
//! # Quick Start
//!
//! ```no_run
//! use qcaps_harness::{default_fixture_dir, run_manifest};
//!
//! let reports = run_manifest(&default_fixture_dir()).unwrap();
//! for report in reports.iter().filter(|r| !r.is_pass()) {
//!     for d in report.discrepancies() {
//!         eprintln!("{}: {d}", report.name);
//!     }
//! }
//! ```
//!
//! # Debug output
//!
//! With `QCAPS_TEST_DEBUG` set, the `qcaps-harness` binary also prints each
//! discrepancy to stderr.

pub mod error;
pub mod fixture;
pub mod manifest;
pub mod replay;

pub use error::HarnessError;
pub use fixture::{default_fixture_dir, device_fixture_path, load_fixture};
pub use manifest::{Expectation, Expected, FixtureCase, Manifest};
pub use replay::{CaseOutcome, CaseReport, Discrepancy, compare, run_case, run_manifest};

/// Environment variable enabling per-discrepancy stderr output.
pub const DEBUG_ENV: &str = "QCAPS_TEST_DEBUG";

/// Whether `QCAPS_TEST_DEBUG` is set to anything but `0` or empty.
#[must_use]
pub fn is_debug_mode() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|v| !v.is_empty() && v != "0")
}
