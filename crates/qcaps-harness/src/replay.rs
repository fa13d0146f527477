#![forbid(unsafe_code)]

//! Replaying fixtures through the parser and comparing the outcome.

use std::fmt;
use std::path::Path;

use qcaps_core::{Capability, CapabilityParser, ParseError, ParseResult, ParserConfig};
use serde_json::{Value, json};

use crate::error::HarnessError;
use crate::fixture::{device_fixture_path, load_fixture};
use crate::manifest::{Expected, FixtureCase, Manifest};

/// One way in which a parse disagreed with the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    Version { expected: u32, actual: u32 },
    IsKvm { expected: bool, actual: bool },
    KvmVersion { expected: u32, actual: u32 },
    ExtraFlag(Capability),
    MissingFlag(Capability),
    /// Parsing failed where a result was expected.
    UnexpectedError { actual: String },
    /// Parsing failed, but not in the expected way.
    WrongError { expected: String, actual: String },
    /// Parsing succeeded where a failure was expected.
    UnexpectedSuccess { expected: String },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version { expected, actual } => {
                write!(f, "version {actual}, expected {expected}")
            }
            Self::IsKvm { expected, actual } => write!(f, "is_kvm {actual}, expected {expected}"),
            Self::KvmVersion { expected, actual } => {
                write!(f, "kvm_version {actual}, expected {expected}")
            }
            Self::ExtraFlag(cap) => write!(f, "extra flag {} ({cap})", cap.bit()),
            Self::MissingFlag(cap) => write!(f, "missing flag {} ({cap})", cap.bit()),
            Self::UnexpectedError { actual } => write!(f, "unexpected error: {actual}"),
            Self::WrongError { expected, actual } => {
                write!(f, "error {actual}, expected {expected}")
            }
            Self::UnexpectedSuccess { expected } => {
                write!(f, "parse succeeded, expected {expected}")
            }
        }
    }
}

/// Result of replaying one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Pass,
    Mismatch(Vec<Discrepancy>),
}

impl CaseOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Mismatch(_) => "fail",
        }
    }
}

/// A replayed case with the parser's actual answer.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub name: String,
    pub outcome: CaseOutcome,
    pub actual: Result<ParseResult, ParseError>,
}

impl CaseReport {
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.outcome == CaseOutcome::Pass
    }

    /// Discrepancies, empty on pass.
    #[must_use]
    pub fn discrepancies(&self) -> &[Discrepancy] {
        match &self.outcome {
            CaseOutcome::Pass => &[],
            CaseOutcome::Mismatch(found) => found,
        }
    }

    /// One JSON object describing the case, for line-oriented logs.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut line = json!({
            "case": self.name,
            "outcome": self.outcome.as_str(),
        });
        match &self.actual {
            Ok(result) => {
                line["version"] = json!(result.version.encoded());
                line["is_kvm"] = json!(result.is_kvm());
                line["kvm_version"] = json!(result.kvm_version());
                line["flags"] = json!(result.flags.iter().map(Capability::name).collect::<Vec<_>>());
            }
            Err(err) => {
                line["error"] = json!(err.kind());
                line["message"] = json!(err.to_string());
            }
        }
        if !self.is_pass() {
            line["discrepancies"] = json!(
                self.discrepancies()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            );
        }
        line
    }
}

/// Compare a parse outcome against the manifest expectation.
#[must_use]
pub fn compare(expected: &Expected, actual: &Result<ParseResult, ParseError>) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    match (expected, actual) {
        (
            Expected::Success {
                version,
                is_kvm,
                kvm_version,
                flags,
            },
            Ok(result),
        ) => {
            if *version != result.version.encoded() {
                found.push(Discrepancy::Version {
                    expected: *version,
                    actual: result.version.encoded(),
                });
            }
            if *is_kvm != result.is_kvm() {
                found.push(Discrepancy::IsKvm {
                    expected: *is_kvm,
                    actual: result.is_kvm(),
                });
            }
            if *kvm_version != result.kvm_version() {
                found.push(Discrepancy::KvmVersion {
                    expected: *kvm_version,
                    actual: result.kvm_version(),
                });
            }
            found.extend(result.flags.difference(*flags).iter().map(Discrepancy::ExtraFlag));
            found.extend(flags.difference(result.flags).iter().map(Discrepancy::MissingFlag));
        }
        (Expected::Success { .. }, Err(err)) => found.push(Discrepancy::UnexpectedError {
            actual: err.to_string(),
        }),
        (Expected::Failure(kind), Err(err)) => {
            if kind != err.kind() {
                found.push(Discrepancy::WrongError {
                    expected: kind.clone(),
                    actual: err.kind().to_owned(),
                });
            }
        }
        (Expected::Failure(kind), Ok(_)) => found.push(Discrepancy::UnexpectedSuccess {
            expected: kind.clone(),
        }),
    }
    found
}

/// Replay one case from `dir`.
///
/// The `<name>-device` companion is loaded only when the case expects the
/// `device` capability.
///
/// # Errors
///
/// A [`HarnessError`] when a fixture cannot be loaded or the case names an
/// unknown capability. Parser disagreements are reported in the outcome.
pub fn run_case(dir: &Path, case: &FixtureCase, max_len: usize) -> Result<CaseReport, HarnessError> {
    let expected = case.expected()?;
    let help = load_fixture(&dir.join(&case.name), max_len)?;
    let devices = if case.wants_device_list() {
        Some(load_fixture(&device_fixture_path(dir, &case.name), max_len)?)
    } else {
        None
    };

    let parser = CapabilityParser::with_config(ParserConfig::default().max_input_len(max_len));
    let actual = parser.parse(&help, devices.as_deref());
    let found = compare(&expected, &actual);
    let outcome = if found.is_empty() {
        CaseOutcome::Pass
    } else {
        CaseOutcome::Mismatch(found)
    };

    Ok(CaseReport {
        name: case.name.clone(),
        outcome,
        actual,
    })
}

/// Replay every case of the manifest in `dir`.
///
/// # Errors
///
/// The first [`HarnessError`] encountered.
pub fn run_manifest(dir: &Path) -> Result<Vec<CaseReport>, HarnessError> {
    let manifest = Manifest::load(dir)?;
    manifest
        .cases
        .iter()
        .map(|case| run_case(dir, case, manifest.max_input_bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcaps_core::{FlagSet, parse};

    fn expected(flags: &[Capability]) -> Expected {
        Expected::Success {
            version: 12_001,
            is_kvm: false,
            kvm_version: 0,
            flags: flags.iter().copied().collect(),
        }
    }

    const HELP: &[u8] = b"QEMU emulator version 0.12.1\n-drive file=f\n";

    fn baseline() -> Vec<Capability> {
        parse(HELP, None).unwrap().flags.iter().collect()
    }

    #[test]
    fn identical_result_has_no_discrepancies() {
        assert!(compare(&expected(&baseline()), &parse(HELP, None)).is_empty());
    }

    #[test]
    fn flag_differences_are_reported_by_bit() {
        let mut want = baseline();
        want.retain(|&cap| cap != Capability::Drive);
        want.push(Capability::Spice);
        let found = compare(&expected(&want), &parse(HELP, None));
        assert_eq!(
            found,
            vec![
                Discrepancy::ExtraFlag(Capability::Drive),
                Discrepancy::MissingFlag(Capability::Spice),
            ]
        );
        assert_eq!(found[0].to_string(), "extra flag 3 (drive)");
        assert_eq!(found[1].to_string(), "missing flag 46 (spice)");
    }

    #[test]
    fn scalar_differences() {
        let want = Expected::Success {
            version: 12_002,
            is_kvm: true,
            kvm_version: 5,
            flags: parse(HELP, None).unwrap().flags,
        };
        let found = compare(&want, &parse(HELP, None));
        assert_eq!(
            found,
            vec![
                Discrepancy::Version {
                    expected: 12_002,
                    actual: 12_001
                },
                Discrepancy::IsKvm {
                    expected: true,
                    actual: false
                },
                Discrepancy::KvmVersion {
                    expected: 5,
                    actual: 0
                },
            ]
        );
    }

    #[test]
    fn error_expectations() {
        let missing = parse(b"", None);
        let want = Expected::Failure("missing-version-banner".into());
        assert!(compare(&want, &missing).is_empty());

        let other = Expected::Failure("malformed-version-banner".into());
        assert!(matches!(
            compare(&other, &missing).as_slice(),
            [Discrepancy::WrongError { .. }]
        ));

        assert!(matches!(
            compare(&want, &parse(HELP, None)).as_slice(),
            [Discrepancy::UnexpectedSuccess { .. }]
        ));
        assert!(matches!(
            compare(&expected(&[]), &missing).as_slice(),
            [Discrepancy::UnexpectedError { .. }]
        ));
    }

    #[test]
    fn report_json_shape() {
        let report = CaseReport {
            name: "sample".into(),
            outcome: CaseOutcome::Mismatch(vec![Discrepancy::MissingFlag(Capability::Spice)]),
            actual: parse(HELP, None),
        };
        let line = report.to_json();
        assert_eq!(line["case"], "sample");
        assert_eq!(line["outcome"], "fail");
        assert_eq!(line["version"], 12_001);
        assert_eq!(line["discrepancies"][0], "missing flag 46 (spice)");
        assert!(line["flags"].as_array().unwrap().iter().any(|f| f == "drive"));

        let failed = CaseReport {
            name: "bad".into(),
            outcome: CaseOutcome::Pass,
            actual: parse(b"", None),
        };
        let line = failed.to_json();
        assert_eq!(line["outcome"], "pass");
        assert_eq!(line["error"], "missing-version-banner");
        assert!(line.get("discrepancies").is_none());
    }

    #[test]
    fn empty_flagset_matches_empty_expectation() {
        let result = parse(b"QEMU emulator version 0.8.0\n", None).unwrap();
        assert_eq!(result.flags, FlagSet::empty());
    }
}
