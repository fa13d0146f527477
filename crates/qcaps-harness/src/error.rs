#![forbid(unsafe_code)]

//! Harness failures, as opposed to fixture mismatches.

use std::fmt;
use std::io;
use std::path::PathBuf;

use qcaps_core::UnknownCapability;

/// Something prevented a fixture from being replayed at all.
#[derive(Debug)]
pub enum HarnessError {
    /// A fixture or manifest could not be read.
    Io { path: PathBuf, source: io::Error },
    /// A fixture exceeds the capture buffer size.
    FixtureTooLarge { path: PathBuf, len: u64, max: usize },
    /// The manifest is not valid JSON or does not match the expected shape.
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// A manifest case names a capability that does not exist.
    UnknownFlag {
        case: String,
        source: UnknownCapability,
    },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::FixtureTooLarge { path, len, max } => write!(
                f,
                "fixture {} is {len} bytes, larger than the {max} byte capture buffer",
                path.display()
            ),
            Self::Manifest { path, source } => {
                write!(f, "invalid manifest {}: {source}", path.display())
            }
            Self::UnknownFlag { case, source } => write!(f, "case {case}: {source}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Manifest { source, .. } => Some(source),
            Self::UnknownFlag { source, .. } => Some(source),
            Self::FixtureTooLarge { .. } => None,
        }
    }
}
