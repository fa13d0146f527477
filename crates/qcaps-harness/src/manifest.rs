#![forbid(unsafe_code)]

//! The fixture table.
//!
//! `manifest.json` lists every historical release with the exact result the
//! parser must produce for it:
//!
//! ```json
//! {
//!   "max_input_bytes": 65536,
//!   "cases": [
//!     { "name": "qemu-0.9.1", "version": 9001, "is_kvm": false, "kvm_version": 0,
//!       "flags": ["kqemu", "vnc-colon", "no-reboot", "drive", "name"] },
//!     { "name": "qemu-truncated-version", "error": "malformed-version-banner" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use qcaps_core::{Capability, FlagSet};
use serde::Deserialize;

use crate::error::HarnessError;

/// Manifest file name inside a fixture directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// The parsed fixture table.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Capture buffer size; larger fixtures are rejected.
    pub max_input_bytes: usize,
    pub cases: Vec<FixtureCase>,
}

/// One release and what parsing it must yield.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCase {
    pub name: String,
    #[serde(flatten)]
    pub expect: Expectation,
}

/// Expected outcome as written in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    /// Parsing must fail with this `ParseError::kind()`.
    Failure { error: String },
    /// Parsing must succeed with exactly these values.
    Success {
        version: u32,
        is_kvm: bool,
        kvm_version: u32,
        flags: Vec<String>,
    },
}

/// An [`Expectation`] with flag names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Failure(String),
    Success {
        version: u32,
        is_kvm: bool,
        kvm_version: u32,
        flags: FlagSet,
    },
}

impl Manifest {
    /// Load `manifest.json` from a fixture directory.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Io`] or [`HarnessError::Manifest`].
    pub fn load(dir: &Path) -> Result<Self, HarnessError> {
        let path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|source| HarnessError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| HarnessError::Manifest { path, source })
    }

    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// The `serde_json` error when `text` does not describe a manifest.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl FixtureCase {
    /// Resolve flag names into a [`FlagSet`].
    ///
    /// # Errors
    ///
    /// [`HarnessError::UnknownFlag`] for a name outside the enumeration.
    pub fn expected(&self) -> Result<Expected, HarnessError> {
        match &self.expect {
            Expectation::Failure { error } => Ok(Expected::Failure(error.clone())),
            Expectation::Success {
                version,
                is_kvm,
                kvm_version,
                flags,
            } => {
                let flags = flags
                    .iter()
                    .map(|name| name.parse::<Capability>())
                    .collect::<Result<FlagSet, _>>()
                    .map_err(|source| HarnessError::UnknownFlag {
                        case: self.name.clone(),
                        source,
                    })?;
                Ok(Expected::Success {
                    version: *version,
                    is_kvm: *is_kvm,
                    kvm_version: *kvm_version,
                    flags,
                })
            }
        }
    }

    /// Whether the case needs its `-device` companion fixture.
    ///
    /// Keyed on `device` in the expected flags. The rhel61 entry lists
    /// `device` for that reason even though the historical table omits it:
    /// its `hda-duplex`, `ccid-passthru` and `virtio-tx-alg` bits only exist
    /// in the companion.
    #[must_use]
    pub fn wants_device_list(&self) -> bool {
        match &self.expect {
            Expectation::Success { flags, .. } => flags.iter().any(|f| f == "device"),
            Expectation::Failure { .. } => false,
        }
    }
}
