#![forbid(unsafe_code)]

//! Fixture files on disk.
//!
//! Each fixture is the raw output captured from one emulator release. A
//! release that supports `-device` may have a companion `<name>-device`
//! file holding its device list.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Suffix of the device-list companion fixture.
pub const DEVICE_SUFFIX: &str = "-device";

/// The fixture directory shipped with the workspace.
#[must_use]
pub fn default_fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/qemuhelp")
}

/// Path of the device-list companion for `name`.
#[must_use]
pub fn device_fixture_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}{DEVICE_SUFFIX}"))
}

/// Read a fixture, refusing files larger than `max_len` bytes.
///
/// # Errors
///
/// [`HarnessError::Io`] when the file cannot be read and
/// [`HarnessError::FixtureTooLarge`] when it exceeds `max_len`.
pub fn load_fixture(path: &Path, max_len: usize) -> Result<Vec<u8>, HarnessError> {
    let io_err = |source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = fs::File::open(path).map_err(io_err)?;

    // Read one byte past the cap so oversize files are detected without
    // trusting metadata.
    let mut buf = Vec::new();
    file.take((max_len as u64).saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(io_err)?;
    if buf.len() > max_len {
        let len = fs::metadata(path).map_or(buf.len() as u64, |m| m.len());
        return Err(HarnessError::FixtureTooLarge {
            path: path.to_path_buf(),
            len,
            max: max_len,
        });
    }
    Ok(buf)
}
