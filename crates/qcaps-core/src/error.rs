#![forbid(unsafe_code)]

//! Parse failures.
//!
//! Only the version banner can abort a parse. An undetected capability is
//! an absent bit, never an error.

use std::fmt;

/// Why a banner that matched a known signature could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerDefect {
    /// No digits where the major component should start.
    MissingMajor,
    /// No `.` and digits after the major component.
    MissingMinor,
    /// A `.` after the minor component without digits.
    MissingMicro,
    /// A component larger than 999.
    ComponentOutOfRange,
    /// `(kvm-` not followed by a build number.
    MissingKvmVersion,
}

impl BannerDefect {
    /// Short description.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingMajor => "missing major version",
            Self::MissingMinor => "missing minor version",
            Self::MissingMicro => "missing micro version",
            Self::ComponentOutOfRange => "version component exceeds 999",
            Self::MissingKvmVersion => "missing kvm build number",
        }
    }
}

impl fmt::Display for BannerDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal parse failure.
///
/// `line` holds at most the first 80 bytes of the offending line, lossily
/// decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No line near the start of the help text carries a version banner.
    MissingVersionBanner {
        /// Emulator display name.
        emulator: String,
        /// First line of the help text.
        line: String,
    },
    /// A banner was found but its version number could not be decoded.
    MalformedVersionBanner {
        /// Emulator display name.
        emulator: String,
        /// The banner line.
        line: String,
        /// What was wrong with it.
        reason: BannerDefect,
    },
}

impl ParseError {
    /// Stable identifier for this failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingVersionBanner { .. } => "missing-version-banner",
            Self::MalformedVersionBanner { .. } => "malformed-version-banner",
        }
    }

    /// The offending line excerpt.
    #[must_use]
    pub fn line(&self) -> &str {
        match self {
            Self::MissingVersionBanner { line, .. } | Self::MalformedVersionBanner { line, .. } => {
                line
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVersionBanner { emulator, line } => {
                write!(f, "cannot parse {emulator} version number in '{line}'")
            }
            Self::MalformedVersionBanner {
                emulator,
                line,
                reason,
            } => write!(
                f,
                "cannot parse {emulator} version number in '{line}': {reason}"
            ),
        }
    }
}

impl std::error::Error for ParseError {}
