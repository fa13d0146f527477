#![forbid(unsafe_code)]

//! Version banner extraction.
//!
//! The emulator announces itself on one of its first lines:
//!
//! ```text
//! QEMU PC emulator version 0.12.3 (qemu-kvm-0.12.3), Copyright (c) 2003-2008 Fabrice Bellard
//! QEMU PC emulator version 0.9.1 (kvm-74), Copyright (c) 2003-2008 Fabrice Bellard
//! ```
//!
//! [`extract_version`] finds that line, decodes `major.minor[.micro]` into a
//! [`Version`], and reads the optional parenthesized build tag into a
//! [`KvmInfo`].
//!
//! # Encoding
//!
//! A [`Version`] is stored as `major * 1_000_000 + minor * 1_000 + micro`
//! with every component limited to 999, so integer order equals semantic
//! order. Downstream gates compare encoded values directly
//! (`0.10.0` is `10_000`).

use std::fmt;

use crate::config::ParserConfig;
use crate::error::{BannerDefect, ParseError};
use crate::text::{excerpt, is_blank, lines, skip_blanks, split_decimal};

/// Longest banner excerpt carried by a [`ParseError`].
pub const BANNER_EXCERPT_LEN: usize = 80;

const KVM_BUILD_TAG: &[u8] = b"(kvm-";
const QEMU_KVM_BUILD_TAG: &[u8] = b"(qemu-kvm-";

/// An encoded emulator version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u32);

impl Version {
    /// Largest value a single component may take.
    pub const MAX_COMPONENT: u32 = 999;

    /// Encode three components, or `None` when one exceeds
    /// [`MAX_COMPONENT`](Self::MAX_COMPONENT).
    #[must_use]
    pub const fn encode(major: u32, minor: u32, micro: u32) -> Option<u32> {
        if major > Self::MAX_COMPONENT || minor > Self::MAX_COMPONENT || micro > Self::MAX_COMPONENT
        {
            return None;
        }
        Some(major * 1_000_000 + minor * 1_000 + micro)
    }

    /// Build a version from its components.
    #[must_use]
    pub const fn from_components(major: u32, minor: u32, micro: u32) -> Option<Self> {
        match Self::encode(major, minor, micro) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Wrap an already encoded value. `None` above `999.999.999`.
    #[must_use]
    pub const fn from_encoded(raw: u32) -> Option<Self> {
        if raw > 999_999_999 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The encoded integer.
    #[must_use]
    pub const fn encoded(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn major(self) -> u32 {
        self.0 / 1_000_000
    }

    #[must_use]
    pub const fn minor(self) -> u32 {
        self.0 / 1_000 % 1_000
    }

    #[must_use]
    pub const fn micro(self) -> u32 {
        self.0 % 1_000
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.micro())
    }
}

/// KVM build descriptor taken from the banner.
///
/// `kvm_version` is 0 whenever `is_kvm` is false, and also for
/// `qemu-kvm` builds, which carry no separate KVM build number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KvmInfo {
    pub is_kvm: bool,
    pub kvm_version: u32,
}

impl KvmInfo {
    /// A plain, non-KVM build.
    pub const NONE: Self = Self {
        is_kvm: false,
        kvm_version: 0,
    };

    /// A KVM build with the given build number.
    #[must_use]
    pub const fn build(kvm_version: u32) -> Self {
        Self {
            is_kvm: true,
            kvm_version,
        }
    }
}

/// Everything the banner line tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBanner {
    pub version: Version,
    pub kvm: KvmInfo,
}

/// Locate and decode the version banner in `help`.
///
/// Only the first `config.banner_search_lines` lines are examined. Blank
/// lines and lines without a known signature are skipped.
///
/// # Errors
///
/// [`ParseError::MissingVersionBanner`] when no examined line starts with a
/// signature, [`ParseError::MalformedVersionBanner`] when the first one that
/// does cannot be decoded.
pub fn extract_version(help: &[u8], config: &ParserConfig) -> Result<VersionBanner, ParseError> {
    for line in lines(help).take(config.banner_search_lines) {
        if is_blank(line) {
            continue;
        }
        let trimmed = line.trim_ascii();
        let Some(rest) = config
            .banner_prefixes
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix.as_bytes()))
        else {
            continue;
        };

        let banner = decode_banner(rest).map_err(|reason| ParseError::MalformedVersionBanner {
            emulator: config.emulator_name.clone(),
            line: excerpt(trimmed, BANNER_EXCERPT_LEN),
            reason,
        })?;

        crate::debug!(
            major = banner.version.major(),
            minor = banner.version.minor(),
            micro = banner.version.micro(),
            version = banner.version.encoded(),
            "parsed version banner"
        );
        if banner.kvm.is_kvm {
            crate::debug!(kvm_version = banner.kvm.kvm_version, "kvm build detected");
        }
        return Ok(banner);
    }

    Err(ParseError::MissingVersionBanner {
        emulator: config.emulator_name.clone(),
        line: excerpt(lines(help).next().unwrap_or_default(), BANNER_EXCERPT_LEN),
    })
}

/// Decode the text that follows a banner signature.
fn decode_banner(rest: &[u8]) -> Result<VersionBanner, BannerDefect> {
    let rest = skip_blanks(rest);
    let (major, rest) = component(rest, BannerDefect::MissingMajor)?;
    let rest = rest.strip_prefix(b".").ok_or(BannerDefect::MissingMinor)?;
    let (minor, rest) = component(rest, BannerDefect::MissingMinor)?;
    let (micro, rest) = match rest.strip_prefix(b".") {
        Some(after_dot) => component(after_dot, BannerDefect::MissingMicro)?,
        None => (0, rest),
    };
    let version =
        Version::from_components(major, minor, micro).ok_or(BannerDefect::ComponentOutOfRange)?;

    let rest = skip_blanks(rest);
    let kvm = if rest.starts_with(QEMU_KVM_BUILD_TAG) {
        KvmInfo::build(0)
    } else if let Some(tag) = rest.strip_prefix(KVM_BUILD_TAG) {
        let (build, _) = split_decimal(tag).ok_or(BannerDefect::MissingKvmVersion)?;
        KvmInfo::build(build)
    } else {
        KvmInfo::NONE
    };

    Ok(VersionBanner { version, kvm })
}

/// One decimal version component, at most [`Version::MAX_COMPONENT`].
fn component(input: &[u8], missing: BannerDefect) -> Result<(u32, &[u8]), BannerDefect> {
    if !input.first().is_some_and(u8::is_ascii_digit) {
        return Err(missing);
    }
    match split_decimal(input) {
        Some((value, rest)) if value <= Version::MAX_COMPONENT => Ok((value, rest)),
        _ => Err(BannerDefect::ComponentOutOfRange),
    }
}
