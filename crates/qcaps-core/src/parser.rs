#![forbid(unsafe_code)]

//! The capability parser: banner, help-text scan, then device list.
//!
//! ```
//! use qcaps_core::{Capability, CapabilityParser};
//!
//! let help = b"QEMU PC emulator version 0.12.3 (qemu-kvm-0.12.3)\n\
//!              -drive [file=file][,format=f]\n\
//!              -device driver[,prop[=value][,...]]\n";
//! let devices = b"name \"hda-duplex\", bus HDA-bus\n";
//!
//! let result = CapabilityParser::new().parse(help, Some(&devices[..])).unwrap();
//! assert_eq!(result.version.encoded(), 12_003);
//! assert!(result.kvm.is_kvm);
//! assert!(result.flags.contains(Capability::DriveFormat));
//! assert!(result.flags.contains(Capability::HdaDuplex));
//! ```

use crate::config::ParserConfig;
use crate::devices::scan_devices;
use crate::error::ParseError;
use crate::flags::{Capability, FlagSet};
use crate::scanner::scan_help;
use crate::text::clip;
use crate::version::{KvmInfo, Version, extract_version};

/// Outcome of a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseResult {
    pub version: Version,
    pub kvm: KvmInfo,
    pub flags: FlagSet,
}

impl ParseResult {
    /// Whether the banner identified a KVM build.
    #[must_use]
    pub const fn is_kvm(&self) -> bool {
        self.kvm.is_kvm
    }

    /// KVM build number; 0 for plain builds.
    #[must_use]
    pub const fn kvm_version(&self) -> u32 {
        self.kvm.kvm_version
    }
}

/// Turns captured emulator output into a [`ParseResult`].
///
/// Holds only configuration; every call to [`parse`](Self::parse) is
/// independent and the parser can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct CapabilityParser {
    config: ParserConfig,
}

impl CapabilityParser {
    /// Parser with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse help text and, when the emulator supports `-device`, its
    /// device list.
    ///
    /// Both inputs are clipped to `max_input_len`. A device list passed for
    /// an emulator without `-device` is ignored; a missing device list for
    /// one that has it just leaves the device-conditioned flags clear.
    ///
    /// # Errors
    ///
    /// Fails only when the version banner is missing or malformed. No
    /// partial result is produced in that case.
    pub fn parse(&self, help: &[u8], device_list: Option<&[u8]>) -> Result<ParseResult, ParseError> {
        let span = crate::debug_span!("parse_help", help_len = help.len());
        let _guard = span.enter();

        let help = self.clipped(help);
        let banner = extract_version(help, &self.config)?;
        let mut flags = scan_help(help, banner);

        match device_list {
            Some(list) => {
                let list = self.clipped(list);
                flags = scan_devices(list, flags);
            }
            None if flags.contains(Capability::Device) => {
                crate::warn!("emulator supports -device but no device list was supplied");
            }
            None => {}
        }

        crate::debug!(
            version = banner.version.encoded(),
            flag_count = flags.len(),
            "capability parse complete"
        );
        Ok(ParseResult {
            version: banner.version,
            kvm: banner.kvm,
            flags,
        })
    }

    fn clipped<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let (kept, truncated) = clip(input, self.config.max_input_len);
        if truncated {
            crate::debug!(
                len = input.len(),
                max = self.config.max_input_len,
                "input clipped"
            );
        }
        kept
    }
}

/// Parse with the default configuration.
///
/// # Errors
///
/// See [`CapabilityParser::parse`].
pub fn parse(help: &[u8], device_list: Option<&[u8]>) -> Result<ParseResult, ParseError> {
    CapabilityParser::new().parse(help, device_list)
}
