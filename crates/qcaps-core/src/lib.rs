#![forbid(unsafe_code)]

//! Emulator capability detection from captured help output.
//!
//! Given the text an emulator prints for `-help` and, optionally, for
//! `-device ?`, [`CapabilityParser`] produces the emulator [`Version`], its
//! KVM build descriptor, and a [`FlagSet`] of detected [`Capability`] bits.
//!
//! # Pipeline
//!
//! 1. [`version::extract_version`] decodes the banner. This is the only
//!    stage that can fail; every later rule depends on the version.
//! 2. [`scanner::scan_help`] evaluates the help-text rule table.
//! 3. [`devices::scan_devices`] folds in device-model capabilities when the
//!    help text advertised `-device`.
//!
//! # Invariants
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Determinism | The same input always yields the same result |
//! | Bounded input | Bytes past `max_input_len` are never read |
//! | No partial results | A banner failure yields an error and nothing else |
//! | Stable bits | A capability's bit position never changes |
//! | Gating | Device-list text is ignored without the `device` bit |
//!
//! # Feature flags
//!
//! - `tracing`: emit structured events through the `tracing` crate.

pub mod config;
pub mod devices;
pub mod error;
pub mod flags;
pub mod logging;
pub mod parser;
pub mod scanner;
pub mod text;
pub mod version;

pub use config::ParserConfig;
pub use error::{BannerDefect, ParseError};
pub use flags::{Capability, FlagSet, UnknownCapability};
pub use parser::{CapabilityParser, ParseResult, parse};
pub use version::{KvmInfo, Version};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};
