#![forbid(unsafe_code)]

//! Parser configuration.
//!
//! Defaults describe stock QEMU output captured into a 64 KiB buffer.
//! `QCAPS_MAX_INPUT_BYTES` overrides the input cap when read through
//! [`ParserConfig::from_env`].

/// Default cap on help and device-list text.
pub const DEFAULT_MAX_INPUT_LEN: usize = 64 * 1024;

/// Default number of leading lines searched for the banner.
pub const DEFAULT_BANNER_SEARCH_LINES: usize = 4;

/// Environment variable read by [`ParserConfig::from_env`].
pub const MAX_INPUT_ENV: &str = "QCAPS_MAX_INPUT_BYTES";

const DEFAULT_EMULATOR_NAME: &str = "QEMU";
const DEFAULT_BANNER_PREFIXES: [&str; 2] = ["QEMU emulator version", "QEMU PC emulator version"];

/// Configuration for [`CapabilityParser`](crate::parser::CapabilityParser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Bytes of input considered; anything past this is treated as absent.
    pub max_input_len: usize,
    /// Display name used in error messages.
    pub emulator_name: String,
    /// Signatures a banner line must start with.
    pub banner_prefixes: Vec<String>,
    /// How many leading lines may hold the banner.
    pub banner_search_lines: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            emulator_name: DEFAULT_EMULATOR_NAME.to_owned(),
            banner_prefixes: DEFAULT_BANNER_PREFIXES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            banner_search_lines: DEFAULT_BANNER_SEARCH_LINES,
        }
    }
}

impl ParserConfig {
    /// Defaults with overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MAX_INPUT_ENV).ok().as_deref())
    }

    /// Defaults with an optional raw `QCAPS_MAX_INPUT_BYTES` value applied.
    ///
    /// Unparseable or zero values are ignored.
    #[must_use]
    pub fn from_env_value(max_input: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = max_input
            && let Ok(len) = raw.trim().parse::<usize>()
            && len > 0
        {
            config.max_input_len = len;
        }
        config
    }

    /// Set the input cap.
    #[must_use]
    pub fn max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = len;
        self
    }

    /// Set the emulator display name.
    #[must_use]
    pub fn emulator_name(mut self, name: impl Into<String>) -> Self {
        self.emulator_name = name.into();
        self
    }

    /// Accept an additional banner signature.
    #[must_use]
    pub fn banner_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.banner_prefixes.push(prefix.into());
        self
    }

    /// Set how many leading lines may hold the banner.
    #[must_use]
    pub fn banner_search_lines(mut self, lines: usize) -> Self {
        self.banner_search_lines = lines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_input_len, 65_536);
        assert_eq!(config.emulator_name, "QEMU");
        assert_eq!(config.banner_prefixes.len(), 2);
        assert_eq!(config.banner_search_lines, 4);
    }

    #[test]
    fn env_value_overrides_cap() {
        assert_eq!(ParserConfig::from_env_value(Some("4096")).max_input_len, 4096);
        assert_eq!(ParserConfig::from_env_value(Some(" 10 ")).max_input_len, 10);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        for raw in [Some("0"), Some("lots"), Some("-5"), Some(""), None] {
            assert_eq!(
                ParserConfig::from_env_value(raw).max_input_len,
                DEFAULT_MAX_INPUT_LEN
            );
        }
    }

    #[test]
    fn builders_chain() {
        let config = ParserConfig::default()
            .max_input_len(128)
            .emulator_name("KVM")
            .banner_prefix("KVM emulator version")
            .banner_search_lines(1);
        assert_eq!(config.max_input_len, 128);
        assert_eq!(config.emulator_name, "KVM");
        assert_eq!(config.banner_prefixes.last().map(String::as_str), Some("KVM emulator version"));
        assert_eq!(config.banner_search_lines, 1);
    }
}
