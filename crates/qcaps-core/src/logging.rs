#![forbid(unsafe_code)]

//! Logging shim for the capability parser.
//!
//! With the `tracing` feature the parser emits structured events through
//! the `tracing` crate. Without it, the macros below expand to nothing so
//! call sites stay identical and the parser carries no logging cost.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// Swallows per-stage summaries such as the decoded version.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Yields a [`NoopSpan`] so `parse` can still enter its span.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }

    /// Swallows the per-capability detection events.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Swallows warnings about a missing or unusable device list.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

/// Span placeholder for builds without `tracing`.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns a guard with no drop behaviour.
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }
}

/// Held for the duration of a parse; dropping it is free.
#[cfg(not(feature = "tracing"))]
pub struct NoopGuard;
