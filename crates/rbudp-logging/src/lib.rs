#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! A verbosity-gated event log for the RBUDP workspace, bridged to
//! [`tracing`]. Sender and receiver state transitions, handshake fields, and
//! round-by-round bitmap progress go through [`tracing::info!`] /
//! [`tracing::debug!`] / [`tracing::trace!`] directly; this crate only owns
//! turning a CLI verbosity count into a subscriber filter.
//!
//! # Design
//!
//! The protocol has no per-category flag matrix to gate (no analogue of
//! separate "copy"/"delete"/"flist" channels) — a single [`VerbosityConfig`]
//! with one `level: u8` is enough. `-v` repeated `n` times raises the level
//! to `n`; [`init`] installs a global `tracing-subscriber` `fmt` subscriber
//! filtered accordingly.
//!
//! # Examples
//!
//! ```
//! use rbudp_logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_count(2);
//! assert_eq!(config.level(), 2);
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Subscriber;

/// Verbosity level derived from repeated `-v` flags on the CLI.
///
/// - `0`: warnings and errors only.
/// - `1`: state-machine transitions and round summaries (`info`).
/// - `2`: per-packet and per-round detail (`debug`).
/// - `3+`: everything, including per-packet wire dumps (`trace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerbosityConfig {
    level: u8,
}

impl VerbosityConfig {
    /// Builds a config from the number of times `-v` was passed.
    #[must_use]
    pub const fn from_verbose_count(count: u8) -> Self {
        Self { level: count }
    }

    /// The raw verbosity level.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Maps this level onto a `tracing` filter directive.
    #[must_use]
    pub fn filter_directive(&self) -> &'static str {
        match self.level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Installs a process-global `tracing-subscriber` filtered by `config`.
///
/// Intended to be called once, at binary startup. Returns without effect
/// (rather than panicking) if a global subscriber is already installed, so
/// it is safe to call from multiple test harnesses in the same process.
pub fn init(config: VerbosityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    let subscriber = Subscriber::builder().with_env_filter(filter).with_target(false).finish();

    // Multiple loopback tests in one process each call `init`; only the
    // first one actually takes effect.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
