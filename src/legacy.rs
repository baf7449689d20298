//! Compatibility facade for an older severity-naming convention.
//!
//! A thin translation layer mapping an older severity-naming convention onto
//! the core's `Level`s and routing through the same dispatcher entry points
//! as `trace!`..`error!`. It has no macro access to the call site, so it
//! goes through the depth-based bridge (`Logger::log_at_depth`) instead of
//! the frame-capturing one.

use std::error::Error as StdError;
use std::fmt;

use crate::dispatch::{Logger, MessageInput};
use crate::level::Level;

/// Frames above the call site needed to reach the real caller: one for
/// `LegacyFacade`'s own method, one for `log_at_depth`'s `emit` call.
const CALL_DEPTH: u32 = 2;

/// Old-style severity name, kept distinct from `Level` so existing callers
/// using this naming convention don't have to learn the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fine,
    Config,
    Info,
    Warning,
    Severe,
}

impl Severity {
    fn to_level(self) -> Level {
        match self {
            Severity::Fine => Level::Trace,
            Severity::Config => Level::Debug,
            Severity::Info => Level::Info,
            Severity::Warning => Level::Warning,
            Severity::Severe => Level::Error,
        }
    }
}

/// Static translation to dispatcher entry points, one-to-one with
/// `Severity`. No state of its own.
pub struct LegacyFacade;

impl LegacyFacade {
    pub fn log(severity: Severity, message: &dyn fmt::Display) {
        Logger::log_at_depth(severity.to_level(), CALL_DEPTH, None, MessageInput::Value(message));
    }

    pub fn log_with_cause(severity: Severity, err: &(dyn StdError + 'static), message: &dyn fmt::Display) {
        Logger::log_at_depth(severity.to_level(), CALL_DEPTH, Some(err), MessageInput::Value(message));
    }

    pub fn fine(message: &dyn fmt::Display) {
        Self::log(Severity::Fine, message);
    }

    pub fn config(message: &dyn fmt::Display) {
        Self::log(Severity::Config, message);
    }

    pub fn info(message: &dyn fmt::Display) {
        Self::log(Severity::Info, message);
    }

    pub fn warning(message: &dyn fmt::Display) {
        Self::log(Severity::Warning, message);
    }

    pub fn severe(message: &dyn fmt::Display) {
        Self::log(Severity::Severe, message);
    }

    pub fn is_enabled(severity: Severity) -> bool {
        Logger::is_enabled_for_module(severity.to_level(), "legacy")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Configurator;
    use crate::sink::ChannelSink;
    use crate::test_support::ACTIVATE_GUARD;
    use std::sync::mpsc;
    use std::sync::Arc;

    #[test]
    fn severe_maps_to_error_level() {
        let _guard = ACTIVATE_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let (tx, rx) = mpsc::channel();
        Configurator::new()
            .level(Level::Trace)
            .format_pattern("{level} {message}")
            .writer(Arc::new(ChannelSink::new(tx)))
            .activate()
            .expect("activation should succeed");

        LegacyFacade::severe(&"disk full");
        let line = rx.recv().expect("a record should have been enqueued");
        assert!(line.starts_with("ERROR disk full"));
    }

    #[test]
    fn fine_is_disabled_above_info() {
        let _guard = ACTIVATE_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        Configurator::new().level(Level::Info).activate().expect("activation should succeed");
        assert!(!LegacyFacade::is_enabled(Severity::Fine));
        assert!(LegacyFacade::is_enabled(Severity::Severe));
    }
}
