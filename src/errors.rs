//! Error kinds, one per failure domain the dispatcher can hit.
//!
//! Policy: user emission calls never raise out of the dispatcher.
//! `RecordAssemblyError` and `SinkWriteError` are always caught centrally and
//! funneled through [`crate::internal::InternalLogger`]; only `ConfigError`
//! and `PluginInitError` are surfaced to a configurator caller.

use std::fmt;
use std::io;

/// Raised while building a `Configuration`: an invalid pattern or an unknown
/// sink option. Surfaced to the configurator caller.
#[derive(Debug)]
pub enum ConfigError {
    InvalidPattern { pattern: String, reason: String },
    UnknownOption(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid format pattern {:?}: {}", pattern, reason)
            }
            ConfigError::UnknownOption(opt) => write!(f, "unknown configuration option: {}", opt),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raised while assembling a record (e.g. an argument's textual conversion
/// fails). Caught centrally; the whole emission is dropped and reported once
/// via `InternalLogger` at ERROR rather than partially delivered.
#[derive(Debug)]
pub struct RecordAssemblyError {
    pub kind: String,
}

impl RecordAssemblyError {
    pub fn new(kind: impl Into<String>) -> Self {
        RecordAssemblyError { kind: kind.into() }
    }
}

impl fmt::Display for RecordAssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to create log entry ({})", self.kind)
    }
}

impl std::error::Error for RecordAssemblyError {}

/// Raised by a sink's `write`. Caught per-sink; does not stop fan-out to the
/// remaining sinks.
#[derive(Debug)]
pub enum SinkWriteError {
    Io(io::Error),
    /// The sink's downstream (e.g. a channel receiver) is gone.
    Closed,
    Other(String),
}

impl fmt::Display for SinkWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkWriteError::Io(e) => write!(f, "{}", e),
            SinkWriteError::Closed => write!(f, "sink destination closed"),
            SinkWriteError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SinkWriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkWriteError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SinkWriteError {
    fn from(e: io::Error) -> Self {
        SinkWriteError::Io(e)
    }
}

impl SinkWriteError {
    /// Short tag used as the `<exception-kind>` in `InternalLogger`'s report
    /// line.
    pub fn kind(&self) -> &'static str {
        match self {
            SinkWriteError::Io(_) => "io",
            SinkWriteError::Closed => "closed",
            SinkWriteError::Other(_) => "other",
        }
    }
}

/// Raised by a stack-walking strategy other than the final fallback.
/// Reported at WARNING; the next strategy in `frame::resolve`'s ladder runs.
#[derive(Debug)]
pub struct FrameLookupWarning {
    pub strategy: &'static str,
    pub reason: String,
}

impl fmt::Display for FrameLookupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller-frame strategy {:?} failed: {}", self.strategy, self.reason)
    }
}

impl std::error::Error for FrameLookupWarning {}

/// Raised during sink/plugin `init` inside `Configurator::activate`. The new
/// snapshot is not published; the error is surfaced to the configurator
/// caller.
#[derive(Debug)]
pub struct PluginInitError {
    pub message: String,
}

impl PluginInitError {
    pub fn new(message: impl Into<String>) -> Self {
        PluginInitError {
            message: message.into(),
        }
    }
}

impl fmt::Display for PluginInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plugin/sink initialization failed: {}", self.message)
    }
}

impl std::error::Error for PluginInitError {}
