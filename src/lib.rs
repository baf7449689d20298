//! A lightweight, embeddable logging library.
//!
//! Application code emits records at one of five severities through the
//! [`trace!`], [`debug!`], [`info!`], [`warn!`] and [`error!`] macros. Each
//! call is filtered against a configurable per-module threshold, rendered
//! through a format pattern, and handed to one or more sinks — either on the
//! calling thread or through a dedicated writer thread.
//!
//! # Configuring
//!
//! ```no_run
//! use emberlog::config::Configurator;
//! use emberlog::level::Level;
//! use emberlog::sink::StdoutSink;
//! use std::sync::Arc;
//!
//! Configurator::new()
//!     .level(Level::Info)
//!     .format_pattern("{date} {level} {class}: {message}")
//!     .writer(Arc::new(StdoutSink::default()))
//!     .activate()
//!     .expect("configuration should activate");
//!
//! emberlog::info!("server listening on {}", 8080);
//! ```
//!
//! # Layout
//!
//! - [`level`] — the total-ordered severity set.
//! - [`record`] — the value assembled by the dispatcher and handed to sinks.
//! - [`token`] — pre-parsed format-pattern tokens.
//! - [`sink`] — the sink contract and built-in console/file/channel sinks.
//! - [`plugins`] — pluggable caller-frame providers and exception sanitizers.
//! - [`frame`] — the caller-frame discovery strategy ladder.
//! - [`config`] — immutable configuration snapshots and their builder.
//! - [`dispatch`] — the hot-path pipeline the macros funnel through.
//! - [`internal`] — the last-resort diagnostic sink.
//! - [`legacy`] — a compatibility facade using an older severity naming.
//! - [`errors`] — the error kinds raised across the crate.

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod exception;
pub mod frame;
pub mod internal;
pub mod legacy;
pub mod level;
pub mod message;
pub mod plugins;
pub mod record;
pub mod sink;
pub mod token;
mod writer_thread;

pub use config::{Configuration, Configurator};
pub use errors::{ConfigError, PluginInitError, RecordAssemblyError, SinkWriteError};
pub use legacy::LegacyFacade;
pub use level::Level;
pub use record::LogRecord;
pub use writer_thread::{ThreadPriority, WritingThread};

/// Serializes tests that call `Configurator::activate`, since it publishes to
/// the one process-wide `Configuration::active()` singleton shared by every
/// test in this binary.
#[cfg(test)]
pub(crate) mod test_support {
    pub(crate) static ACTIVATE_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());
}
