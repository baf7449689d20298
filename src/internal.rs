//! Last-resort diagnostic sink.
//!
//! Every failure inside the dispatch pipeline itself — record assembly,
//! a sink's `write`, a caller-frame strategy — is reported here instead of
//! propagating to user code. `InternalLogger` never calls back into
//! [`crate::dispatch`], so a misbehaving sink cannot recurse into logging
//! about its own failure.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::errors::{FrameLookupWarning, RecordAssemblyError, SinkWriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

// Dedup key is (severity, kind): once a given failure kind has been reported
// at a given severity, repeats are suppressed for the process lifetime. This
// is what stands between a persistently failing sink and a stderr flood.
static SEEN: Lazy<Mutex<HashSet<(Severity, String)>>> = Lazy::new(|| Mutex::new(HashSet::new()));

pub struct InternalLogger;

impl InternalLogger {
    pub fn report_record_assembly_error(err: &RecordAssemblyError) {
        Self::emit(Severity::Error, "Failed to create log entry", &err.kind);
    }

    pub fn report_sink_write_error(err: &SinkWriteError) {
        Self::emit(Severity::Error, "Failed to write log entry", err.kind());
    }

    pub fn report_frame_lookup_warning(warning: &FrameLookupWarning) {
        Self::emit(Severity::Warning, &warning.reason, warning.strategy);
    }

    pub fn report_discarded_enqueue() {
        Self::emit(Severity::Warning, "Dropped log entry enqueued during shutdown", "writing_thread");
    }

    fn emit(severity: Severity, message: &str, kind: &str) {
        let key = (severity, kind.to_owned());
        {
            let mut seen = SEEN.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(key) {
                return;
            }
        }
        let line = format!("LOGGER {}: {} ({})\n", severity.as_str(), message, kind);
        let _ = std::io::stderr().write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn report_does_not_panic_on_repeated_kind() {
        let err = RecordAssemblyError::new("message-render-test-kind");
        InternalLogger::report_record_assembly_error(&err);
        InternalLogger::report_record_assembly_error(&err);
    }
}
