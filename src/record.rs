//! The immutable value assembled by the dispatcher and handed to sinks.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use crate::exception::Exception;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Cell<u64> = Cell::new(0);
}

/// Numeric id plus name of the thread that produced a record.
///
/// `std::thread::ThreadId` has no stable numeric representation, so each
/// thread is assigned a small sequential id the first time it logs.
#[derive(Debug, Clone)]
pub struct ThreadHandle {
    pub id: u64,
    pub name: Option<String>,
}

impl ThreadHandle {
    /// Captures the handle for the thread calling this function.
    pub fn current() -> Self {
        let id = THREAD_ID.with(|cell| {
            let mut id = cell.get();
            if id == 0 {
                id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
                cell.set(id);
            }
            id
        });
        ThreadHandle {
            id,
            name: std::thread::current().name().map(str::to_owned),
        }
    }
}

/// A caller-attributed source location: dotted module path, function,
/// file and line. `line = -1` means unknown.
#[derive(Debug, Clone, Default)]
pub struct CallerFrame {
    pub module_path: Option<String>,
    pub method: Option<String>,
    pub file: Option<String>,
    pub line: i64,
}

impl CallerFrame {
    /// A fully-populated frame captured at a macro call site via
    /// `module_path!()`/`file!()`/`line!()`. Zero-cost: no stack walking.
    pub fn captured(module_path: &str, file: &str, line: u32) -> Self {
        CallerFrame {
            module_path: Some(module_path.to_owned()),
            method: None,
            file: Some(file.to_owned()),
            line: line as i64,
        }
    }

    /// A frame with only the dotted module/class populated; method and file
    /// are `"<unknown>"`, line is `-1`. Used by the fast class-name-only
    /// strategy in `frame::resolve`.
    pub fn class_name_only(module_path: impl Into<String>) -> Self {
        CallerFrame {
            module_path: Some(module_path.into()),
            method: Some("<unknown>".to_owned()),
            file: Some("<unknown>".to_owned()),
            line: -1,
        }
    }

    /// The unqualified last segment of the dotted module path.
    pub fn class_name(&self) -> Option<&str> {
        self.module_path
            .as_deref()
            .map(|p| p.rsplit("::").next().unwrap_or(p))
    }

    /// Everything in the dotted module path before the last segment, empty
    /// if the path has no parent (top-level module).
    pub fn package(&self) -> Option<&str> {
        self.module_path.as_deref().map(|p| match p.rfind("::") {
            Some(idx) => &p[..idx],
            None => "",
        })
    }
}

/// Every field a sink may consume. All fields but `level` are optional,
/// gated by the sinks' declared (and token-derived) required-field union at
/// the record's level — see `config::RequiredFields`.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: crate::level::Level,
    pub timestamp: Option<SystemTime>,
    pub process_id: Option<u32>,
    pub thread: Option<ThreadHandle>,
    pub module_path: Option<String>,
    pub method: Option<String>,
    pub file: Option<String>,
    pub line: i64,
    pub rendered_message: Option<String>,
    pub exception: Option<Exception>,
    /// Final bytes to emit, one per sink — populated during per-sink
    /// rendering, `None` before that point.
    pub rendered_text: Option<String>,
}

impl LogRecord {
    /// A bare record at `level` with every optional field unset. The
    /// dispatcher fills in only the fields the active configuration's
    /// required-field union demands.
    pub fn bare(level: crate::level::Level) -> Self {
        LogRecord {
            level,
            timestamp: None,
            process_id: None,
            thread: None,
            module_path: None,
            method: None,
            file: None,
            line: -1,
            rendered_message: None,
            exception: None,
            rendered_text: None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.module_path
            .as_deref()
            .map(|p| p.rsplit("::").next().unwrap_or(p))
    }

    pub fn package(&self) -> Option<&str> {
        self.module_path.as_deref().map(|p| match p.rfind("::") {
            Some(idx) => &p[..idx],
            None => "",
        })
    }
}
