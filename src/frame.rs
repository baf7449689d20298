//! Caller-frame discovery strategy ladder.
//!
//! Ordinary emission call sites never reach [`full_trace_frame`] — the
//! `trace!`/`debug!`/… macros capture `module_path!()`/`file!()`/`line!()`
//! at compile time, which is strictly cheaper and is threaded straight into
//! [`crate::dispatch::Logger::log_with_frame`]. This ladder exists for the
//! depth-based bridge entry points (`Logger::log_at_depth`, the legacy
//! facade) that have no macro-captured frame to hand in.

use crate::errors::FrameLookupWarning;
use crate::internal::InternalLogger;
use crate::plugins::PluginChain;
use crate::record::CallerFrame;

/// Resolves the caller frame for a depth-based emission, trying in order:
/// the installed plugin chain, then a full backtrace walk. `depth` counts
/// frames above the dispatcher's own entry point; `only_class_name` mirrors
/// `cfg.stackInfoNeeded[level] == CLASS_NAME_ONLY` and is passed through to
/// the plugin chain so a provider can skip resolving fields it won't need,
/// but never skips the backtrace fallback itself — a plugin declining to
/// answer still leaves the bridge entry points needing a real frame.
pub fn resolve(plugins: &PluginChain, depth: u32, only_class_name: bool) -> CallerFrame {
    if let Some(provider) = &plugins.frame_provider {
        if let Some(frame) = provider.get(depth, only_class_name) {
            return frame;
        }
    }

    full_trace_frame(depth)
}

fn full_trace_frame(depth: u32) -> CallerFrame {
    let mut found = None;
    let mut index = 0u32;
    // +2 skips this function's own frame and `backtrace::trace`'s internal
    // trampoline frame, so `depth` keeps meaning "frames above the user call
    // site" regardless of which strategy resolved it.
    let target = depth + 2;
    backtrace::trace(|bt_frame| {
        if index == target {
            found = Some(bt_frame.clone());
            return false;
        }
        index += 1;
        true
    });

    match found {
        Some(bt_frame) => frame_from_backtrace(&bt_frame),
        None => {
            InternalLogger::report_frame_lookup_warning(&FrameLookupWarning {
                strategy: "backtrace",
                reason: format!("no frame found at depth {}", depth),
            });
            CallerFrame::class_name_only("<unknown>")
        }
    }
}

fn frame_from_backtrace(bt_frame: &backtrace::Frame) -> CallerFrame {
    let mut resolved = CallerFrame::class_name_only("<unknown>");
    backtrace::resolve_frame(bt_frame, |symbol| {
        let name = match symbol.name() {
            Some(name) => strip_hash(&name.to_string()),
            None => return,
        };
        let (module_path, method) = match name.rfind("::") {
            Some(idx) => (name[..idx].to_owned(), name[idx + 2..].to_owned()),
            None => (name.clone(), name),
        };
        resolved = CallerFrame {
            module_path: Some(module_path),
            method: Some(method),
            file: symbol.filename().map(|p| p.display().to_string()),
            line: symbol.lineno().map(|l| l as i64).unwrap_or(-1),
        };
    });
    resolved
}

/// Strips the compiler-generated `::h0123456789abcdef` disambiguator suffix
/// from a mangled-then-demangled symbol name.
fn strip_hash(name: &str) -> String {
    match name.rfind("::h") {
        Some(idx)
            if name.len() - idx - 3 == 16
                && name[idx + 3..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            name[..idx].to_owned()
        }
        _ => name.to_owned(),
    }
}
