//! The dispatch pipeline: the single path every `trace!`..`error!`
//! call and every legacy-facade call funnels through.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::Configuration;
use crate::errors::RecordAssemblyError;
use crate::frame;
use crate::internal::InternalLogger;
use crate::level::Level;
use crate::record::{CallerFrame, LogRecord};
use crate::token::Field;

/// What a log call actually carries as its message payload. The macros build
/// one of these from whichever arm matched.
pub enum MessageInput<'a> {
    None,
    Value(&'a dyn fmt::Display),
    Pattern(&'a str, &'a [&'a dyn fmt::Display]),
}

/// Where the caller frame comes from: captured directly at the macro call
/// site (the fast, zero-cost path) or a depth to walk via `backtrace` (used
/// by bridge entry points, e.g. the legacy facade, that don't have macro
/// access to `module_path!()`/`file!()`/`line!()`).
enum FrameSource {
    Captured(CallerFrame),
    Depth(u32),
}

fn resolve_source(source: &FrameSource, cfg: &Configuration, only_class_name: bool) -> CallerFrame {
    match source {
        FrameSource::Captured(frame) => frame.clone(),
        FrameSource::Depth(depth) => frame::resolve(cfg.plugins(), *depth, only_class_name),
    }
}

/// Zero-sized entry point the macros call through. Keeping this as a type
/// (rather than free functions in this module) gives `$crate::dispatch::Logger::...`
/// a stable path for the macros to reference.
pub struct Logger;

impl Logger {
    /// `log_enabled!` / `*_enabled!` implementation: does this level, for
    /// this module, have any chance of reaching a sink right now.
    pub fn is_enabled_for_module(level: Level, module_path: &str) -> bool {
        let cfg = Configuration::active();
        if !cfg.is_output_possible(level) {
            return false;
        }
        level >= cfg.effective_level(module_path)
    }

    /// Entry point for the per-level macros: frame already captured at the
    /// call site.
    pub fn log_with_frame(
        level: Level,
        frame: CallerFrame,
        exception: Option<&(dyn std::error::Error + 'static)>,
        message: MessageInput<'_>,
    ) {
        emit(level, FrameSource::Captured(frame), exception, message);
    }

    /// Entry point for callers without a macro-captured frame (the legacy
    /// facade): `depth` is the number of stack frames to skip past this
    /// call to reach the real caller.
    pub fn log_at_depth(
        level: Level,
        depth: u32,
        exception: Option<&(dyn std::error::Error + 'static)>,
        message: MessageInput<'_>,
    ) {
        emit(level, FrameSource::Depth(depth), exception, message);
    }
}

/// Renders a message, converting a panicking `Display` impl into a
/// `RecordAssemblyError` rather than letting it unwind into user code.
/// `Display::fmt` has no `Result`-based failure channel, so a panic is the
/// only way a hostile or buggy implementation can actually fail.
fn assemble_message(message: &MessageInput<'_>) -> Result<Option<String>, RecordAssemblyError> {
    match message {
        MessageInput::None => Ok(None),
        MessageInput::Value(value) => {
            catch_unwind(AssertUnwindSafe(|| value.to_string()))
                .map(Some)
                .map_err(|_| RecordAssemblyError::new("message-render"))
        }
        MessageInput::Pattern(pattern, args) => {
            catch_unwind(AssertUnwindSafe(|| crate::message::format(pattern, args)))
                .map(Some)
                .map_err(|_| RecordAssemblyError::new("message-render"))
        }
    }
}

fn emit(
    level: Level,
    source: FrameSource,
    exception: Option<&(dyn std::error::Error + 'static)>,
    message: MessageInput<'_>,
) {
    let cfg = Configuration::active();

    // Step 1: cheap early reject, before touching the frame or the message.
    if !cfg.is_output_possible(level) {
        return;
    }

    let needed = cfg.stack_info_needed(level);
    let only_class_name = matches!(needed, crate::config::StackInfoNeeded::ClassNameOnly);

    // A `Captured` frame was already built for free at the macro call site,
    // so it's always kept. A `Depth` frame costs an actual backtrace walk,
    // so it's only resolved when rendering needs it — or when a per-module
    // override is in play, since `effective_level` below needs a real
    // `module_path` to match against, independent of what sinks require.
    let needs_resolution = !matches!(needed, crate::config::StackInfoNeeded::None) || cfg.has_custom_levels();
    let mut frame = match &source {
        FrameSource::Captured(captured) => captured.clone(),
        FrameSource::Depth(_) if needs_resolution => resolve_source(&source, &cfg, only_class_name),
        FrameSource::Depth(_) => CallerFrame::default(),
    };

    // Step 2: custom-level override check needs the module path, which for
    // a `Depth` source only exists once a frame has actually been resolved.
    let module_path = frame.module_path.as_deref().unwrap_or("");
    if cfg.has_custom_levels() && level < cfg.effective_level(module_path) {
        return;
    }

    // Step 3: a sink further down the chain might need the full frame even
    // though the cheap path above only fetched a class name.
    if matches!(needed, crate::config::StackInfoNeeded::FullFrame) && frame.method.is_none() {
        frame = resolve_source(&source, &cfg, false);
    }

    let fields = cfg.required_fields(level);

    let mut record = LogRecord::bare(level);
    if fields.contains(&Field::Timestamp) {
        record.timestamp = Some(std::time::SystemTime::now());
    }
    if fields.contains(&Field::ProcessId) {
        record.process_id = Some(std::process::id());
    }
    if fields.contains(&Field::Thread) {
        record.thread = Some(crate::record::ThreadHandle::current());
    }
    if fields.contains(&Field::ClassName) || fields.contains(&Field::FullFrame) {
        record.module_path = frame.module_path.take();
        record.method = frame.method.take();
        record.file = frame.file.take();
        record.line = frame.line;
    }

    if fields.contains(&Field::Message) {
        match assemble_message(&message) {
            Ok(rendered) => record.rendered_message = rendered,
            Err(err) => {
                InternalLogger::report_record_assembly_error(&err);
                return;
            }
        }
        if let Some(exception) = exception {
            let captured = crate::exception::Exception::capture(exception);
            record.exception = Some(match cfg.plugins().exception_sanitizer.as_ref() {
                Some(sanitizer) => sanitizer.sanitize(captured),
                None => captured,
            });
        }
    }

    let max_stack_trace_elements = cfg.max_stack_trace_elements();
    for (sink_index, entry) in cfg.sink_entries().iter().enumerate() {
        if let Some(floor) = entry.floor {
            if level < floor {
                continue;
            }
        }
        let mut entry_record = record.clone();
        let mut rendered = String::new();
        entry.pattern.render_into(&entry_record, max_stack_trace_elements, &mut rendered);
        entry_record.rendered_text = Some(rendered);

        match cfg.writing_thread() {
            Some(writer) => {
                if writer.enqueue(sink_index, entry_record).is_err() {
                    InternalLogger::report_discarded_enqueue();
                }
            }
            None => {
                if let Err(err) = entry.sink.write(&entry_record) {
                    InternalLogger::report_sink_write_error(&err);
                }
            }
        }
    }
}

/// Generic logging macro the per-level macros (`trace!`..`error!`) forward
/// to. Exposed directly for callers that want to pick the level dynamically.
#[macro_export]
macro_rules! log {
    (level: $level:expr, err: $err:expr, $pattern:expr, $($arg:expr),+ $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            Some($err as &(dyn ::std::error::Error + 'static)),
            $crate::dispatch::MessageInput::Pattern($pattern, &[$(&$arg),+]),
        );
    }};
    (level: $level:expr, err: $err:expr, $pattern:expr $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            Some($err as &(dyn ::std::error::Error + 'static)),
            $crate::dispatch::MessageInput::Value(&$pattern),
        );
    }};
    (level: $level:expr, err: $err:expr $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            Some($err as &(dyn ::std::error::Error + 'static)),
            $crate::dispatch::MessageInput::None,
        );
    }};
    (level: $level:expr, $pattern:expr, $($arg:expr),+ $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            None,
            $crate::dispatch::MessageInput::Pattern($pattern, &[$(&$arg),+]),
        );
    }};
    (level: $level:expr, $value:expr $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            None,
            $crate::dispatch::MessageInput::Value(&$value),
        );
    }};
    (level: $level:expr $(,)?) => {{
        let frame = $crate::record::CallerFrame::captured(
            module_path!(), file!(), line!(),
        );
        $crate::dispatch::Logger::log_with_frame(
            $level,
            frame,
            None,
            $crate::dispatch::MessageInput::None,
        );
    }};
}

/// `log_enabled!(Level::Debug)` — true if a debug-level call at this
/// location has any chance of reaching a sink.
#[macro_export]
macro_rules! log_enabled {
    ($level:expr) => {
        $crate::dispatch::Logger::is_enabled_for_module($level, module_path!())
    };
}

macro_rules! per_level_macro {
    ($name:ident, $enabled:ident, $level:expr) => {
        #[macro_export]
        macro_rules! $name {
            ($($arg:tt)*) => {
                $crate::log!(level: $level, $($arg)*)
            };
        }

        #[macro_export]
        macro_rules! $enabled {
            () => {
                $crate::log_enabled!($level)
            };
        }
    };
}

per_level_macro!(trace, trace_enabled, $crate::level::Level::Trace);
per_level_macro!(debug, debug_enabled, $crate::level::Level::Debug);
per_level_macro!(info, info_enabled, $crate::level::Level::Info);
per_level_macro!(warn, warn_enabled, $crate::level::Level::Warning);
per_level_macro!(error, error_enabled, $crate::level::Level::Error);

#[cfg(test)]
mod test {
    use std::sync::mpsc;

    use crate::config::Configurator;
    use crate::level::Level;
    use crate::sink::ChannelSink;
    use crate::test_support::ACTIVATE_GUARD;

    fn install_channel_sink(pattern: &str, level: Level) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel();
        Configurator::new()
            .level(level)
            .format_pattern(pattern)
            .writer(std::sync::Arc::new(ChannelSink::new(tx)))
            .activate()
            .expect("activation should succeed");
        rx
    }

    #[test]
    fn trace_with_placeholder_renders_substituted_message() {
        let _guard = ACTIVATE_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let rx = install_channel_sink("{message}", Level::Trace);
        crate::trace!("value is {}", 42);
        let line = rx.recv().expect("a record should have been enqueued");
        assert_eq!(line.trim_end(), "value is 42");
    }

    #[test]
    fn override_below_global_disables_module() {
        let _guard = ACTIVATE_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        let (tx, rx) = mpsc::channel();
        Configurator::new()
            .level(Level::Info)
            .level_for(module_path!(), Some(Level::Error))
            .format_pattern("{message}")
            .writer(std::sync::Arc::new(ChannelSink::new(tx)))
            .activate()
            .expect("activation should succeed");

        crate::info!("should be suppressed");
        crate::error!("should pass");

        let line = rx.recv().expect("only the error-level record should arrive");
        assert_eq!(line.trim_end(), "should pass");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn is_enabled_reflects_global_level() {
        let _guard = ACTIVATE_GUARD.lock().unwrap_or_else(|e| e.into_inner());
        Configurator::new().level(Level::Warning).activate().expect("activation should succeed");
        assert!(!crate::debug_enabled!());
        assert!(crate::warn_enabled!());
    }
}
