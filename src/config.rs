//! Immutable configuration snapshots and the builder that produces them
//! (`Configuration` and the `Configurator` builder that produces it).
//!
//! The active snapshot is the only mutable process-wide state in the
//! crate. It lives behind an [`arc_swap::ArcSwap`]: readers do a single
//! acquire-load per emission (`Configuration::active`), writers do a single
//! release-store on `activate`. A retired snapshot stays valid for any
//! emission that already holds an `Arc` to it.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use crate::errors::PluginInitError;
use crate::level::Level;
use crate::plugins::{chain_exception_sanitizer, chain_frame_provider};
use crate::plugins::{ExceptionSanitizer, Plugin, PluginChain, StackFrameProvider};
use crate::sink::Sink;
use crate::token::{Field, FormatPattern};
use crate::writer_thread::{ThreadPriority, WritingThread};

/// How much caller-frame information a given level's active sinks need,
/// precomputed at `activate()` time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackInfoNeeded {
    None,
    ClassNameOnly,
    FullFrame,
}

/// One installed sink plus its resolved floor and format pattern.
pub struct SinkEntry {
    pub sink: Arc<dyn Sink>,
    pub floor: Option<Level>,
    pub pattern: Arc<FormatPattern>,
}

fn level_index(level: Level) -> usize {
    Level::ALL
        .iter()
        .position(|l| *l == level)
        .expect("level_index called with Level::Off")
}

fn matches_prefix(class_path: &str, prefix: &str) -> bool {
    class_path == prefix || class_path.starts_with(&format!("{}::", prefix))
}

fn stack_info_for(fields: &[Field]) -> StackInfoNeeded {
    if fields.contains(&Field::FullFrame) {
        StackInfoNeeded::FullFrame
    } else if fields.contains(&Field::ClassName) {
        StackInfoNeeded::ClassNameOnly
    } else {
        StackInfoNeeded::None
    }
}

/// An immutable configuration snapshot.
pub struct Configuration {
    global_level: Level,
    custom_levels: HashMap<String, Level>,
    has_custom_levels: bool,
    /// Parallel to `sink_entries`, shared with the writing thread so both
    /// index sinks identically.
    sinks: Arc<Vec<Arc<dyn Sink>>>,
    sink_entries: Vec<SinkEntry>,
    required_fields: [Vec<Field>; 5],
    stack_info_needed: [StackInfoNeeded; 5],
    output_possible: [bool; 5],
    writing_thread: Option<Arc<WritingThread>>,
    plugins: PluginChain,
    max_stack_trace_elements: i64,
}

impl Configuration {
    fn disabled() -> Configuration {
        Configuration {
            global_level: Level::Off,
            custom_levels: HashMap::new(),
            has_custom_levels: false,
            sinks: Arc::new(Vec::new()),
            sink_entries: Vec::new(),
            required_fields: Default::default(),
            stack_info_needed: [StackInfoNeeded::None; 5],
            output_possible: [false; 5],
            writing_thread: None,
            plugins: PluginChain::default(),
            max_stack_trace_elements: -1,
        }
    }

    /// The process-wide active snapshot. A single acquire-load; the only
    /// synchronisation point on the hot path.
    pub fn active() -> Arc<Configuration> {
        ACTIVE.load_full()
    }

    fn publish(new: Arc<Configuration>) {
        ACTIVE.store(new);
    }

    pub fn global_level(&self) -> Level {
        self.global_level
    }

    pub fn has_custom_levels(&self) -> bool {
        self.has_custom_levels
    }

    pub fn max_stack_trace_elements(&self) -> i64 {
        self.max_stack_trace_elements
    }

    pub fn plugins(&self) -> &PluginChain {
        &self.plugins
    }

    pub fn writing_thread(&self) -> Option<&Arc<WritingThread>> {
        self.writing_thread.as_ref()
    }

    pub fn sink_entries(&self) -> &[SinkEntry] {
        &self.sink_entries
    }

    pub fn sink_handles(&self) -> &Arc<Vec<Arc<dyn Sink>>> {
        &self.sinks
    }

    /// `false` iff no sink can accept a record at `level` (`Off` is never
    /// possible).
    pub fn is_output_possible(&self, level: Level) -> bool {
        if level == Level::Off {
            return false;
        }
        self.output_possible[level_index(level)]
    }

    pub fn required_fields(&self, level: Level) -> &[Field] {
        &self.required_fields[level_index(level)]
    }

    pub fn stack_info_needed(&self, level: Level) -> StackInfoNeeded {
        self.stack_info_needed[level_index(level)]
    }

    /// Longest-prefix match of `class_path` (a `::`-delimited dotted name)
    /// against the custom-level overrides, falling back to `global_level`.
    pub fn effective_level(&self, class_path: &str) -> Level {
        if !self.has_custom_levels {
            return self.global_level;
        }
        let mut best: Option<(&str, Level)> = None;
        for (prefix, level) in &self.custom_levels {
            if matches_prefix(class_path, prefix) && best.map_or(true, |(b, _)| prefix.len() > b.len()) {
                best = Some((prefix.as_str(), *level));
            }
        }
        best.map(|(_, level)| level).unwrap_or(self.global_level)
    }
}

static ACTIVE: Lazy<ArcSwap<Configuration>> = Lazy::new(|| ArcSwap::from_pointee(Configuration::disabled()));

struct SinkSpec {
    sink: Arc<dyn Sink>,
    floor: Option<Level>,
    pattern: Arc<FormatPattern>,
}

/// Builder producing a [`Configuration`] and publishing it atomically
/// (immutable snapshot production and atomic publish).
pub struct Configurator {
    global_level: Level,
    custom_levels: HashMap<String, Level>,
    sink_specs: Vec<SinkSpec>,
    current_pattern: Arc<FormatPattern>,
    writing_thread_request: Option<(Option<usize>, bool, ThreadPriority)>,
    max_stack_trace_elements: i64,
    frame_provider: Option<Arc<dyn StackFrameProvider>>,
    exception_sanitizer: Option<Arc<dyn ExceptionSanitizer>>,
}

impl Default for Configurator {
    fn default() -> Self {
        Configurator {
            global_level: Level::Info,
            custom_levels: HashMap::new(),
            sink_specs: Vec::new(),
            current_pattern: Arc::new(FormatPattern::parse("{level} {message}")),
            writing_thread_request: None,
            max_stack_trace_elements: -1,
            frame_provider: None,
            exception_sanitizer: None,
        }
    }
}

impl Configurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global level.
    pub fn level(mut self, level: Level) -> Self {
        self.global_level = level;
        self
    }

    /// Overrides the effective level for a class or package prefix.
    /// `None` removes a previously-set override.
    pub fn level_for(mut self, class_or_package: impl Into<String>, level: Option<Level>) -> Self {
        let key = class_or_package.into();
        match level {
            Some(level) => {
                self.custom_levels.insert(key, level);
            }
            None => {
                self.custom_levels.remove(&key);
            }
        }
        self
    }

    /// Adds a sink using the pattern set by the most recent `format_pattern`
    /// call (or the default pattern if none was set).
    pub fn writer(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink_specs.push(SinkSpec {
            sink,
            floor: None,
            pattern: Arc::clone(&self.current_pattern),
        });
        self
    }

    /// As `writer`, with a per-sink severity floor.
    pub fn writer_with_floor(mut self, sink: Arc<dyn Sink>, floor: Level) -> Self {
        self.sink_specs.push(SinkSpec {
            sink,
            floor: Some(floor),
            pattern: Arc::clone(&self.current_pattern),
        });
        self
    }

    pub fn remove_all_writers(mut self) -> Self {
        self.sink_specs.clear();
        self
    }

    /// Parses `pattern` and applies it to every `writer`/`writer_with_floor`
    /// call that follows.
    pub fn format_pattern(mut self, pattern: &str) -> Self {
        self.current_pattern = Arc::new(FormatPattern::parse(pattern));
        self
    }

    /// Enables async dispatch with an unbounded queue.
    pub fn writing_thread(mut self, daemon: bool, priority: ThreadPriority) -> Self {
        self.writing_thread_request = Some((None, daemon, priority));
        self
    }

    /// Enables async dispatch with a bounded queue; producers block when
    /// full.
    pub fn writing_thread_bounded(mut self, capacity: usize, daemon: bool, priority: ThreadPriority) -> Self {
        self.writing_thread_request = Some((Some(capacity), daemon, priority));
        self
    }

    pub fn max_stack_trace_elements(mut self, n: i64) -> Self {
        self.max_stack_trace_elements = n;
        self
    }

    /// Chains `plugin` into every plugin interface it implements. The
    /// previously-registered instance for that interface, if any, runs
    /// first.
    pub fn add_plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        if let Some(provider) = Arc::clone(&plugin).as_frame_provider() {
            self.frame_provider = Some(chain_frame_provider(self.frame_provider.take(), provider));
        }
        if let Some(sanitizer) = plugin.as_exception_sanitizer() {
            self.exception_sanitizer = Some(chain_exception_sanitizer(self.exception_sanitizer.take(), sanitizer));
        }
        self
    }

    /// Builds the `Configuration`, initializes newly-added sinks exactly
    /// once, and publishes it atomically. On `Err`, the previous snapshot
    /// remains active.
    pub fn activate(self) -> Result<Arc<Configuration>, PluginInitError> {
        let previous = Configuration::active();
        let sinks: Vec<Arc<dyn Sink>> = self.sink_specs.iter().map(|spec| Arc::clone(&spec.sink)).collect();
        let config = Arc::new(build_configuration(&self, sinks.clone()));

        for sink in new_sinks(&previous, &sinks) {
            sink.init(&config)?;
        }

        Configuration::publish(Arc::clone(&config));
        Ok(config)
    }
}

/// Sinks present in the new set but not (by pointer identity) in the
/// previous configuration's set — these get `init` called exactly once.
fn new_sinks<'a>(previous: &Configuration, sinks: &'a [Arc<dyn Sink>]) -> Vec<&'a Arc<dyn Sink>> {
    sinks
        .iter()
        .filter(|sink| {
            !previous
                .sink_handles()
                .iter()
                .any(|existing| Arc::ptr_eq(existing, sink))
        })
        .collect()
}

fn build_configuration(configurator: &Configurator, sinks: Vec<Arc<dyn Sink>>) -> Configuration {
    // A sink's own declared floor and the Configurator's `writer_with_floor`
    // floor both gate delivery; the stricter (higher) of the two wins.
    let sink_entries: Vec<SinkEntry> = configurator
        .sink_specs
        .iter()
        .map(|spec| SinkEntry {
            floor: match (spec.floor, spec.sink.severity_floor()) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            sink: Arc::clone(&spec.sink),
            pattern: Arc::clone(&spec.pattern),
        })
        .collect();

    let sinks_arc = Arc::new(sinks);

    let mut required_fields: [Vec<Field>; 5] = Default::default();
    let mut stack_info_needed = [StackInfoNeeded::None; 5];
    let mut output_possible = [false; 5];

    for (i, level) in Level::ALL.iter().enumerate() {
        let mut fields: Vec<Field> = Vec::new();
        let mut possible = false;
        for entry in &sink_entries {
            if entry.floor.map_or(true, |floor| *level >= floor) {
                possible = true;
                fields.extend_from_slice(entry.pattern.required_fields());
                fields.extend_from_slice(entry.sink.required_fields());
            }
        }
        fields.sort_by_key(|f| *f as u8);
        fields.dedup();
        stack_info_needed[i] = stack_info_for(&fields);
        required_fields[i] = fields;
        output_possible[i] = possible;
    }

    let writing_thread = configurator.writing_thread_request.map(|(capacity, daemon, priority)| {
        Arc::new(WritingThread::spawn(Arc::clone(&sinks_arc), capacity, daemon, priority))
    });

    Configuration {
        global_level: configurator.global_level,
        has_custom_levels: !configurator.custom_levels.is_empty(),
        custom_levels: configurator.custom_levels.clone(),
        sinks: sinks_arc,
        sink_entries,
        required_fields,
        stack_info_needed,
        output_possible,
        writing_thread,
        plugins: PluginChain {
            frame_provider: configurator.frame_provider.clone(),
            exception_sanitizer: configurator.exception_sanitizer.clone(),
        },
        max_stack_trace_elements: configurator.max_stack_trace_elements,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::SinkWriteError;
    use crate::record::LogRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);
    impl Sink for CountingSink {
        fn init(&self, _config: &Configuration) -> Result<(), PluginInitError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn write(&self, _record: &LogRecord) -> Result<(), SinkWriteError> {
            Ok(())
        }
    }

    #[test]
    fn zero_sinks_disables_every_level() {
        let config = build_configuration(&Configurator::new().level(Level::Trace), Vec::new());
        for level in Level::ALL {
            assert!(!config.is_output_possible(level));
        }
    }

    #[test]
    fn per_sink_floor_gates_lower_levels() {
        let sink: Arc<dyn Sink> = Arc::new(CountingSink(AtomicUsize::new(0)));
        let configurator = Configurator::new().level(Level::Trace).writer_with_floor(Arc::clone(&sink), Level::Info);
        let config = build_configuration(&configurator, vec![sink]);
        assert!(!config.is_output_possible(Level::Debug));
        assert!(config.is_output_possible(Level::Info));
        assert!(config.is_output_possible(Level::Error));
    }

    #[test]
    fn longest_prefix_override_resolves_correctly() {
        let configurator = Configurator::new()
            .level(Level::Error)
            .level_for("a", Some(Level::Warning))
            .level_for("a::b", Some(Level::Debug));
        let config = build_configuration(&configurator, Vec::new());
        assert_eq!(config.effective_level("a::b::C"), Level::Debug);
        assert_eq!(config.effective_level("a::X"), Level::Warning);
        assert_eq!(config.effective_level("z::X"), Level::Error);
    }

    #[test]
    fn init_runs_once_for_a_newly_added_sink_and_is_skipped_on_reactivation() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let sink_dyn: Arc<dyn Sink> = sink.clone() as Arc<dyn Sink>;

        let previous = Configuration::disabled();
        let config1 = build_configuration(&Configurator::new().writer(Arc::clone(&sink_dyn)), vec![Arc::clone(&sink_dyn)]);
        let added = new_sinks(&previous, config1.sink_handles());
        assert_eq!(added.len(), 1);
        for s in &added {
            s.init(&config1).unwrap();
        }
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);

        // Reactivating with the same sink instance must not re-init it.
        let config2 = build_configuration(&Configurator::new().writer(Arc::clone(&sink_dyn)), vec![Arc::clone(&sink_dyn)]);
        let added_again = new_sinks(&config1, config2.sink_handles());
        assert!(added_again.is_empty());
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }
}
