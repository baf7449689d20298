//! Composable plugin interfaces for caller-frame discovery and exception
//! sanitization.
//!
//! A configuration holds at most one head instance per interface. Adding a
//! second instance wraps the current head in a two-link chain rather than
//! replacing it; the older instance always runs first.

use std::sync::Arc;

use crate::exception::Exception;
use crate::record::CallerFrame;

/// Supplies a caller frame at `depth` frames above the call site. Returning
/// `None` falls through to the next strategy in `frame::resolve`'s ladder.
pub trait StackFrameProvider: Send + Sync {
    fn get(&self, depth: u32, only_class_name: bool) -> Option<CallerFrame>;
}

/// Rewrites a captured exception before it is attached to a record.
pub trait ExceptionSanitizer: Send + Sync {
    fn sanitize(&self, exception: Exception) -> Exception;
}

/// An installable unit that may implement either or both plugin interfaces.
/// `Configurator::add_plugin` chains whichever of these an instance
/// overrides into the matching interface's chain.
pub trait Plugin: Send + Sync {
    fn as_frame_provider(self: Arc<Self>) -> Option<Arc<dyn StackFrameProvider>> {
        None
    }

    fn as_exception_sanitizer(self: Arc<Self>) -> Option<Arc<dyn ExceptionSanitizer>> {
        None
    }
}

struct ChainedFrameProvider {
    older: Arc<dyn StackFrameProvider>,
    newer: Arc<dyn StackFrameProvider>,
}

impl StackFrameProvider for ChainedFrameProvider {
    fn get(&self, depth: u32, only_class_name: bool) -> Option<CallerFrame> {
        // This wrapper is itself one call frame; bump depth by one so both
        // links see the same user call site they would if invoked directly.
        self.older
            .get(depth + 1, only_class_name)
            .or_else(|| self.newer.get(depth + 1, only_class_name))
    }
}

struct ChainedSanitizer {
    older: Arc<dyn ExceptionSanitizer>,
    newer: Arc<dyn ExceptionSanitizer>,
}

impl ExceptionSanitizer for ChainedSanitizer {
    fn sanitize(&self, exception: Exception) -> Exception {
        // No short-circuit: both links always run, in registration order.
        self.newer.sanitize(self.older.sanitize(exception))
    }
}

/// Chains `new_provider` behind `existing` (if any). `existing` runs first.
pub fn chain_frame_provider(
    existing: Option<Arc<dyn StackFrameProvider>>,
    new_provider: Arc<dyn StackFrameProvider>,
) -> Arc<dyn StackFrameProvider> {
    match existing {
        Some(older) => Arc::new(ChainedFrameProvider {
            older,
            newer: new_provider,
        }),
        None => new_provider,
    }
}

/// Chains `new_sanitizer` behind `existing` (if any). `existing` runs first.
pub fn chain_exception_sanitizer(
    existing: Option<Arc<dyn ExceptionSanitizer>>,
    new_sanitizer: Arc<dyn ExceptionSanitizer>,
) -> Arc<dyn ExceptionSanitizer> {
    match existing {
        Some(older) => Arc::new(ChainedSanitizer {
            older,
            newer: new_sanitizer,
        }),
        None => new_sanitizer,
    }
}

/// The plugin chain snapshot carried by a [`crate::config::Configuration`].
#[derive(Clone, Default)]
pub struct PluginChain {
    pub frame_provider: Option<Arc<dyn StackFrameProvider>>,
    pub exception_sanitizer: Option<Arc<dyn ExceptionSanitizer>>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::level::Level;
    use std::error::Error as StdError;
    use std::fmt;

    struct FixedFrame(&'static str);
    impl StackFrameProvider for FixedFrame {
        fn get(&self, _depth: u32, _only_class_name: bool) -> Option<CallerFrame> {
            Some(CallerFrame::class_name_only(self.0))
        }
    }

    struct AlwaysNone;
    impl StackFrameProvider for AlwaysNone {
        fn get(&self, _depth: u32, _only_class_name: bool) -> Option<CallerFrame> {
            None
        }
    }

    #[test]
    fn chained_provider_prefers_older_result() {
        let older: Arc<dyn StackFrameProvider> = Arc::new(FixedFrame("older::Class"));
        let newer: Arc<dyn StackFrameProvider> = Arc::new(FixedFrame("newer::Class"));
        let chain = chain_frame_provider(Some(older), newer);
        let frame = chain.get(0, true).unwrap();
        assert_eq!(frame.module_path.as_deref(), Some("older::Class"));
    }

    #[test]
    fn chained_provider_falls_through_on_none() {
        let older: Arc<dyn StackFrameProvider> = Arc::new(AlwaysNone);
        let newer: Arc<dyn StackFrameProvider> = Arc::new(FixedFrame("newer::Class"));
        let chain = chain_frame_provider(Some(older), newer);
        let frame = chain.get(0, true).unwrap();
        assert_eq!(frame.module_path.as_deref(), Some("newer::Class"));
    }

    #[derive(Debug)]
    struct Dummy;
    impl fmt::Display for Dummy {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "dummy")
        }
    }
    impl StdError for Dummy {}

    struct Tag(&'static str);
    impl ExceptionSanitizer for Tag {
        fn sanitize(&self, exception: Exception) -> Exception {
            let mut causes = exception.causes().to_vec();
            causes[0] = format!("{}({})", self.0, causes[0]);
            Exception::from_messages(causes)
        }
    }

    #[test]
    fn sanitizer_chain_applies_in_registration_order() {
        let s1: Arc<dyn ExceptionSanitizer> = Arc::new(Tag("S1"));
        let s2: Arc<dyn ExceptionSanitizer> = Arc::new(Tag("S2"));
        let chain = chain_exception_sanitizer(Some(s1), s2);
        let exc = Exception::capture(&Dummy);
        let sanitized = chain.sanitize(exc);
        assert_eq!(sanitized.message(), "S2(S1(dummy))");
        let _ = Level::Info;
    }
}
