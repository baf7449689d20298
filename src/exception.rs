//! Exception representation carried on a [`crate::record::LogRecord`].
//!
//! Rust has no single universal "throwable" type, so callers hand the
//! dispatcher anything implementing [`std::error::Error`] and it is captured
//! here as a cause chain, the same shape `std::error::Error::source()`
//! already exposes.

use std::error::Error as StdError;
use std::fmt;

/// A captured error plus its full `source()` chain, post-sanitizer.
#[derive(Debug, Clone)]
pub struct Exception {
    /// Display of the error itself, then each `source()` in order.
    causes: Vec<String>,
}

impl Exception {
    /// Captures `err` and walks its `source()` chain to completion.
    pub fn capture(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = vec![err.to_string()];
        let mut current = err.source();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }
        Exception { causes }
    }

    /// Builds an exception from an already-rendered cause chain. Used by
    /// [`crate::plugins::ExceptionSanitizer`] implementations that rewrite
    /// messages rather than wrapping a live error.
    pub fn from_messages(causes: Vec<String>) -> Self {
        Exception { causes }
    }

    /// The top-level error's message.
    pub fn message(&self) -> &str {
        self.causes.first().map(String::as_str).unwrap_or("")
    }

    /// The full cause chain, outermost first.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Renders the chain as `{kind}`-style text, capped at `max_elements`
    /// causes (`-1` = unbounded, `0` = just the top-level message).
    pub fn render(&self, max_elements: i64) -> String {
        if max_elements == 0 {
            return self.message().to_owned();
        }
        let take = if max_elements < 0 {
            self.causes.len()
        } else {
            (max_elements as usize).min(self.causes.len())
        };
        let mut out = String::new();
        for (i, cause) in self.causes.iter().take(take).enumerate() {
            if i > 0 {
                out.push_str("\nCaused by: ");
            }
            out.push_str(cause);
        }
        out
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(-1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Root;
    impl fmt::Display for Root {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "root cause")
        }
    }
    impl StdError for Root {}

    #[derive(Debug)]
    struct Wrapper(Root);
    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "wrapped failure")
        }
    }
    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn captures_full_cause_chain() {
        let err = Wrapper(Root);
        let exc = Exception::capture(&err);
        assert_eq!(exc.causes(), ["wrapped failure", "root cause"]);
    }

    #[test]
    fn render_bounds_depth() {
        let err = Wrapper(Root);
        let exc = Exception::capture(&err);
        assert_eq!(exc.render(0), "wrapped failure");
        assert_eq!(exc.render(1), "wrapped failure");
        assert!(exc.render(-1).contains("root cause"));
    }
}
