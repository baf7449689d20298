//! Pre-parsed format-pattern tokens and their renderers.
//!
//! A [`FormatPattern`] is produced once, at configuration build time, from a
//! pattern string such as `"{pid}#{thread}#{level}#{message}"`. Each token
//! knows which [`crate::record::LogRecord`] fields it needs, so
//! [`crate::config::Configuration`] can precompute the union of fields any
//! sink at a given level actually requires.

use std::fmt::Write;

use crate::record::LogRecord;

/// A single field a token may need populated on the record before rendering.
///
/// `ClassName` and `FullFrame` are kept distinct because they drive
/// `config::StackInfoNeeded`: a pattern using only `{class}`/`{package}`/
/// `{class_name}` can be satisfied by the cheap class-name-only caller-frame
/// strategy, but `{method}`, `{file}` or `{line}` need a materialised frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    ProcessId,
    Thread,
    ClassName,
    FullFrame,
    Level,
    Message,
}

#[derive(Debug, Clone)]
enum Token {
    Literal(String),
    Pid,
    Thread,
    ThreadId,
    Class,
    Package,
    ClassName,
    Method,
    File,
    Line,
    Level,
    Date(Option<String>),
    Message,
}

impl Token {
    fn required_fields(&self) -> &'static [Field] {
        match self {
            Token::Literal(_) => &[],
            Token::Pid => &[Field::ProcessId],
            Token::Thread | Token::ThreadId => &[Field::Thread],
            Token::Class | Token::Package | Token::ClassName => &[Field::ClassName],
            Token::Method | Token::File | Token::Line => &[Field::FullFrame],
            Token::Level => &[Field::Level],
            Token::Date(_) => &[Field::Timestamp],
            Token::Message => &[Field::Message],
        }
    }

    fn render(&self, record: &LogRecord, max_stack_trace_elements: i64, out: &mut String) {
        match self {
            Token::Literal(text) => out.push_str(text),
            Token::Pid => {
                if let Some(pid) = record.process_id {
                    let _ = write!(out, "{}", pid);
                }
            }
            Token::Thread => {
                if let Some(thread) = &record.thread {
                    out.push_str(thread.name.as_deref().unwrap_or("<unnamed>"));
                }
            }
            Token::ThreadId => {
                if let Some(thread) = &record.thread {
                    let _ = write!(out, "{}", thread.id);
                }
            }
            Token::Class => {
                if let Some(module) = &record.module_path {
                    out.push_str(module);
                }
            }
            Token::Package => {
                if let Some(package) = record.package() {
                    out.push_str(package);
                }
            }
            Token::ClassName => {
                if let Some(class_name) = record.class_name() {
                    out.push_str(class_name);
                }
            }
            Token::Method => {
                if let Some(method) = &record.method {
                    out.push_str(method);
                }
            }
            Token::File => {
                if let Some(file) = &record.file {
                    out.push_str(file);
                }
            }
            Token::Line => {
                if record.line >= 0 {
                    let _ = write!(out, "{}", record.line);
                }
            }
            Token::Level => out.push_str(record.level.as_str()),
            Token::Date(format) => render_date(record, format.as_deref(), out),
            Token::Message => {
                if let Some(message) = &record.rendered_message {
                    out.push_str(message);
                }
                if let Some(exception) = &record.exception {
                    if record.rendered_message.is_some() {
                        out.push('\n');
                    }
                    out.push_str(&exception.render(max_stack_trace_elements));
                }
            }
        }
    }
}

#[cfg(feature = "date-based")]
fn render_date(record: &LogRecord, format: Option<&str>, out: &mut String) {
    if let Some(timestamp) = record.timestamp {
        let datetime: chrono::DateTime<chrono::Local> = timestamp.into();
        let fmt = format.unwrap_or("%Y-%m-%d %H:%M:%S%.3f");
        let _ = write!(out, "{}", datetime.format(fmt));
    }
}

#[cfg(not(feature = "date-based"))]
fn render_date(record: &LogRecord, _format: Option<&str>, out: &mut String) {
    if let Some(timestamp) = record.timestamp {
        if let Ok(elapsed) = timestamp.duration_since(std::time::UNIX_EPOCH) {
            let _ = write!(out, "{}", elapsed.as_secs());
        }
    }
}

/// Platform line terminator appended after each sink's rendered text
/// after every sink's rendered text.
#[cfg(windows)]
pub const LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_TERMINATOR: &str = "\n";

/// A parsed, ready-to-render format pattern: a sequence of literal text and
/// typed tokens, plus the union of record fields it needs.
#[derive(Debug, Clone)]
pub struct FormatPattern {
    tokens: Vec<Token>,
    required_fields: Vec<Field>,
}

impl FormatPattern {
    /// Parses `pattern` into a token sequence. `{token}` and `{token:options}`
    /// are recognized; unknown tokens are kept as literal text (matching
    /// unknown tokens are kept as literal text rather than rejected.
    pub fn parse(pattern: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            if ch != '{' {
                literal.push(ch);
                continue;
            }
            // find the matching close brace
            let mut end = None;
            let mut scan = chars.clone();
            while let Some((idx, c)) = scan.next() {
                if c == '}' {
                    end = Some(idx);
                    break;
                }
            }
            match end {
                Some(end_idx) => {
                    let body = &pattern[start + 1..end_idx];
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(parse_token(body));
                    // advance `chars` past the consumed body and closing brace
                    while let Some(&(idx, _)) = chars.peek() {
                        if idx > end_idx {
                            break;
                        }
                        chars.next();
                    }
                }
                None => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        let mut required_fields: Vec<Field> = tokens
            .iter()
            .flat_map(|t| t.required_fields().iter().copied())
            .collect();
        required_fields.sort_by_key(|f| *f as u8);
        required_fields.dedup();

        FormatPattern {
            tokens,
            required_fields,
        }
    }

    /// The union of record fields any token in this pattern requires.
    pub fn required_fields(&self) -> &[Field] {
        &self.required_fields
    }

    /// Concatenates every token's rendering into `out`, then appends the
    /// platform line terminator.
    pub fn render_into(&self, record: &LogRecord, max_stack_trace_elements: i64, out: &mut String) {
        for token in &self.tokens {
            token.render(record, max_stack_trace_elements, out);
        }
        out.push_str(LINE_TERMINATOR);
    }
}

fn parse_token(body: &str) -> Token {
    let (name, options) = match body.find(':') {
        Some(idx) => (&body[..idx], Some(body[idx + 1..].to_owned())),
        None => (body, None),
    };
    match name {
        "pid" => Token::Pid,
        "thread" => Token::Thread,
        "thread_id" => Token::ThreadId,
        "class" => Token::Class,
        "package" => Token::Package,
        "class_name" => Token::ClassName,
        "method" => Token::Method,
        "file" => Token::File,
        "line" => Token::Line,
        "level" => Token::Level,
        "date" => Token::Date(options),
        "message" => Token::Message,
        _ => Token::Literal(format!("{{{}}}", body)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::level::Level;

    fn record_with_pid(pid: u32) -> LogRecord {
        let mut record = LogRecord::bare(Level::Info);
        record.process_id = Some(pid);
        record
    }

    #[test]
    fn pid_pattern_renders_pid_and_newline() {
        let pattern = FormatPattern::parse("{pid}");
        let record = record_with_pid(1234);
        let mut out = String::new();
        pattern.render_into(&record, -1, &mut out);
        assert_eq!(out, format!("1234{}", LINE_TERMINATOR));
    }

    #[test]
    fn package_of_nested_class() {
        let pattern = FormatPattern::parse("{package}");
        let mut record = LogRecord::bare(Level::Info);
        record.module_path = Some("com::test::MyClass".to_owned());
        let mut out = String::new();
        pattern.render_into(&record, -1, &mut out);
        assert_eq!(out, format!("com::test{}", LINE_TERMINATOR));
    }

    #[test]
    fn package_of_bare_class_is_empty() {
        let pattern = FormatPattern::parse("{package}");
        let mut record = LogRecord::bare(Level::Info);
        record.module_path = Some("MyClass".to_owned());
        let mut out = String::new();
        pattern.render_into(&record, -1, &mut out);
        assert_eq!(out, LINE_TERMINATOR);
    }

    #[test]
    fn full_pattern_concatenates_with_hash() {
        let pattern = FormatPattern::parse(
            "{pid}#{thread}#{thread_id}#{class}#{package}#{class_name}#{method}#{file}#{line}#{level}#{message}",
        );
        let mut record = LogRecord::bare(Level::Error);
        record.process_id = Some(42);
        record.thread = Some(crate::record::ThreadHandle {
            id: 7,
            name: Some("main".to_owned()),
        });
        record.module_path = Some("com::test::MyClass".to_owned());
        record.method = Some("run".to_owned());
        record.file = Some("my_class.rs".to_owned());
        record.line = 10;
        record.rendered_message = Some("boom".to_owned());

        let mut out = String::new();
        pattern.render_into(&record, -1, &mut out);
        assert_eq!(
            out,
            format!(
                "42#main#7#com::test::MyClass#com::test#MyClass#run#my_class.rs#10#ERROR#boom{}",
                LINE_TERMINATOR
            )
        );
    }

    #[test]
    fn required_fields_are_unioned_and_deduped() {
        let pattern = FormatPattern::parse("{line} {file} {message}");
        let fields = pattern.required_fields();
        assert!(fields.contains(&Field::FullFrame));
        assert!(fields.contains(&Field::Message));
        assert_eq!(fields.iter().filter(|f| **f == Field::FullFrame).count(), 1);
    }
}
