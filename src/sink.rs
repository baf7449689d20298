//! The sink (writer) contract and the small set of built-in sinks that ship
//! with the crate. Rolling-file, JDBC-style and socket sinks are explicitly
//! out of scope; these four are the ambient minimum needed to exercise and
//! test the dispatch pipeline at all.

use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::sync::mpsc;
use std::sync::Mutex;

use crate::config::Configuration;
use crate::errors::SinkWriteError;
use crate::level::Level;
use crate::record::LogRecord;
use crate::token::Field;

/// Lifecycle and write contract every sink must implement.
pub trait Sink: Send + Sync {
    /// Record fields this sink itself needs, independent of any format
    /// requirements: token requirements are unioned with this set, they
    /// never replace it.
    fn required_fields(&self) -> &[Field] {
        &[]
    }

    /// Optional per-sink severity floor: a record below this level is never
    /// delivered to this sink, regardless of the global/per-module level.
    fn severity_floor(&self) -> Option<Level> {
        None
    }

    /// Called exactly once, before this sink's first `write`, when the
    /// configuration that installs it is published.
    fn init(&self, _config: &Configuration) -> Result<(), crate::errors::PluginInitError> {
        Ok(())
    }

    /// Consumes a fully-rendered record. May fail; a failure is reported via
    /// `InternalLogger` and does not prevent other sinks from being written.
    fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError>;

    /// Flushes any buffered output.
    fn flush(&self) {}

    /// Releases resources. Called only as part of writing-thread shutdown or
    /// explicit caller action.
    fn close(&self) {}
}

fn rendered_text_or_empty(record: &LogRecord) -> &str {
    record.rendered_text.as_deref().unwrap_or("")
}

/// Writes rendered records to stdout.
pub struct StdoutSink {
    stream: Mutex<io::Stdout>,
}

impl Default for StdoutSink {
    fn default() -> Self {
        StdoutSink {
            stream: Mutex::new(io::stdout()),
        }
    }
}

impl Sink for StdoutSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError> {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        stream
            .write_all(rendered_text_or_empty(record).as_bytes())
            .map_err(SinkWriteError::from)
    }

    fn flush(&self) {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        let _ = stream.flush();
    }
}

/// Writes rendered records to stderr.
pub struct StderrSink {
    stream: Mutex<io::Stderr>,
}

impl Default for StderrSink {
    fn default() -> Self {
        StderrSink {
            stream: Mutex::new(io::stderr()),
        }
    }
}

impl Sink for StderrSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError> {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        stream
            .write_all(rendered_text_or_empty(record).as_bytes())
            .map_err(SinkWriteError::from)
    }

    fn flush(&self) {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        let _ = stream.flush();
    }
}

/// Writes rendered records to a buffered file, flushing after every write.
pub struct FileSink {
    stream: Mutex<BufWriter<fs::File>>,
}

impl FileSink {
    /// Opens `path` for appending, creating it if necessary.
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let file = fs::OpenOptions::new()
            .write(true)
            .append(true)
            .create(true)
            .open(path)?;
        Ok(FileSink {
            stream: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Sink for FileSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError> {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        stream.write_all(rendered_text_or_empty(record).as_bytes())?;
        stream.flush()?;
        Ok(())
    }

    fn flush(&self) {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        let _ = stream.flush();
    }
}

/// Forwards rendered records to an `mpsc::Sender<String>`. Mainly useful for
/// tests and for bridging into another channel-based system, the direct
/// for bridging records out to a channel receiver, e.g. in tests.
pub struct ChannelSink {
    sender: Mutex<mpsc::Sender<String>>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        ChannelSink {
            sender: Mutex::new(sender),
        }
    }
}

impl Sink for ChannelSink {
    fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError> {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        sender
            .send(rendered_text_or_empty(record).to_owned())
            .map_err(|_| SinkWriteError::Closed)
    }
}

impl fmt::Debug for ChannelSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSink").finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn channel_sink_delivers_rendered_text() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        let mut record = LogRecord::bare(Level::Info);
        record.rendered_text = Some("hello\n".to_owned());
        sink.write(&record).unwrap();
        assert_eq!(rx.recv().unwrap(), "hello\n");
    }

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let sink = ChannelSink::new(tx);
        let record = LogRecord::bare(Level::Info);
        assert!(matches!(sink.write(&record), Err(SinkWriteError::Closed)));
    }

    #[test]
    fn file_sink_appends_rendered_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = FileSink::open(&path).unwrap();
        let mut record = LogRecord::bare(Level::Info);
        record.rendered_text = Some("line one\n".to_owned());
        sink.write(&record).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "line one\n");
    }
}
