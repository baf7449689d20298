//! The asynchronous writing thread.
//!
//! A single-consumer FIFO queue of `(sink index, record)` pairs, bounded or
//! unbounded, with a `Running -> Draining -> Terminated` shutdown handshake.
//! No transition runs backward.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::internal::InternalLogger;
use crate::record::LogRecord;
use crate::sink::Sink;

const RUNNING: u8 = 0;
const DRAINING: u8 = 1;
const TERMINATED: u8 = 2;

/// Best-effort priority hint for the writer thread's OS thread. Rust's `std`
/// has no portable thread-priority API, so this only affects the thread's
/// name; it is not wired into scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPriority {
    Low,
    Normal,
    High,
}

impl ThreadPriority {
    fn tag(self) -> &'static str {
        match self {
            ThreadPriority::Low => "low",
            ThreadPriority::Normal => "normal",
            ThreadPriority::High => "high",
        }
    }
}

enum Item {
    Record { sink_index: usize, record: LogRecord },
    Shutdown,
}

enum QueueSender {
    Bounded(SyncSender<Item>),
    Unbounded(Sender<Item>),
}

impl QueueSender {
    fn send(&self, item: Item) -> Result<(), ()> {
        match self {
            QueueSender::Bounded(tx) => tx.send(item).map_err(|_| ()),
            QueueSender::Unbounded(tx) => tx.send(item).map_err(|_| ()),
        }
    }
}

/// The background consumer that performs sink writes when async dispatch is
/// enabled (`Configurator::writing_thread`).
pub struct WritingThread {
    sender: QueueSender,
    state: Arc<AtomicU8>,
    handle: Mutex<Option<JoinHandle<()>>>,
    /// Rust threads already don't block process exit (the closest analogue
    /// to a JVM daemon thread). A non-daemon writer instead joins on drop,
    /// so dropping the last handle to it guarantees delivery.
    daemon: bool,
}

impl WritingThread {
    /// Spawns the consumer thread against `sinks`, indexed the same way the
    /// owning `Configuration`'s sink list is. `capacity` bounds the queue
    /// (producers block when full, the crate's default); `None` is
    /// unbounded.
    pub fn spawn(
        sinks: Arc<Vec<Arc<dyn Sink>>>,
        capacity: Option<usize>,
        daemon: bool,
        priority: ThreadPriority,
    ) -> WritingThread {
        let (sender, receiver) = match capacity {
            Some(cap) => {
                let (tx, rx) = mpsc::sync_channel(cap);
                (QueueSender::Bounded(tx), rx)
            }
            None => {
                let (tx, rx) = mpsc::channel();
                (QueueSender::Unbounded(tx), rx)
            }
        };
        let state = Arc::new(AtomicU8::new(RUNNING));
        let consumer_state = Arc::clone(&state);

        let handle = std::thread::Builder::new()
            .name(format!("emberlog-writer-{}", priority.tag()))
            .spawn(move || consume(receiver, sinks, consumer_state))
            .expect("failed to spawn writing thread");

        WritingThread {
            sender,
            state,
            handle: Mutex::new(Some(handle)),
            daemon,
        }
    }

    /// Enqueues a record for delivery to `sinks[sink_index]`. Returns
    /// `Err(())` when the queue is not `Running`; the dispatcher reports
    /// that case via `InternalLogger` rather than raising to the caller.
    pub fn enqueue(&self, sink_index: usize, record: LogRecord) -> Result<(), ()> {
        if self.state.load(Ordering::Acquire) != RUNNING {
            return Err(());
        }
        self.sender.send(Item::Record { sink_index, record })
    }

    /// Transitions `Running -> Draining` and wakes the consumer to drain and
    /// exit. Idempotent; subsequent calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(RUNNING, DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _ = self.sender.send(Item::Shutdown);
        }
    }

    /// Blocks until the consumer thread has exited.
    pub fn join(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state.load(Ordering::Acquire) == TERMINATED
    }
}

impl Drop for WritingThread {
    fn drop(&mut self) {
        if !self.daemon {
            self.shutdown();
            self.join();
        }
    }
}

fn consume(receiver: Receiver<Item>, sinks: Arc<Vec<Arc<dyn Sink>>>, state: Arc<AtomicU8>) {
    let mut touched = vec![false; sinks.len()];
    for item in receiver.iter() {
        match item {
            Item::Record { sink_index, record } => {
                if let Some(sink) = sinks.get(sink_index) {
                    touched[sink_index] = true;
                    if let Err(err) = sink.write(&record) {
                        InternalLogger::report_sink_write_error(&err);
                    }
                }
            }
            Item::Shutdown => break,
        }
    }
    for (index, sink) in sinks.iter().enumerate() {
        if touched[index] {
            sink.flush();
            sink.close();
        }
    }
    state.store(TERMINATED, Ordering::Release);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::SinkWriteError;
    use crate::level::Level;
    use std::sync::mpsc::channel as std_channel;
    use std::sync::mpsc::Sender as StdSender;

    struct RecordingSink(Mutex<StdSender<String>>);
    impl Sink for RecordingSink {
        fn write(&self, record: &LogRecord) -> Result<(), SinkWriteError> {
            let tx = self.0.lock().unwrap();
            tx.send(record.rendered_text.clone().unwrap_or_default()).unwrap();
            Ok(())
        }
    }

    #[test]
    fn delivers_records_in_enqueue_order_and_terminates_on_shutdown() {
        let (tx, rx) = std_channel();
        let sinks: Arc<Vec<Arc<dyn Sink>>> = Arc::new(vec![Arc::new(RecordingSink(Mutex::new(tx)))]);
        let writer = WritingThread::spawn(sinks, None, true, ThreadPriority::Normal);

        for i in 0..5 {
            let mut record = LogRecord::bare(Level::Info);
            record.rendered_text = Some(i.to_string());
            writer.enqueue(0, record).unwrap();
        }
        writer.shutdown();
        writer.join();

        let received: Vec<String> = rx.try_iter().collect();
        assert_eq!(received, vec!["0", "1", "2", "3", "4"]);
        assert!(writer.is_terminated());
    }

    #[test]
    fn enqueue_after_shutdown_is_rejected() {
        let sinks: Arc<Vec<Arc<dyn Sink>>> = Arc::new(Vec::new());
        let writer = WritingThread::spawn(sinks, None, true, ThreadPriority::Normal);
        writer.shutdown();
        let record = LogRecord::bare(Level::Info);
        assert!(writer.enqueue(0, record).is_err());
        writer.join();
    }

    #[test]
    fn non_daemon_writer_joins_on_drop() {
        let (tx, rx) = std_channel();
        let sinks: Arc<Vec<Arc<dyn Sink>>> = Arc::new(vec![Arc::new(RecordingSink(Mutex::new(tx)))]);
        let writer = WritingThread::spawn(sinks, None, false, ThreadPriority::Normal);
        let mut record = LogRecord::bare(Level::Info);
        record.rendered_text = Some("only".to_owned());
        writer.enqueue(0, record).unwrap();
        drop(writer);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["only"]);
    }
}
