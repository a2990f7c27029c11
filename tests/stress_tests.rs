//! Stress tests for the writing thread
//!
//! These tests verify:
//! - Producers block while the queue is full instead of dropping entries
//! - Everything queued before shutdown is written exactly once
//! - Failing and panicking writers never stop other writers
//! - Thread safety under concurrent high-volume logging

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use rust_log_backend::core::{InternalLogger, INTERNAL_TAG};
use rust_log_backend::prelude::*;
use rust_log_backend::writing_thread::{WritingThread, THREAD_NAME};
use rust_log_backend::{error, info};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct CollectingWriter {
    messages: Mutex<Vec<String>>,
}

impl Writer for CollectingWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::of(&[LogEntryValue::Message])
    }
    fn write(&self, entry: &LogEntry) -> Result<()> {
        self.messages
            .lock()
            .push(entry.message.clone().unwrap_or_default());
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "collecting"
    }
}

/// Writer that blocks every write until the gate is opened or dropped
struct GatedWriter {
    gate: Receiver<()>,
    written: AtomicUsize,
}

impl Writer for GatedWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        let _ = self.gate.recv();
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "gated"
    }
}

struct FailingWriter {
    calls: AtomicUsize,
}

impl Writer for FailingWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst);
        if calls % 2 == 0 {
            Err(LoggerError::writer("disk full"))
        } else {
            panic!("writer exploded");
        }
    }
    fn flush(&self) -> Result<()> {
        Err(LoggerError::writer("cannot flush"))
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "failing"
    }
}

struct RejectingWriter;

impl Writer for RejectingWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        Err(LoggerError::writer("disk full"))
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "rejecting"
    }
}

/// Writer that records untagged messages and counts writes after close
struct ClosableWriter {
    messages: Mutex<Vec<String>>,
    closed: AtomicBool,
    late_writes: AtomicUsize,
    on_close: Sender<()>,
}

impl Writer for ClosableWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::of(&[LogEntryValue::Message])
    }
    fn write(&self, entry: &LogEntry) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            self.late_writes.fetch_add(1, Ordering::SeqCst);
            return Err(LoggerError::writer("closable writer is closed"));
        }
        if entry.tag.as_deref() != Some(INTERNAL_TAG) {
            self.messages
                .lock()
                .push(entry.message.clone().unwrap_or_default());
        }
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.on_close.send(());
        Ok(())
    }
    fn name(&self) -> &str {
        "closable"
    }
}

/// Writer for diagnostics that holds the writing thread once until released
struct HoldingWriter {
    held: AtomicBool,
    entered: Sender<()>,
    release: Receiver<()>,
}

impl Writer for HoldingWriter {
    fn required_values(&self) -> ValueSet {
        ValueSet::empty()
    }
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        if thread::current().name() == Some(THREAD_NAME) && !self.held.swap(true, Ordering::SeqCst) {
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "holding"
    }
}

fn entry(message: impl Into<String>) -> Arc<LogEntry> {
    Arc::new(LogEntry::new(Level::Info).with_message(message))
}

/// A full queue blocks producers until the writing thread frees a slot
#[test]
fn test_full_queue_blocks_producer() {
    let (open, gate) = bounded::<()>(0);
    let writer = Arc::new(GatedWriter {
        gate,
        written: AtomicUsize::new(0),
    });
    let dyn_writer: Arc<dyn Writer> = writer.clone();
    let writing_thread = Arc::new(
        WritingThread::start(vec![Arc::clone(&dyn_writer)], 1, InternalLogger::capturing())
            .expect("Failed to start writing thread"),
    );

    let enqueued = Arc::new(AtomicUsize::new(0));
    let producer = {
        let writing_thread = Arc::clone(&writing_thread);
        let enqueued = Arc::clone(&enqueued);
        let dyn_writer = Arc::clone(&dyn_writer);
        thread::spawn(move || {
            for i in 0..3 {
                writing_thread.enqueue(Arc::clone(&dyn_writer), entry(i.to_string()));
                enqueued.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    // One job is blocked in the writer, one waits in the queue
    thread::sleep(Duration::from_millis(300));
    assert_eq!(enqueued.load(Ordering::SeqCst), 2);
    assert_eq!(writer.written.load(Ordering::SeqCst), 0);

    // Release the writer for all jobs
    drop(open);
    producer.join().expect("Producer panicked");
    assert_eq!(enqueued.load(Ordering::SeqCst), 3);

    writing_thread.shut_down();
    writing_thread.join().expect("Writing thread failed");
    assert_eq!(writer.written.load(Ordering::SeqCst), 3);
}

/// Internal entries are dropped instead of blocking on a full queue
#[test]
fn test_internal_entries_never_block() {
    let (open, gate) = bounded::<()>(0);
    let writer: Arc<dyn Writer> = Arc::new(GatedWriter {
        gate,
        written: AtomicUsize::new(0),
    });
    let writing_thread = WritingThread::start(vec![], 1, InternalLogger::capturing())
        .expect("Failed to start writing thread");

    writing_thread.enqueue(Arc::clone(&writer), entry("first"));
    writing_thread.enqueue(Arc::clone(&writer), entry("second"));
    thread::sleep(Duration::from_millis(100));

    for _ in 0..10 {
        let internal = Arc::new(
            LogEntry::new(Level::Error)
                .with_tag(INTERNAL_TAG)
                .with_message("diagnostic"),
        );
        writing_thread.enqueue(Arc::clone(&writer), internal);
    }

    drop(open);
    writing_thread.shut_down();
    writing_thread.join().expect("Writing thread failed");
}

/// Every job queued before shutdown is written exactly once and in order
#[test]
fn test_drain_on_shutdown() {
    let writer = Arc::new(CollectingWriter::default());
    let dyn_writer: Arc<dyn Writer> = writer.clone();
    let writing_thread = WritingThread::start(vec![Arc::clone(&dyn_writer)], 8, InternalLogger::capturing())
        .expect("Failed to start writing thread");

    for i in 0..10_000 {
        writing_thread.enqueue(Arc::clone(&dyn_writer), entry(i.to_string()));
    }
    writing_thread.shut_down();
    writing_thread.enqueue(Arc::clone(&dyn_writer), entry("late"));
    writing_thread.join().expect("Writing thread failed");

    let messages = writer.messages.lock();
    let expected: Vec<String> = (0..10_000).map(|i| i.to_string()).collect();
    assert_eq!(*messages, expected);
}

/// Failing writers are reported but never stop other writers or the thread
#[test]
fn test_failing_writer_does_not_stop_others() {
    let collecting = Arc::new(CollectingWriter::default());
    let failing = Arc::new(FailingWriter {
        calls: AtomicUsize::new(0),
    });
    let diagnostics = InternalLogger::capturing();

    let registry = {
        let collecting = Arc::clone(&collecting);
        let failing = Arc::clone(&failing);
        WriterRegistry::new()
            .with("collecting", move |_, _| Ok(Arc::clone(&collecting) as Arc<dyn Writer>))
            .with("failing", move |_, _| Ok(Arc::clone(&failing) as Arc<dyn Writer>))
    };

    let backend = LoggingBackend::builder()
        .configuration(
            Configuration::new()
                .with("writingthread", "true")
                .with("writer1", "failing")
                .with("writer2", "collecting")
                .with("writer3", "failing")
                .with("writer3.async", "false"),
        )
        .registry(registry)
        .queue_capacity(4)
        .internal_logger(diagnostics.clone())
        .build()
        .expect("Failed to build backend");

    for i in 0..200 {
        error!(backend, "Entry {}", i);
    }
    backend.shutdown();

    assert_eq!(collecting.messages.lock().len(), 200);
    assert!(failing.calls.load(Ordering::SeqCst) >= 200);

    let records = diagnostics.records();
    assert!(records
        .iter()
        .any(|record| record.message.contains("disk full")));
    assert!(records
        .iter()
        .any(|record| record.message.contains("writer exploded")));
}

/// Dropping the last reference while the writing thread reports a failure
/// shuts the backend down from the writing thread without losing entries
#[test]
fn test_backend_dropped_while_writing_thread_reports_failure() {
    let (entered, wait_entered) = bounded::<()>(0);
    let (release, wait_release) = bounded::<()>(0);
    let (on_close, wait_close) = bounded::<()>(1);

    let closable = Arc::new(ClosableWriter {
        messages: Mutex::new(Vec::new()),
        closed: AtomicBool::new(false),
        late_writes: AtomicUsize::new(0),
        on_close,
    });
    let holding: Arc<dyn Writer> = Arc::new(HoldingWriter {
        held: AtomicBool::new(false),
        entered,
        release: wait_release,
    });

    let registry = {
        let closable = Arc::clone(&closable);
        WriterRegistry::new()
            .with("rejecting", |_, _| Ok(Arc::new(RejectingWriter) as Arc<dyn Writer>))
            .with("closable", move |_, _| Ok(Arc::clone(&closable) as Arc<dyn Writer>))
            .with("holding", move |_, _| Ok(Arc::clone(&holding)))
    };

    // Diagnostics go through the backend, so the writing thread briefly owns
    // a strong reference while it reports the failed write
    let backend = LoggingBackend::builder()
        .configuration(
            Configuration::new()
                .with("writer1", "rejecting")
                .with("writer1.async", "true")
                .with("writer2", "closable")
                .with("writer2.async", "true")
                .with("writer3", "holding")
                .with("writer3.tag", INTERNAL_TAG),
        )
        .registry(registry)
        .build()
        .expect("Failed to build backend");

    info!(backend, "Entry {}", 0);
    wait_entered
        .recv_timeout(Duration::from_secs(5))
        .expect("Failure was not reported");

    for i in 1..10 {
        info!(backend, "Entry {}", i);
    }
    drop(backend);
    release.send(()).expect("Writing thread is gone");

    wait_close
        .recv_timeout(Duration::from_secs(5))
        .expect("Writing thread did not finish");

    let expected: Vec<String> = (0..10).map(|i| format!("Entry {}", i)).collect();
    assert_eq!(*closable.messages.lock(), expected);
    assert_eq!(closable.late_writes.load(Ordering::SeqCst), 0);
}

/// Concurrent producers with a tiny queue lose nothing
#[test]
fn test_concurrent_producers() {
    let writer = Arc::new(CollectingWriter::default());
    let shared = Arc::clone(&writer);

    let backend = LoggingBackend::builder()
        .configuration(
            Configuration::new()
                .with("writer", "collecting")
                .with("writer.async", "true"),
        )
        .registry(WriterRegistry::new().with("collecting", move |_, _| {
            Ok(Arc::clone(&shared) as Arc<dyn Writer>)
        }))
        .queue_capacity(16)
        .internal_logger(InternalLogger::capturing())
        .build()
        .expect("Failed to build backend");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let backend = Arc::clone(&backend);
            thread::spawn(move || {
                for i in 0..1_000 {
                    info!(backend, "{}-{}", t, i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Producer panicked");
    }
    backend.shutdown();

    let messages = writer.messages.lock();
    assert_eq!(messages.len(), 8_000);

    let unique: HashSet<&String> = messages.iter().collect();
    assert_eq!(unique.len(), 8_000);

    // Order per producer is preserved
    for t in 0..8 {
        let prefix = format!("{}-", t);
        let sequence: Vec<usize> = messages
            .iter()
            .filter_map(|message| message.strip_prefix(&prefix))
            .filter_map(|index| index.parse().ok())
            .collect();
        assert_eq!(sequence, (0..1_000).collect::<Vec<_>>());
    }
}

/// A burst of log calls followed by an immediate shutdown
#[test]
fn test_rapid_burst_logging() {
    let writer = Arc::new(CollectingWriter::default());
    let shared = Arc::clone(&writer);

    let backend = LoggingBackend::builder()
        .configuration(
            Configuration::new()
                .with("writingthread", "true")
                .with("writer", "collecting"),
        )
        .registry(WriterRegistry::new().with("collecting", move |_, _| {
            Ok(Arc::clone(&shared) as Arc<dyn Writer>)
        }))
        .internal_logger(InternalLogger::capturing())
        .build()
        .expect("Failed to build backend");

    for i in 0..50_000 {
        info!(backend, "Burst {}", i);
    }
    drop(backend);

    assert_eq!(writer.messages.lock().len(), 50_000);
}
