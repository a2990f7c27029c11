//! Background thread that writes log entries to asynchronous writers
//!
//! Jobs are passed through a bounded queue. Producers block while the queue
//! is full, except for entries issued by the logging engine itself, which
//! are dropped instead so that the writing thread can never wait for itself.

use crate::core::{InternalLogger, LogEntry, LoggerError, Result, Writer, INTERNAL_TAG};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Default number of queued jobs before producers block
pub const DEFAULT_QUEUE_CAPACITY: usize = 65_536;

pub const THREAD_NAME: &str = "log-writing-thread";

enum Task {
    Write(Arc<dyn Writer>, Arc<LogEntry>),
    Shutdown,
}

pub struct WritingThread {
    sender: Sender<Task>,
    accepting: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl WritingThread {
    /// Spawn the writing thread
    ///
    /// `writers` are flushed whenever the queue runs empty and closed when
    /// the thread exits.
    pub fn start(
        writers: Vec<Arc<dyn Writer>>,
        capacity: usize,
        diagnostics: InternalLogger,
    ) -> Result<Self> {
        let (sender, receiver) = bounded(capacity.max(1));

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || Self::run(receiver, writers, diagnostics))
            .map_err(|e| {
                LoggerError::io_operation("spawning writing thread", e.to_string(), e)
            })?;

        Ok(Self {
            sender,
            accepting: AtomicBool::new(true),
            thread_id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queue a log entry for a writer
    ///
    /// Blocks while the queue is full. Entries with the internal tag are
    /// dropped instead of blocking. Ignored after [`shut_down`](Self::shut_down).
    pub fn enqueue(&self, writer: Arc<dyn Writer>, entry: Arc<LogEntry>) {
        if !self.accepting.load(Ordering::Acquire) {
            return;
        }

        if entry.tag.as_deref() == Some(INTERNAL_TAG) {
            // Dropped when full, the writing thread itself may be the caller
            let _ = self.sender.try_send(Task::Write(writer, entry));
        } else {
            // Disconnected only after the thread has terminated
            let _ = self.sender.send(Task::Write(writer, entry));
        }
    }

    /// Stop accepting new entries and let the thread exit after writing
    /// everything queued so far
    ///
    /// Called from the writing thread itself, the request never blocks. If
    /// the queue is full, the thread exits once all senders are dropped.
    pub fn shut_down(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }

        if self.is_current_thread() {
            let _ = self.sender.try_send(Task::Shutdown);
        } else {
            let _ = self.sender.send(Task::Shutdown);
        }
    }

    /// Whether the caller runs on the writing thread
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Wait until the thread has terminated
    ///
    /// Returns immediately when called from the writing thread itself.
    pub fn join(&self) -> Result<()> {
        if self.is_current_thread() {
            return Ok(());
        }

        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|payload| LoggerError::writer_panicked(THREAD_NAME, payload.as_ref())),
            None => Ok(()),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Number of jobs currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.sender.len()
    }

    fn run(receiver: Receiver<Task>, writers: Vec<Arc<dyn Writer>>, diagnostics: InternalLogger) {
        while let Ok(task) = receiver.recv() {
            match task {
                Task::Write(writer, entry) => Self::write(&writer, &entry, &diagnostics),
                Task::Shutdown => break,
            }

            if receiver.is_empty() {
                Self::flush(&writers, &diagnostics);
            }
        }

        Self::flush(&writers, &diagnostics);
        Self::close(&writers, &diagnostics);
    }

    fn write(writer: &Arc<dyn Writer>, entry: &LogEntry, diagnostics: &InternalLogger) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.write(entry)));

        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(payload) => LoggerError::writer_panicked(writer.name(), payload.as_ref()),
        };

        if entry.tag.as_deref() != Some(INTERNAL_TAG) {
            diagnostics.error(format!("Failed to write log entry: {}", error));
        }
    }

    fn flush(writers: &[Arc<dyn Writer>], diagnostics: &InternalLogger) {
        for writer in writers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.flush()));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    diagnostics.error(format!("Failed to flush writer \"{}\": {}", writer.name(), e))
                }
                Err(payload) => diagnostics.error(format!(
                    "Failed to flush writer \"{}\": {}",
                    writer.name(),
                    LoggerError::writer_panicked(writer.name(), payload.as_ref())
                )),
            }
        }
    }

    fn close(writers: &[Arc<dyn Writer>], diagnostics: &InternalLogger) {
        for writer in writers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.close()));
            let error = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => LoggerError::writer_panicked(writer.name(), payload.as_ref()),
            };
            diagnostics.error(format!("Failed to close writer \"{}\": {}", writer.name(), error));
        }
    }
}

impl Drop for WritingThread {
    fn drop(&mut self) {
        self.shut_down();
        if let Err(e) = self.join() {
            eprintln!("[LOGGER ERROR] Writing thread terminated abnormally: {}", e);
        }
    }
}
