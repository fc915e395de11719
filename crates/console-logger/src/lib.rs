//! Console Logger
//!
//! Diagnostic channel for the app: a `tracing` subscriber whose formatted
//! lines go to the browser console (stderr on native targets), with a
//! bounded ring buffer of the most recent lines.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Lines kept by the global logger
pub const DEFAULT_CAPACITY: usize = 500;

static GLOBAL_BUFFER: OnceLock<LogBuffer> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(String),
}

// ========================
// Ring Buffer
// ========================

/// Circular buffer of formatted log lines
#[derive(Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, line: String) {
        let mut lines = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Oldest first
    pub fn lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

// ========================
// Writer
// ========================

/// `MakeWriter` handing out one [`LineWriter`] per event
#[derive(Clone)]
pub struct ConsoleWriter {
    buffer: LogBuffer,
}

impl ConsoleWriter {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter::new(self.buffer.clone(), Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        LineWriter::new(self.buffer.clone(), *meta.level())
    }
}

/// Collects one formatted event and emits it when dropped
pub struct LineWriter {
    bytes: Vec<u8>,
    level: Level,
    buffer: LogBuffer,
}

impl LineWriter {
    fn new(buffer: LogBuffer, level: Level) -> Self {
        Self {
            bytes: Vec::new(),
            level,
            buffer,
        }
    }
}

impl io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.bytes).trim_end().to_string();
        if line.is_empty() {
            return;
        }
        emit(self.level, &line);
        self.buffer.push(line);
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let value = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&value),
        Level::WARN => web_sys::console::warn_1(&value),
        Level::INFO => web_sys::console::info_1(&value),
        _ => web_sys::console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{}", line);
}

// ========================
// Timer
// ========================

/// Wall-clock `HH:MM:SS.mmm` timestamps (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockTime;

impl FormatTime for ClockTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().format("%H:%M:%S%.3f"))
    }
}

// ========================
// Setup
// ========================

/// Formatting layer writing into `buffer` and the console
pub fn layer<S>(buffer: LogBuffer) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_timer(ClockTime)
        .with_writer(ConsoleWriter::new(buffer))
}

/// Install the global subscriber. Call once at start-up.
pub fn init_logger(app_name: &str, level: Level) -> Result<(), LoggerError> {
    let buffer = GLOBAL_BUFFER
        .get_or_init(|| LogBuffer::new(DEFAULT_CAPACITY))
        .clone();
    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(layer(buffer))
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;
    tracing::info!(app = app_name, "logger initialized");
    Ok(())
}

/// Recent lines from the global logger (empty before `init_logger`)
pub fn recent_logs() -> Vec<String> {
    GLOBAL_BUFFER.get().map(LogBuffer::lines).unwrap_or_default()
}

pub fn info(message: &str) {
    tracing::info!("{}", message);
}

pub fn error(message: &str) {
    tracing::error!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_drops_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push("a".into());
        buffer.push("b".into());
        buffer.push("c".into());
        assert_eq!(buffer.lines(), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one_line() {
        let buffer = LogBuffer::new(0);
        buffer.push("a".into());
        buffer.push("b".into());
        assert_eq!(buffer.lines(), vec!["b"]);
    }

    #[test]
    fn test_layer_records_formatted_events() {
        let buffer = LogBuffer::new(8);
        let subscriber = tracing_subscriber::registry().with(layer(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(todo_id = 7, "failed to delete todo");
            info("hello");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("failed to delete todo"));
        assert!(lines[0].contains("todo_id=7"));
        assert!(lines[1].contains("INFO") && lines[1].contains("hello"));
    }

    #[test]
    fn test_clear() {
        let buffer = LogBuffer::new(4);
        buffer.push("x".into());
        buffer.clear();
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn test_recent_logs_after_init() {
        // Only one global subscriber per process; a second init must fail
        init_logger("console-logger-test", Level::DEBUG).expect("first init");
        error("boom");
        assert!(recent_logs().iter().any(|line| line.contains("boom")));
        assert!(init_logger("again", Level::DEBUG).is_err());
    }
}
