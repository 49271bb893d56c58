//! Structured logging.
//!
//! # Responsibilities
//! - Emit one JSON record per line to a single output sink
//! - Filter records below a minimum severity
//! - Attach a stack trace to records at `Error` and above
//! - Expose the logger as a plain byte sink for other subsystems
//!
//! # Design Decisions
//! - Records are built and serialized outside the lock; only the write is serialized
//! - Logging never fails from the caller's point of view
//! - The logger is constructed once in `main` and shared via `Arc`

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Free-form string properties attached to a record.
pub type Properties = BTreeMap<String, String>;

const TIME_FORMAT: &str = "%d-%b-%y %H:%M:%S%.3f %:z";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    /// An error worth reporting that does not need a stack trace.
    InfoError,
    Error,
    /// Terminates the process after the record is written.
    Fatal,
    /// Suppresses all output when used as the minimum level.
    Off,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Info => "INFO",
            Level::InfoError => "ERROR",
            Level::Error => "ERROR+STACK",
            Level::Fatal => "FATAL",
            Level::Off => "",
        };
        f.write_str(s)
    }
}

#[derive(Serialize)]
struct LogRecord<'a> {
    level: String,
    time: String,
    message: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    properties: Option<&'a Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
}

fn is_empty(properties: &Option<&Properties>) -> bool {
    properties.map_or(true, |p| p.is_empty())
}

/// Severity-gated JSON line logger.
pub struct Logger {
    out: Mutex<Box<dyn Write + Send>>,
    min_level: Level,
    offset: FixedOffset,
}

impl Logger {
    /// Create a logger writing records at or above `min_level` to `out`.
    pub fn new(out: impl Write + Send + 'static, min_level: Level) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            min_level,
            offset: default_offset(),
        }
    }

    /// Create a logger writing to standard output.
    pub fn stdout(min_level: Level) -> Self {
        Self::new(io::stdout(), min_level)
    }

    /// Render timestamps in the given fixed offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Write one record. Returns the number of bytes written to the sink,
    /// which is zero when the record is filtered out.
    ///
    /// A `Fatal` record terminates the process once it has been written.
    pub fn log(
        &self,
        level: Level,
        message: &str,
        properties: Option<&Properties>,
    ) -> io::Result<usize> {
        if level < self.min_level || level == Level::Off {
            return Ok(0);
        }

        let record = LogRecord {
            level: level.to_string(),
            time: Utc::now()
                .with_timezone(&self.offset)
                .format(TIME_FORMAT)
                .to_string(),
            message,
            properties,
            trace: (level >= Level::Error).then(|| Backtrace::force_capture().to_string()),
        };

        let mut line = serde_json::to_vec(&record).unwrap_or_else(|e| {
            format!("{}: unable to marshal log message: {}", Level::Error, e).into_bytes()
        });
        line.push(b'\n');

        let written = {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            out.write_all(&line).map(|()| line.len())
        };

        if level == Level::Fatal {
            let _ = self.flush();
            std::process::exit(1);
        }
        written
    }

    pub fn info(&self, message: &str) {
        let _ = self.log(Level::Info, message, None);
    }

    pub fn info_with(&self, message: &str, properties: &Properties) {
        let _ = self.log(Level::Info, message, Some(properties));
    }

    /// Report an error without a stack trace.
    pub fn error(&self, message: &str) {
        let _ = self.log(Level::InfoError, message, None);
    }

    /// Report an error with a stack trace and context properties.
    pub fn error_with(&self, err: &dyn fmt::Display, properties: &Properties) {
        let _ = self.log(Level::Error, &err.to_string(), Some(properties));
    }

    pub fn fatal(&self, err: &dyn fmt::Display) -> ! {
        let _ = self.log(Level::Fatal, &err.to_string(), None);
        std::process::exit(1)
    }

    pub fn fatal_with(&self, err: &dyn fmt::Display, properties: &Properties) -> ! {
        let _ = self.log(Level::Fatal, &err.to_string(), Some(properties));
        std::process::exit(1)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }

    /// A byte sink that turns every write into an `Error` record.
    pub fn sink(self: &Arc<Self>) -> LogSink {
        LogSink {
            logger: Arc::clone(self),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

fn default_offset() -> FixedOffset {
    // UTC-08:00 always fits in a FixedOffset.
    FixedOffset::west_opt(8 * 3600).unwrap_or_else(|| Utc.fix())
}

/// `io::Write` adapter over a shared [`Logger`].
///
/// Also implements `MakeWriter`, so a `tracing-subscriber` fmt layer can
/// route framework diagnostics through the same sink.
#[derive(Clone)]
pub struct LogSink {
    logger: Arc<Logger>,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.logger
            .log(Level::Error, text.trim_end_matches(['\r', '\n']), None)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.logger.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Build a property map from key/value pairs.
pub fn properties<const N: usize>(pairs: [(&str, String); N]) -> Properties {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// In-memory sink shared between a logger and a test.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub(crate) fn lines(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn logger(min_level: Level) -> (Logger, SharedBuffer) {
        let buf = SharedBuffer::default();
        (Logger::new(buf.clone(), min_level), buf)
    }

    #[test]
    fn test_below_minimum_writes_nothing() {
        let (log, buf) = logger(Level::Error);

        assert_eq!(log.log(Level::Info, "quiet", None).unwrap(), 0);
        assert_eq!(log.log(Level::InfoError, "quiet", None).unwrap(), 0);
        assert!(buf.contents().is_empty());

        let (log, buf) = logger(Level::Off);
        assert_eq!(log.log(Level::Error, "quiet", None).unwrap(), 0);
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn test_trace_only_at_error_and_above() {
        let (log, buf) = logger(Level::Info);
        log.info("hello");
        log.error("soft failure");
        log.error_with(&"hard failure", &Properties::new());

        let lines = buf.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].get("trace").is_none());
        assert!(lines[1].get("trace").is_none());
        let trace = lines[2]["trace"].as_str().unwrap();
        assert!(!trace.is_empty());
    }

    #[test]
    fn test_record_shape() {
        let (log, buf) = logger(Level::Info);
        let props = properties([("method", "GET".to_string())]);
        let n = log.log(Level::Info, "request received", Some(&props)).unwrap();

        let raw = buf.contents();
        assert_eq!(n, raw.len());
        assert!(raw.ends_with('\n'));

        let line = &buf.lines()[0];
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["message"], "request received");
        assert_eq!(line["properties"]["method"], "GET");
        assert!(line["time"].as_str().unwrap().ends_with("-08:00"));
    }

    #[test]
    fn test_empty_properties_omitted() {
        let (log, buf) = logger(Level::Info);
        log.info_with("nothing attached", &Properties::new());
        assert!(buf.lines()[0].get("properties").is_none());
    }

    #[test]
    fn test_level_display_and_order() {
        assert!(Level::Info < Level::InfoError);
        assert!(Level::InfoError < Level::Error);
        assert!(Level::Error < Level::Fatal);
        assert!(Level::Fatal < Level::Off);
        assert_eq!(Level::InfoError.to_string(), "ERROR");
        assert_eq!(Level::Error.to_string(), "ERROR+STACK");
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let (log, buf) = logger(Level::Info);
        let log = Arc::new(log);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for j in 0..10 {
                        let props = properties([("worker", i.to_string())]);
                        let _ = log.log(Level::Error, &format!("line {j}"), Some(&props));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = buf.lines();
        assert_eq!(lines.len(), 8 * 10);
        assert!(lines.iter().all(|l| l["level"] == "ERROR+STACK"));
    }

    #[test]
    fn test_sink_writes_error_records() {
        let buf = SharedBuffer::default();
        let log = Arc::new(Logger::new(buf.clone(), Level::Info));
        let mut sink = log.sink();

        writeln!(sink, "http: TLS handshake error").unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["level"], "ERROR+STACK");
        assert_eq!(line["message"], "http: TLS handshake error");
    }
}
