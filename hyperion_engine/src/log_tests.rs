//! Unit tests for log.rs

use crate::hyperion::Engine;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "hyperion::Image".to_string(),
        message: "uploaded 6 faces".to_string(),
        file,
        line,
    }
}

struct CollectingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Logger for CollectingLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == "hyperion::test" {
            self.lines.lock().unwrap().push(DefaultLogger::format_plain(entry));
        }
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_have_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
}

// ============================================================================
// FORMAT TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[hyperion::Image]"));
    assert!(line.ends_with("uploaded 6 faces"));
}

#[test]
fn test_format_plain_with_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("image.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("uploaded 6 faces (image.rs:42)"));
}

#[test]
fn test_default_logger_prints_every_severity() {
    let logger = DefaultLogger;
    logger.log(&entry(LogSeverity::Trace, None, None));
    logger.log(&entry(LogSeverity::Debug, None, None));
    logger.log(&entry(LogSeverity::Warn, None, None));
    logger.log(&entry(LogSeverity::Error, Some("log_tests.rs"), Some(1)));
}

// ============================================================================
// GLOBAL LOGGER TESTS
// ============================================================================

#[test]
#[serial]
fn test_macros_route_through_custom_logger() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CollectingLogger { lines: lines.clone() });

    crate::engine_debug!("hyperion::test", "frame {}", 3);
    crate::engine_error!("hyperion::test", "lost device");

    let captured = lines.lock().unwrap().clone();
    Engine::reset_logger();

    assert_eq!(captured.len(), 2);
    assert!(captured[0].contains("[DEBUG] [hyperion::test] frame 3"));
    assert!(captured[1].contains("lost device ("));
    assert!(captured[1].contains("log_tests.rs"));
}

#[test]
#[serial]
fn test_reset_logger_detaches_custom_logger() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CollectingLogger { lines: lines.clone() });
    Engine::reset_logger();

    crate::engine_info!("hyperion::test", "goes to stdout");

    assert!(lines.lock().unwrap().is_empty());
}
