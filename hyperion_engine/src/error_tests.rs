//! Unit tests for error.rs
//!
//! Covers Display output of every variant and the engine_err!/engine_bail! family.

use crate::error::{Error, Result};
use crate::hyperion::Engine;
use crate::log::{LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};

struct CapturingLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests log concurrently; keep only this module's records.
        if entry.source == "hyperion::test" {
            self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
        }
    }
}

fn capture_logs() -> Arc<Mutex<Vec<(LogSeverity, String)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CapturingLogger { entries: entries.clone() });
    entries
}

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit returned DEVICE_LOST".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Backend error"));
    assert!(display.contains("DEVICE_LOST"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("image host buffer holds 12 bytes, expected 16".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("expected 16"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no supported depth format".to_string());
    assert!(format!("{}", err).contains("Initialization failed: no supported depth format"));
}

#[test]
fn test_not_found_display() {
    let err = Error::NotFound("vkshaders/deferred_frag.spv".to_string());
    assert_eq!(format!("{}", err), "Not found: vkshaders/deferred_frag.spv");
}

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_equality() {
    assert_eq!(Error::OutOfMemory, Error::OutOfMemory);
    assert_ne!(
        Error::BackendError("a".to_string()),
        Error::InvalidResource("a".to_string())
    );
}

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }

    assert_eq!(outer(), Err(Error::OutOfMemory));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture_logs();

    let err = crate::engine_err!("hyperion::test", "create failed: {}", 7);

    assert_eq!(err, Error::BackendError("create failed: 7".to_string()));
    let logged = entries.lock().unwrap().clone();
    Engine::reset_logger();
    assert_eq!(logged, vec![(LogSeverity::Error, "create failed: 7".to_string())]);
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = capture_logs();

    fn failing(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("hyperion::test", "bailed out");
        }
        Ok(1)
    }

    assert_eq!(failing(false), Ok(1));
    match failing(true) {
        Err(Error::BackendError(msg)) => assert!(msg.contains("bailed out")),
        other => panic!("unexpected result: {:?}", other),
    }
    let count = entries.lock().unwrap().len();
    Engine::reset_logger();
    assert_eq!(count, 1);
}

#[test]
#[serial]
fn test_engine_warn_err_logs_at_warn_severity() {
    let entries = capture_logs();

    fn recoverable() -> Result<()> {
        crate::engine_bail_warn!("hyperion::test", "format {} unsupported", "RGB8");
    }

    let result = recoverable();
    let logged = entries.lock().unwrap().clone();
    Engine::reset_logger();

    assert!(result.is_err());
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].0, LogSeverity::Warn);
    assert_eq!(logged[0].1, "format RGB8 unsupported");
}
