//! Integration tests for the logging macros and error reporting
//!
//! Checks that the exported macros work from outside the crate and that
//! backend failures reach a custom logger.
//!
//! Run with: cargo test --test logging_integration_tests
//! (GPU tests: add -- --ignored)


use gpu_test_utils::create_test_device;
use hyperion_engine::hyperion::device::{BufferDesc, BufferUsage, GraphicsDevice, MemoryLocation};
use hyperion_engine::hyperion::log::{LogEntry, LogSeverity, Logger};
use hyperion_engine::hyperion::{Engine, Error, Result};
use hyperion_engine::{engine_bail, engine_debug, engine_error, engine_info, engine_warn, engine_warn_err};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// CAPTURING LOGGER
// ============================================================================

/// Records (severity, source, message, has location) of every entry
struct CapturingLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, String, bool)>>>,
}

impl Logger for CapturingLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((
            entry.severity,
            entry.source.clone(),
            entry.message.clone(),
            entry.file.is_some() && entry.line.is_some(),
        ));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String, String, bool)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CapturingLogger {
        entries: Arc::clone(&entries),
    });
    entries
}

fn load_level(name: &str) -> Result<u32> {
    if name.is_empty() {
        engine_bail!("app::Levels", "empty level name");
    }
    Ok(name.len() as u32)
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_macros_from_external_crate() {
    let entries = capture();

    engine_debug!("app::Game", "loading {} assets", 3);
    engine_info!("app::Game", "ready");
    engine_warn!("app::Game", "slow frame: {:.1} ms", 33.3);
    engine_error!("app::Game", "lost device");

    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0], (LogSeverity::Debug, "app::Game".to_string(), "loading 3 assets".to_string(), false));
    assert_eq!(entries[1].2, "ready");
    assert_eq!(entries[2].2, "slow frame: 33.3 ms");
    // Only errors carry file:line
    assert_eq!(entries[3].0, LogSeverity::Error);
    assert!(entries[3].3);
}

#[test]
#[serial]
fn test_integration_bail_logs_and_returns_backend_error() {
    let entries = capture();

    let ok = load_level("harbor");
    let err = load_level("");

    Engine::reset_logger();

    assert_eq!(ok, Ok(6));
    assert_eq!(err, Err(Error::BackendError("empty level name".to_string())));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, LogSeverity::Error);
    assert_eq!(entries[0].1, "app::Levels");
}

#[test]
#[serial]
fn test_integration_warn_err_is_recoverable() {
    let entries = capture();

    let error = engine_warn_err!("app::Formats", "falling back from {:?}", "RGB8");

    Engine::reset_logger();

    assert!(matches!(error, Error::BackendError(_)));
    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, LogSeverity::Warn);
    assert!(!entries[0].3);
}

// ============================================================================
// BACKEND ERROR TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_integration_backend_errors_reach_custom_logger() {
    let mut device = create_test_device();
    let entries = capture();

    let result = device.create_buffer(&BufferDesc {
        size: 0,
        usage: BufferUsage::Uniform,
        location: MemoryLocation::CpuToGpu,
    });

    Engine::reset_logger();

    assert!(matches!(result, Err(Error::BackendError(_))));
    let entries = entries.lock().unwrap();
    assert!(entries
        .iter()
        .any(|(severity, source, _, located)| *severity == LogSeverity::Error
            && source == "hyperion::vulkan"
            && *located));
}
