//! Tests!
use std::sync::Arc;
use std::{fs, io::Read};

use emberlog::config::Configurator;
use emberlog::level::Level;
use emberlog::sink::{FileSink, Sink};
use emberlog::{debug, error, info, trace, warn};

#[test]
fn test_basic_file_logging() {
    let temp_log_dir = tempfile::tempdir().expect("failed to set up temporary directory");
    let log_file = temp_log_dir.path().join("test.log");

    let sink = Arc::new(FileSink::open(&log_file).expect("failed to open log file"));
    Configurator::new()
        .level(Level::Info)
        .format_pattern("[{level}] {message}")
        .writer(Arc::clone(&sink) as Arc<dyn emberlog::sink::Sink>)
        .activate()
        .expect("activation should succeed");

    trace!("SHOULD NOT DISPLAY");
    debug!("SHOULD NOT DISPLAY");
    info!("Test information message");
    warn!("Test warning message");
    error!("Test error message");

    sink.flush();

    let mut result = String::new();
    fs::File::open(&log_file).unwrap().read_to_string(&mut result).unwrap();

    assert!(
        !result.contains("SHOULD NOT DISPLAY"),
        "expected result not including \"SHOULD NOT DISPLAY\", found:\n```\n{}\n```\n",
        result
    );
    assert!(
        result.contains("[INFO] Test information message"),
        "expected result including \"[INFO] Test information message\", found:\n```\n{}\n```\n",
        result
    );
    assert!(
        result.contains("[WARNING] Test warning message"),
        "expected result including \"[WARNING] Test warning message\", found:\n```\n{}\n```\n",
        result
    );
    assert!(
        result.contains("[ERROR] Test error message"),
        "expected result including \"[ERROR] Test error message\", found:\n```\n{}\n```\n",
        result
    );
}
