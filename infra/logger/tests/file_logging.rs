use osprofiles_logger::{LevelFilter, Logger, LoggerError};
use serial_test::serial;
use std::fs;
use std::time::Duration;

// One process-wide subscriber: the file test installs it, the second init must fail.
#[test]
#[serial]
fn file_logging_writes_json_and_blocks_second_init() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("osprofiles-test")
        .console(false)
        .level(LevelFilter::INFO)
        .path(&log_dir)
        .json(true)
        .init()?;
    assert!(logger.has_file_output());

    tracing::info!(record = "demo/default", "Record stored");

    let second = Logger::builder().name("again").init().unwrap_err();
    assert!(matches!(second, LoggerError::Subscriber { .. }));

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(log_file)?;
    let line = contents.lines().next().expect("one log line");
    let parsed: serde_json::Value = serde_json::from_str(line)?;
    assert!(parsed.get("fields").is_some(), "file layer should emit JSON lines");
    assert!(contents.contains("demo/default"));
    Ok(())
}

