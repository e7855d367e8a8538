// vidshrink-core/tests/compression_log_tests.rs

use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use vidshrink_core::compression_log::{CompressionLog, EntryStatus, FailureKind, LogEntry};
use vidshrink_core::error::CoreError;
use vidshrink_core::reporting::Summary;

#[test]
fn test_on_disk_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut log = CompressionLog::load(dir.path())?;
    log.record(Path::new("/v/a.mp4"), LogEntry::compressed("h264", 100, "hevc", 1_700_000_000, 40))?;
    log.record(Path::new("/v/b.mkv"), LogEntry::skipped("hevc"))?;
    log.record(Path::new("/v/c.mov"), LogEntry::error(FailureKind::Encode, "exit 1"))?;

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(log.path())?)?;
    assert_eq!(on_disk["/v/a.mp4"], json!([["h264", 100], ["hevc", 1_700_000_000, 40]]));
    assert_eq!(on_disk["/v/b.mkv"], json!({"status": "skipped", "codec": "hevc"}));
    assert_eq!(
        on_disk["/v/c.mov"],
        json!({"status": "error", "kind": "encode", "message": "exit 1"})
    );
    Ok(())
}

#[test]
fn test_hand_written_log_is_summarised() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("compression_log.json"),
        r#"{
            "/v/a.mp4": [["h264", 100], ["hevc", 1, 40]],
            "/v/b.mp4": [[200], [70]],
            "/v/c.mkv": {"status": "skipped"},
            "/v/d.mov": {"status": "error", "message": "unreadable"}
        }"#,
    )?;

    let log = CompressionLog::load(dir.path())?;
    let summary = Summary::from_log(&log);
    assert_eq!(summary.total_before, 300);
    assert_eq!(summary.total_after, 110);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 1);
    assert!(summary.to_string().contains("36.7%"));
    Ok(())
}

#[test]
fn test_unknown_metadata_survives_rewrite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log_path = dir.path().join("compression_log.json");
    fs::write(
        &log_path,
        r#"{"/v/a.mp4": [["h264", "1920x1080", {"bitrate": 8000}, 100], ["hevc", 5, 40]]}"#,
    )?;

    let mut log = CompressionLog::load(dir.path())?;
    log.record(Path::new("/v/z.mp4"), LogEntry::skipped("hevc"))?;

    let on_disk: Value = serde_json::from_str(&fs::read_to_string(&log_path)?)?;
    assert_eq!(
        on_disk["/v/a.mp4"][0],
        json!(["h264", "1920x1080", {"bitrate": 8000}, 100])
    );
    Ok(())
}

#[test]
fn test_corrupt_log_is_refused_and_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let log_path = dir.path().join("compression_log.json");
    fs::write(&log_path, r#"{"/v/a.mp4": [["h264", 100], ["hevc", 40"#)?;

    match CompressionLog::load(dir.path()) {
        Err(CoreError::CorruptLog { path, .. }) => assert_eq!(path, log_path),
        other => panic!("expected CorruptLog, got {other:?}"),
    }
    assert_eq!(
        fs::read_to_string(&log_path)?,
        r#"{"/v/a.mp4": [["h264", 100], ["hevc", 40"#
    );
    Ok(())
}

#[test]
fn test_later_record_supersedes_earlier() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let video = Path::new("/v/a.mp4");
    let mut log = CompressionLog::load(dir.path())?;
    log.record(video, LogEntry::error(FailureKind::Encode, "first try"))?;
    log.record(video, LogEntry::compressed("h264", 10, "hevc", 1, 4))?;

    let reloaded = CompressionLog::load(dir.path())?;
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.lookup(video).map(LogEntry::status), Some(EntryStatus::Compressed));
    Ok(())
}

#[test]
fn test_log_is_scoped_to_base_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let child = dir.path().join("child");
    fs::create_dir(&child)?;
    fs::write(dir.path().join("compression_log.json"), r#"{"/v/a.mp4": {"status": "skipped"}}"#)?;

    // The parent's log is never consulted
    let log = CompressionLog::load(&child)?;
    assert!(log.is_empty());
    assert_eq!(log.path(), child.join("compression_log.json"));
    Ok(())
}
