use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rotalog_logging::{Level, Logger};
use tempfile::TempDir;

fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "log"))
        .collect();
    files.sort();
    files
}

#[test]
fn counter_never_exceeds_limit_between_calls() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::new(dir.path(), "app", 256).unwrap();
    logger.set_header("${level}");

    let mut total = 0;
    for i in 0..200 {
        total += logger.infof(format_args!("event {i} with some padding text")).unwrap();
        assert!(logger.pending_bytes() <= 256, "after line {i}");
    }

    let on_disk: u64 = log_files(dir.path())
        .iter()
        .map(|p| fs::metadata(p).unwrap().len())
        .sum();
    assert_eq!(on_disk, total as u64);
    assert!(log_files(dir.path()).len() >= 2);
}

#[test]
fn zero_limit_uses_default_and_does_not_rotate_small_volumes() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::new(dir.path(), "", 0).unwrap();
    logger.set_header("${level}");

    let mut total = 0u64;
    for i in 0..1000 {
        total += logger.info(&[&"line", &i]).unwrap() as u64;
    }
    assert_eq!(logger.pending_bytes(), total);

    let files = log_files(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("app_") && name.ends_with("_0.log"), "{name}");
}

#[test]
fn concurrent_writers_produce_complete_lines() {
    let dir = TempDir::new().unwrap();
    let logger = Arc::new(Logger::new(dir.path(), "app", 8 * 1024).unwrap());
    logger.set_header("${level}");
    logger.set_level(Level::Debug);

    let written: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..100)
            .map(|worker| {
                let logger = Arc::clone(&logger);
                s.spawn(move || {
                    (0..100)
                        .map(|line| {
                            logger
                                .infof(format_args!("worker {worker:03} line {line:03}"))
                                .unwrap()
                        })
                        .sum::<usize>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let mut seen = HashSet::new();
    let mut bytes = 0;
    for path in log_files(dir.path()) {
        let content = fs::read_to_string(&path).unwrap();
        bytes += content.len();
        for line in content.lines() {
            let rest = line.strip_prefix("INFO worker ").expect(line);
            let (worker, n) = rest.split_once(" line ").expect(line);
            assert_eq!(worker.len(), 3, "{line}");
            assert_eq!(n.len(), 3, "{line}");
            assert!(seen.insert(rest.to_string()), "duplicate {line}");
        }
    }
    assert_eq!(seen.len(), 10_000);
    assert_eq!(bytes, written);

    // every line is 25 bytes, so each file stops at the first line past the limit
    let files = log_files(dir.path());
    assert!(files.len() >= 30, "only {} files", files.len());
    for path in &files {
        let len = fs::metadata(path).unwrap().len();
        assert!(len <= 8 * 1024 + 25, "{} has {len} bytes", path.display());
    }
}

#[test]
fn equal_length_lines_keep_rotating_within_one_second() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::new(dir.path(), "app", 64).unwrap();
    logger.set_header("${level}");

    let mut line_len = 0;
    for _ in 0..100 {
        line_len = logger.info(&[&"0123456789abcdefghij"]).unwrap() as u64;
    }

    let files = log_files(dir.path());
    let mut total = 0;
    for path in &files {
        let len = fs::metadata(path).unwrap().len();
        assert!(len <= 64 + line_len, "{} has {len} bytes", path.display());
        total += len;
    }
    assert_eq!(total, 100 * line_len);
    assert!(files.len() >= 100 / (64 / line_len as usize + 1), "only {} files", files.len());
}

#[cfg(unix)]
#[test]
fn failed_rotation_degrades_then_recovers() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("logs");
    fs::create_dir(&dir).unwrap();

    let logger = Logger::new(&dir, "app", 64).unwrap();
    logger.set_header("${level}");
    let first = logger.current_file().unwrap();

    fs::remove_dir_all(&dir).unwrap();
    let n = logger
        .info(&[&"this line is long enough to cross the sixty four byte limit"])
        .unwrap();
    assert!(n > 64);
    assert_eq!(logger.current_file().unwrap(), first);
    assert!(logger.pending_bytes() > 64);

    fs::create_dir(&dir).unwrap();
    logger.info(&[&"retry"]).unwrap();
    assert_ne!(logger.current_file().unwrap(), first);
    assert_eq!(logger.pending_bytes(), 0);

    logger.info(&[&"after"]).unwrap();
    let current = logger.current_file().unwrap();
    assert_eq!(fs::read_to_string(current).unwrap(), "INFO after\n");
}
