//! Size-triggered file rotation.
//!
//! Files are named `{prefix}_{YYYY-MM-DD_HHMMSS}_{bytes}.{extension}` inside
//! the target directory, where `bytes` is the counter value at the moment
//! of rotation (0 for the first file). When that name is taken (two
//! rotations in the same second at the same size), a sequence number is
//! added: `{prefix}_{YYYY-MM-DD_HHMMSS}_{bytes}_{seq}.{extension}`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};

use crate::error::{LogError, Result};
use crate::output::LogOutput;
use crate::rotator::Rotator;

/// 100 MiB.
pub const DEFAULT_LIMIT: u64 = 100 << 20;
pub const DEFAULT_PREFIX: &str = "app";
pub const DEFAULT_EXTENSION: &str = "log";
/// rwxr-xr-x, applied regardless of the process umask.
pub const DEFAULT_FILE_MODE: u32 = 0o755;

const NAME_TIME_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Sequence numbers tried before settling on an existing name.
const MAX_NAME_SEQUENCE: u32 = 10_000;

/// Shared handle to an open log file.
///
/// Clones share one descriptor, which is closed when the last clone is
/// dropped. The rotator drops its clone on rotation; a holder of another
/// clone releases it with [`LogFile::close`] or by dropping it.
#[derive(Debug, Clone)]
pub struct LogFile {
    file: Arc<File>,
    path: Arc<Path>,
}

impl LogFile {
    fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path: Arc::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and sync the file, then release this clone. Returns whether
    /// this was the last clone, i.e. whether the descriptor is now closed.
    pub fn close(self) -> io::Result<bool> {
        self.file.sync_all()?;
        Ok(Arc::into_inner(self.file).is_some())
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.file).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.file).flush()
    }
}

impl LogOutput for LogFile {}

/// Rotates to a fresh file once more than `limit` bytes were written.
///
/// The byte counter is atomic so `accumulate` may be called concurrently
/// without holding any lock; `rotate` needs `&mut self` and is serialized by
/// whoever owns the rotator.
#[derive(Debug)]
pub struct FileSizeRotator {
    dir: PathBuf,
    prefix: String,
    extension: String,
    current_size: AtomicU64,
    limit: u64,
    mode: u32,
    active: Option<LogFile>,
}

impl FileSizeRotator {
    /// Empty `prefix`/`extension` fall back to `app`/`log`, a zero `limit`
    /// to [`DEFAULT_LIMIT`]. An empty `dir` means the working directory.
    pub fn new(dir: impl Into<PathBuf>, prefix: &str, extension: &str, limit: u64) -> Self {
        let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
        let extension = if extension.is_empty() { DEFAULT_EXTENSION } else { extension };
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            current_size: AtomicU64::new(0),
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
            mode: DEFAULT_FILE_MODE,
            active: None,
        }
    }

    /// Override the permission bits applied to every new file.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Add `n` freshly written bytes; `true` iff the total now exceeds the limit.
    pub fn accumulate(&self, n: u64) -> bool {
        let total = self.current_size.fetch_add(n, Ordering::AcqRel) + n;
        total > self.limit
    }

    pub fn size(&self) -> u64 {
        self.current_size.load(Ordering::Acquire)
    }

    pub(crate) fn file_name_at(&self, now: DateTime<Local>, size: u64, seq: u32) -> String {
        let stamp = now.format(NAME_TIME_FORMAT);
        match seq {
            0 => format!("{}_{}_{}.{}", self.prefix, stamp, size, self.extension),
            n => format!("{}_{}_{}_{}.{}", self.prefix, stamp, size, n, self.extension),
        }
    }

    /// First free name for the current second and size. Falls back to the
    /// last candidate, opened in append mode, if every sequence is taken.
    fn next_path(&self) -> PathBuf {
        let now = Local::now();
        let size = self.size();
        let active = self.active.as_ref().map(LogFile::path);
        let mut path = self.dir.join(self.file_name_at(now, size, 0));
        for seq in 1..=MAX_NAME_SEQUENCE {
            if active != Some(path.as_path()) && !path.exists() {
                break;
            }
            path = self.dir.join(self.file_name_at(now, size, seq));
        }
        path
    }

    /// Open the next file and make it the active one.
    ///
    /// On failure nothing changes: the previous file stays active and the
    /// counter keeps its value.
    pub fn rotate(&mut self) -> Result<LogFile> {
        let path = self.next_path();
        let file = open_append(&path, self.mode).map_err(|source| LogError::Open {
            path: path.clone(),
            source,
        })?;
        apply_mode(&path, self.mode).map_err(|source| LogError::Open {
            path: path.clone(),
            source,
        })?;

        if let Some(mut old) = self.active.take() {
            // close errors are not a reason to fail the rotation
            let _ = old.flush();
        }
        self.current_size.store(0, Ordering::Release);

        let handle = LogFile::new(file, path);
        self.active = Some(handle.clone());
        Ok(handle)
    }

    pub fn current_handle(&self) -> Option<&LogFile> {
        self.active.as_ref()
    }
}

impl Rotator for FileSizeRotator {
    type Handle = LogFile;

    fn reach_limit(&self, written: usize) -> bool {
        self.accumulate(written as u64)
    }

    fn next_writer(&mut self) -> Result<LogFile> {
        self.rotate()
    }

    fn current_handle(&self) -> Option<&LogFile> {
        self.active.as_ref()
    }

    fn current_size(&self) -> u64 {
        self.size()
    }

    fn current_path(&self) -> Option<&Path> {
        self.active.as_ref().map(LogFile::path)
    }
}

/// Standalone use: the first write opens the first file, and a crossing
/// rotates right after the write that caused it. A failed rotation keeps
/// the old file and is retried on the next write.
impl Write for FileSizeRotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = match self.active.clone() {
            Some(file) => file,
            None => self.rotate().map_err(io::Error::other)?,
        };
        let n = file.write(buf)?;
        if self.accumulate(n as u64) {
            let _ = self.rotate();
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.active.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Parse an octal permission string such as `"0755"` or `"0o640"`.
pub fn parse_file_mode(s: &str) -> Result<u32> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| LogError::Config(format!("invalid file mode '{s}': {e}")))?;
    if mode > 0o7777 {
        return Err(LogError::Config(format!("file mode '{s}' is out of range")));
    }
    Ok(mode)
}

#[cfg(unix)]
fn open_append(path: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .append(true)
        .create(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_append(path: &Path, _mode: u32) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

// The create path is subject to the umask, so the mode is set again.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
