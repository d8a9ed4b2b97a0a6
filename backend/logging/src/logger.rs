//! Structured Logger
//!
//! Renders a header template plus a message body into a pooled buffer, writes
//! the line to the current output and drives the [`Rotator`] afterwards. The
//! render, write and rotate steps run under one mutex, so lines never
//! interleave and appear in lock acquisition order.

use std::convert::Infallible;
use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use colored::Colorize;
use rotalog_config::LoggerConfig;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{LogError, Result};
use crate::file_rotator::{
    DEFAULT_EXTENSION, DEFAULT_FILE_MODE, DEFAULT_PREFIX, FileSizeRotator, parse_file_mode,
};
use crate::level::Level;
use crate::message::Message;
use crate::output::LogOutput;
use crate::pool::BufferPool;
use crate::rotator::Rotator;
use crate::template::{HeaderFields, HeaderTemplate, is_json_header};

const LEVEL_COUNT: usize = 6;

pub struct Logger<R: Rotator = FileSizeRotator> {
    level: AtomicU8,
    pool: BufferPool,
    state: Mutex<State<R>>,
}

struct State<R> {
    prefix: String,
    template: HeaderTemplate,
    output: Box<dyn LogOutput>,
    rotator: R,
    color: bool,
    labels: [String; LEVEL_COUNT],
}

impl Logger<FileSizeRotator> {
    /// Create a logger writing `{prefix}_*.log` files into `dir` and open
    /// the first file. `limit == 0` selects the 100 MiB default.
    pub fn new(dir: impl AsRef<Path>, prefix: &str, limit: u64) -> Result<Self> {
        let rotator = FileSizeRotator::new(dir.as_ref(), prefix, DEFAULT_EXTENSION, limit);
        Self::open(rotator, prefix)
    }

    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let level: Level = config.level.as_deref().unwrap_or("info").parse()?;
        let mode = match config.file_mode.as_deref() {
            Some(mode) => parse_file_mode(mode)?,
            None => DEFAULT_FILE_MODE,
        };
        let prefix = config.prefix.as_deref().unwrap_or(DEFAULT_PREFIX);
        let rotator = FileSizeRotator::new(
            config.directory.as_deref().unwrap_or(""),
            prefix,
            config.extension.as_deref().unwrap_or(DEFAULT_EXTENSION),
            config.limit_bytes.unwrap_or(0),
        )
        .with_mode(mode);

        let logger = Self::open(rotator, prefix)?;
        logger.set_level(level);
        if let Some(header) = &config.header {
            logger.set_header(header);
        }
        if config.color == Some(false) {
            logger.disable_color();
        }
        Ok(logger)
    }

    fn open(mut rotator: FileSizeRotator, prefix: &str) -> Result<Self> {
        let first = rotator.rotate()?;
        debug!(path = %first.path().display(), "Opened log file");
        let logger = Self::with_rotator(rotator, first);
        logger.set_prefix(prefix);
        Ok(logger)
    }
}

impl<R: Rotator> Logger<R> {
    /// Build a logger around an already prepared rotation strategy.
    pub fn with_rotator(rotator: R, output: impl LogOutput + 'static) -> Self {
        let output: Box<dyn LogOutput> = Box::new(output);
        let labels = level_labels(output.is_terminal());
        Self {
            level: AtomicU8::new(Level::Info as u8),
            pool: BufferPool::new(),
            state: Mutex::new(State {
                prefix: String::new(),
                template: HeaderTemplate::default(),
                output,
                rotator,
                color: true,
                labels,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn prefix(&self) -> String {
        self.lock().prefix.clone()
    }

    pub fn set_prefix(&self, prefix: &str) {
        self.lock().prefix = prefix.to_string();
    }

    pub fn header(&self) -> String {
        self.lock().template.source().to_string()
    }

    /// Recompile the header from a `${placeholder}` format string.
    pub fn set_header(&self, format: &str) {
        let template = HeaderTemplate::new(format);
        let unknown = template.unknown_placeholders();
        if !unknown.is_empty() {
            warn!(placeholders = ?unknown, "Header has unknown placeholders; they render empty");
        }
        self.lock().template = template;
    }

    /// Redirect output. Rotation keeps counting and swaps back to a fresh
    /// file on the next crossing.
    pub fn set_output(&self, output: impl LogOutput + 'static) {
        self.lock().set_output(Box::new(output));
    }

    pub fn enable_color(&self) {
        let mut state = self.lock();
        state.color = true;
        state.refresh_labels();
    }

    pub fn disable_color(&self) {
        let mut state = self.lock();
        state.color = false;
        state.refresh_labels();
    }

    /// Bytes counted against the current rotation target.
    pub fn pending_bytes(&self) -> u64 {
        self.lock().rotator.current_size()
    }

    pub fn current_file(&self) -> Option<PathBuf> {
        self.lock().rotator.current_path().map(Path::to_path_buf)
    }

    /// Render and write one line at `level`.
    ///
    /// Returns the number of bytes written, or 0 when the level is filtered.
    /// A failed write is returned as an error and skips the rotation check;
    /// a failed rotation is reported on the error channel and does not fail
    /// the call.
    #[track_caller]
    pub fn log(&self, level: Level, message: Message<'_>) -> Result<usize> {
        if !level.passes(self.level()) {
            return Ok(0);
        }
        let location = Location::caller();

        let mut state = self.lock();
        let mut line = self.pool.get();
        let mut body = self.pool.get();
        state.render(level, location, &message, &mut body, &mut line);
        let written = state.write(&line)?;
        drop(body);
        drop(line);

        if state.rotator.reach_limit(written) {
            self.rotate_locked(&mut state, location);
        }
        Ok(written)
    }

    fn rotate_locked(&self, state: &mut State<R>, location: &'static Location<'static>) {
        match state.rotator.next_writer() {
            Ok(handle) => {
                debug!(path = ?state.rotator.current_path(), "Rotated log output");
                state.set_output(Box::new(handle));
            }
            Err(e) => {
                error!(error = %e, "Log rotation failed; keeping current output");
                if !Level::Error.passes(self.level()) {
                    return;
                }
                let text = format!("log rotation failed: {e}");
                let mut line = self.pool.get();
                let mut body = self.pool.get();
                state.render(Level::Error, location, &Message::Args(&[&text]), &mut body, &mut line);
                // counted, but the next crossing check belongs to the next call
                if let Ok(n) = state.write(&line) {
                    state.rotator.reach_limit(n);
                }
            }
        }
    }

    #[track_caller]
    fn log_json<T: Serialize + ?Sized>(&self, level: Level, value: &T) -> Result<usize> {
        if !level.passes(self.level()) {
            return Ok(0);
        }
        self.log(level, Message::json(value)?)
    }

    #[track_caller]
    fn escalate(&self, message: Message<'_>, kind: fn(String) -> LogError) -> Result<Infallible> {
        let text = message.render();
        if let Err(e) = self.log(Level::Print, message) {
            error!(error = %e, "Failed to write escalated log line");
        }
        Err(kind(text))
    }

    #[track_caller]
    pub fn print(&self, args: &[&dyn fmt::Display]) -> Result<usize> {
        self.log(Level::Print, Message::Args(args))
    }

    #[track_caller]
    pub fn printf(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.log(Level::Print, Message::Format(args))
    }

    #[track_caller]
    pub fn printj<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        self.log_json(Level::Print, value)
    }

    #[track_caller]
    pub fn debug(&self, args: &[&dyn fmt::Display]) -> Result<usize> {
        self.log(Level::Debug, Message::Args(args))
    }

    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.log(Level::Debug, Message::Format(args))
    }

    #[track_caller]
    pub fn debugj<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        self.log_json(Level::Debug, value)
    }

    #[track_caller]
    pub fn info(&self, args: &[&dyn fmt::Display]) -> Result<usize> {
        self.log(Level::Info, Message::Args(args))
    }

    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.log(Level::Info, Message::Format(args))
    }

    #[track_caller]
    pub fn infoj<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        self.log_json(Level::Info, value)
    }

    #[track_caller]
    pub fn warn(&self, args: &[&dyn fmt::Display]) -> Result<usize> {
        self.log(Level::Warn, Message::Args(args))
    }

    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.log(Level::Warn, Message::Format(args))
    }

    #[track_caller]
    pub fn warnj<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        self.log_json(Level::Warn, value)
    }

    #[track_caller]
    pub fn error(&self, args: &[&dyn fmt::Display]) -> Result<usize> {
        self.log(Level::Error, Message::Args(args))
    }

    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.log(Level::Error, Message::Format(args))
    }

    #[track_caller]
    pub fn errorj<T: Serialize + ?Sized>(&self, value: &T) -> Result<usize> {
        self.log_json(Level::Error, value)
    }

    /// Write unconditionally, then hand back [`LogError::Fatal`]. Process
    /// termination is left to the caller, see [`LogError::escalate`].
    #[track_caller]
    pub fn fatal(&self, args: &[&dyn fmt::Display]) -> Result<Infallible> {
        self.escalate(Message::Args(args), |message| LogError::Fatal { message })
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> Result<Infallible> {
        self.escalate(Message::Format(args), |message| LogError::Fatal { message })
    }

    #[track_caller]
    pub fn fatalj<T: Serialize + ?Sized>(&self, value: &T) -> Result<Infallible> {
        self.escalate(Message::json(value)?, |message| LogError::Fatal { message })
    }

    /// Write unconditionally, then hand back [`LogError::Panic`].
    #[track_caller]
    pub fn panic(&self, args: &[&dyn fmt::Display]) -> Result<Infallible> {
        self.escalate(Message::Args(args), |message| LogError::Panic { message })
    }

    #[track_caller]
    pub fn panicf(&self, args: fmt::Arguments<'_>) -> Result<Infallible> {
        self.escalate(Message::Format(args), |message| LogError::Panic { message })
    }

    #[track_caller]
    pub fn panicj<T: Serialize + ?Sized>(&self, value: &T) -> Result<Infallible> {
        self.escalate(Message::json(value)?, |message| LogError::Panic { message })
    }
}

impl<R: Rotator> State<R> {
    fn set_output(&mut self, output: Box<dyn LogOutput>) {
        self.output = output;
        self.refresh_labels();
    }

    fn refresh_labels(&mut self) {
        self.labels = level_labels(self.color && self.output.is_terminal());
    }

    fn write(&mut self, line: &[u8]) -> Result<usize> {
        self.output.write_all(line)?;
        Ok(line.len())
    }

    /// Header, then the body merged in, then a newline.
    fn render(
        &self,
        level: Level,
        location: &Location<'_>,
        message: &Message<'_>,
        body: &mut Vec<u8>,
        line: &mut Vec<u8>,
    ) {
        let fields = HeaderFields {
            level: &self.labels[level as usize],
            prefix: &self.prefix,
            file: location.file(),
            line: location.line(),
        };
        self.template.render(&fields, line);
        message.write_to(body);

        if is_json_header(line) {
            merge_into_json(line, message, body);
        } else {
            line.push(b' ');
            line.extend_from_slice(body);
        }
        line.push(b'\n');
    }
}

/// Splice `body` into the JSON object in `line`: a JSON body contributes its
/// fields, any other body becomes a `"message"` string field.
fn merge_into_json(line: &mut Vec<u8>, message: &Message<'_>, body: &[u8]) {
    let Some(close) = line.iter().rposition(|b| *b == b'}') else {
        return;
    };
    line.truncate(close);
    let empty_header = line
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_none_or(|b| *b == b'{');

    if message.is_json() {
        // body is a serialized object: `{...}`
        let fields = &body[1..body.len() - 1];
        if !fields.is_empty() {
            if !empty_header {
                line.push(b',');
            }
            line.extend_from_slice(fields);
        }
    } else {
        if !empty_header {
            line.push(b',');
        }
        line.extend_from_slice(br#""message":"#);
        let text = String::from_utf8_lossy(body);
        // serializing a str into a Vec cannot fail
        let _ = serde_json::to_writer(&mut *line, &*text);
    }
    line.push(b'}');
}

fn level_labels(colorize: bool) -> [String; LEVEL_COUNT] {
    let label = |level: Level| -> String {
        let text = level.label();
        if !colorize {
            return text.to_string();
        }
        match level {
            Level::Debug => text.blue().to_string(),
            Level::Info => text.green().to_string(),
            Level::Warn => text.yellow().to_string(),
            Level::Error => text.red().to_string(),
            Level::Print | Level::Off => text.to_string(),
        }
    };
    [
        label(Level::Print),
        label(Level::Debug),
        label(Level::Info),
        label(Level::Warn),
        label(Level::Error),
        label(Level::Off),
    ]
}
