//! The rotation capability a [`Logger`](crate::Logger) drives after each write.

use std::io;
use std::path::Path;

use crate::error::{LogError, Result};
use crate::output::LogOutput;

/// Output rotation strategy.
///
/// `reach_limit` is called on the hot path after every successful write and
/// must not do I/O. `next_writer` is only called once it returns `true`.
pub trait Rotator: Send {
    type Handle: LogOutput + 'static;

    /// Add `written` bytes to the counter; `true` once the limit is crossed.
    fn reach_limit(&self, written: usize) -> bool;

    /// Open the next destination, releasing the previous one.
    fn next_writer(&mut self) -> Result<Self::Handle>;

    /// The destination currently open, if any. Handles that share a
    /// descriptor release it when the last clone is dropped.
    fn current_handle(&self) -> Option<&Self::Handle>;

    /// Bytes counted against the current destination.
    fn current_size(&self) -> u64 {
        0
    }

    fn current_path(&self) -> Option<&Path> {
        None
    }
}

/// Strategy that never rotates. Used when the logger writes to a fixed output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverRotate;

impl Rotator for NeverRotate {
    type Handle = io::Sink;

    fn reach_limit(&self, _written: usize) -> bool {
        false
    }

    fn next_writer(&mut self) -> Result<io::Sink> {
        Err(LogError::Rotation("rotation is disabled".to_string()))
    }

    fn current_handle(&self) -> Option<&io::Sink> {
        None
    }
}
