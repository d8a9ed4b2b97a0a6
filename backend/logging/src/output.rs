//! Destinations a [`Logger`](crate::Logger) can write rendered lines to.

use std::fs::File;
use std::io::{self, IsTerminal, Write};

/// A writable log destination.
///
/// `is_terminal` decides whether level labels may be colorized.
pub trait LogOutput: Write + Send {
    fn is_terminal(&self) -> bool {
        false
    }
}

impl LogOutput for io::Stdout {
    fn is_terminal(&self) -> bool {
        IsTerminal::is_terminal(self)
    }
}

impl LogOutput for io::Stderr {
    fn is_terminal(&self) -> bool {
        IsTerminal::is_terminal(self)
    }
}

impl LogOutput for File {
    fn is_terminal(&self) -> bool {
        IsTerminal::is_terminal(self)
    }
}

impl LogOutput for Vec<u8> {}

impl LogOutput for io::Sink {}

impl<T: LogOutput + ?Sized> LogOutput for Box<T> {
    fn is_terminal(&self) -> bool {
        (**self).is_terminal()
    }
}
