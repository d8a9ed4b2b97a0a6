//! Size-rotated structured logging for rotalog.
//!
//! A [`Logger`] renders a `${placeholder}` header and a message body into one
//! line (plain text or a JSON object), writes it to the current output and
//! rotates to a new file through a [`Rotator`] once the configured byte
//! limit is crossed.

pub mod error;
pub mod file_rotator;
pub mod level;
pub mod logger;
pub mod message;
pub mod output;
pub mod pool;
pub mod rotator;
pub mod subscriber;
pub mod template;

pub use error::{LogError, Result};
pub use file_rotator::{parse_file_mode, FileSizeRotator, LogFile, DEFAULT_LIMIT};
pub use level::Level;
pub use logger::Logger;
pub use message::Message;
pub use output::LogOutput;
pub use rotator::{NeverRotate, Rotator};
pub use subscriber::init_tracing;
pub use template::{HeaderTemplate, DEFAULT_HEADER};
