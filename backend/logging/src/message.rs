//! Message bodies.
//!
//! A body is one of three explicit kinds rather than something inferred from
//! the arguments: default concatenation, `format_args!` output, or a JSON
//! object.

use std::fmt;
use std::io::Write as _;

use serde::Serialize;

use crate::error::{LogError, Result};

pub enum Message<'a> {
    /// Arguments joined with a single space.
    Args(&'a [&'a dyn fmt::Display]),
    Format(fmt::Arguments<'a>),
    /// Compact serialized JSON object, fields in serialization order.
    Json(Vec<u8>),
}

impl Message<'_> {
    /// Serialize `value` for a JSON-mode call. Only objects are accepted,
    /// since the fields are spliced into JSON headers.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Message<'static>> {
        let bytes = serde_json::to_vec(value)?;
        match bytes.first() {
            Some(b'{') => Ok(Message::Json(bytes)),
            first => Err(LogError::Serialization(format!(
                "JSON log payload must be an object, got {}",
                kind(first.copied())
            ))),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Message::Json(_))
    }

    /// Append the body to `out`. JSON bodies are written as compact JSON.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Message::Args(args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    let _ = write!(out, "{arg}");
                }
            }
            Message::Format(args) => {
                let _ = out.write_fmt(*args);
            }
            Message::Json(bytes) => out.extend_from_slice(bytes),
        }
    }

    pub fn render(&self) -> String {
        let mut out = Vec::new();
        self.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn kind(first: Option<u8>) -> &'static str {
    match first {
        Some(b'[') => "an array",
        Some(b'"') => "a string",
        Some(b'n') => "null",
        Some(b't' | b'f') => "a boolean",
        _ => "a number",
    }
}
