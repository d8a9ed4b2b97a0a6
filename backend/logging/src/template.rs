//! Header templates.
//!
//! A header is a format string with `${name}` placeholders resolved on every
//! log call. Recognized names are `time_rfc3339`, `level`, `prefix`,
//! `short_file`, `long_file` and `line`; anything else renders as empty text.

use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{Local, SecondsFormat};
use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern"));

/// JSON header used when none is configured.
pub use rotalog_config::DEFAULT_HEADER;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Placeholder {
    TimeRfc3339,
    Level,
    Prefix,
    ShortFile,
    LongFile,
    Line,
    Unknown(String),
}

impl Placeholder {
    fn parse(name: &str) -> Self {
        match name {
            "time_rfc3339" => Placeholder::TimeRfc3339,
            "level" => Placeholder::Level,
            "prefix" => Placeholder::Prefix,
            "short_file" => Placeholder::ShortFile,
            "long_file" => Placeholder::LongFile,
            "line" => Placeholder::Line,
            other => Placeholder::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Tag(Placeholder),
}

/// Values available to a header while rendering one line.
#[derive(Debug, Clone, Copy)]
pub struct HeaderFields<'a> {
    pub level: &'a str,
    pub prefix: &'a str,
    pub file: &'a str,
    pub line: u32,
}

/// A compiled header template.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl HeaderTemplate {
    pub fn new(format: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(format) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                segments.push(Segment::Literal(format[last..whole.start()].to_string()));
            }
            segments.push(Segment::Tag(Placeholder::parse(&caps[1])));
            last = whole.end();
        }
        if last < format.len() {
            segments.push(Segment::Literal(format[last..].to_string()));
        }
        Self {
            source: format.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names that will render as empty text.
    pub fn unknown_placeholders(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Tag(Placeholder::Unknown(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Append the resolved header to `out`.
    pub fn render(&self, fields: &HeaderFields<'_>, out: &mut Vec<u8>) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.extend_from_slice(text.as_bytes()),
                Segment::Tag(tag) => render_tag(tag, fields, out),
            }
        }
    }
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER)
    }
}

fn render_tag(tag: &Placeholder, fields: &HeaderFields<'_>, out: &mut Vec<u8>) {
    match tag {
        Placeholder::TimeRfc3339 => {
            let now = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            out.extend_from_slice(now.as_bytes());
        }
        Placeholder::Level => out.extend_from_slice(fields.level.as_bytes()),
        Placeholder::Prefix => out.extend_from_slice(fields.prefix.as_bytes()),
        Placeholder::LongFile => out.extend_from_slice(fields.file.as_bytes()),
        Placeholder::ShortFile => {
            let short = Path::new(fields.file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(fields.file);
            out.extend_from_slice(short.as_bytes());
        }
        Placeholder::Line => {
            // writing into a Vec cannot fail
            let _ = write!(out, "{}", fields.line);
        }
        Placeholder::Unknown(_) => {}
    }
}

/// Whether a rendered header is a JSON object, i.e. its last
/// non-whitespace byte is `}`.
pub fn is_json_header(rendered: &[u8]) -> bool {
    rendered
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> HeaderFields<'static> {
        HeaderFields {
            level: "INFO",
            prefix: "api",
            file: "backend/logging/src/logger.rs",
            line: 42,
        }
    }

    fn render(format: &str) -> String {
        let mut out = Vec::new();
        HeaderTemplate::new(format).render(&fields(), &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn resolves_known_placeholders() {
        assert_eq!(
            render("[${level}] ${prefix} ${short_file}:${line}"),
            "[INFO] api logger.rs:42"
        );
        assert_eq!(render("${long_file}"), "backend/logging/src/logger.rs");
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let t = HeaderTemplate::new("a${nope}b");
        assert_eq!(t.unknown_placeholders(), vec!["nope"]);
        assert_eq!(render("a${nope}b"), "ab");
    }

    #[test]
    fn time_is_rfc3339() {
        let out = render("${time_rfc3339}");
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok(), "{out}");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(render("${level"), "${level");
    }

    #[test]
    fn default_header_is_json_shaped() {
        let mut out = Vec::new();
        HeaderTemplate::default().render(&fields(), &mut out);
        assert!(is_json_header(&out));
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["level"], "INFO");
        assert_eq!(v["file"], "logger.rs");
        assert_eq!(v["line"], "42");
    }

    #[test]
    fn json_detection_ignores_trailing_whitespace() {
        assert!(is_json_header(b"{\"a\":1}  \n"));
        assert!(!is_json_header(b"INFO:"));
        assert!(!is_json_header(b""));
    }
}
