//! Sidecar text format.
//!
//! ```text
//! path to data file: <path>
//! <optional blank line>
//! <keyword_0>:  <value_0>
//! <keyword_1>:  <value_1>
//! ```

use crate::config::SidecarFormat;
use crate::{MdtagError, Result};
use std::path::Path;

/// Parsed contents of one sidecar file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSidecar {
    /// Text after the header prefix, if the header had one.
    pub data_path: Option<String>,
    /// Keyword/value pairs in file order.
    pub entries: Vec<(String, String)>,
}

impl ParsedSidecar {
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Value on the first body line. By format this is the process keyword.
    pub fn process_value(&self) -> Option<&str> {
        self.entries.first().map(|(_, v)| v.as_str())
    }
}

/// Remove characters that would break the one-line-per-keyword layout.
pub fn strip_newlines(value: &str) -> String {
    value.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Render a sidecar file.
pub fn render_sidecar<'a, I>(data_path: &Path, entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    out.push_str(SidecarFormat::HEADER_PREFIX);
    // File names may hold line breaks; the header must stay one line.
    out.push_str(&strip_newlines(&data_path.display().to_string()));
    out.push_str("\n\n");
    for (keyword, value) in entries {
        out.push_str(keyword);
        out.push_str(SidecarFormat::SEPARATOR);
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Parse a sidecar file.
///
/// The header may take one or two lines (older files have no blank line).
/// `source` is only used for error context.
pub fn parse_sidecar(text: &str, source: Option<&Path>) -> Result<ParsedSidecar> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(header) = lines.first() else {
        return Err(MdtagError::MalformedRecord {
            path: source.map(Path::to_path_buf),
            line: 1,
            content: String::new(),
        });
    };

    let data_path = header
        .strip_prefix(SidecarFormat::HEADER_PREFIX)
        .map(str::to_string);

    let body_start = if lines.get(1).is_some_and(|l| l.is_empty()) {
        2
    } else {
        1
    };

    let mut entries = Vec::with_capacity(lines.len().saturating_sub(body_start));
    for (offset, line) in lines.iter().enumerate().skip(body_start) {
        let Some((keyword, value)) = line.split_once(SidecarFormat::SEPARATOR) else {
            return Err(MdtagError::MalformedRecord {
                path: source.map(Path::to_path_buf),
                line: offset + 1,
                content: line.to_string(),
            });
        };
        entries.push((keyword.to_string(), value.to_string()));
    }

    Ok(ParsedSidecar { data_path, entries })
}
