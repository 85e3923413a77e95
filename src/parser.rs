use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::model::RawEntry;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([\w.]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\n#]*?))\s*(?:#.*)?$"#)
        .expect("line pattern should compile")
});

/// Decode dotenv text into raw entries.
///
/// Blank lines and `#` comments are skipped. A line that is not a
/// `KEY=VALUE` pair is reported as a warning and skipped; decoding itself
/// never fails.
pub fn decode(input: &str, diagnostics: &mut Diagnostics) -> Vec<RawEntry> {
    let normalized = normalize_newlines(input);
    let mut entries = Vec::new();

    for (idx, raw_line) in normalized.lines().enumerate() {
        let line_num = idx as u32 + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Some((key, value)) => entries.push(RawEntry::new(line_num, key, value)),
            None => diagnostics.warning(line_num, "line not matched"),
        }
    }

    entries
}

/// Match a single trimmed line, returning its key and normalized value.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let captures = LINE_PATTERN.captures(line)?;
    let key = captures.get(1)?.as_str();
    let value = captures
        .iter()
        .skip(2)
        .flatten()
        .next()
        .map(|m| m.as_str())
        .unwrap_or_default();
    Some((key, normalize_value(value)))
}

/// Strip one pair of matching enclosing quotes.
///
/// A value is unquoted only when its first and last characters are the same
/// quote character; anything else is returned as is. A lone quote character
/// counts as an empty quoted value.
pub fn normalize_value(raw: &str) -> &str {
    for quote in ['"', '\''] {
        if raw.starts_with(quote) && raw.ends_with(quote) {
            if raw.len() == 1 {
                return "";
            }
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    Cow::Owned(out)
}
