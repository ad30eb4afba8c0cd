//! Shared utility functions for sitebackup crates

use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use unicode_normalization::UnicodeNormalization;

/// Format of archive timestamps; lexicographic order equals chronological order
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Indentation used for key/value lines in reports
pub const SPACER: &str = "    ";

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));

static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid separator regex"));

/// Current local time truncated to whole seconds
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Render a point in time as a 14-digit archive timestamp
pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a 14-digit archive timestamp
pub fn parse_timestamp(timestamp: &str) -> Result<NaiveDateTime> {
    if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_timestamp(timestamp));
    }
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|_| Error::invalid_timestamp(timestamp))
}

/// Convert a human title into a URL-safe slug
///
/// Characters are decomposed (NFKD) and reduced to ASCII, anything but word
/// characters, whitespace and hyphens is dropped, and runs of hyphens or
/// whitespace collapse to a single hyphen.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let cleaned = NON_SLUG_CHARS.replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();
    SLUG_SEPARATORS.replace_all(&lowered, "-").into_owned()
}

/// Format key/value pairs as an indented block, optionally headed by a title
///
/// Multi-line values continue on lines indented twice. Empty values are
/// rendered as `None`.
pub fn format_kv<K, V>(title: Option<&str>, pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = Vec::new();
    if let Some(title) = title {
        out.push(title.to_string());
    }

    for (key, value) in pairs {
        let key = key.as_ref();
        let mut lines = value.as_ref().lines();
        match lines.next() {
            Some(first) => {
                out.push(format!("{SPACER}{key}: {first}"));
                for line in lines {
                    out.push(format!("{SPACER}{SPACER}{line}"));
                }
            }
            None => out.push(format!("{SPACER}{key}: None")),
        }
    }

    out.join("\n")
}

/// Format a byte count using binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as hours, minutes and seconds
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    if total == 0 {
        return format!("{} ms", duration.as_millis());
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if seconds > 0 {
        parts.push(plural(seconds, "second"));
    }

    match parts.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        None => String::new(),
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
