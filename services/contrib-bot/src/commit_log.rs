//! Keep-alive log format
//!
//! The tracked file is a list of `- <timestamp>` lines, one per UTC day,
//! separated by blank lines. Only the last non-blank line matters when
//! deciding whether today already has an entry.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

const ENTRY_PREFIX: &str = "- ";

/// A trailing line that is not a `- <timestamp>` entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed log entry: {line:?}")]
pub struct MalformedLogEntry {
    pub line: String,
}

/// What the last line of the log says about today
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogState {
    /// No file, or nothing but blank lines
    Empty,
    /// Last entry falls on the current UTC day
    Today(DateTime<Utc>),
    /// Last entry is from an earlier (or later) UTC day
    OtherDay(DateTime<Utc>),
    /// Last line could not be parsed
    Malformed(MalformedLogEntry),
}

impl LogState {
    pub fn has_entry_today(&self) -> bool {
        matches!(self, LogState::Today(_))
    }
}

/// `2024-01-01T00:00:00.000Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A complete log line including its terminating newline
pub fn entry_line(at: DateTime<Utc>) -> String {
    format!("{}{}\n", ENTRY_PREFIX, format_timestamp(at))
}

/// Last non-blank line of the log, without its line ending
pub fn last_line(text: &str) -> Option<&str> {
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
}

/// Parse a `- <timestamp>` line.
///
/// Accepts RFC 3339 timestamps and naive ISO timestamps, which are read as UTC.
pub fn parse_entry(line: &str) -> Result<DateTime<Utc>, MalformedLogEntry> {
    let malformed = || MalformedLogEntry {
        line: line.to_string(),
    };

    let raw = line.strip_prefix(ENTRY_PREFIX).ok_or_else(malformed)?.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(malformed())
}

/// Classify the log relative to the UTC day of `now`
pub fn inspect(text: &str, now: DateTime<Utc>) -> LogState {
    let Some(line) = last_line(text) else {
        return LogState::Empty;
    };

    match parse_entry(line) {
        Ok(at) if at.date_naive() == now.date_naive() => LogState::Today(at),
        Ok(at) => LogState::OtherDay(at),
        Err(malformed) => LogState::Malformed(malformed),
    }
}

/// New log content with an entry for `now` appended.
///
/// Existing content is kept byte for byte and followed by one blank line.
pub fn append_entry(prior: Option<&str>, now: DateTime<Utc>) -> String {
    let line = entry_line(now);
    match prior {
        Some(text) if !text.is_empty() => {
            let mut content = String::with_capacity(text.len() + line.len() + 2);
            content.push_str(text);
            if !text.ends_with('\n') {
                content.push('\n');
            }
            content.push('\n');
            content.push_str(&line);
            content
        }
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(
            format_timestamp(at(2024, 1, 2, 0, 0, 5)),
            "2024-01-02T00:00:05.000Z"
        );
        assert_eq!(
            entry_line(at(2024, 1, 1, 0, 0, 0)),
            "- 2024-01-01T00:00:00.000Z\n"
        );
    }

    #[test]
    fn test_last_line_skips_blank_lines() {
        let text = "- 2024-01-01T00:00:00.000Z\n\n- 2024-01-02T00:00:05.000Z\n\n  \n";
        assert_eq!(last_line(text), Some("- 2024-01-02T00:00:05.000Z"));
        assert_eq!(last_line("\r\n- a\r\n"), Some("- a"));
        assert_eq!(last_line(""), None);
        assert_eq!(last_line("\n\n"), None);
    }

    #[test]
    fn test_parse_entry_variants() {
        let expected = at(2024, 1, 1, 10, 30, 0);
        assert_eq!(parse_entry("- 2024-01-01T10:30:00.000Z"), Ok(expected));
        assert_eq!(parse_entry("- 2024-01-01T10:30:00+00:00"), Ok(expected));
        assert_eq!(parse_entry("- 2024-01-01T10:30:00"), Ok(expected));
        assert_eq!(parse_entry("- 2024-01-01T10:30:00.123456"), Ok(
            expected + chrono::Duration::microseconds(123_456)
        ));
        assert_eq!(parse_entry("-  2024-01-01T10:30:00Z  "), Ok(expected));
    }

    #[test]
    fn test_parse_entry_converts_offsets_to_utc() {
        // 23:30 at -02:00 is already the next UTC day
        let parsed = parse_entry("- 2024-01-01T23:30:00-02:00").unwrap();
        assert_eq!(parsed, at(2024, 1, 2, 1, 30, 0));
    }

    #[test]
    fn test_parse_entry_rejects_malformed() {
        for line in ["2024-01-01T00:00:00Z", "- yesterday", "* 2024-01-01", "-"] {
            let err = parse_entry(line).unwrap_err();
            assert_eq!(err.line, line);
        }
    }

    #[test]
    fn test_inspect() {
        let now = at(2024, 1, 1, 23, 59, 59);

        assert_eq!(inspect("", now), LogState::Empty);
        assert!(inspect("- 2024-01-01T00:00:00.000Z\n", now).has_entry_today());
        assert_eq!(
            inspect("- 2023-12-31T23:59:59.999Z\n", now),
            LogState::OtherDay(
                at(2023, 12, 31, 23, 59, 59) + chrono::Duration::milliseconds(999)
            )
        );
        assert!(matches!(
            inspect("- 2024-01-01T00:00:00.000Z\n\nnot an entry\n", now),
            LogState::Malformed(_)
        ));
    }

    #[test]
    fn test_append_to_empty_log() {
        let now = at(2024, 1, 1, 0, 0, 0);
        assert_eq!(append_entry(None, now), "- 2024-01-01T00:00:00.000Z\n");
        assert_eq!(append_entry(Some(""), now), "- 2024-01-01T00:00:00.000Z\n");
    }

    #[test]
    fn test_append_after_prior_entry() {
        let now = at(2024, 1, 2, 0, 0, 5);
        assert_eq!(
            append_entry(Some("- 2024-01-01T00:00:00.000Z\n"), now),
            "- 2024-01-01T00:00:00.000Z\n\n- 2024-01-02T00:00:05.000Z\n"
        );
    }

    #[test]
    fn test_append_terminates_unterminated_prior_line() {
        let now = at(2024, 1, 2, 0, 0, 5);
        assert_eq!(
            append_entry(Some("# keep alive"), now),
            "# keep alive\n\n- 2024-01-02T00:00:05.000Z\n"
        );
    }
}
