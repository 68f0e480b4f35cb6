//! The line format shared by every output and by the statistics collector.
//!
//! A formatted line looks like:
//!
//! ```text
//! [2024-01-01 00:00:00.000] [INFO] message text
//! ```
//!
//! Exactly two bracketed fields precede the free text. Readers locate the
//! first two bracket pairs positionally, so the message itself may contain
//! further brackets. Lines travel newline delimited over sockets; the
//! terminator is not part of the formatted line.

use crate::{LogLevel, Timestamp};

/// A single message as submitted by a producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogMessage {
    pub text: String,
    pub level: LogLevel,
}

impl LogMessage {
    pub fn new(text: impl Into<String>, level: LogLevel) -> LogMessage {
        LogMessage {
            text: text.into(),
            level,
        }
    }
}

/// Appends `[timestamp] [LEVEL] text` to `out`.
pub fn format_line(
    out: &mut String,
    timestamp: &Timestamp,
    timestamp_format: &str,
    level: LogLevel,
    text: &str,
) {
    out.reserve(text.len() + 36);
    out.push('[');
    timestamp.write_into(out, timestamp_format);
    out.push_str("] [");
    out.push_str(level.as_str());
    out.push_str("] ");
    out.push_str(text);
}

/// The fields recovered from a formatted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub timestamp: &'a str,
    pub level: LogLevel,
    pub message: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    MissingTimestampOpen,
    MissingTimestampClose,
    MissingLevelOpen,
    MissingLevelClose,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self {
            ParseError::MissingTimestampOpen => "missing `[` opening the timestamp",
            ParseError::MissingTimestampClose => "missing `]` closing the timestamp",
            ParseError::MissingLevelOpen => "missing `[` opening the level",
            ParseError::MissingLevelClose => "missing `]` closing the level",
        };
        f.write_str(what)
    }
}

impl std::error::Error for ParseError {}

/// Parses a line produced by [`format_line`].
///
/// The level name goes through [`LogLevel::from_name`], so an unknown level
/// reads as `Info`. Leading spaces and tabs before the message are skipped.
pub fn parse_line(line: &str) -> Result<ParsedLine<'_>, ParseError> {
    let ts_open = line.find('[').ok_or(ParseError::MissingTimestampOpen)?;
    let ts_close = ts_open
        + line[ts_open..]
            .find(']')
            .ok_or(ParseError::MissingTimestampClose)?;
    let level_open = ts_close
        + line[ts_close..]
            .find('[')
            .ok_or(ParseError::MissingLevelOpen)?;
    let level_close = level_open
        + line[level_open..]
            .find(']')
            .ok_or(ParseError::MissingLevelClose)?;

    let level = LogLevel::from_name(&line[level_open + 1..level_close]);
    let message = line[level_close + 1..].trim_start_matches([' ', '\t']);
    Ok(ParsedLine {
        timestamp: &line[ts_open + 1..ts_close],
        level,
        message,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use jiff::{civil, tz::TimeZone};

    fn fixed_timestamp() -> Timestamp {
        let zoned = civil::date(2024, 1, 1)
            .at(0, 0, 0, 1_000_000)
            .to_zoned(TimeZone::UTC)
            .unwrap();
        Timestamp::from_zoned(zoned)
    }

    #[test]
    fn format_layout() {
        let mut out = String::new();
        format_line(
            &mut out,
            &fixed_timestamp(),
            crate::DEFAULT_TIMESTAMP_FORMAT,
            LogLevel::Warning,
            "disk almost full",
        );
        assert_eq!(out, "[2024-01-01 00:00:00.001] [WARNING] disk almost full");
    }

    #[test]
    fn parse_formatted_line() {
        let parsed = parse_line("[2024-01-01 00:00:00.001] [WARNING] bye").unwrap();
        assert_eq!(parsed.timestamp, "2024-01-01 00:00:00.001");
        assert_eq!(parsed.level, LogLevel::Warning);
        assert_eq!(parsed.message, "bye");
    }

    #[test]
    fn parse_tolerates_brackets_in_message() {
        let parsed = parse_line("[t] [DEBUG] [worker 3] done [ok]").unwrap();
        assert_eq!(parsed.level, LogLevel::Debug);
        assert_eq!(parsed.message, "[worker 3] done [ok]");
    }

    #[test]
    fn parse_edge_cases() {
        let parsed = parse_line("[t] [INFO]").unwrap();
        assert_eq!(parsed.message, "");
        let parsed = parse_line("[t] [info] \t  spaced").unwrap();
        assert_eq!(parsed.level, LogLevel::Info);
        assert_eq!(parsed.message, "spaced");
        let parsed = parse_line("[t] [FATAL] x").unwrap();
        assert_eq!(parsed.level, LogLevel::Info);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_line("no brackets"), Err(ParseError::MissingTimestampOpen));
        assert_eq!(parse_line("[open"), Err(ParseError::MissingTimestampClose));
        assert_eq!(parse_line("[t] INFO x"), Err(ParseError::MissingLevelOpen));
        assert_eq!(parse_line("[t] [INFO x"), Err(ParseError::MissingLevelClose));
    }
}
