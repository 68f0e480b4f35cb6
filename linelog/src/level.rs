/// Severity of a log message.
///
/// Levels are totally ordered `Debug < Info < Warning`; a message is emitted
/// only when its level is at least the logger's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [LogLevel::Debug, LogLevel::Info, LogLevel::Warning];

    /// Uppercase name used in formatted lines, e.g. `"WARNING"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
        }
    }

    /// Case-insensitive lookup of a level name. Unrecognized names map to
    /// `Info` rather than failing.
    pub fn from_name(name: &str) -> LogLevel {
        for level in LogLevel::ALL {
            if name.eq_ignore_ascii_case(level.as_str()) {
                return level;
            }
        }
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn log_level_to_string(level: LogLevel) -> &'static str {
    level.as_str()
}

pub fn string_to_log_level(name: &str) -> LogLevel {
    LogLevel::from_name(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn level_names_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(string_to_log_level(log_level_to_string(level)), level);
        }
        assert_eq!(log_level_to_string(LogLevel::Debug), "DEBUG");
        assert_eq!(log_level_to_string(LogLevel::Info), "INFO");
        assert_eq!(log_level_to_string(LogLevel::Warning), "WARNING");
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(string_to_log_level("debug"), LogLevel::Debug);
        assert_eq!(string_to_log_level("info"), LogLevel::Info);
        assert_eq!(string_to_log_level("Warning"), LogLevel::Warning);
        assert_eq!(string_to_log_level("wArNiNg"), LogLevel::Warning);
    }

    #[test]
    fn unknown_names_fall_back_to_info() {
        for name in ["", "unknown", "WARN", "ERROR", " INFO", "trace"] {
            assert_eq!(string_to_log_level(name), LogLevel::Info, "{name:?}");
        }
    }

    #[test]
    fn ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
    }
}
