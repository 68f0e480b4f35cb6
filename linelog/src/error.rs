/// Failure kinds reported by the logging pipeline.
///
/// Output failures never unwind through the core; they surface as `false`
/// from a write and are recorded here as the logger's last error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoggingError {
    #[default]
    Success,
    FileOpenFailed,
    FileWriteFailed,
    SocketConnectionFailed,
    SocketWriteFailed,
    ConfigParseError,
    QueueOverflow,
    RotationFailed,
}

impl LoggingError {
    pub fn code(self) -> u32 {
        match self {
            LoggingError::Success => 0,
            LoggingError::FileOpenFailed => 1001,
            LoggingError::FileWriteFailed => 1002,
            LoggingError::SocketConnectionFailed => 2001,
            LoggingError::SocketWriteFailed => 2002,
            LoggingError::ConfigParseError => 3001,
            LoggingError::QueueOverflow => 5001,
            LoggingError::RotationFailed => 6001,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoggingError::Success => "SUCCESS",
            LoggingError::FileOpenFailed => "FILE_OPEN_FAILED",
            LoggingError::FileWriteFailed => "FILE_WRITE_FAILED",
            LoggingError::SocketConnectionFailed => "SOCKET_CONNECTION_FAILED",
            LoggingError::SocketWriteFailed => "SOCKET_WRITE_FAILED",
            LoggingError::ConfigParseError => "CONFIG_PARSE_ERROR",
            LoggingError::QueueOverflow => "QUEUE_OVERFLOW",
            LoggingError::RotationFailed => "ROTATION_FAILED",
        }
    }
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

impl std::error::Error for LoggingError {}

/// Error produced while parsing a [`crate::LoggerConfig`] or [`crate::Target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownKey(String),
    InvalidValue { key: String, value: String },
    MissingValue(String),
    InvalidTarget(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownKey(key) => write!(f, "unknown config key `{key}`"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for config key `{key}`")
            }
            ConfigError::MissingValue(key) => write!(f, "config key `{key}` is missing a value"),
            ConfigError::InvalidTarget(reason) => write!(f, "invalid target: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for LoggingError {
    fn from(_: ConfigError) -> LoggingError {
        LoggingError::ConfigParseError
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(LoggingError::default(), LoggingError::Success);
        assert_eq!(LoggingError::Success.code(), 0);
        assert_eq!(LoggingError::FileWriteFailed.code(), 1002);
        assert_eq!(LoggingError::SocketConnectionFailed.code(), 2001);
        assert_eq!(LoggingError::QueueOverflow.code(), 5001);
        assert_eq!(LoggingError::RotationFailed.to_string(), "ROTATION_FAILED (6001)");
        let err: LoggingError = ConfigError::UnknownKey("x".into()).into();
        assert_eq!(err, LoggingError::ConfigParseError);
    }
}
