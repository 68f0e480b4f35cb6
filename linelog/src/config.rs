use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::output::{FileOutput, Output, ReconnectingSocketOutput, RotatingFileOutput};
use crate::{LogLevel, DEFAULT_QUEUE_SIZE, DEFAULT_TIMESTAMP_FORMAT};

/// Tunables of a [`crate::Logger`].
///
/// # String Format
///
/// `LoggerConfig` parses from a comma separated list of `key=value` pairs.
/// Keys are the field names, in either `snake_case` or `camelCase`; omitted
/// keys keep their default. Values may not contain commas.
///
/// ```
/// let config: linelog::LoggerConfig =
///     "default_level=warning, enableAsync=true, max_files=3".parse().unwrap();
/// assert_eq!(config.default_level, linelog::LogLevel::Warning);
/// assert!(config.enable_async);
/// assert_eq!(config.max_files, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Messages below this level are dropped.
    pub default_level: LogLevel,
    pub enable_async: bool,
    /// Capacity of the async queue; a full queue rejects new messages.
    pub async_queue_size: usize,
    pub max_file_size_mb: u64,
    /// Active file plus numbered archives.
    pub max_files: usize,
    pub enable_rotation: bool,
    pub compress_old_logs: bool,
    /// strftime style format, milliseconds are always appended.
    pub timestamp_format: String,
    pub reconnect_interval_ms: u64,
    /// Non-positive means retry until connected.
    pub max_reconnect_attempts: i32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            default_level: LogLevel::Info,
            enable_async: false,
            async_queue_size: DEFAULT_QUEUE_SIZE,
            max_file_size_mb: 100,
            max_files: 10,
            enable_rotation: true,
            compress_old_logs: false,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            reconnect_interval_ms: 5000,
            max_reconnect_attempts: 10,
        }
    }
}

impl LoggerConfig {
    pub fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match normalized.as_str() {
            "defaultlevel" => {
                self.default_level = LogLevel::ALL
                    .into_iter()
                    .find(|level| value.eq_ignore_ascii_case(level.as_str()))
                    .ok_or_else(invalid)?;
            }
            "enableasync" => self.enable_async = parse_bool(value).ok_or_else(invalid)?,
            "asyncqueuesize" => self.async_queue_size = value.parse().map_err(|_| invalid())?,
            "maxfilesizemb" => self.max_file_size_mb = value.parse().map_err(|_| invalid())?,
            "maxfiles" => self.max_files = value.parse().map_err(|_| invalid())?,
            "enablerotation" => self.enable_rotation = parse_bool(value).ok_or_else(invalid)?,
            "compressoldlogs" => self.compress_old_logs = parse_bool(value).ok_or_else(invalid)?,
            "timestampformat" => self.timestamp_format = value.to_string(),
            "reconnectintervalms" => {
                self.reconnect_interval_ms = value.parse().map_err(|_| invalid())?
            }
            "maxreconnectattempts" => {
                self.max_reconnect_attempts = value.parse().map_err(|_| invalid())?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl FromStr for LoggerConfig {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut config = LoggerConfig::default();
        for entry in input.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((key, value)) = entry.split_once('=') else {
                return Err(ConfigError::MissingValue(entry.to_string()));
            };
            config.apply(key.trim(), value.trim())?;
        }
        Ok(config)
    }
}

/// Where a logger built from configuration sends its lines.
///
/// # String Format
///
/// - `"Stdout"`
/// - `"File:/var/log/app.log"`
/// - `"Socket:127.0.0.1:9000"`; the port follows the last `:`, IPv6 hosts
///   are written in brackets (`"Socket:[::1]:9000"`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Stdout,
    File { path: PathBuf },
    Socket { host: String, port: u16 },
}

impl Target {
    /// Builds the output for this target: files rotate when the config
    /// enables rotation and sockets always reconnect.
    pub fn build_output(&self, config: &LoggerConfig) -> Output {
        match self {
            Target::Stdout => Output::stdout(),
            Target::File { path } if config.enable_rotation => RotatingFileOutput::open(
                path,
                config.max_file_size_mb,
                config.max_files,
                config.compress_old_logs,
            )
            .into(),
            Target::File { path } => FileOutput::open(path).into(),
            Target::Socket { host, port } => ReconnectingSocketOutput::connect(
                host.clone(),
                *port,
                config.reconnect_interval(),
                config.max_reconnect_attempts,
            )
            .into(),
        }
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = input.split_once(':').unwrap_or((input, ""));
        match kind {
            "Stdout" => Ok(Target::Stdout),
            "File" => {
                if rest.is_empty() {
                    Err(ConfigError::InvalidTarget(
                        "File path is required and must not be empty".into(),
                    ))
                } else {
                    Ok(Target::File {
                        path: PathBuf::from(rest),
                    })
                }
            }
            "Socket" => {
                let Some((host, port)) = rest.rsplit_once(':') else {
                    return Err(ConfigError::InvalidTarget(
                        "Socket requires `host:port`".into(),
                    ));
                };
                let host = host
                    .strip_prefix('[')
                    .and_then(|host| host.strip_suffix(']'))
                    .unwrap_or(host);
                if host.is_empty() {
                    return Err(ConfigError::InvalidTarget("Socket host must not be empty".into()));
                }
                let port = port
                    .parse()
                    .map_err(|_| ConfigError::InvalidTarget(format!("invalid port `{port}`")))?;
                Ok(Target::Socket {
                    host: host.to_string(),
                    port,
                })
            }
            _ => Err(ConfigError::InvalidTarget(format!("unknown target kind `{kind}`"))),
        }
    }
}
