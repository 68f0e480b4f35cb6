//! Leveled line logging to files and TCP sockets.
//!
//! A [`Logger`] formats each message as `[<timestamp>] [<LEVEL>] <text>` and
//! hands it to one [`Output`]: a plain file, a size rotated file, a TCP
//! socket, or a TCP socket that reconnects in the background. Dispatch is
//! synchronous by default and can be moved onto a bounded queue drained by a
//! worker thread with [`Logger::enable_async`].
//!
//! # Process-wide Logger
//!
//! Applications usually install one logger with [`spawn_logger_from_env`] or
//! [`install_global`] and log through the [`debug!`], [`info!`] and
//! [`warning!`] macros:
//!
//! ```
//! let _guard = linelog::spawn_logger_from_env(true);
//! linelog::info!("listening on port {}", 9000);
//! ```

use std::sync::RwLock;

pub mod config;
pub mod encoding;
mod error;
mod level;
mod logger;
mod mutex;
pub mod output;
mod queue;
pub mod rotator;
mod timestamp;

pub use config::{LoggerConfig, Target};
pub use encoding::{format_line, parse_line, LogMessage, ParseError, ParsedLine};
pub use error::{ConfigError, LoggingError};
pub use level::{log_level_to_string, string_to_log_level, LogLevel};
pub use logger::Logger;
pub use output::{
    ClosureOutput, ConnectionState, FileOutput, LogOutput, Output, ReconnectingSocketOutput,
    RotatingFileOutput, SocketOutput, StdoutOutput,
};
pub use queue::{AsyncQueue, DEFAULT_QUEUE_SIZE};
pub use rotator::LogRotator;
pub use timestamp::{Timestamp, DEFAULT_TIMESTAMP_FORMAT};

static GLOBAL_LOGGER: RwLock<Option<Logger>> = RwLock::new(None);

/// Keeps the process-wide logger installed.
///
/// Dropping the guard uninstalls the logger, draining its async queue.
#[must_use]
pub struct GlobalGuard {
    _private: (),
}

impl Drop for GlobalGuard {
    fn drop(&mut self) {
        let previous = match GLOBAL_LOGGER.write() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        // Stopping the worker may block, so do it outside the lock.
        drop(previous);
    }
}

/// Installs `logger` as the process-wide logger used by the logging macros,
/// replacing any logger installed before.
pub fn install_global(logger: Logger) -> GlobalGuard {
    let previous = match GLOBAL_LOGGER.write() {
        Ok(mut slot) => slot.replace(logger),
        Err(poisoned) => poisoned.into_inner().replace(logger),
    };
    drop(previous);
    GlobalGuard { _private: () }
}

/// Backend of the logging macros.
///
/// Without an installed logger the line is formatted with the default
/// timestamp format and printed to stdout.
#[doc(hidden)]
pub fn global_log(level: LogLevel, args: std::fmt::Arguments<'_>) -> bool {
    let slot = match GLOBAL_LOGGER.read() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    let message = match args.as_str() {
        Some(message) => std::borrow::Cow::Borrowed(message),
        None => std::borrow::Cow::Owned(args.to_string()),
    };
    match slot.as_ref() {
        Some(logger) => logger.log(&message, level),
        None => {
            let mut line = String::new();
            format_line(
                &mut line,
                &Timestamp::now(),
                DEFAULT_TIMESTAMP_FORMAT,
                level,
                &message,
            );
            StdoutOutput.write_log(&line)
        }
    }
}

/// Builds a logger from the environment and installs it process-wide.
///
/// See [`logger_from_env`] for the variables read.
pub fn spawn_logger_from_env(quiet: bool) -> GlobalGuard {
    install_global(logger_from_env(quiet))
}

/// Builds a logger from the environment.
///
/// The target is read from `LINELOG_TARGET` (see [`Target`]) and the tunables
/// from `LINELOG_CONFIG` (see [`LoggerConfig`]). A missing or unparsable
/// variable falls back to its default; a parse failure is recorded on the
/// returned logger as [`LoggingError::ConfigParseError`]. Unless `quiet` is
/// set, the chosen configuration is printed to stdout.
pub fn logger_from_env(quiet: bool) -> Logger {
    let target = from_env::<Target>("LINELOG_TARGET", quiet);
    let config = from_env::<LoggerConfig>("LINELOG_CONFIG", quiet);
    if !quiet {
        println!("LINELOG: Using target {:?} with {:#?}", target.value, config.value);
        println!("LINELOG: target from the {}", target.source);
        println!("LINELOG: config from the {}", config.source);
    }
    let logger = Logger::with_config(&target.value, config.value);
    for (var, err) in [target.error, config.error].into_iter().flatten() {
        logger.record_error(LoggingError::from(err.clone()), format!("{var}: {err}"));
    }
    logger
}

struct EnvSetting<T> {
    value: T,
    source: &'static str,
    error: Option<(&'static str, ConfigError)>,
}

fn from_env<T>(var: &'static str, quiet: bool) -> EnvSetting<T>
where
    T: std::str::FromStr<Err = ConfigError> + Default,
{
    let Ok(value) = std::env::var(var) else {
        return EnvSetting {
            value: T::default(),
            source: "default configuration (environment variable not set)",
            error: None,
        };
    };
    match value.parse::<T>() {
        Ok(parsed) => EnvSetting {
            value: parsed,
            source: "environment variable",
            error: None,
        },
        Err(err) => {
            if !quiet {
                println!(
                    "LINELOG: Error parsing {var} environment variable\n value: `{value}`\n error: {err}"
                );
            }
            EnvSetting {
                value: T::default(),
                source: "default configuration after an error parsing",
                error: Some((var, err)),
            }
        }
    }
}

/// Logs a `format!` style message at DEBUG through the process-wide logger.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::global_log($crate::LogLevel::Debug, ::std::format_args!($($arg)+))
    };
}

/// Logs a `format!` style message at INFO through the process-wide logger.
#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::global_log($crate::LogLevel::Info, ::std::format_args!($($arg)+))
    };
}

/// Logs a `format!` style message at WARNING through the process-wide logger.
#[macro_export]
macro_rules! warning {
    ($($arg:tt)+) => {
        $crate::global_log($crate::LogLevel::Warning, ::std::format_args!($($arg)+))
    };
}
