//! Destinations for formatted lines.
//!
//! Every output takes `&self` and serializes its own mutation behind an
//! internal lock, so the caller's thread and the async worker can share one
//! instance.

mod closure;
mod file;
mod reconnecting;
mod rotating;
mod socket;

pub use closure::ClosureOutput;
pub use file::FileOutput;
pub use reconnecting::{ConnectionState, ReconnectingSocketOutput};
pub use rotating::RotatingFileOutput;
pub use socket::SocketOutput;

use crate::LoggingError;

/// Capability shared by every output.
pub trait LogOutput: Send + Sync {
    /// Appends one formatted line. Returns whether the output accepted it.
    fn write_log(&self, line: &str) -> bool;

    /// Reports whether the output is currently usable, without side effects.
    fn is_valid(&self) -> bool;
}

#[derive(Debug)]
pub struct StdoutOutput;

impl LogOutput for StdoutOutput {
    fn write_log(&self, line: &str) -> bool {
        use std::io::Write;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(line.as_bytes()).is_ok() && stdout.write_all(b"\n").is_ok()
    }

    fn is_valid(&self) -> bool {
        true
    }
}

/// The closed set of outputs a [`crate::Logger`] can own.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutOutput),
    File(FileOutput),
    Socket(SocketOutput),
    RotatingFile(RotatingFileOutput),
    ReconnectingSocket(ReconnectingSocketOutput),
    Closure(ClosureOutput),
}

impl Output {
    pub fn stdout() -> Output {
        Output::Stdout(StdoutOutput)
    }

    fn as_dyn(&self) -> &dyn LogOutput {
        match self {
            Output::Stdout(output) => output,
            Output::File(output) => output,
            Output::Socket(output) => output,
            Output::RotatingFile(output) => output,
            Output::ReconnectingSocket(output) => output,
            Output::Closure(output) => output,
        }
    }

    /// Error recorded when a write to this output fails.
    pub fn write_error(&self) -> LoggingError {
        match self {
            Output::Socket(_) | Output::ReconnectingSocket(_) => LoggingError::SocketWriteFailed,
            _ => LoggingError::FileWriteFailed,
        }
    }

    /// Takes the message of a rotation that failed since the last call.
    /// Only rotating files produce one.
    pub fn take_rotation_error(&self) -> Option<String> {
        match self {
            Output::RotatingFile(output) => output.take_rotation_error(),
            _ => None,
        }
    }

    /// Asks a reconnecting socket that gave up to try again. No-op for
    /// every other output.
    pub fn request_reconnect(&self) {
        if let Output::ReconnectingSocket(output) = self {
            output.request_reconnect();
        }
    }

    /// Error recorded when this output is found unusable before a write.
    pub fn invalid_error(&self) -> LoggingError {
        match self {
            Output::Socket(_) | Output::ReconnectingSocket(_) => {
                LoggingError::SocketConnectionFailed
            }
            _ => LoggingError::FileOpenFailed,
        }
    }
}

impl LogOutput for Output {
    fn write_log(&self, line: &str) -> bool {
        self.as_dyn().write_log(line)
    }

    fn is_valid(&self) -> bool {
        self.as_dyn().is_valid()
    }
}

impl From<StdoutOutput> for Output {
    fn from(output: StdoutOutput) -> Self {
        Output::Stdout(output)
    }
}

impl From<FileOutput> for Output {
    fn from(output: FileOutput) -> Self {
        Output::File(output)
    }
}

impl From<SocketOutput> for Output {
    fn from(output: SocketOutput) -> Self {
        Output::Socket(output)
    }
}

impl From<RotatingFileOutput> for Output {
    fn from(output: RotatingFileOutput) -> Self {
        Output::RotatingFile(output)
    }
}

impl From<ReconnectingSocketOutput> for Output {
    fn from(output: ReconnectingSocketOutput) -> Self {
        Output::ReconnectingSocket(output)
    }
}

impl From<ClosureOutput> for Output {
    fn from(output: ClosureOutput) -> Self {
        Output::Closure(output)
    }
}

/// Appends the line terminator to a reusable buffer so a line goes out in a
/// single write.
fn terminated<'a>(buffer: &'a mut Vec<u8>, line: &str) -> &'a [u8] {
    buffer.clear();
    buffer.reserve(line.len() + 1);
    buffer.extend_from_slice(line.as_bytes());
    buffer.push(b'\n');
    buffer
}

/// A local port with nothing listening on it.
#[cfg(test)]
fn refused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
