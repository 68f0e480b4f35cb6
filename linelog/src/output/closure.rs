use super::LogOutput;
use crate::mutex::Mutex;

type Handler = Box<dyn FnMut(&str) -> bool + Send>;

/// Hands each formatted line to a closure.
///
/// The closure runs under the output's lock, so it sees lines one at a time.
///
/// ```
/// use linelog::{ClosureOutput, LogLevel, Logger};
///
/// let logger = Logger::new(
///     ClosureOutput::new(|line: &str| {
///         eprintln!("{line}");
///         true
///     }),
///     LogLevel::Info,
/// );
/// assert!(logger.info("captured"));
/// ```
pub struct ClosureOutput {
    handler: Mutex<Handler>,
}

impl ClosureOutput {
    pub fn new<F>(handler: F) -> ClosureOutput
    where
        F: FnMut(&str) -> bool + Send + 'static,
    {
        ClosureOutput {
            handler: Mutex::new(Box::new(handler)),
        }
    }
}

impl LogOutput for ClosureOutput {
    fn write_log(&self, line: &str) -> bool {
        let mut handler = self.handler.lock();
        (*handler)(line)
    }

    fn is_valid(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for ClosureOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClosureOutput")
    }
}
