use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::encoding::{format_line, LogMessage};
use crate::mutex::Mutex;
use crate::output::{FileOutput, LogOutput, Output, SocketOutput};
use crate::queue::AsyncQueue;
use crate::{LogLevel, LoggerConfig, LoggingError, Target, Timestamp};

struct LoggerState {
    config: LoggerConfig,
    timestamp_format: Arc<str>,
}

#[derive(Default)]
struct LastError {
    kind: LoggingError,
    message: String,
}

struct Shared {
    output: Output,
    state: Mutex<LoggerState>,
    /// Serializes synchronous dispatch from caller threads.
    dispatch: Mutex<()>,
    last_error: Mutex<LastError>,
}

impl Shared {
    fn record(&self, kind: LoggingError, message: String) {
        let mut last = self.last_error.lock();
        last.kind = kind;
        last.message = message;
    }

    fn write(&self, line: &str) -> bool {
        let written = self.output.write_log(line);
        if let Some(message) = self.output.take_rotation_error() {
            self.record(LoggingError::RotationFailed, message);
        }
        if !written {
            self.record(self.output.write_error(), format!("failed to write line: {line}"));
        }
        written
    }
}

/// The async queue carries lines that were already formatted on the
/// producer's thread, so the timestamp reflects the call and each message is
/// formatted exactly once.
struct AsyncWorker {
    queue: Arc<AsyncQueue<LogMessage>>,
    handle: JoinHandle<()>,
}

fn async_worker_loop(shared: &Shared, queue: &AsyncQueue<LogMessage>) {
    while let Some(message) = queue.pop() {
        shared.write(&message.text);
    }
}

/// Leveled logger dispatching formatted lines to one [`Output`].
///
/// Lines look like `[2024-01-01 12:00:00.000] [INFO] text`. In synchronous
/// mode `log` writes before returning; in async mode it only enqueues and a
/// background worker performs the write, so `true` means accepted rather
/// than delivered. Dropping the logger drains the queue and joins the worker
/// before the output is released.
///
/// ```no_run
/// use linelog::{LogLevel, Logger};
///
/// let logger = Logger::to_file("app.log", LogLevel::Info);
/// logger.debug("filtered out");
/// logger.warning("written");
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    worker: Mutex<Option<AsyncWorker>>,
    async_running: AtomicBool,
}

impl Logger {
    pub fn new(output: impl Into<Output>, default_level: LogLevel) -> Logger {
        Logger::with_output(
            output.into(),
            LoggerConfig::default().with_default_level(default_level),
        )
    }

    /// Synchronous logger appending to a plain file.
    pub fn to_file(path: impl Into<PathBuf>, default_level: LogLevel) -> Logger {
        Logger::new(FileOutput::open(path), default_level)
    }

    /// Synchronous logger sending to a TCP peer, without reconnection.
    pub fn to_socket(host: impl Into<String>, port: u16, default_level: LogLevel) -> Logger {
        Logger::new(SocketOutput::connect(host, port), default_level)
    }

    /// Builds the output described by `target` and `config`, enabling async
    /// dispatch when the config asks for it.
    pub fn with_config(target: &Target, config: LoggerConfig) -> Logger {
        let output = target.build_output(&config);
        Logger::with_output(output, config)
    }

    pub fn with_output(output: Output, config: LoggerConfig) -> Logger {
        let enable_async = config.enable_async;
        let logger = Logger {
            shared: Arc::new(Shared {
                state: Mutex::new(LoggerState {
                    timestamp_format: Arc::from(config.timestamp_format.as_str()),
                    config,
                }),
                dispatch: Mutex::new(()),
                last_error: Mutex::new(LastError::default()),
                output,
            }),
            worker: Mutex::new(None),
            async_running: AtomicBool::new(false),
        };
        if !logger.shared.output.is_valid() {
            logger.shared.record(
                logger.shared.output.invalid_error(),
                "output is not usable".to_string(),
            );
        }
        if enable_async {
            logger.enable_async(true);
        }
        logger
    }

    /// Logs `message` at `level`.
    ///
    /// Returns true when the message was filtered out by the threshold or
    /// accepted by the output (sync) or queue (async); false when the output
    /// is unusable, the write failed, or the async queue is full.
    pub fn log(&self, message: &str, level: LogLevel) -> bool {
        let (threshold, timestamp_format) = {
            let state = self.shared.state.lock();
            (state.config.default_level, state.timestamp_format.clone())
        };
        if level < threshold {
            return true;
        }
        if !self.shared.output.is_valid() {
            self.shared.record(
                self.shared.output.invalid_error(),
                "output is not usable".to_string(),
            );
            self.shared.output.request_reconnect();
            return false;
        }

        let mut line = String::new();
        format_line(&mut line, &Timestamp::now(), &timestamp_format, level, message);

        {
            let worker = self.worker.lock();
            if let Some(worker) = worker.as_ref() {
                return match worker.queue.try_push(LogMessage { text: line, level }) {
                    Ok(()) => true,
                    Err(rejected) => {
                        self.shared.record(
                            LoggingError::QueueOverflow,
                            format!("async queue full, dropped: {}", rejected.text),
                        );
                        false
                    }
                };
            }
        }

        let _dispatch = self.shared.dispatch.lock();
        self.shared.write(&line)
    }

    /// Logs `message` at the current default level.
    pub fn log_default(&self, message: &str) -> bool {
        self.log(message, self.default_level())
    }

    pub fn debug(&self, message: &str) -> bool {
        self.log(message, LogLevel::Debug)
    }

    pub fn info(&self, message: &str) -> bool {
        self.log(message, LogLevel::Info)
    }

    pub fn warning(&self, message: &str) -> bool {
        self.log(message, LogLevel::Warning)
    }

    pub fn set_default_level(&self, level: LogLevel) {
        self.shared.state.lock().config.default_level = level;
    }

    pub fn default_level(&self) -> LogLevel {
        self.shared.state.lock().config.default_level
    }

    /// Replaces the configuration. The threshold follows `config.default_level`;
    /// the output and dispatch mode are left as they are.
    pub fn set_config(&self, config: LoggerConfig) {
        let mut state = self.shared.state.lock();
        state.timestamp_format = Arc::from(config.timestamp_format.as_str());
        state.config = config;
    }

    pub fn config(&self) -> LoggerConfig {
        self.shared.state.lock().config.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.shared.output.is_valid()
    }

    pub fn output(&self) -> &Output {
        &self.shared.output
    }

    /// Most recent failure. Advisory only: concurrent failures overwrite
    /// each other.
    pub fn last_error(&self) -> LoggingError {
        self.shared.last_error.lock().kind
    }

    pub fn last_error_message(&self) -> String {
        self.shared.last_error.lock().message.clone()
    }

    pub(crate) fn record_error(&self, kind: LoggingError, message: String) {
        self.shared.record(kind, message);
    }

    /// Starts or stops the async worker. Both directions are idempotent;
    /// stopping drains the queue and joins the worker before returning.
    pub fn enable_async(&self, enable: bool) {
        if enable {
            self.start_async_worker();
        } else {
            self.stop_async_worker();
        }
    }

    pub fn is_async_enabled(&self) -> bool {
        self.async_running.load(Ordering::Acquire)
    }

    /// Messages accepted by the async queue but not yet written.
    pub fn pending(&self) -> usize {
        self.worker
            .lock()
            .as_ref()
            .map_or(0, |worker| worker.queue.len())
    }

    fn start_async_worker(&self) {
        let mut slot = self.worker.lock();
        if slot.is_some() {
            return;
        }
        let queue_size = self.shared.state.lock().config.async_queue_size;
        let queue = Arc::new(AsyncQueue::new(queue_size));
        let shared = self.shared.clone();
        let worker_queue = queue.clone();
        let spawned = thread::Builder::new()
            .name("linelog-async".into())
            .spawn(move || async_worker_loop(&shared, &worker_queue));
        match spawned {
            Ok(handle) => {
                *slot = Some(AsyncWorker { queue, handle });
                self.async_running.store(true, Ordering::Release);
            }
            Err(err) => {
                eprintln!("linelog: failed to spawn async worker: {err}");
            }
        }
    }

    fn stop_async_worker(&self) {
        // Producers push while holding the slot, so once the worker is taken
        // out nothing new can enter its queue. Producers arriving during the
        // join find the slot empty and write synchronously.
        let worker = {
            let mut slot = self.worker.lock();
            let Some(worker) = slot.take() else {
                return;
            };
            worker.queue.shutdown();
            worker
        };
        if worker.handle.join().is_err() {
            eprintln!("linelog: async worker panicked");
        }
        let slot = self.worker.lock();
        if slot.is_none() {
            self.async_running.store(false, Ordering::Release);
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.stop_async_worker();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("output", &self.shared.output)
            .field("default_level", &self.default_level())
            .field("async", &self.is_async_enabled())
            .finish()
    }
}
