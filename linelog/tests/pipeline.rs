use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use linelog::{
    parse_line, ClosureOutput, ConnectionState, LogLevel, LogOutput, Logger, LoggerConfig,
    LoggingError, Output, ReconnectingSocketOutput, Target,
};

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn warning_threshold_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threshold.log");
    let logger = Logger::to_file(&path, LogLevel::Warning);
    assert!(logger.debug("a"));
    assert!(logger.info("b"));
    assert!(logger.warning("c"));
    drop(logger);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 1);
    let parsed = parse_line(&lines[0]).unwrap();
    assert_eq!(parsed.level, LogLevel::Warning);
    assert_eq!(parsed.message, "c");
    assert!(lines[0].ends_with("] [WARNING] c"));
}

#[test]
fn concurrent_producers_write_whole_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threads.log");
    let logger = Arc::new(Logger::to_file(&path, LogLevel::Info));
    let producers: Vec<_> = (0..5)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    assert!(logger.info(&format!("Thread {t} message {i}")));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    drop(logger);

    let lines = read_lines(&path);
    assert_eq!(lines.len(), 50);
    for t in 0..5 {
        let mine: Vec<&str> = lines
            .iter()
            .map(|line| parse_line(line).unwrap().message)
            .filter(|message| message.starts_with(&format!("Thread {t} ")))
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("Thread {t} message {i}")).collect();
        assert_eq!(mine, expected);
    }
}

#[test]
fn async_dispatch_preserves_order() {
    let (tx, rx) = mpsc::channel();
    let output = ClosureOutput::new(move |line: &str| {
        thread::sleep(Duration::from_micros(50));
        tx.send(line.to_string()).is_ok()
    });
    let logger = Logger::new(output, LogLevel::Debug);
    logger.enable_async(true);
    assert!(logger.is_async_enabled());
    for i in 0..100 {
        assert!(logger.debug(&format!("m{i}")));
    }
    logger.enable_async(false);

    let messages: Vec<String> = rx
        .try_iter()
        .map(|line| parse_line(&line).unwrap().message.to_string())
        .collect();
    let expected: Vec<String> = (0..100).map(|i| format!("m{i}")).collect();
    assert_eq!(messages, expected);
}

#[test]
fn async_overflow_drops_and_records() {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (tx, rx) = mpsc::channel();
    let output = ClosureOutput::new(move |line: &str| {
        let _ = gate_rx.recv();
        tx.send(line.to_string()).is_ok()
    });
    let config = LoggerConfig {
        enable_async: true,
        async_queue_size: 4,
        ..LoggerConfig::default()
    };
    let logger = Logger::with_output(Output::from(output), config);
    assert!(logger.is_async_enabled());

    assert!(logger.info("held by worker"));
    assert!(wait_until(Duration::from_secs(5), || logger.pending() == 0));
    let accepted = (0..10).filter(|i| logger.info(&format!("q{i}"))).count();
    assert_eq!(accepted, 4);
    assert_eq!(logger.last_error(), LoggingError::QueueOverflow);

    drop(gate_tx);
    drop(logger);
    assert_eq!(rx.try_iter().count(), 5);
}

#[test]
fn rotation_keeps_bounded_archives() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotating.log");
    let target = Target::File { path: path.clone() };
    let config = LoggerConfig {
        max_file_size_mb: 1,
        max_files: 3,
        ..LoggerConfig::default()
    };
    let logger = Logger::with_config(&target, config);
    assert!(matches!(logger.output(), Output::RotatingFile(_)));

    let padding = "p".repeat(4000);
    for i in 0..1000 {
        assert!(logger.info(&format!("{i:04} {padding}")));
    }
    drop(logger);

    let archive = |index: usize| dir.path().join(format!("rotating.log.{index}"));
    assert!(path.exists());
    assert!(archive(1).exists());
    assert!(archive(2).exists());
    assert!(!archive(3).exists());
    for file in [archive(2), archive(1), path.clone()] {
        let len = std::fs::metadata(&file).unwrap().len();
        assert!(len <= 1024 * 1024 + 4100, "{} is {len} bytes", file.display());
    }

    // The newest archive continues exactly where the active file starts.
    let last_archived = read_lines(&archive(1)).pop().unwrap();
    let first_active = read_lines(&path).swap_remove(0);
    let index = |line: &str| -> u32 { parse_line(line).unwrap().message[..4].parse().unwrap() };
    assert_eq!(index(&last_archived) + 1, index(&first_active));
    assert_eq!(index(read_lines(&path).last().unwrap()), 999);
}

#[test]
fn plain_file_when_rotation_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let target: Target = format!("File:{}", dir.path().join("plain.log").display())
        .parse()
        .unwrap();
    let config: LoggerConfig = "enable_rotation=false".parse().unwrap();
    let logger = Logger::with_config(&target, config);
    assert!(matches!(logger.output(), Output::File(_)));
    assert!(logger.info("kept"));
}

#[test]
fn reconnect_gives_up_after_budget() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let output =
        ReconnectingSocketOutput::connect("127.0.0.1", port, Duration::from_millis(20), 3);
    let logger = Logger::new(output, LogLevel::Info);
    assert!(!logger.is_valid());
    assert!(!logger.info("lost"));
    assert_eq!(logger.last_error(), LoggingError::SocketConnectionFailed);

    let Output::ReconnectingSocket(output) = logger.output() else {
        panic!("expected a reconnecting socket output");
    };
    assert!(wait_until(Duration::from_secs(5), || !output.is_reconnecting()));
    assert_eq!(output.reconnect_attempts(), 3);
    assert_eq!(output.state(), ConnectionState::Disconnected);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(output.reconnect_attempts(), 3);
}

#[test]
fn logging_after_give_up_restarts_reconnect() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let output =
        ReconnectingSocketOutput::connect("127.0.0.1", port, Duration::from_millis(10), 2);
    let logger = Logger::new(output, LogLevel::Info);
    let Output::ReconnectingSocket(output) = logger.output() else {
        panic!("expected a reconnecting socket output");
    };
    assert!(wait_until(Duration::from_secs(5), || !output.is_reconnecting()));
    assert_eq!(output.reconnect_attempts(), 2);

    let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
    assert!(!logger.info("dropped while down"));
    assert!(wait_until(Duration::from_secs(5), || logger.is_valid()));
    let (peer, _) = listener.accept().unwrap();
    assert!(logger.info("back online"));
    drop(logger);

    let lines: Vec<String> = BufReader::new(peer).lines().map(Result::unwrap).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(parse_line(&lines[0]).unwrap().message, "back online");
}

#[test]
fn socket_target_delivers_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let target: Target = format!("Socket:127.0.0.1:{port}").parse().unwrap();
    let logger = Logger::with_config(&target, LoggerConfig::default());
    let (peer, _) = listener.accept().unwrap();
    assert!(logger.output().is_valid());
    assert!(logger.info("Test message 0"));
    assert!(logger.warning("Test message 1"));
    drop(logger);

    let lines: Vec<String> = BufReader::new(peer).lines().map(Result::unwrap).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(parse_line(&lines[0]).unwrap().message, "Test message 0");
    assert_eq!(parse_line(&lines[1]).unwrap().level, LogLevel::Warning);
}

#[test]
fn global_macros_reach_installed_logger() {
    let (tx, rx) = mpsc::channel();
    let logger = Logger::new(
        ClosureOutput::new(move |line: &str| tx.send(line.to_string()).is_ok()),
        LogLevel::Info,
    );
    let guard = linelog::install_global(logger);
    linelog::debug!("hidden {}", 1);
    linelog::info!("shown {}", 2);
    linelog::warning!("shown {}", 3);
    drop(guard);
    assert!(linelog::info!("stdout fallback"));

    let lines: Vec<String> = rx.try_iter().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[INFO] shown 2"));
    assert!(lines[1].ends_with("[WARNING] shown 3"));
}
