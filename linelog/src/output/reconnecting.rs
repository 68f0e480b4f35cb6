use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::socket::{connect_tcp, send_line, CONNECT_TIMEOUT};
use super::LogOutput;
use crate::mutex::{wait_timeout_while, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// A reconnect loop is waiting out its interval between attempts.
    Reconnecting,
}

struct Connection {
    state: ConnectionState,
    stream: Option<TcpStream>,
    /// Set while a reconnect loop owns the connection. Cleared by the loop in
    /// the same critical section that publishes its final state.
    loop_active: bool,
    buffer: Vec<u8>,
}

struct Shared {
    host: String,
    port: u16,
    interval: Duration,
    max_attempts: i32,
    connection: Mutex<Connection>,
    cancelled: Mutex<bool>,
    cancel_signal: Condvar,
    attempts: AtomicU64,
}

impl Shared {
    /// Sleeps for one reconnect interval; returns true if cancelled meanwhile.
    fn wait_cancelled(&self) -> bool {
        let cancelled = self.cancelled.lock();
        let (cancelled, _) =
            wait_timeout_while(&self.cancel_signal, cancelled, self.interval, |c| !*c);
        *cancelled
    }

    fn reconnect_loop(&self) {
        let mut remaining = (self.max_attempts > 0).then_some(self.max_attempts);
        loop {
            if self.wait_cancelled() {
                let mut conn = self.connection.lock();
                conn.loop_active = false;
                if conn.state != ConnectionState::Connected {
                    conn.state = ConnectionState::Disconnected;
                }
                return;
            }
            self.connection.lock().state = ConnectionState::Connecting;
            let result = connect_tcp(&self.host, self.port, CONNECT_TIMEOUT);
            self.attempts.fetch_add(1, Ordering::Relaxed);

            let mut conn = self.connection.lock();
            match result {
                Ok(stream) => {
                    conn.stream = Some(stream);
                    conn.state = ConnectionState::Connected;
                    conn.loop_active = false;
                    eprintln!("linelog: reconnected to {}:{}", self.host, self.port);
                    return;
                }
                Err(err) => {
                    if let Some(remaining) = remaining.as_mut() {
                        *remaining -= 1;
                        if *remaining <= 0 {
                            conn.state = ConnectionState::Disconnected;
                            conn.loop_active = false;
                            eprintln!(
                                "linelog: giving up reconnecting to {}:{} after {} attempts: {err}",
                                self.host, self.port, self.max_attempts
                            );
                            return;
                        }
                    }
                    conn.state = ConnectionState::Reconnecting;
                }
            }
        }
    }
}

/// TCP output that repairs its connection on a background thread.
///
/// Writes never wait for the connection: while it is down they fail fast.
/// A failed connect or send starts a reconnect loop that sleeps
/// `reconnect_interval` between attempts and gives up after
/// `max_reconnect_attempts` failures. A non-positive attempt budget retries
/// until connected or dropped. At most one loop runs per output; the next
/// write rejected after a loop gave up starts a fresh one.
pub struct ReconnectingSocketOutput {
    shared: Arc<Shared>,
    reconnect: Mutex<Option<JoinHandle<()>>>,
}

impl ReconnectingSocketOutput {
    pub fn connect(
        host: impl Into<String>,
        port: u16,
        reconnect_interval: Duration,
        max_reconnect_attempts: i32,
    ) -> ReconnectingSocketOutput {
        let host = host.into();
        let stream = connect_tcp(&host, port, CONNECT_TIMEOUT);
        let (state, stream) = match stream {
            Ok(stream) => (ConnectionState::Connected, Some(stream)),
            Err(err) => {
                eprintln!("linelog: failed to connect to {host}:{port}: {err}");
                (ConnectionState::Disconnected, None)
            }
        };
        let output = ReconnectingSocketOutput {
            shared: Arc::new(Shared {
                host,
                port,
                interval: reconnect_interval,
                max_attempts: max_reconnect_attempts,
                connection: Mutex::new(Connection {
                    state,
                    stream,
                    loop_active: false,
                    buffer: Vec::new(),
                }),
                cancelled: Mutex::new(false),
                cancel_signal: Condvar::new(),
                attempts: AtomicU64::new(0),
            }),
            reconnect: Mutex::new(None),
        };
        if state == ConnectionState::Disconnected {
            output.start_reconnect();
        }
        output
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.connection.lock().state
    }

    /// Connect attempts made by reconnect loops so far.
    pub fn reconnect_attempts(&self) -> u64 {
        self.shared.attempts.load(Ordering::Relaxed)
    }

    pub fn is_reconnecting(&self) -> bool {
        self.shared.connection.lock().loop_active
    }

    /// Starts a fresh reconnect loop if the connection is down and no loop
    /// is running, e.g. after an earlier loop used up its attempts.
    pub fn request_reconnect(&self) {
        let idle = {
            let conn = self.shared.connection.lock();
            conn.state == ConnectionState::Disconnected && !conn.loop_active
        };
        if idle {
            self.start_reconnect();
        }
    }

    fn start_reconnect(&self) {
        let mut slot = self.reconnect.lock();
        {
            let mut conn = self.shared.connection.lock();
            if conn.loop_active || conn.state == ConnectionState::Connected {
                return;
            }
            conn.loop_active = true;
            conn.state = ConnectionState::Reconnecting;
        }
        if let Some(finished) = slot.take() {
            let _ = finished.join();
        }
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name("linelog-reconnect".into())
            .spawn(move || shared.reconnect_loop());
        match spawned {
            Ok(handle) => *slot = Some(handle),
            Err(err) => {
                eprintln!("linelog: failed to spawn reconnect thread: {err}");
                let mut conn = self.shared.connection.lock();
                conn.loop_active = false;
                conn.state = ConnectionState::Disconnected;
            }
        }
    }
}

impl LogOutput for ReconnectingSocketOutput {
    fn write_log(&self, line: &str) -> bool {
        {
            let mut guard = self.shared.connection.lock();
            let conn = &mut *guard;
            if conn.state != ConnectionState::Connected {
                let idle = conn.state == ConnectionState::Disconnected && !conn.loop_active;
                drop(guard);
                if idle {
                    self.start_reconnect();
                }
                return false;
            }
            let Some(stream) = conn.stream.as_mut() else {
                return false;
            };
            if send_line(stream, &mut conn.buffer, line) {
                return true;
            }
            conn.stream = None;
            conn.state = ConnectionState::Disconnected;
        }
        eprintln!(
            "linelog: send to {}:{} failed, reconnecting",
            self.shared.host, self.shared.port
        );
        self.start_reconnect();
        false
    }

    fn is_valid(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

impl Drop for ReconnectingSocketOutput {
    fn drop(&mut self) {
        *self.shared.cancelled.lock() = true;
        self.shared.cancel_signal.notify_all();
        if let Some(handle) = self.reconnect.lock().take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for ReconnectingSocketOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectingSocketOutput")
            .field("host", &self.shared.host)
            .field("port", &self.shared.port)
            .field("state", &self.state())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}
