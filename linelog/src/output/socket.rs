use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{terminated, LogOutput};
use crate::mutex::Mutex;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves `host:port` and connects to the first address that accepts.
pub(crate) fn connect_tcp(host: &str, port: u16, timeout: Duration) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrNotAvailable,
            format!("{host}:{port} resolved to no addresses"),
        )
    }))
}

/// Sends a full line with one `write` call. A short or failed write means
/// the connection can no longer be trusted.
pub(crate) fn send_line(stream: &mut TcpStream, buffer: &mut Vec<u8>, line: &str) -> bool {
    let bytes = terminated(buffer, line);
    matches!(stream.write(bytes), Ok(sent) if sent == bytes.len())
}

struct SocketState {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
}

/// Sends lines over one TCP connection established at construction.
///
/// There is no retry: once a send fails the output stays invalid.
pub struct SocketOutput {
    host: String,
    port: u16,
    state: Mutex<SocketState>,
}

impl SocketOutput {
    pub fn connect(host: impl Into<String>, port: u16) -> SocketOutput {
        let host = host.into();
        let stream = match connect_tcp(&host, port, CONNECT_TIMEOUT) {
            Ok(stream) => Some(stream),
            Err(err) => {
                eprintln!("linelog: failed to connect to {host}:{port}: {err}");
                None
            }
        };
        SocketOutput {
            host,
            port,
            state: Mutex::new(SocketState {
                stream,
                buffer: Vec::new(),
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl LogOutput for SocketOutput {
    fn write_log(&self, line: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(stream) = state.stream.as_mut() else {
            return false;
        };
        if send_line(stream, &mut state.buffer, line) {
            return true;
        }
        eprintln!("linelog: send to {}:{} failed", self.host, self.port);
        state.stream = None;
        false
    }

    fn is_valid(&self) -> bool {
        self.state.lock().stream.is_some()
    }
}

impl std::fmt::Debug for SocketOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketOutput")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.is_valid())
            .finish()
    }
}
