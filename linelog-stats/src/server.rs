use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};

use crate::line_buffer::LineBuffer;
use crate::stats::{LogStatistics, Report};

const LISTENER: Token = Token(0);
const CLIENT: Token = Token(1);
const WAKER: Token = Token(2);

/// How often the time based report is checked while idle.
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Report after every this many messages; zero disables the count trigger.
    pub report_every: u64,
    /// Report once this much time has passed with new messages.
    pub report_timeout: Duration,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            report_every: 10,
            report_timeout: Duration::from_secs(30),
        }
    }
}

/// Stops a running [`StatsServer`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
        if let Err(err) = self.waker.wake() {
            linelog::warning!("failed to wake stats server: {err}");
        }
    }
}

struct Client {
    stream: TcpStream,
    peer: SocketAddr,
}

/// TCP listener feeding received lines into [`LogStatistics`].
///
/// Clients are served one at a time; further connections wait in the
/// listen backlog until the current client disconnects.
pub struct StatsServer {
    poll: Poll,
    listener: TcpListener,
    waker: Arc<Waker>,
    stop: Arc<AtomicBool>,
    config: StatsConfig,
    stats: LogStatistics,
    lines: LineBuffer,
    client: Option<Client>,
}

impl StatsServer {
    pub fn bind(addr: SocketAddr, config: StatsConfig) -> io::Result<StatsServer> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        Ok(StatsServer {
            poll,
            listener,
            waker,
            stop: Arc::new(AtomicBool::new(false)),
            config,
            stats: LogStatistics::new(Instant::now()),
            lines: LineBuffer::new(),
            client: None,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            stop: self.stop.clone(),
            waker: self.waker.clone(),
        }
    }

    pub fn statistics(&self) -> &LogStatistics {
        &self.stats
    }

    /// Serves clients until a [`ShutdownHandle`] fires, calling `on_report`
    /// whenever a report is due.
    pub fn run(&mut self, on_report: &mut dyn FnMut(&Report)) -> io::Result<()> {
        let mut events = Events::with_capacity(128);
        loop {
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            if let Err(err) = self.poll.poll(&mut events, Some(TICK)) {
                if interrupted(&err) {
                    continue;
                }
                return Err(err);
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept()?,
                    CLIENT => {
                        if self.read_client(on_report) {
                            self.close_client()?;
                            // Connections that queued up meanwhile raised no new event.
                            self.accept()?;
                        }
                    }
                    // Woken for shutdown, checked at the top of the loop.
                    _ => {}
                }
            }

            let now = Instant::now();
            let config = &self.config;
            if self
                .stats
                .should_report(config.report_every, config.report_timeout, now)
            {
                on_report(&self.stats.report(now));
            }
        }
        if self.client.is_some() {
            self.close_client()?;
        }
        linelog::info!("stats server stopped after {} messages", self.stats.total());
        Ok(())
    }

    fn accept(&mut self) -> io::Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    self.poll
                        .registry()
                        .register(&mut stream, CLIENT, Interest::READABLE)?;
                    linelog::info!("client connected from {peer}");
                    self.client = Some(Client { stream, peer });
                    return Ok(());
                }
                Err(err) if would_block(&err) => return Ok(()),
                Err(err) if interrupted(&err) => continue,
                Err(err) => {
                    linelog::warning!("failed to accept connection: {err}");
                    return Ok(());
                }
            }
        }
    }

    /// Drains the client socket. Returns true once the client is gone.
    fn read_client(&mut self, on_report: &mut dyn FnMut(&Report)) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };
        loop {
            match self.lines.read_from(&mut client.stream) {
                Ok(0) => return true,
                Ok(_) => {
                    while let Some(line) = self.lines.next_line() {
                        ingest(&mut self.stats, &self.config, line, on_report);
                    }
                }
                Err(err) if would_block(&err) => return false,
                Err(err) if interrupted(&err) => continue,
                Err(err) => {
                    linelog::warning!("reading from {} failed: {err}", client.peer);
                    return true;
                }
            }
        }
    }

    fn close_client(&mut self) -> io::Result<()> {
        let Some(mut client) = self.client.take() else {
            return Ok(());
        };
        self.poll.registry().deregister(&mut client.stream)?;
        let pending = self.lines.pending().len();
        if pending > 0 {
            linelog::warning!(
                "client {} left {pending} bytes of an unterminated line",
                client.peer
            );
        }
        self.lines.clear();
        linelog::info!("client {} disconnected", client.peer);
        Ok(())
    }
}

fn ingest(
    stats: &mut LogStatistics,
    config: &StatsConfig,
    line: &[u8],
    on_report: &mut dyn FnMut(&Report),
) {
    let line = String::from_utf8_lossy(line);
    match linelog::parse_line(&line) {
        Ok(parsed) => {
            linelog::debug!("received: {line}");
            let now = Instant::now();
            stats.add_message(parsed.message, parsed.level, now);
            if stats.should_report(config.report_every, config.report_timeout, now) {
                on_report(&stats.report(now));
            }
        }
        Err(err) => {
            linelog::warning!("unparseable line {line:?}: {err}");
        }
    }
}

fn would_block(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
}

fn interrupted(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}
