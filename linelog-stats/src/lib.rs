//! Collector for lines produced by `linelog` socket outputs.
//!
//! [`server::StatsServer`] accepts newline delimited lines over TCP, parses
//! them with [`linelog::parse_line`] and keeps rolling [`stats::LogStatistics`],
//! emitting a [`stats::Report`] every N messages or after T seconds with news.


pub mod line_buffer;
pub mod server;
pub mod stats;

pub use server::{ShutdownHandle, StatsConfig, StatsServer};
pub use stats::{LogStatistics, Report};
