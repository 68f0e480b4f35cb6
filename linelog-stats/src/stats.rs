use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use linelog::LogLevel;

/// Span of the sliding "last hour" count.
pub const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Rolling counters over the messages received by the collector.
///
/// Message length is counted in characters of the message text, without the
/// timestamp and level fields.
#[derive(Debug)]
pub struct LogStatistics {
    total: u64,
    by_level: [u64; 3],
    total_length: u64,
    min_length: Option<usize>,
    max_length: usize,
    /// Arrival times inside [`WINDOW`], oldest first.
    window: VecDeque<Instant>,
    last_report: Instant,
    changed: bool,
}

impl LogStatistics {
    pub fn new(now: Instant) -> LogStatistics {
        LogStatistics {
            total: 0,
            by_level: [0; 3],
            total_length: 0,
            min_length: None,
            max_length: 0,
            window: VecDeque::new(),
            last_report: now,
            changed: false,
        }
    }

    pub fn add_message(&mut self, text: &str, level: LogLevel, now: Instant) {
        let length = text.chars().count();
        self.total += 1;
        self.by_level[level as usize] += 1;
        self.total_length += length as u64;
        self.min_length = Some(self.min_length.map_or(length, |min| min.min(length)));
        self.max_length = self.max_length.max(length);

        self.window.push_back(now);
        if let Some(horizon) = now.checked_sub(WINDOW) {
            while self.window.front().is_some_and(|at| *at < horizon) {
                self.window.pop_front();
            }
        }
        self.changed = true;
    }

    /// Whether a report is due: every `every` messages, or once `timeout` has
    /// passed since the last report while there is something new to tell.
    ///
    /// A count that is already reported does not trigger again, so an idle
    /// collector sitting on a multiple of `every` stays quiet. An `every` of
    /// zero disables the count trigger.
    pub fn should_report(&self, every: u64, timeout: Duration, now: Instant) -> bool {
        if !self.changed {
            return false;
        }
        if every > 0 && self.total > 0 && self.total % every == 0 {
            return true;
        }
        now.saturating_duration_since(self.last_report) >= timeout
    }

    /// Snapshots the counters and marks them as reported.
    pub fn report(&mut self, now: Instant) -> Report {
        self.last_report = now;
        self.changed = false;
        Report {
            total: self.total,
            by_level: self.by_level,
            last_hour: self.window.len(),
            min_length: self.min_length.unwrap_or(0),
            max_length: self.max_length,
            average_length: self.average_length(),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, level: LogLevel) -> u64 {
        self.by_level[level as usize]
    }

    /// Messages received within the last [`WINDOW`], as of the latest update.
    pub fn last_hour(&self) -> usize {
        self.window.len()
    }

    pub fn min_length(&self) -> usize {
        self.min_length.unwrap_or(0)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn average_length(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_length as f64 / self.total as f64
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total: u64,
    pub by_level: [u64; 3],
    pub last_hour: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub average_length: f64,
}

impl Report {
    pub fn count(&self, level: LogLevel) -> u64 {
        self.by_level[level as usize]
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== LOG STATISTICS ===")?;
        writeln!(f, "Total messages: {}", self.total)?;
        writeln!(f, "By level:")?;
        for level in LogLevel::ALL {
            let count = self.count(level);
            if count > 0 {
                writeln!(f, "  {level}: {count}")?;
            }
        }
        writeln!(f, "Last hour: {}", self.last_hour)?;
        if self.total > 0 {
            writeln!(f, "Message length:")?;
            writeln!(f, "  Min: {}", self.min_length)?;
            writeln!(f, "  Max: {}", self.max_length)?;
            writeln!(f, "  Avg: {:.2}", self.average_length)?;
        }
        write!(f, "======================")
    }
}
