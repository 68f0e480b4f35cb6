use jiff::fmt::strtime;
use jiff::Zoned;

/// Format used for the date and time part of a line when none is configured.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wall clock timestamp in the local time zone, captured when a line is formatted.
///
/// Rendered as `<strftime format>.mmm`, so with the default format:
///
/// ```
/// let ts = linelog::Timestamp::now();
/// let mut out = String::new();
/// ts.write_into(&mut out, linelog::DEFAULT_TIMESTAMP_FORMAT);
/// assert_eq!(out.len(), "2024-01-01 00:00:00.000".len());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    zoned: Zoned,
}

impl Timestamp {
    pub fn now() -> Timestamp {
        Timestamp { zoned: Zoned::now() }
    }

    pub fn from_zoned(zoned: Zoned) -> Timestamp {
        Timestamp { zoned }
    }

    pub fn zoned(&self) -> &Zoned {
        &self.zoned
    }

    pub fn millisecond(&self) -> u32 {
        self.zoned.millisecond() as u32
    }

    /// Appends the timestamp rendered with `format` plus milliseconds.
    ///
    /// A format jiff rejects falls back to [`DEFAULT_TIMESTAMP_FORMAT`].
    pub fn write_into(&self, out: &mut String, format: &str) {
        match strtime::format(format, &self.zoned) {
            Ok(text) => out.push_str(&text),
            Err(_) => {
                if let Ok(text) = strtime::format(DEFAULT_TIMESTAMP_FORMAT, &self.zoned) {
                    out.push_str(&text);
                }
            }
        }
        out.push('.');
        write_3digit_number(out, self.millisecond());
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity(24);
        self.write_into(&mut out, DEFAULT_TIMESTAMP_FORMAT);
        f.write_str(&out)
    }
}

fn write_3digit_number(out: &mut String, value: u32) {
    let value = value % 1000;
    if value < 100 {
        out.push('0');
    }
    if value < 10 {
        out.push('0');
    }
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}
