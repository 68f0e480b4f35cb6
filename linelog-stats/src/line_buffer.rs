use std::io::{self, Read};

const INITIAL_CAPACITY: usize = 4096 * 8;
/// Longest pending line accepted before the stream is rejected.
pub const MAX_LINE: usize = 16 * 1024 * 1024;

/// Reassembles newline delimited lines from a byte stream.
///
/// Reads land after the unconsumed tail; complete lines are handed out in
/// order with the terminator and any trailing `\r` removed. Empty lines are
/// skipped.
pub struct LineBuffer {
    buffer: Vec<u8>,
    head: usize,
    tail: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        LineBuffer::new()
    }
}

impl LineBuffer {
    pub fn new() -> LineBuffer {
        LineBuffer {
            buffer: vec![0; INITIAL_CAPACITY],
            head: 0,
            tail: 0,
        }
    }

    /// Performs one read from `reader`. `Ok(0)` means end of stream.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        if self.head > 0 && (self.head == self.tail || self.tail > self.buffer.len() / 2) {
            self.buffer.copy_within(self.head..self.tail, 0);
            self.tail -= self.head;
            self.head = 0;
        }
        if self.tail == self.buffer.len() {
            if self.buffer.len() >= MAX_LINE {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "line exceeds maximum length",
                ));
            }
            let grown = (self.buffer.len() * 2).min(MAX_LINE);
            self.buffer.resize(grown, 0);
        }
        let len = reader.read(&mut self.buffer[self.tail..])?;
        self.tail += len;
        Ok(len)
    }

    /// Next complete, non-empty line.
    pub fn next_line(&mut self) -> Option<&[u8]> {
        loop {
            let end = memchr::memchr(b'\n', &self.buffer[self.head..self.tail])?;
            let start = self.head;
            self.head += end + 1;
            let mut stop = start + end;
            if stop > start && self.buffer[stop - 1] == b'\r' {
                stop -= 1;
            }
            if stop > start {
                return Some(&self.buffer[start..stop]);
            }
        }
    }

    /// Bytes of an incomplete trailing line.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.head..self.tail]
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn collect(buffer: &mut LineBuffer) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = buffer.next_line() {
            lines.push(String::from_utf8(line.to_vec()).unwrap());
        }
        lines
    }

    #[test]
    fn splits_and_strips() {
        let mut buffer = LineBuffer::new();
        let mut input: &[u8] = b"first\r\n\n\nsecond\nthi";
        buffer.read_from(&mut input).unwrap();
        assert_eq!(collect(&mut buffer), ["first", "second"]);
        assert_eq!(buffer.pending(), b"thi");

        let mut input: &[u8] = b"rd\r\n";
        buffer.read_from(&mut input).unwrap();
        assert_eq!(collect(&mut buffer), ["third"]);
        assert!(buffer.pending().is_empty());
    }

    #[test]
    fn lone_carriage_return_is_empty() {
        let mut buffer = LineBuffer::new();
        let mut input: &[u8] = b"\r\nx\n";
        buffer.read_from(&mut input).unwrap();
        assert_eq!(collect(&mut buffer), ["x"]);
    }

    #[test]
    fn grows_for_long_lines() {
        let mut buffer = LineBuffer::new();
        let mut long = vec![b'a'; INITIAL_CAPACITY * 3];
        long.push(b'\n');
        let mut input: &[u8] = &long;
        while buffer.read_from(&mut input).unwrap() > 0 {}
        let line = buffer.next_line().unwrap();
        assert_eq!(line.len(), INITIAL_CAPACITY * 3);
        assert!(buffer.next_line().is_none());
    }

    #[test]
    fn end_of_stream_reads_zero() {
        let mut buffer = LineBuffer::new();
        let mut input: &[u8] = b"";
        assert_eq!(buffer.read_from(&mut input).unwrap(), 0);
    }
}
