//! Line framing on top of a [Transport](../transport/trait.Transport.html).

use arrayvec::ArrayVec;
use std::ops::Deref;
use std::str;

use err::{FramingError, ReadError};
use timeout::{Clock, MonotonicClock, Timeout};
use transport::Transport;

const TERMINATOR_LENGTH: usize = 8;

/// The byte sequence that ends a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminator(ArrayVec<[u8; TERMINATOR_LENGTH]>);

impl Terminator {
    pub fn new(bytes: &[u8]) -> Result<Self, FramingError> {
        if bytes.is_empty() {
            return Err(FramingError::EmptyTerminator);
        }
        let mut buf = ArrayVec::<[u8; TERMINATOR_LENGTH]>::new();
        for &b in bytes {
            if let Err(e) = buf.try_push(b) {
                return Err((e, buf.capacity()).into());
            }
        }
        Ok(Terminator(buf))
    }

    /// A single `\n`.
    pub fn line_feed() -> Self {
        Terminator([b'\n'].iter().cloned().collect())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for Terminator {
    fn default() -> Self {
        Terminator::line_feed()
    }
}

/// One framed line as read from the transport.
///
/// A line that does not end in the terminator was cut off by the size bound
/// or by the read deadline and should be treated as incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    bytes: Vec<u8>,
    terminator_len: usize,
}

impl RawLine {
    fn new(bytes: Vec<u8>, terminator: &Terminator) -> Self {
        let terminator_len = if bytes.ends_with(terminator.as_bytes()) {
            terminator.len()
        } else {
            0
        };
        RawLine {
            bytes,
            terminator_len,
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.terminator_len > 0
    }

    /// The line without its terminator.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - self.terminator_len]
    }

    /// The line without its terminator, decoded as ASCII.
    pub fn text(&self) -> Result<&str, ReadError> {
        decode_ascii(self.content())
    }
}

impl Deref for RawLine {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Decode `raw` as ASCII. Any byte outside the ASCII range is an error.
pub fn decode_ascii(raw: &[u8]) -> Result<&str, ReadError> {
    if let Some(position) = raw.iter().position(|b| !b.is_ascii()) {
        return Err(ReadError::Decode(position));
    }
    str::from_utf8(raw).map_err(|e| ReadError::Decode(e.valid_up_to()))
}

/// Reads one byte at a time until a line is complete.
#[derive(Debug, Clone, Default)]
pub struct LineReader {
    terminator: Terminator,
    max_size: Option<usize>,
}

impl LineReader {
    pub fn new(terminator: Terminator, max_size: Option<usize>) -> Result<Self, FramingError> {
        if max_size == Some(0) {
            return Err(FramingError::ZeroMaxSize);
        }
        Ok(LineReader {
            terminator,
            max_size,
        })
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Read a line from `transport`.
    ///
    /// Stops after the terminator, after `max_size` bytes, or once the
    /// transport's timeout has elapsed since the call started; the last case
    /// returns whatever arrived so far. A read that yields no byte at all is
    /// `ReadError::ReadTimeout`. A closed transport is reopened once before
    /// each byte.
    pub fn read_line<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<RawLine, ReadError> {
        self.read_line_with_clock(transport, MonotonicClock)
    }

    pub fn read_line_with_clock<T, C>(&self, transport: &mut T, clock: C) -> Result<RawLine, ReadError>
    where
        T: Transport + ?Sized,
        C: Clock,
    {
        let mut line = Vec::new();
        let mut timeout = Timeout::with_clock(transport.timeout(), clock);
        let mut byte = [0u8; 1];

        loop {
            if !transport.is_open() {
                debug!(transport = transport.name(), "reopening closed transport");
                transport.open()?;
            }
            if transport.read(&mut byte)? == 0 {
                return Err(ReadError::ReadTimeout);
            }
            line.push(byte[0]);
            if line.ends_with(self.terminator.as_bytes()) {
                break;
            }
            if let Some(max) = self.max_size {
                if line.len() >= max {
                    break;
                }
            }
            if timeout.expired() {
                debug!(
                    transport = transport.name(),
                    bytes = line.len(),
                    "read deadline passed mid-line"
                );
                break;
            }
        }

        Ok(RawLine::new(line, &self.terminator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::{Duration, Instant};
    use timeout::manual::ManualClock;
    use transport::ReplayTransport;

    fn lf() -> LineReader {
        LineReader::default()
    }

    #[test]
    fn reads_through_terminator() {
        let mut t = ReplayTransport::new().feed(b"abc\nrest");
        let line = lf().read_line(&mut t).unwrap();
        assert_eq!(&*line, b"abc\n");
        assert!(line.is_terminated());
        assert_eq!(line.content(), b"abc");
        assert_eq!(line.text().unwrap(), "abc");
    }

    #[test]
    fn stops_at_max_size() {
        let reader = LineReader::new(Terminator::line_feed(), Some(4)).unwrap();
        let mut t = ReplayTransport::new().feed(b"abcdef");
        let line = reader.read_line(&mut t).unwrap();
        assert_eq!(&*line, b"abcd");
        assert!(!line.is_terminated());
        assert_eq!(line.content(), b"abcd");
    }

    #[test]
    fn multi_byte_terminator() {
        let reader = LineReader::new(Terminator::new(b"\r\n").unwrap(), None).unwrap();
        let mut t = ReplayTransport::new().feed(b"a\rb\r\nc");
        let line = reader.read_line(&mut t).unwrap();
        assert_eq!(&*line, b"a\rb\r\n");
        assert_eq!(line.content(), b"a\rb");
    }

    #[test]
    fn empty_read_is_a_timeout() {
        let mut t = ReplayTransport::new().feed(b"ab").silence().feed(b"c\n");
        assert_matches!(lf().read_line(&mut t), Err(ReadError::ReadTimeout));
        // The next read picks up where the stream left off.
        assert_eq!(&*lf().read_line(&mut t).unwrap(), b"c\n");
    }

    #[test]
    fn nothing_at_all_is_a_timeout() {
        let mut t = ReplayTransport::new();
        assert_matches!(lf().read_line(&mut t), Err(ReadError::ReadTimeout));
    }

    #[test]
    fn transport_fault_propagates() {
        let mut t = ReplayTransport::new().feed(b"ab").fault("gone");
        assert_matches!(lf().read_line(&mut t), Err(ReadError::SerialTransport(_)));
    }

    #[test]
    fn closed_transport_is_reopened() {
        let mut t = ReplayTransport::new().feed(b"x\n").closed();
        assert_eq!(&*lf().read_line(&mut t).unwrap(), b"x\n");
        assert_eq!(t.opens(), 1);
    }

    #[test]
    fn reopen_failure_propagates() {
        let mut t = ReplayTransport::new().feed(b"x\n").closed().unopenable();
        assert_matches!(lf().read_line(&mut t), Err(ReadError::SerialTransport(_)));
    }

    /// Advances a fixed step every time it is read.
    struct SteppingClock<'a> {
        clock: &'a ManualClock,
        step: Duration,
        calls: Cell<usize>,
    }

    impl<'a> Clock for SteppingClock<'a> {
        fn now(&self) -> Instant {
            let now = self.clock.now();
            self.clock.advance(self.step);
            self.calls.set(self.calls.get() + 1);
            now
        }
    }

    #[test]
    fn deadline_returns_partial_line() {
        let clock = ManualClock::new();
        let stepping = SteppingClock {
            clock: &clock,
            step: Duration::from_millis(400),
            calls: Cell::new(0),
        };
        let mut t = ReplayTransport::new()
            .with_timeout(Some(Duration::from_secs(1)))
            .feed(b"$GPRMC,1235");
        let line = lf().read_line_with_clock(&mut t, &stepping).unwrap();
        assert!(!line.is_terminated());
        // Armed at 0 ms, then polled at 400, 800 and 1200 ms.
        assert_eq!(&*line, b"$GP");
        assert_eq!(stepping.calls.get(), 4);
    }

    #[test]
    fn non_blocking_returns_after_one_byte() {
        let mut t = ReplayTransport::new()
            .with_timeout(Some(Duration::from_secs(0)))
            .feed(b"abc\n");
        assert_eq!(&*lf().read_line(&mut t).unwrap(), b"a");
    }

    #[test]
    fn blocking_forever_waits_for_terminator() {
        let clock = ManualClock::new();
        let mut t = ReplayTransport::new().with_timeout(None).feed(b"abc\n");
        clock.advance(Duration::from_secs(100_000));
        assert_eq!(&*lf().read_line_with_clock(&mut t, &clock).unwrap(), b"abc\n");
    }

    #[test]
    fn huge_transport_timeout_reads_normally() {
        let mut t = ReplayTransport::new()
            .with_timeout(Some(Duration::from_secs(u64::MAX)))
            .feed(b"abc\n");
        assert_eq!(&*lf().read_line(&mut t).unwrap(), b"abc\n");
    }

    #[test]
    fn terminator_bounds() {
        assert_matches!(Terminator::new(b""), Err(FramingError::EmptyTerminator));
        assert_matches!(
            Terminator::new(b"123456789"),
            Err(FramingError::TerminatorOverflow(_, 8))
        );
        assert_eq!(Terminator::new(b"\n").unwrap(), Terminator::default());
        assert_matches!(
            LineReader::new(Terminator::default(), Some(0)),
            Err(FramingError::ZeroMaxSize)
        );
    }

    #[test]
    fn non_ascii_is_a_decode_error() {
        assert_matches!(decode_ascii(b"ok\xc3\xa9"), Err(ReadError::Decode(2)));
        assert_eq!(decode_ascii(b"$SDDBS").unwrap(), "$SDDBS");
    }
}
