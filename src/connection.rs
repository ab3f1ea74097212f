//! One instrument connection: a transport, the line framing in front of it
//! and the grammar its lines are decoded with.

use serde::{Deserialize, Serialize};

use err::ReadError;
use parser::SentenceParser;
use reader::{LineReader, RawLine};
use sentence::Sentence;
use transport::Transport;

/// Outcome of the most recent read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No cycle has run yet.
    Idle,
    /// A cycle is in progress.
    Reading,
    /// The last line matched the grammar.
    Matched,
    /// The last line did not match; there are no current fields.
    Unmatched,
    /// No data arrived within the transport timeout.
    TimedOut,
    /// The transport failed or the line could not be decoded.
    Failed,
}

/// What to do with the transport after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the transport open and read again.
    KeepOpen,
    /// Close the transport; the next cycle reopens it.
    Close,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::KeepOpen
    }
}

/// A transport bound to a sentence grammar.
///
/// Each call to [`read_one_cycle`](#method.read_one_cycle) frames one line,
/// matches it and returns the decoded reading. The reading of the last
/// matching line is kept as the last known value.
pub struct Connection<T, S: Sentence> {
    name: String,
    transport: T,
    reader: LineReader,
    parser: SentenceParser<S>,
    last: Option<S::Reading>,
    state: ConnectionState,
    on_timeout: FailurePolicy,
    on_transport_error: FailurePolicy,
    reset_input: bool,
}

impl<T: Transport, S: Sentence> Connection<T, S> {
    /// A connection with `\n` framing and both failure policies set to
    /// `KeepOpen`.
    pub fn new(name: &str, transport: T, sentence: S) -> Self {
        Connection {
            name: name.to_string(),
            transport,
            reader: LineReader::default(),
            parser: SentenceParser::new(sentence),
            last: None,
            state: ConnectionState::Idle,
            on_timeout: FailurePolicy::KeepOpen,
            on_transport_error: FailurePolicy::KeepOpen,
            reset_input: false,
        }
    }

    pub fn with_reader(mut self, reader: LineReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn on_timeout(mut self, policy: FailurePolicy) -> Self {
        self.on_timeout = policy;
        self
    }

    pub fn on_transport_error(mut self, policy: FailurePolicy) -> Self {
        self.on_transport_error = policy;
        self
    }

    /// Drop buffered input before every cycle so each reading reflects the
    /// newest line rather than a backlog.
    pub fn reset_input(mut self, reset: bool) -> Self {
        self.reset_input = reset;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn parser(&self) -> &SentenceParser<S> {
        &self.parser
    }

    /// Reading of the most recent matching line.
    pub fn last_reading(&self) -> Option<&S::Reading> {
        self.last.as_ref()
    }

    /// Reading with every value absent.
    pub fn absent(&self) -> S::Reading {
        self.parser.absent()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    pub fn open(&mut self) -> Result<(), ReadError> {
        if !self.transport.is_open() {
            self.transport.open()?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Read, match and decode one line.
    ///
    /// A line that does not match yields the absent reading and leaves the
    /// last known value alone. Errors are returned after the matching
    /// failure policy has been applied; a decode error also drops the
    /// current fields.
    pub fn read_one_cycle(&mut self) -> Result<S::Reading, ReadError> {
        self.state = ConnectionState::Reading;
        let result = self.next_line().and_then(|line| self.accept(&line));
        result.map_err(|err| self.fail(err))
    }

    fn next_line(&mut self) -> Result<RawLine, ReadError> {
        if self.reset_input {
            self.open()?;
            self.transport.reset_input_buffer()?;
        }
        self.reader.read_line(&mut self.transport)
    }

    fn accept(&mut self, line: &RawLine) -> Result<S::Reading, ReadError> {
        if self.parser.parse_bytes(line.content())? {
            let reading = self.parser.reading();
            self.last = Some(reading.clone());
            self.state = ConnectionState::Matched;
            Ok(reading)
        } else {
            self.state = ConnectionState::Unmatched;
            Ok(self.parser.reading())
        }
    }

    fn fail(&mut self, err: ReadError) -> ReadError {
        let policy = match err {
            ReadError::ReadTimeout => {
                self.state = ConnectionState::TimedOut;
                self.on_timeout
            }
            ReadError::SerialTransport(_) => {
                self.state = ConnectionState::Failed;
                self.on_transport_error
            }
            ReadError::Decode(_) => {
                self.parser.clear();
                self.state = ConnectionState::Failed;
                FailurePolicy::KeepOpen
            }
        };
        if policy == FailurePolicy::Close && self.transport.is_open() {
            debug!(connection = %self.name, "closing transport after failed cycle");
            self.transport.close();
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbs::Dbs;
    use reader::Terminator;
    use rmc::Rmc;
    use std::time::Duration;
    use transport::ReplayTransport;

    const FIX: &[u8] = b"$GPRMC,090503,A,3430.0000,S,05830.0000,W,000.0,000.0,050124,,*1F\r\n";
    const DEPTH: &[u8] = b"$SDDBS,40.49,f,12.34,M,06.75,F*3C\r\n";

    fn gps(t: ReplayTransport) -> Connection<ReplayTransport, Rmc> {
        Connection::new("gps", t, Rmc::new().unwrap())
    }

    fn sounder(t: ReplayTransport) -> Connection<ReplayTransport, Dbs> {
        Connection::new("sounder", t, Dbs::new().unwrap())
    }

    #[test]
    fn starts_idle_and_absent() {
        let c = gps(ReplayTransport::new());
        assert_eq!(c.state(), ConnectionState::Idle);
        assert!(c.last_reading().is_none());
        assert_eq!(c.parser().latitude(), None);
        assert!(c.absent().is_absent());
    }

    #[test]
    fn matched_line() {
        let mut c = gps(ReplayTransport::new().feed(FIX));
        let reading = c.read_one_cycle().unwrap();
        assert_eq!(c.state(), ConnectionState::Matched);
        assert_eq!(reading.latitude, Some("-34.5".to_string()));
        assert_eq!(reading.time, Some("09:05:03".to_string()));
        assert_eq!(c.last_reading(), Some(&reading));
        assert_eq!(c.parser().longitude(), Some("-58.5".to_string()));
    }

    #[test]
    fn mismatch_keeps_last_known_value() {
        let mut c = sounder(ReplayTransport::new().feed(DEPTH).feed(b"$SDDBS,,f,,M,,F*3C\r\n").feed(DEPTH));
        c.read_one_cycle().unwrap();
        let reading = c.read_one_cycle().unwrap();
        assert_eq!(c.state(), ConnectionState::Unmatched);
        assert!(reading.is_absent());
        assert_eq!(c.parser().depth_meters(), None);
        assert_eq!(c.last_reading().and_then(|r| r.meters.clone()), Some("12.34".to_string()));

        let reading = c.read_one_cycle().unwrap();
        assert_eq!(c.state(), ConnectionState::Matched);
        assert_eq!(reading.meters, Some("12.34".to_string()));
    }

    #[test]
    fn line_cut_by_deadline_is_unmatched() {
        // A zero timeout expires after the first byte.
        let t = ReplayTransport::new()
            .with_timeout(Some(Duration::from_secs(0)))
            .feed(DEPTH);
        let mut c = sounder(t);
        let reading = c.read_one_cycle().unwrap();
        assert_eq!(c.state(), ConnectionState::Unmatched);
        assert!(reading.is_absent());
        assert!(c.last_reading().is_none());
        assert!(c.is_open());
    }

    #[test]
    fn timeout_keeps_transport_open_by_default() {
        let mut c = sounder(ReplayTransport::new().feed(DEPTH).silence());
        c.read_one_cycle().unwrap();
        assert_matches!(c.read_one_cycle(), Err(ReadError::ReadTimeout));
        assert_eq!(c.state(), ConnectionState::TimedOut);
        assert!(c.is_open());
        // Timeouts do not touch the current fields.
        assert_eq!(c.parser().depth_meters(), Some("12.34".to_string()));
    }

    #[test]
    fn timeout_closes_when_configured() {
        let mut c = sounder(ReplayTransport::new().silence().feed(DEPTH)).on_timeout(FailurePolicy::Close);
        assert_matches!(c.read_one_cycle(), Err(ReadError::ReadTimeout));
        assert!(!c.is_open());

        // The next cycle reopens the transport.
        assert!(c.read_one_cycle().is_ok());
        assert!(c.is_open());
        assert_eq!(c.transport().opens(), 1);
    }

    #[test]
    fn transport_error_policy() {
        let mut c = gps(ReplayTransport::new().fault("unplugged"));
        assert_matches!(c.read_one_cycle(), Err(ReadError::SerialTransport(_)));
        assert_eq!(c.state(), ConnectionState::Failed);
        assert!(c.is_open());

        let mut c = gps(ReplayTransport::new().fault("unplugged")).on_transport_error(FailurePolicy::Close);
        assert_matches!(c.read_one_cycle(), Err(ReadError::SerialTransport(_)));
        assert!(!c.is_open());
    }

    #[test]
    fn decode_error_drops_fields() {
        let mut c = sounder(ReplayTransport::new().feed(DEPTH).feed(b"$SDDBS,\xb0\n"));
        c.read_one_cycle().unwrap();
        assert_matches!(c.read_one_cycle(), Err(ReadError::Decode(7)));
        assert_eq!(c.state(), ConnectionState::Failed);
        assert_eq!(c.parser().depth_meters(), None);
        assert!(c.is_open());
        assert!(c.last_reading().is_some());
    }

    #[test]
    fn reset_input_drops_backlog() {
        let t = ReplayTransport::new().pending(b"$SDDBS,99.99,f,30.48,M,16.67,F\n").feed(DEPTH);
        let mut c = sounder(t).reset_input(true);
        let reading = c.read_one_cycle().unwrap();
        assert_eq!(reading.meters, Some("12.34".to_string()));
        assert_eq!(c.transport().resets(), 1);
    }

    #[test]
    fn custom_framing() {
        let reader = LineReader::new(Terminator::new(b"\r\n").unwrap(), Some(128)).unwrap();
        let mut c = sounder(ReplayTransport::new().feed(b"$SDDBS,40.49,f,12.34,M,06.75,F*3C\r\n")).with_reader(reader);
        assert_eq!(c.read_one_cycle().unwrap().feet, Some("40.49".to_string()));
    }
}
