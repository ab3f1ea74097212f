//! Byte transports the line reader pulls from.

use serialport::{self, ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

use err::ReadError;

/// Serial ports cannot express "block forever"; an unbounded timeout waits a
/// day per read instead.
const BLOCKING_TIMEOUT: Duration = Duration::from_secs(86_400);

/// A character-oriented, exclusively owned transport.
pub trait Transport {
    /// Human-readable name of the transport, used in log lines.
    fn name(&self) -> &str;

    /// Read up to `buf.len()` bytes, waiting at most `timeout()`.
    /// `Ok(0)` means nothing arrived in time.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError>;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<(), ReadError>;

    fn close(&mut self);

    /// Discard bytes received but not yet read.
    fn reset_input_buffer(&mut self) -> Result<(), ReadError>;

    /// Per-read timeout. `None` blocks forever, zero polls.
    fn timeout(&self) -> Option<Duration>;

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ReadError>;
}

/// Line settings for a [SerialTransport](struct.SerialTransport.html).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Port name (e.g. `COM3`, `/dev/ttyUSB0`).
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl SerialSettings {
    /// 8N1 on `port`.
    pub fn new(port: &str, baud_rate: u32) -> Self {
        SerialSettings {
            port: port.to_string(),
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// A serial port opened through the `serialport` crate.
pub struct SerialTransport {
    settings: SerialSettings,
    timeout: Option<Duration>,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a closed transport. Nothing touches the device until
    /// [open](trait.Transport.html#tymethod.open) is called.
    pub fn new(settings: SerialSettings, timeout: Option<Duration>) -> Self {
        SerialTransport {
            settings,
            timeout,
            port: None,
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, ReadError> {
        match self.port {
            Some(ref mut port) => Ok(port),
            None => Err(not_open(&self.settings.port)),
        }
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.settings.port
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        match self.port_mut()?.read(buf) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<(), ReadError> {
        let port = serialport::new(self.settings.port.as_str(), self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .parity(self.settings.parity)
            .stop_bits(self.settings.stop_bits)
            .timeout(port_timeout(self.timeout))
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.port = None;
    }

    fn reset_input_buffer(&mut self) -> Result<(), ReadError> {
        self.port_mut()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ReadError> {
        if let Some(ref mut port) = self.port {
            port.set_timeout(port_timeout(timeout))?;
        }
        self.timeout = timeout;
        Ok(())
    }
}

#[inline]
fn port_timeout(timeout: Option<Duration>) -> Duration {
    timeout.unwrap_or(BLOCKING_TIMEOUT)
}

fn not_open(port: &str) -> ReadError {
    ReadError::SerialTransport(serialport::Error::new(
        serialport::ErrorKind::NoDevice,
        format!("port {} is not open", port),
    ))
}

#[derive(Debug)]
enum Step {
    Bytes(Vec<u8>),
    Silence,
    Fault(String),
    Burst(Vec<u8>),
}

/// Replays a recorded byte stream as if it came from an instrument.
///
/// The script is consumed in order: byte chunks are handed out one read at a
/// time, a silence makes exactly one read come back empty (a transport
/// timeout), and a fault makes one read fail. An exhausted script reads as
/// silence forever.
#[derive(Debug)]
pub struct ReplayTransport {
    name: String,
    script: VecDeque<Step>,
    open: bool,
    fail_open: bool,
    timeout: Option<Duration>,
    opens: usize,
    resets: usize,
}

impl ReplayTransport {
    /// An open transport with an empty script.
    pub fn new() -> Self {
        ReplayTransport {
            name: "replay".to_string(),
            script: VecDeque::new(),
            open: true,
            fail_open: false,
            timeout: Some(Duration::from_secs(1)),
            opens: 0,
            resets: 0,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Queue bytes.
    pub fn feed(mut self, bytes: &[u8]) -> Self {
        self.script.push_back(Step::Bytes(bytes.to_vec()));
        self
    }

    /// Queue a read that returns nothing.
    pub fn silence(mut self) -> Self {
        self.script.push_back(Step::Silence);
        self
    }

    /// Queue a read that fails with a transport error.
    pub fn fault(mut self, msg: &str) -> Self {
        self.script.push_back(Step::Fault(msg.to_string()));
        self
    }

    /// Queue bytes that are still buffered, and therefore dropped, when the
    /// input buffer is reset before they are read.
    pub fn pending(mut self, bytes: &[u8]) -> Self {
        self.script.push_back(Step::Burst(bytes.to_vec()));
        self
    }

    /// Start closed.
    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    /// Make every `open` call fail.
    pub fn unopenable(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of successful `open` calls.
    pub fn opens(&self) -> usize {
        self.opens
    }

    /// Number of `reset_input_buffer` calls.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Whether the whole script has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }

    /// Copy as much of `bytes` into `buf` as fits and requeue the rest as the
    /// same kind of step.
    fn hand_out(&mut self, mut bytes: Vec<u8>, buf: &mut [u8], step: fn(Vec<u8>) -> Step) -> usize {
        let n = buf.len().min(bytes.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        if n < bytes.len() {
            let rest = bytes.split_off(n);
            self.script.push_front(step(rest));
        }
        n
    }
}

impl Default for ReplayTransport {
    fn default() -> Self {
        ReplayTransport::new()
    }
}

impl Transport for ReplayTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        if !self.open {
            return Err(not_open(&self.name));
        }
        if buf.is_empty() {
            return Ok(0);
        }
        match self.script.pop_front() {
            None | Some(Step::Silence) => Ok(0),
            Some(Step::Fault(msg)) => Err(ReadError::SerialTransport(serialport::Error::new(
                serialport::ErrorKind::Io(io::ErrorKind::BrokenPipe),
                msg,
            ))),
            Some(Step::Bytes(bytes)) => Ok(self.hand_out(bytes, buf, Step::Bytes)),
            Some(Step::Burst(bytes)) => Ok(self.hand_out(bytes, buf, Step::Burst)),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<(), ReadError> {
        if self.fail_open {
            return Err(ReadError::SerialTransport(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                format!("{} cannot be opened", self.name),
            )));
        }
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn reset_input_buffer(&mut self) -> Result<(), ReadError> {
        if !self.open {
            return Err(not_open(&self.name));
        }
        self.resets += 1;
        while let Some(&Step::Burst(_)) = self.script.front() {
            self.script.pop_front();
        }
        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ReadError> {
        self.timeout = timeout;
        Ok(())
    }
}
