use arrayvec::CapacityError;
use regex;
use serialport;
use std::io;
use toml;

quick_error! {
    #[derive(Debug)]
    pub enum ReadError {
        ReadTimeout {
            description("Read timeout")
            display("No data arrived within the transport read timeout")
        }
        SerialTransport(err: serialport::Error) {
            from()
            from(err: io::Error) -> (serialport::Error::from(err))
            description("Serial transport error")
            display("Serial transport failed: {}", err)
            cause(err)
        }
        Decode(position: usize) {
            description("Non-ASCII input")
            display("Encountered non-ASCII byte at offset {}", position)
        }
    }
}

quick_error! {
    #[derive(Debug, PartialEq)]
    pub enum TimeoutError {
        InvalidState(msg: &'static str) {
            description("Invalid timeout state")
            display("Invalid timeout state: {}", msg)
        }
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum FramingError {
        EmptyTerminator {
            description("Empty terminator")
            display("The line terminator must contain at least one byte")
        }
        TerminatorOverflow(err: CapacityError<u8>, capacity: usize) {
            description("Terminator too long")
            display("Tried to push more than {} bytes into the terminator: {}", capacity, err)
            cause(err)
        }
        ZeroMaxSize {
            description("Zero max size")
            display("The maximum line size must be at least one byte")
        }
    }
}

// Quick error can't handle from for tuples
impl From<(CapacityError<u8>, usize)> for FramingError {
    fn from((e, cap): (CapacityError<u8>, usize)) -> Self {
        FramingError::TerminatorOverflow(e, cap)
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum PatternError {
        Regex(err: regex::Error) {
            from()
            description("Invalid sentence pattern")
            display("Could not compile sentence pattern: {}", err)
            cause(err)
        }
        NoColumns {
            description("No columns")
            display("A column layout needs at least one column name")
        }
        BlankColumn(index: usize) {
            description("Blank column name")
            display("Column {} has a blank name", index)
        }
        DuplicateColumn(index: usize) {
            description("Duplicate column name")
            display("Column {} repeats the name of an earlier column", index)
        }
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum ConfigError {
        Io(err: io::Error) {
            from()
            description("I/O error")
            display("Could not read configuration: {}", err)
            cause(err)
        }
        Toml(err: toml::de::Error) {
            from()
            description("Malformed configuration")
            display("Could not parse configuration: {}", err)
            cause(err)
        }
        Framing(err: FramingError) {
            from()
            description("Invalid framing")
            display("Invalid line framing: {}", err)
            cause(err)
        }
        Pattern(err: PatternError) {
            from()
            description("Invalid sentence layout")
            display("Invalid sentence layout: {}", err)
            cause(err)
        }
        InvalidValue(connection: String, msg: &'static str) {
            description("Invalid configuration value")
            display("Connection \"{}\": {}", connection, msg)
        }
    }
}
