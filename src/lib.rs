#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate arrayvec;
extern crate chrono;
extern crate crossbeam_channel;
#[macro_use]
extern crate quick_error;
extern crate regex;
extern crate serde;
extern crate serialport;
extern crate toml;
#[macro_use]
extern crate tracing;

#[macro_use]
mod macros;
pub mod columns;
pub mod config;
pub mod connection;
pub mod dbs;
pub mod decode;
pub mod err;
pub mod parser;
pub mod reader;
pub mod reading;
pub mod rmc;
pub mod sentence;
pub mod timeout;
pub mod transport;
pub mod worker;

pub use columns::Columns;
pub use config::{Config, ConnectionConfig, Kind};
pub use connection::{Connection, ConnectionState, FailurePolicy};
pub use dbs::Dbs;
pub use err::{ConfigError, FramingError, PatternError, ReadError, TimeoutError};
pub use parser::SentenceParser;
pub use reader::{LineReader, RawLine, Terminator};
pub use reading::{ColumnReading, DepthReading, PositionReading};
pub use rmc::Rmc;
pub use sentence::{FieldMap, Sentence, SentencePattern};
pub use timeout::{Clock, MonotonicClock, Timeout};
pub use transport::{ReplayTransport, SerialSettings, SerialTransport, Transport};
pub use worker::{sink_fn, Sink, StopHandle, Worker};
