//! The acquisition loop that drives a [Connection](../connection/struct.Connection.html)
//! on its own thread.

use crossbeam_channel::Sender;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use connection::Connection;
use err::ReadError;
use sentence::Sentence;
use transport::Transport;

/// Cooperative stop flag, checked once per cycle.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        StopHandle::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives the readings of one worker, in the order they were read.
pub trait Sink<R> {
    /// Hand over one reading. Returning `false` ends the worker.
    fn emit(&mut self, reading: R) -> bool;
}

impl<R> Sink<R> for Sender<R> {
    fn emit(&mut self, reading: R) -> bool {
        self.send(reading).is_ok()
    }
}

/// A sink backed by a closure.
pub struct FnSink<F>(F);

/// Wrap `f` as a [Sink](trait.Sink.html).
pub fn sink_fn<R, F: FnMut(R) -> bool>(f: F) -> FnSink<F> {
    FnSink(f)
}

impl<R, F: FnMut(R) -> bool> Sink<R> for FnSink<F> {
    fn emit(&mut self, reading: R) -> bool {
        (self.0)(reading)
    }
}

/// Owns a connection and reads from it until stopped.
pub struct Worker<T, S: Sentence> {
    connection: Connection<T, S>,
    interval: Duration,
    stop: StopHandle,
}

impl<T: Transport, S: Sentence> Worker<T, S> {
    /// `interval` is the pause after every cycle.
    pub fn new(connection: Connection<T, S>, interval: Duration) -> Self {
        Worker {
            connection,
            interval,
            stop: StopHandle::new(),
        }
    }

    /// Share a stop flag with other workers.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the acquisition loop on the current thread and return the
    /// connection, closed, once the stop flag is set or the sink hangs up.
    ///
    /// A timeout emits the absent reading. Transport and decode errors are
    /// logged and emit nothing.
    pub fn run<K: Sink<S::Reading>>(mut self, mut sink: K) -> Connection<T, S> {
        info!(connection = self.connection.name(), "worker started");

        if let Err(err) = self.connection.open() {
            error!(
                connection = self.connection.name(),
                error = %err,
                "could not open transport"
            );
            return self.connection;
        }

        while !self.stop.is_stopped() {
            let reading = match self.connection.read_one_cycle() {
                Ok(reading) => Some(reading),
                Err(ReadError::ReadTimeout) => {
                    warn!(
                        connection = self.connection.name(),
                        transport = self.connection.transport().name(),
                        "timed out waiting for data"
                    );
                    Some(self.connection.absent())
                }
                Err(err) => {
                    error!(
                        connection = self.connection.name(),
                        error = %err,
                        "read cycle failed"
                    );
                    None
                }
            };
            if let Some(reading) = reading {
                if !sink.emit(reading) {
                    info!(connection = self.connection.name(), "sink closed");
                    break;
                }
            }
            thread::sleep(self.interval);
        }

        self.connection.close();
        info!(connection = self.connection.name(), "worker stopped");
        self.connection
    }
}

impl<T, S> Worker<T, S>
where
    T: Transport + Send + 'static,
    S: Sentence + Send + 'static,
    S::Reading: Send + 'static,
{
    /// Run the loop on a named thread.
    pub fn spawn<K>(self, sink: K) -> io::Result<thread::JoinHandle<Connection<T, S>>>
    where
        K: Sink<S::Reading> + Send + 'static,
    {
        let name = format!("worker-{}", self.connection.name());
        thread::Builder::new().name(name).spawn(move || self.run(sink))
    }
}
