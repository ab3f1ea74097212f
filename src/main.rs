#[macro_use]
extern crate anyhow;
extern crate clap;
extern crate crossbeam_channel;
extern crate ctrlc;
extern crate plimsoll;
extern crate serde;
extern crate serde_json;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, Sender};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use plimsoll::{sink_fn, ConnectionConfig, Dbs, Kind, Rmc, Sentence, StopHandle, Worker};

/// Read serial survey instruments and print every reading as a JSON line.
#[derive(Parser, Debug)]
#[command(name = "plimsoll", version)]
struct Args {
    /// TOML file with one `[[connection]]` table per instrument
    config: PathBuf,
}

/// One output line.
#[derive(Serialize)]
struct Tagged<'a, R: 'a> {
    connection: &'a str,
    reading: &'a R,
}

type Join = Box<dyn FnOnce() -> bool>;

/// Start a worker for `conn` whose readings are serialized onto `out`.
fn start<S>(conn: &ConnectionConfig, sentence: S, stop: &StopHandle, out: Sender<String>) -> Result<Join>
where
    S: Sentence + Send + 'static,
    S::Reading: Serialize + Send + 'static,
{
    let transport = conn.transport()?;
    let connection = conn.connection(transport, sentence)?;
    let worker = Worker::new(connection, conn.interval()).with_stop_handle(stop.clone());

    let name = conn.name.clone();
    let sink = sink_fn(move |reading: S::Reading| {
        let tagged = Tagged {
            connection: &name,
            reading: &reading,
        };
        match serde_json::to_string(&tagged) {
            Ok(line) => out.send(line).is_ok(),
            Err(err) => {
                error!(connection = %name, error = %err, "could not serialize reading");
                true
            }
        }
    });

    let handle = worker
        .spawn(sink)
        .with_context(|| format!("spawning worker for {}", conn.name))?;
    Ok(Box::new(move || handle.join().is_ok()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = plimsoll::Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if config.connections.is_empty() {
        bail!("{} has no [[connection]] tables", args.config.display());
    }

    let stop = StopHandle::new();
    let on_signal = stop.clone();
    ctrlc::set_handler(move || on_signal.stop()).context("installing Ctrl-C handler")?;

    let (tx, rx) = unbounded();
    let mut workers = Vec::with_capacity(config.connections.len());
    for conn in &config.connections {
        let join = match conn.kind {
            Kind::Rmc => start(conn, Rmc::new()?, &stop, tx.clone()),
            Kind::Dbs => start(conn, Dbs::new()?, &stop, tx.clone()),
            Kind::Ctd | Kind::Tsg | Kind::Columns => start(conn, conn.column_layout()?, &stop, tx.clone()),
        };
        match join {
            Ok(join) => workers.push((conn.name.clone(), join)),
            Err(err) => {
                stop.stop();
                return Err(err);
            }
        }
    }
    drop(tx);

    let stdout = io::stdout();
    for line in rx {
        let mut out = stdout.lock();
        writeln!(out, "{}", line).context("writing reading")?;
    }

    for (name, join) in workers {
        if !join() {
            error!(connection = %name, "worker panicked");
        }
    }
    info!("all workers stopped");
    Ok(())
}
