//! Runs one embedded PostgreSQL lifecycle step on behalf of the test suite.
//!
//! `pg-embed-setup-unpriv` drops root privileges by re-executing this binary
//! as `pg_worker <setup|start|stop> <payload.json>`. The payload is the
//! library's own `WorkerPayload`, so the settings come back unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Report, Result};
use pg_embedded_setup_unpriv::worker::WorkerPayload;
use postgresql_embedded::PostgreSQL;
use tokio::runtime::Builder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Step {
    Setup,
    Start,
    Stop,
}

#[derive(Debug, Parser)]
#[command(name = "pg_worker", about = "Embedded PostgreSQL helper for the Diesel tests")]
struct Invocation {
    step: Step,
    payload: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let invocation = Invocation::parse();
    let payload = read_payload(&invocation.payload)?;
    run(invocation.step, payload)
}

fn read_payload(path: &Path) -> Result<WorkerPayload> {
    let raw = fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).wrap_err_with(|| format!("parsing {}", path.display()))
}

fn run(step: Step, payload: WorkerPayload) -> Result<()> {
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| Report::new(err).wrap_err("rebuilding postgres settings"))?;
    for (key, value) in payload.environment {
        // SAFETY: the worker is single-threaded until the runtime below starts.
        match value {
            Some(value) => unsafe { std::env::set_var(&key, value.expose()) },
            None => unsafe { std::env::remove_var(&key) },
        }
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("building worker runtime")?;
    let mut postgres = PostgreSQL::new(settings);
    runtime
        .block_on(async {
            match step {
                Step::Setup => postgres.setup().await,
                Step::Start => postgres.start().await,
                Step::Stop => postgres.stop().await,
            }
        })
        .wrap_err_with(|| format!("postgres {step:?} failed"))
}
