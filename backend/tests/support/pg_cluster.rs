//! Embedded PostgreSQL databases for the Diesel integration suite.
//!
//! Every test gets a fresh database on the shared cluster with the embedded
//! migrations applied. Set `SKIP_TEST_CLUSTER=1` where the cluster cannot
//! start; any other setup failure panics so CI breakage stays visible.
//!
//! Bootstrap points `PG_EMBEDDED_WORKER` at this crate's `pg_worker` binary
//! and keeps the install and data directories under `target/pg-embed`
//! unless the caller already chose them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::time::Duration;

use pg_embedded_setup_unpriv::ClusterHandle;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use uuid::Uuid;

const CLUSTER_RETRIES: usize = 5;
const CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

fn pg_embed_dir() -> PathBuf {
    std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target"))
        .join("pg-embed")
}

fn unset_or(
    key: &'static str,
    value: impl FnOnce() -> String,
) -> Option<(&'static str, Option<String>)> {
    std::env::var_os(key).is_none().then(|| (key, Some(value())))
}

/// Bootstrap the shared cluster once, reporting panics as errors.
fn bootstrap() -> Result<&'static ClusterHandle, String> {
    let base = pg_embed_dir();
    let overrides: Vec<_> = [
        unset_or("PG_EMBEDDED_WORKER", || env!("CARGO_BIN_EXE_pg_worker").to_owned()),
        unset_or("PG_RUNTIME_DIR", || base.join("install").to_string_lossy().into_owned()),
        unset_or("PG_DATA_DIR", || base.join("data").to_string_lossy().into_owned()),
    ]
    .into_iter()
    .flatten()
    .collect();
    let _env = env_lock::lock_env(overrides);

    match catch_unwind(AssertUnwindSafe(shared_cluster_handle)) {
        Ok(result) => result.map_err(|error| format!("{error:?}")),
        Err(panic) => Err(panic
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| panic.downcast_ref::<&str>().map(|msg| (*msg).to_owned()))
            .unwrap_or_else(|| "cluster bootstrap panicked".to_owned())),
    }
}

fn cluster() -> Result<&'static ClusterHandle, String> {
    let mut attempt = 1;
    loop {
        match bootstrap() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < CLUSTER_RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{CLUSTER_RETRIES} failed: {error}");
                std::thread::sleep(CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Create an empty, uniquely named database and return its URL.
pub fn fresh_database_url() -> Result<String, String> {
    let cluster = cluster()?;
    let name = format!("newspaper_test_{}", Uuid::new_v4().simple());
    cluster
        .create_database(name.as_str())
        .map_err(|err| format!("create database {name}: {err:?}"))?;
    Ok(cluster.connection().database_url(&name))
}
