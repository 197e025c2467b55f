//! Embedded PostgreSQL for the persistence suites.
//!
//! Every test gets its own database cloned from a template that already has
//! the crate's migrations applied. The template name carries a hash of the
//! migrations directory so edited migrations get a fresh template.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::MigrationHarness;
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use uuid::Uuid;

use hatchr_api::migrations::MIGRATIONS;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "hatchr_template";
const CLUSTER_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// A migrated, throwaway database and one open connection to it.
pub struct TestDb {
    pub conn: PgConnection,
    // Declared after `conn` so the connection closes before the drop.
    _database: TemporaryDatabase,
}

/// Truthy values: "1", "true", "yes" (case-insensitive).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Prints a skip marker and returns `None` when `SKIP_TEST_CLUSTER` is set,
/// otherwise panics so CI breakage is not masked.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Fresh database for one test, or `None` when the cluster is skipped.
pub fn test_database() -> Option<TestDb> {
    match provision() {
        Ok(db) => Some(db),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn provision() -> Result<TestDb, String> {
    let cluster = shared_cluster()?;
    let template = ensure_template_database(cluster)?;
    let name = format!("test_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database_from_template(name.as_str(), template.as_str())
        .map_err(|err| format!("create database from template: {err:?}"))?;
    let url = database.url().to_string();
    let conn = PgConnection::establish(&url).map_err(|err| format!("connect: {err}"))?;
    Ok(TestDb { conn, _database: database })
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    if std::env::var_os("PG_PASSWORD").is_none() {
        // A reused data directory keeps the password it was initialised with.
        std::env::set_var("PG_PASSWORD", "hatchr_embedded_test");
    }
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt >= CLUSTER_RETRIES => return Err(format!("start cluster: {err:?}")),
            Err(_) => {
                std::thread::sleep(RETRY_DELAY);
                attempt += 1;
            }
        }
    }
}

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short}"))
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&template);
        let mut conn = PgConnection::establish(&url).map_err(|err| format!("connect template: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| format!("migrate template: {err}"))?;
    }
    Ok(template)
}
