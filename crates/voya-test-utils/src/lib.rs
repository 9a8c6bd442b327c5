//! Shared PostgreSQL harness for voya integration tests.
//!
//! One server instance is shared across a test binary; every test carves
//! out its own throwaway database inside it, so tests stay isolated without
//! paying container startup per test.
//!
//! Two modes:
//! - **`VOYA_TEST_PG_URL`** set (e.g. by a nextest setup script): connect to
//!   that external server directly, no testcontainers involved.
//! - **Unset** (plain `cargo test`): start a PostgreSQL container via
//!   testcontainers on first use, held in a `OnceCell` for the life of the
//!   binary.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use voya_db::pool;

/// The shared server: its base URL, plus the container handle when we own
/// one (dropping the handle would kill the container).
struct SharedServer {
    base_url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED: OnceCell<SharedServer> = OnceCell::const_new();

async fn start_shared_server() -> SharedServer {
    if let Ok(url) = std::env::var("VOYA_TEST_PG_URL") {
        return SharedServer {
            base_url: url,
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("18")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedServer {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Base URL of the shared PostgreSQL server, without a database name.
///
/// First call may block while the container starts.
pub async fn pg_url() -> &'static str {
    let shared = SHARED.get_or_init(start_shared_server).await;
    &shared.base_url
}

/// Create a uniquely-named database on the shared server and migrate it.
///
/// Returns a pool connected to the fresh database together with its name;
/// pass the name to [`drop_test_db`] during test teardown.
pub async fn create_test_db() -> (PgPool, String) {
    let base_url = pg_url().await;

    // CREATE DATABASE has to run from another database, so go through the
    // default "postgres" one.
    let maint_url = format!("{base_url}/postgres");
    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&maint_url)
        .await
        .expect("failed to connect to maintenance database in container");

    let db_name = format!("voya_test_{}", Uuid::new_v4().simple());
    let stmt = format!("CREATE DATABASE {db_name}");
    maint_pool
        .execute(stmt.as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create temp database {db_name}: {e}"));
    maint_pool.close().await;

    let db_url = format!("{base_url}/{db_name}");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&db_url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to temp database {db_name}: {e}"));

    pool::run_migrations(&db_pool)
        .await
        .expect("migrations should succeed");

    (db_pool, db_name)
}

/// Drop a test database created by [`create_test_db`].
///
/// Kicks any remaining connections first; harmless if the database is
/// already gone.
pub async fn drop_test_db(db_name: &str) {
    let base_url = pg_url().await;
    let maint_url = format!("{base_url}/postgres");

    let maint_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&maint_url)
        .await
        .expect("failed to connect to maintenance database for cleanup");

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint_pool.execute(terminate.as_str()).await;

    let stmt = format!("DROP DATABASE IF EXISTS {db_name}");
    let _ = maint_pool.execute(stmt.as_str()).await;
    maint_pool.close().await;
}
