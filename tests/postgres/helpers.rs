//! Shared test helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
pub use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::fixture;
use taskmeta::tracking::{
    adapters::postgres::PostgresTaskRecordRepository,
    domain::{OwnerRef, TaskId, TaskRecord},
};
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the `task_records` table and its indexes.
pub const CREATE_TASK_RECORDS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_task_records/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "taskmeta_test_template";

/// Creates a tokio runtime for async operations in tests.
#[must_use]
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_TASK_RECORDS_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Creates a test database from the template and returns a repository.
///
/// # Errors
///
/// Returns an error if database creation or pool setup fails.
pub fn setup_repository(
    cluster: &TestCluster,
    db_name: &str,
) -> Result<PostgresTaskRecordRepository, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresTaskRecordRepository::new(pool))
}

/// Drops the test database when the test ends, even on panic.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// Repository over a fresh database cloned from the template.
///
/// Field order matters: the pool closes before the database is dropped.
pub struct PreparedRepo {
    pub repo: PostgresTaskRecordRepository,
    pub runtime: Runtime,
    pub cluster: &'static TestCluster,
    pub db_name: String,
    _guard: CleanupGuard,
}

impl PreparedRepo {
    /// Opens a plain connection to the test database.
    #[must_use]
    pub fn connection(&self) -> PgConnection {
        let url = self.cluster.connection().database_url(&self.db_name);
        PgConnection::establish(&url).expect("test database connection")
    }
}

/// Provides a migrated, isolated database for each test.
#[fixture]
pub fn prepared(shared_test_cluster: &'static TestCluster) -> PreparedRepo {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_task_records_{}", uuid::Uuid::new_v4().simple());
    let guard = CleanupGuard {
        cluster: shared_test_cluster,
        db_name: db_name.clone(),
    };
    let repo = setup_repository(shared_test_cluster, &db_name).expect("repository setup");
    PreparedRepo {
        repo,
        runtime: test_runtime(),
        cluster: shared_test_cluster,
        db_name,
        _guard: guard,
    }
}

/// Builds an owner reference from literals.
#[must_use]
pub fn owner(kind: &str, id: &str) -> OwnerRef {
    OwnerRef::from_parts(kind, id).expect("valid owner reference")
}

/// Builds a task id from a literal.
#[must_use]
pub fn task_id(value: &str) -> TaskId {
    TaskId::new(value).expect("valid task id")
}

/// Builds a fresh pending record.
#[must_use]
pub fn pending_record(task: &str, tracked_by: &OwnerRef) -> TaskRecord {
    TaskRecord::new(task_id(task), tracked_by.clone(), &DefaultClock)
}
