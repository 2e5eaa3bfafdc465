use crate::db::{self, DbPool};
use tempfile::TempDir;

/// Fresh migrated SQLite database in a temporary directory.
///
/// A file is used rather than `sqlite::memory:` so every pooled connection
/// sees the same database. Keep the directory alive for the test's duration.
pub async fn temp_database() -> (DbPool, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("inventory.db").display()
    );
    let pool = db::establish_connection(&url).await.expect("sqlite pool");
    db::run_migrations(&pool).await.expect("migrations");
    (pool, dir)
}
