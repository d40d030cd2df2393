//! SQLite connection and schema.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::instrument;

use crate::error::StoreResult;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        phone TEXT NOT NULL,
        address TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        category TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id INTEGER NOT NULL,
        order_date TEXT NOT NULL,
        status TEXT NOT NULL,
        FOREIGN KEY (customer_id) REFERENCES customers (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        order_id INTEGER NOT NULL,
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        PRIMARY KEY (order_id, product_id),
        FOREIGN KEY (order_id) REFERENCES orders (id),
        FOREIGN KEY (product_id) REFERENCES products (id)
    )
    "#,
];

/// Handle on the shop database file.
///
/// The pool holds a single connection: every operation runs sequentially on
/// it for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl Database {
    /// Open (creating if missing) the database at `path`.
    ///
    /// Foreign keys are declared by the schema but not enforced.
    #[instrument(skip(path), fields(db_path = %path.as_ref().display()), err)]
    pub async fn connect(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { pool, path })
    }

    /// Create the shop tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn bootstrap_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn bootstrap_creates_all_tables_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("nested/shop.db")).await.unwrap();
        db.bootstrap_schema().await.unwrap();
        db.bootstrap_schema().await.unwrap();

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
        assert_eq!(names, vec!["customers", "order_items", "orders", "products"]);
        assert!(db.path().exists());
    }

    #[tokio::test]
    async fn foreign_keys_are_not_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("shop.db")).await.unwrap();
        db.bootstrap_schema().await.unwrap();

        sqlx::query("INSERT INTO orders (customer_id, order_date, status) VALUES (999, '2023-01-01T00:00:00', 'новый')")
            .execute(db.pool())
            .await
            .unwrap();
    }
}
