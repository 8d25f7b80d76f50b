use crate::models::UserRecord;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file at `path`
    pub async fn init(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let db = Self { pool };
        db.create_tables().await?;
        tracing::info!("Database ready at {:?}", path);
        Ok(db)
    }

    /// Private in-memory database, used by tests
    pub async fn in_memory() -> Result<Self> {
        // One connection, otherwise every pooled connection sees its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn lookup_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT username, password, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Insert a new user. Returns `false` when the username is already taken.
    pub async fn create_user(&self, user: &UserRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn validate_credentials(&self, username: &str, password: &str) -> Result<bool> {
        Ok(self
            .lookup_user(username)
            .await?
            .map(|user| user.password == password)
            .unwrap_or(false))
    }

    pub async fn user_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
