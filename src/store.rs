//! Keyed JSON-blob store backed by SQLite.
//!
//! Each entity array lives as one JSON document under a fixed key, mirroring
//! the browser local-storage layout of the original client. Read-modify-write
//! cycles run inside a transaction so racing writers on the same key are
//! serialized instead of silently dropping updates.

use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::AppError;

pub mod keys {
    pub const USER: &str = "cooper_user";
    pub const USERS: &str = "cooper_users";
    pub const EVENTS: &str = "cooper_events";
    pub const CATEGORIES: &str = "cooper_categories";
    pub const BILLS: &str = "cooper_bills";

    /// Keys purged by the debug "clear all" operation. The user registry and
    /// session record survive.
    pub const MIRROR: [&str; 3] = [EVENTS, CATEGORIES, BILLS];
}

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let opts = SqliteConnectOptions::from_str(database_url)
            .map_err(AppError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!().run(&pool).await?;
        Ok(Store { pool })
    }

    /// In-process store for tests and local experiments. A single connection
    /// is required because every SQLite `:memory:` connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").map_err(AppError::Database)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        Ok(Store { pool })
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM store WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    pub async fn put_raw(&self, key: &str, value: &str) -> Result<(), AppError> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO store (key, value, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Typed read. A missing key reads as `T::default()`, matching the
    /// `localStorage.getItem(k) || "[]"` convention of the original client.
    pub async fn load<T>(&self, key: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(T::default()),
        }
    }

    pub async fn save<T>(&self, key: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        self.put_raw(key, &serde_json::to_string(value)?).await
    }

    /// Transactional read-modify-write on one key. The closure's return value
    /// is handed back to the caller after the commit.
    pub async fn update<T, F, R>(&self, key: &str, f: F) -> Result<R, AppError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let mut tx = self.pool.begin().await?;

        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM store WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        let mut value: T = match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => T::default(),
        };
        let out = f(&mut value);

        let updated_at = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO store (key, value, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(serde_json::to_string(&value)?)
        .bind(updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(out)
    }

    pub async fn clear_mirror(&self) -> Result<(), AppError> {
        for key in keys::MIRROR {
            self.remove(key).await?;
        }
        log::info!("local mirror cleared");
        Ok(())
    }
}
