use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::error::RegistryError;
use crate::migrations;
use crate::model::{Bot, NewBot};
use crate::store::BotStore;

const BOT_COLUMNS: &str = "id, name, app_id, app_secret, enabled, created_at, updated_at";

type BotRow = (i64, String, String, String, bool, DateTime<Utc>, DateTime<Utc>);

fn bot_from_row(row: BotRow) -> Bot {
    let (id, name, app_id, app_secret, enabled, created_at, updated_at) = row;
    Bot {
        id,
        name,
        app_id,
        app_secret,
        enabled,
        created_at,
        updated_at,
    }
}

fn backend(e: sqlx::Error) -> RegistryError {
    RegistryError::Backend(e.to_string())
}

/// SQLite-backed implementation of [`BotStore`].
///
/// Uses `sqlx::SqlitePool` for connection pooling. The `bots` table is
/// created on open.
pub struct SqliteBotStore {
    pool: SqlitePool,
}

impl SqliteBotStore {
    /// Open (or create) the database described by `config` and run
    /// migrations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Connection`] if the database cannot be opened,
    /// or [`RegistryError::Backend`] if migrations fail.
    pub async fn new(config: SqliteConfig) -> Result<Self, RegistryError> {
        let mut options = if config.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| RegistryError::Connection(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
        };
        if let Some(key) = &config.key {
            options = options.pragma("key", format!("'{}'", key.replace('\'', "''")));
        }

        // Every connection to `:memory:` opens its own database, so the pool
        // must hold on to exactly one.
        let pool_options = if config.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.pool_size)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;

        info!(path = %config.path, encrypted = config.key.is_some(), "bot registry opened");
        Self::from_pool(pool).await
    }

    /// Create a store from an existing pool. Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Backend`] if migrations fail.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RegistryError> {
        migrations::run_migrations(&pool).await.map_err(backend)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BotStore for SqliteBotStore {
    async fn create(&self, bot: NewBot) -> Result<Bot, RegistryError> {
        let bot = bot.validate()?;
        let now = Utc::now();

        let query = format!(
            "INSERT INTO bots (name, app_id, app_secret, enabled, created_at, updated_at) \
             VALUES (?, ?, ?, 1, ?, ?) \
             RETURNING {BOT_COLUMNS}"
        );
        let row: BotRow = sqlx::query_as(&query)
            .bind(&bot.name)
            .bind(&bot.app_id)
            .bind(&bot.app_secret)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e
                    && db.is_unique_violation()
                {
                    return RegistryError::Duplicate(bot.name.clone());
                }
                backend(e)
            })?;

        debug!(name = %bot.name, "bot created");
        Ok(bot_from_row(row))
    }

    async fn list(&self) -> Result<Vec<Bot>, RegistryError> {
        let query = format!("SELECT {BOT_COLUMNS} FROM bots ORDER BY id");
        let rows: Vec<BotRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(bot_from_row).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Bot>, RegistryError> {
        let query = format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?");
        let row: Option<BotRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(bot_from_row))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Bot>, RegistryError> {
        let query = format!("SELECT {BOT_COLUMNS} FROM bots WHERE name = ?");
        let row: Option<BotRow> = sqlx::query_as(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(bot_from_row))
    }

    async fn delete(&self, id: i64) -> Result<Bot, RegistryError> {
        let query = format!("DELETE FROM bots WHERE id = ? RETURNING {BOT_COLUMNS}");
        let row: Option<BotRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(bot_from_row)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    async fn delete_by_name(&self, name: &str) -> Result<Bot, RegistryError> {
        let query = format!("DELETE FROM bots WHERE name = ? RETURNING {BOT_COLUMNS}");
        let row: Option<BotRow> = sqlx::query_as(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(bot_from_row)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<Bot, RegistryError> {
        let query = format!(
            "UPDATE bots SET enabled = ?, updated_at = ? WHERE name = ? RETURNING {BOT_COLUMNS}"
        );
        let row: Option<BotRow> = sqlx::query_as(&query)
            .bind(enabled)
            .bind(Utc::now())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(bot_from_row)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }
}
