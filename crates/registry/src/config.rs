use std::fmt;

/// Path that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Configuration for the `SQLite` bot store.
#[derive(Clone)]
pub struct SqliteConfig {
    /// Database file, created if missing. [`IN_MEMORY_PATH`] keeps the
    /// database in memory.
    pub path: String,

    /// Optional SQLCipher key, applied as `PRAGMA key` on every connection.
    /// Ignored by `SQLite` builds without encryption support.
    pub key: Option<String>,

    /// Maximum number of connections in the `sqlx` connection pool.
    pub pool_size: u32,
}

impl fmt::Debug for SqliteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConfig")
            .field("path", &self.path)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: String::from("data.db"),
            key: None,
            pool_size: 5,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// An in-memory database, mostly useful for tests.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    /// Set the SQLCipher key. Empty keys are treated as no key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key: String = key.into();
        self.key = (!key.is_empty()).then_some(key);
        self
    }

    pub(crate) fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}
