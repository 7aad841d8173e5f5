//! Database pool with split reader/writer connections in WAL mode.
//!
//! Correlation is read-mostly: every inbound event does a `get` scan, while
//! writes only happen on instance start, wait-state entry, and branch
//! resumption. SQLite allows a single writer, so the pool is split: a
//! multi-connection reader pool for the correlator's concurrent lookups and
//! a one-connection writer pool that serializes record upserts and deletes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on concurrent reader connections.
const MAX_READER_CONNECTIONS: u32 = 4;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool for SQLite with WAL mode.
#[derive(Clone)]
pub struct DatabasePool {
    /// Multi-connection pool for correlation lookups.
    pub reader: SqlitePool,
    /// Single-connection pool for serialized record writes.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations on the writer before the reader pool opens.
    ///
    /// Both pools use WAL journal mode, foreign key enforcement, and a
    /// busy timeout of [`BUSY_TIMEOUT`].
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT)
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(MAX_READER_CONNECTIONS)
            .connect_with(base_opts.read_only(true))
            .await?;

        Ok(Self { reader, writer })
    }

    /// Open the database at the default location (see [`default_database_url`]).
    pub async fn open_default() -> Result<Self, sqlx::Error> {
        Self::new(&default_database_url()).await
    }
}

/// Returns the default database URL based on the `CHOREO_DATA_DIR` env var,
/// falling back to `~/.choreo/choreo.db`.
pub fn default_database_url() -> String {
    let data_dir = std::env::var("CHOREO_DATA_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.choreo")
    });
    format!("sqlite://{data_dir}/choreo.db")
}
