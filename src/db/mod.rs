//! Persistent store for ingested shows and episodes.
//!
//! [`open_store`] opens (or creates) the SQLite file with foreign keys
//! enforced. [`initialize_store`] additionally applies the embedded schema
//! migrations as one transaction, recording each in refinery's
//! `refinery_schema_history` ledger.

pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use refinery::Migration;

/// Default store location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/ingestion.db";

/// Ledger table maintained by refinery.
pub const MIGRATION_TABLE: &str = "refinery_schema_history";

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// A migration recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_on: Option<String>,
}

/// Store handle owning a SQLite connection. The connection closes on drop.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::store_io(parent, e))?;
        }

        let conn = Connection::open(path).map_err(|e| Error::store_io(path, e))?;

        // The file is only read here, so a corrupt or locked store fails now.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| Error::store_io(path, e))?;

        debug!(path = %path.display(), "Opened store");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open or create the store and apply pending schema migrations.
    pub fn initialize<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::open(path)?;
        store.run_migrations()?;
        Ok(store)
    }

    /// Open a migrated in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self { conn, path: None };
        store.run_migrations()?;
        Ok(store)
    }

    /// Apply the embedded schema migrations.
    ///
    /// Returns the names of the migrations applied by this call.
    pub fn run_migrations(&mut self) -> Result<Vec<String>> {
        let runner = embedded::migrations::runner();
        let migrations: Vec<Migration> = runner.get_migrations().to_vec();
        run_migrations(&mut self.conn, &migrations)
    }

    /// Migrations recorded in the ledger, oldest first.
    pub fn applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        if !ledger_exists(&self.conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT version, name, applied_on FROM {MIGRATION_TABLE} ORDER BY version"
        ))?;
        let applied = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    version: row.get(0)?,
                    name: row.get(1)?,
                    applied_on: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(applied)
    }

    /// Path of the store file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access to the connection (for transactions).
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Consume the store and return the raw connection.
    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

/// Open or create the store at `path` with foreign keys enforced.
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<Store> {
    Store::open(path)
}

/// Open the store at `path` and make sure the schema exists.
///
/// Safe to call repeatedly: migrations already in the ledger are skipped and
/// every table is created with `IF NOT EXISTS`.
pub fn initialize_store<P: AsRef<Path>>(path: P) -> Result<Store> {
    Store::initialize(path)
}

/// Apply `migrations` to `conn` in one grouped transaction.
///
/// If any statement fails nothing from this batch is kept, neither tables
/// nor ledger rows. A ledger table created by this call is dropped again.
pub fn run_migrations(conn: &mut Connection, migrations: &[Migration]) -> Result<Vec<String>> {
    let had_ledger = ledger_exists(conn)?;

    let report = match refinery::Runner::new(migrations)
        .set_grouped(true)
        .run(conn)
    {
        Ok(report) => report,
        Err(err) => {
            // refinery creates the ledger outside the grouped transaction.
            if !had_ledger {
                if let Err(drop_err) =
                    conn.execute_batch(&format!("DROP TABLE IF EXISTS {MIGRATION_TABLE};"))
                {
                    warn!(error = %drop_err, "Failed to drop migration ledger after rollback");
                }
            }
            return Err(err.into());
        }
    };

    let applied: Vec<String> = report
        .applied_migrations()
        .iter()
        .map(|m| m.name().to_string())
        .collect();

    if applied.is_empty() {
        debug!("Schema up to date");
    } else {
        info!(migrations = ?applied, "Applied schema migrations");
    }

    Ok(applied)
}

fn ledger_exists(conn: &Connection) -> Result<bool> {
    let ledger: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [MIGRATION_TABLE],
            |row| row.get(0),
        )
        .optional()?;
    Ok(ledger.is_some())
}
