use crate::error::{LedgerError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One person's lifetime coffee spending.
/// Field names double as the persisted column names and the CSV header.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LedgerEntry {
    #[serde(rename = "worker_name")]
    pub name: String,

    #[serde(rename = "spending")]
    pub spend: f64,
}

impl LedgerEntry {
    pub fn new(name: impl Into<String>, spend: f64) -> Self {
        Self {
            name: name.into(),
            spend,
        }
    }
}

/// Storage seam for the ledger.
///
/// Keys are already-normalized names (see [`crate::parser::normalize_name`]).
/// Opening is done through each implementation's constructor.
pub trait LedgerStore {
    /// Current cumulative spend for `key`, or `None` if the person has never bought a coffee.
    fn spending(&self, key: &str) -> Result<Option<f64>>;

    /// Adds `amount` to the entry for `key`, inserting it if absent.
    /// Each call is durable on return. Returns the new cumulative spend.
    fn add_spending(&mut self, key: &str, amount: f64) -> Result<f64>;

    /// All entries ordered by name.
    fn entries(&self) -> Result<Vec<LedgerEntry>>;

    /// Releases the underlying resources.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL keeps each upsert crash-safe without blocking readers
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS spendings (
            worker_name TEXT PRIMARY KEY NOT NULL,
            spending REAL NOT NULL CHECK (spending >= 0)
        )",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SQLITE LEDGER
// ============================================================================

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM spendings", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl LedgerStore for SqliteLedger {
    fn spending(&self, key: &str) -> Result<Option<f64>> {
        let spend = self
            .conn
            .query_row(
                "SELECT spending FROM spendings WHERE worker_name = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(spend)
    }

    fn add_spending(&mut self, key: &str, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        // Read, check and write inside one transaction so the update stays atomic
        let tx = self.conn.transaction()?;
        let current: f64 = tx
            .query_row(
                "SELECT spending FROM spendings WHERE worker_name = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0.0);

        let total = current + amount;
        if !total.is_finite() {
            return Err(LedgerError::SpendOverflow(key.to_string()));
        }

        tx.execute(
            "INSERT INTO spendings (worker_name, spending) VALUES (?1, ?2)
             ON CONFLICT(worker_name) DO UPDATE SET spending = excluded.spending",
            params![key, total],
        )?;
        tx.commit()?;

        tracing::debug!(key, amount, total, "ledger upsert");
        Ok(total)
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT worker_name, spending FROM spendings ORDER BY worker_name")?;

        let entries = stmt
            .query_map([], |row| {
                Ok(LedgerEntry {
                    name: row.get(0)?,
                    spend: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| LedgerError::from(e))
    }
}

// ============================================================================
// IN-MEMORY LEDGER
// ============================================================================

/// Non-persistent ledger, handy for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: BTreeMap<String, f64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn spending(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.entries.get(key).copied())
    }

    fn add_spending(&mut self, key: &str, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let total = self.entries.get(key).copied().unwrap_or(0.0) + amount;
        if !total.is_finite() {
            return Err(LedgerError::SpendOverflow(key.to_string()));
        }
        self.entries.insert(key.to_string(), total);
        Ok(total)
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .entries
            .iter()
            .map(|(name, spend)| LedgerEntry::new(name.clone(), *spend))
            .collect())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}
