// Ledger export - one row per person, opens in any spreadsheet

use crate::db::LedgerStore;
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes every ledger entry as CSV (`worker_name,spending`) to `writer`.
/// Returns the number of rows written.
pub fn write_ledger<S, W>(store: &S, writer: W) -> Result<usize>
where
    S: LedgerStore + ?Sized,
    W: Write,
{
    let entries = store.entries()?;
    let mut csv_writer = csv::Writer::from_writer(writer);

    if entries.is_empty() {
        // serialize() only emits the header alongside the first record
        csv_writer.write_record(["worker_name", "spending"])?;
    }
    for entry in &entries {
        csv_writer.serialize(entry)?;
    }
    csv_writer.flush()?;

    Ok(entries.len())
}

/// Exports the ledger to a CSV file at `path`, replacing any existing file.
pub fn export_ledger<S, P>(store: &S, path: P) -> Result<usize>
where
    S: LedgerStore + ?Sized,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let rows = write_ledger(store, file)?;
    tracing::info!(rows, path = %path.as_ref().display(), "ledger exported");
    Ok(rows)
}
