use thiserror::Error;

/// Errors raised by the ledger, the accumulator and the payer draw.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
    #[error("Lifetime spend for {0} would no longer be a finite number")]
    SpendOverflow(String),
    #[error("Name is empty after normalization")]
    EmptyName,
    #[error("No ledger entry for participant: {0}")]
    UnknownParticipant(String),
    #[error("Weighted draw failed: {0}")]
    Sampling(#[from] rand::distributions::WeightedError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
