// Coffee Payer - Core Library
// Lifetime coffee ledger + spend-weighted draw of who pays for the trip

pub mod accumulator;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod parser;
pub mod selector;
pub mod trip;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use accumulator::record_purchase;
pub use config::Config;
pub use db::{setup_database, LedgerEntry, LedgerStore, MemoryLedger, SqliteLedger};
pub use error::{LedgerError, Result};
pub use export::{export_ledger, write_ledger};
pub use logging::init_tracing;
pub use parser::{normalize_name, parse_price, slots_from_form, OrderSlot, MAX_PARTICIPANTS};
pub use selector::{choose_who_pays, payer_odds, Participant, Payer, NO_ONE};
pub use trip::{process_trip, SkipReason, SkippedSlot, TripLine, TripOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
