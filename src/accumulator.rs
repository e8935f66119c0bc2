// Spend Accumulator - adds one purchase to a person's lifetime total

use crate::db::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::parser::normalize_name;

/// Records that `name` bought a coffee for `price`.
///
/// The name is normalized before it touches the ledger. The first purchase creates
/// the entry; later ones add to it. Returns the new cumulative spend.
pub fn record_purchase<S: LedgerStore + ?Sized>(store: &mut S, name: &str, price: f64) -> Result<f64> {
    let key = normalize_name(name);
    if key.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    if !price.is_finite() || price < 0.0 {
        return Err(LedgerError::InvalidAmount(price));
    }

    store.add_spending(&key, price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryLedger, SqliteLedger};

    #[test]
    fn test_new_name_gets_price() {
        let mut ledger = MemoryLedger::new();

        let total = record_purchase(&mut ledger, "Miles Yang", 4.75).unwrap();

        assert_eq!(total, 4.75);
        assert_eq!(ledger.spending("milesyang").unwrap(), Some(4.75));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_spelling_variants_share_one_entry() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();

        record_purchase(&mut ledger, "Miles Yang", 2.0).unwrap();
        record_purchase(&mut ledger, "miles yang", 3.0).unwrap();
        let total = record_purchase(&mut ledger, "MilesYang", 5.0).unwrap();

        assert_eq!(total, 10.0);
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn test_order_independent_across_names() {
        let purchases = [("Ana", 3.0), ("Bo", 4.5), ("Ana", 1.5), ("Cy", 2.0), ("Bo", 0.5)];

        let mut forward = MemoryLedger::new();
        for (name, price) in purchases {
            record_purchase(&mut forward, name, price).unwrap();
        }

        let mut backward = MemoryLedger::new();
        for (name, price) in purchases.iter().rev() {
            record_purchase(&mut backward, name, *price).unwrap();
        }

        assert_eq!(forward.entries().unwrap(), backward.entries().unwrap());
        assert_eq!(forward.spending("ana").unwrap(), Some(4.5));
        assert_eq!(forward.spending("bo").unwrap(), Some(5.0));
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut ledger = MemoryLedger::new();

        assert!(matches!(
            record_purchase(&mut ledger, "   ", 3.0),
            Err(LedgerError::EmptyName)
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_invalid_price_rejected() {
        let mut ledger = MemoryLedger::new();

        assert!(record_purchase(&mut ledger, "Ana", f64::INFINITY).is_err());
        assert!(record_purchase(&mut ledger, "Ana", -0.5).is_err());
        assert!(ledger.is_empty());
    }
}
