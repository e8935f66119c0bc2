// 🎲 Payer Selector - spend-weighted draw of who pays for the trip
//
// The more someone has spent on coffee so far, the more likely they are to
// pick up the bill this time. Over many trips this pulls everyone's total
// spending toward the same level.

use crate::db::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::parser::normalize_name;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Serialize;
use std::fmt;

/// Rendered in place of a name when nobody valid joined the trip.
pub const NO_ONE: &str = "No one";

// ============================================================================
// PARTICIPANT
// ============================================================================

/// Someone on the current trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    /// Name as typed on the form (trimmed)
    pub display_name: String,

    /// Normalized ledger key
    pub key: String,
}

impl Participant {
    pub fn new(display_name: &str) -> Self {
        Participant {
            display_name: display_name.trim().to_string(),
            key: normalize_name(display_name),
        }
    }
}

// ============================================================================
// PAYER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Payer {
    Chosen(Participant),
    NoOne,
}

impl Payer {
    pub fn display_name(&self) -> &str {
        match self {
            Payer::Chosen(participant) => &participant.display_name,
            Payer::NoOne => NO_ONE,
        }
    }

    pub fn participant(&self) -> Option<&Participant> {
        match self {
            Payer::Chosen(participant) => Some(participant),
            Payer::NoOne => None,
        }
    }
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// DRAW
// ============================================================================

/// Current ledger spend for each participant, in trip order.
fn trip_spending<S: LedgerStore + ?Sized>(store: &S, trip: &[Participant]) -> Result<Vec<f64>> {
    trip.iter()
        .map(|p| {
            let spend = store
                .spending(&p.key)?
                .ok_or_else(|| LedgerError::UnknownParticipant(p.display_name.clone()))?;
            if spend.is_finite() && spend >= 0.0 {
                Ok(spend)
            } else {
                Err(LedgerError::InvalidAmount(spend))
            }
        })
        .collect()
}

/// Spend scaled by the largest spend in the trip, so every weight is in `[0, 1]`.
///
/// Lifetime totals near `f64::MAX` still sum to a finite value after scaling.
/// All-zero spending comes back unchanged.
fn relative_weights(spending: &[f64]) -> Vec<f64> {
    let max = spending.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        spending.iter().map(|spend| spend / max).collect()
    } else {
        spending.to_vec()
    }
}

/// Picks who pays for this trip.
///
/// Call this only AFTER every participant's purchase for the trip has been
/// recorded: the weights are the post-update lifetime totals, so this trip's
/// coffee counts toward the odds.
///
/// - empty trip → [`Payer::NoOne`], no draw
/// - participant missing from the ledger → [`LedgerError::UnknownParticipant`]
/// - everyone at zero spend → uniform draw
///
/// Duplicate participants are kept; each copy carries its own weight.
pub fn choose_who_pays<S, R>(store: &S, trip: &[Participant], rng: &mut R) -> Result<Payer>
where
    S: LedgerStore + ?Sized,
    R: Rng,
{
    if trip.is_empty() {
        return Ok(Payer::NoOne);
    }

    let weights = relative_weights(&trip_spending(store, trip)?);
    let total: f64 = weights.iter().sum();

    let index = if total > 0.0 {
        WeightedIndex::new(weights.iter().copied())?.sample(rng)
    } else {
        tracing::debug!(participants = trip.len(), "zero total spend, drawing uniformly");
        rng.gen_range(0..trip.len())
    };

    Ok(Payer::Chosen(trip[index].clone()))
}

/// Probability of paying for each participant, in trip order. Sums to 1 for a non-empty trip.
pub fn payer_odds<S: LedgerStore + ?Sized>(
    store: &S,
    trip: &[Participant],
) -> Result<Vec<(Participant, f64)>> {
    let weights = relative_weights(&trip_spending(store, trip)?);
    let total: f64 = weights.iter().sum();
    let uniform = 1.0 / trip.len().max(1) as f64;

    Ok(trip
        .iter()
        .zip(weights)
        .map(|(p, weight)| {
            let odds = if total > 0.0 { weight / total } else { uniform };
            (p.clone(), odds)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryLedger;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ledger_with(entries: &[(&str, f64)]) -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        for (name, spend) in entries {
            ledger.add_spending(&normalize_name(name), *spend).unwrap();
        }
        ledger
    }

    #[test]
    fn test_empty_trip_is_no_one() {
        let ledger = MemoryLedger::new();
        let mut rng = StdRng::seed_from_u64(1);

        let payer = choose_who_pays(&ledger, &[], &mut rng).unwrap();

        assert_eq!(payer, Payer::NoOne);
        assert_eq!(payer.to_string(), "No one");
    }

    #[test]
    fn test_single_participant_always_pays() {
        let ledger = ledger_with(&[("Ana", 4.0)]);
        let trip = vec![Participant::new("Ana")];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let payer = choose_who_pays(&ledger, &trip, &mut rng).unwrap();
            assert_eq!(payer.display_name(), "Ana");
        }
    }

    #[test]
    fn test_weighted_distribution() {
        let ledger = ledger_with(&[("A", 10.0), ("B", 30.0)]);
        let trip = vec![Participant::new("A"), Participant::new("B")];
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 10_000;
        let mut a_count = 0;
        for _ in 0..draws {
            if choose_who_pays(&ledger, &trip, &mut rng).unwrap().display_name() == "A" {
                a_count += 1;
            }
        }

        let a_share = a_count as f64 / draws as f64;
        println!("A chosen {:.3} of the time", a_share);
        assert!((a_share - 0.25).abs() < 0.03, "A share {} not near 0.25", a_share);
    }

    #[test]
    fn test_zero_spender_never_pays() {
        let ledger = ledger_with(&[("Free", 0.0), ("Paid", 5.0)]);
        let trip = vec![Participant::new("Free"), Participant::new("Paid")];
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let payer = choose_who_pays(&ledger, &trip, &mut rng).unwrap();
            assert_eq!(payer.display_name(), "Paid");
        }
    }

    #[test]
    fn test_all_zero_spend_draws_uniformly() {
        let ledger = ledger_with(&[("A", 0.0), ("B", 0.0)]);
        let trip = vec![Participant::new("A"), Participant::new("B")];
        let mut rng = StdRng::seed_from_u64(11);

        let mut a_count = 0;
        for _ in 0..2_000 {
            if choose_who_pays(&ledger, &trip, &mut rng).unwrap().display_name() == "A" {
                a_count += 1;
            }
        }

        let a_share = a_count as f64 / 2_000.0;
        assert!((a_share - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_unknown_participant_is_error() {
        let ledger = ledger_with(&[("Ana", 4.0)]);
        let trip = vec![Participant::new("Ana"), Participant::new("Ghost")];
        let mut rng = StdRng::seed_from_u64(5);

        let result = choose_who_pays(&ledger, &trip, &mut rng);

        assert!(matches!(result, Err(LedgerError::UnknownParticipant(name)) if name == "Ghost"));
    }

    #[test]
    fn test_display_name_preserved() {
        let ledger = ledger_with(&[("Miles Yang", 4.0)]);
        let trip = vec![Participant::new("  Miles Yang ")];
        let mut rng = StdRng::seed_from_u64(9);

        let payer = choose_who_pays(&ledger, &trip, &mut rng).unwrap();

        assert_eq!(payer.display_name(), "Miles Yang");
        assert_eq!(payer.participant().unwrap().key, "milesyang");
    }

    #[test]
    fn test_payer_odds() {
        let ledger = ledger_with(&[("A", 10.0), ("B", 30.0)]);
        let trip = vec![Participant::new("A"), Participant::new("B")];

        let odds = payer_odds(&ledger, &trip).unwrap();

        assert_eq!(odds.len(), 2);
        assert!((odds[0].1 - 0.25).abs() < 1e-9);
        assert!((odds[1].1 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_huge_totals_draw_without_overflow() {
        let ledger = ledger_with(&[("A", 1e308), ("B", 1e308), ("C", 1e308)]);
        let trip = vec![
            Participant::new("A"),
            Participant::new("B"),
            Participant::new("C"),
        ];
        let mut rng = StdRng::seed_from_u64(13);

        for _ in 0..100 {
            let payer = choose_who_pays(&ledger, &trip, &mut rng).unwrap();
            assert!(["A", "B", "C"].contains(&payer.display_name()));
        }

        let odds = payer_odds(&ledger, &trip).unwrap();
        let sum: f64 = odds.iter().map(|(_, o)| o).sum();
        assert!((sum - 1.0).abs() < 1e-9, "Odds sum to {}", sum);
        assert!(odds.iter().all(|(_, o)| (o - 1.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_odds_sum_to_one() {
        let ledger = ledger_with(&[("A", 3.5), ("B", 12.25), ("C", 0.0), ("D", 40.0)]);
        let trip: Vec<Participant> = ["A", "B", "C", "D"].iter().map(|n| Participant::new(n)).collect();

        let odds = payer_odds(&ledger, &trip).unwrap();
        let sum: f64 = odds.iter().map(|(_, o)| o).sum();

        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(odds[2].1, 0.0);
    }

    #[test]
    fn test_duplicate_participants_each_weighted() {
        let ledger = ledger_with(&[("A", 10.0), ("B", 10.0)]);
        let trip = vec![
            Participant::new("A"),
            Participant::new("a"),
            Participant::new("B"),
        ];

        let odds = payer_odds(&ledger, &trip).unwrap();
        let a_total: f64 = odds.iter().filter(|(p, _)| p.key == "a").map(|(_, o)| o).sum();

        assert!((a_total - 2.0 / 3.0).abs() < 1e-9);
    }
}
