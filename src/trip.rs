// ☕ Coffee Trip - one form submission from parsing to payer
//
// Order of operations matters: every valid slot is written to the ledger
// first, and only then is the payer drawn, so the odds include this trip.

use crate::accumulator::record_purchase;
use crate::db::LedgerStore;
use crate::error::Result;
use crate::parser::{normalize_name, parse_price, OrderSlot, MAX_PARTICIPANTS};
use crate::selector::{choose_who_pays, Participant, Payer};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Why a form slot did not make it onto the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    MissingPrice,
    InvalidPrice,
    MissingName,
    /// Slot beyond [`MAX_PARTICIPANTS`]
    OverCapacity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSlot {
    /// 1-based form row
    pub slot: usize,
    pub reason: SkipReason,
}

/// A participant plus what they spent this trip and their new lifetime total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripLine {
    pub participant: Participant,
    pub price: f64,
    pub lifetime_spend: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripOutcome {
    pub payer: Payer,
    pub lines: Vec<TripLine>,
    pub skipped: Vec<SkippedSlot>,
    pub drawn_at: DateTime<Utc>,
}

impl TripOutcome {
    pub fn participants(&self) -> Vec<Participant> {
        self.lines.iter().map(|l| l.participant.clone()).collect()
    }

    /// When the payer was drawn, as shown to the trip.
    pub fn drawn_at_display(&self) -> String {
        self.drawn_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Sum of this trip's coffee prices, i.e. what the payer is covering.
    pub fn trip_total(&self) -> f64 {
        self.lines.iter().map(|l| l.price).sum()
    }
}

fn accept_slot(slot: &OrderSlot) -> std::result::Result<(Participant, f64), SkipReason> {
    let price = match slot.price.as_deref() {
        None => return Err(SkipReason::MissingPrice),
        Some(raw) if raw.trim().is_empty() => return Err(SkipReason::MissingPrice),
        Some(raw) => parse_price(raw).ok_or(SkipReason::InvalidPrice)?,
    };

    let name = slot.name.as_deref().unwrap_or_default();
    if normalize_name(name).is_empty() {
        return Err(SkipReason::MissingName);
    }

    Ok((Participant::new(name), price))
}

/// Runs one coffee trip: records every valid slot, then draws the payer.
///
/// Invalid slots are skipped silently (reported in [`TripOutcome::skipped`],
/// never written to the ledger, never eligible to pay). Each accepted slot is
/// persisted on its own before the next one is looked at.
pub fn process_trip<S, R>(store: &mut S, slots: &[OrderSlot], rng: &mut R) -> Result<TripOutcome>
where
    S: LedgerStore + ?Sized,
    R: Rng,
{
    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for (i, slot) in slots.iter().enumerate() {
        let index = i + 1;
        if index > MAX_PARTICIPANTS {
            skipped.push(SkippedSlot {
                slot: index,
                reason: SkipReason::OverCapacity,
            });
            continue;
        }

        match accept_slot(slot) {
            Ok((participant, price)) => {
                let lifetime_spend = record_purchase(store, &participant.display_name, price)?;
                lines.push(TripLine {
                    participant,
                    price,
                    lifetime_spend,
                });
            }
            Err(reason) => {
                // Untouched rows come through as all-empty; not worth a log line
                if *slot != OrderSlot::default() {
                    tracing::debug!(slot = index, ?reason, "skipping order slot");
                }
                skipped.push(SkippedSlot { slot: index, reason });
            }
        }
    }

    let participants: Vec<Participant> = lines.iter().map(|l| l.participant.clone()).collect();
    let payer = choose_who_pays(store, &participants, rng)?;

    tracing::info!(
        payer = %payer,
        participants = participants.len(),
        skipped = skipped.len(),
        "coffee trip drawn"
    );

    Ok(TripOutcome {
        payer,
        lines,
        skipped,
        drawn_at: Utc::now(),
    })
}
