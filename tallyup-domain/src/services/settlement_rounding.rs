//! Quantization of decimal balances into minor units.
//!
//! Balances computed in decimal (for example records written by older
//! floating-point clients) are rounded to the currency unit. Rounding each
//! entry independently can leave the total a few units away from zero, so
//! the residue is repaired one unit at a time:
//! 1. Every balance is rounded with the context's rounding mode.
//! 2. `V = Σ q_i` is the residue in units; `|V|` members get a one-unit correction.
//! 3. Corrections go to members who gained most from rounding, with a SHA-256
//!    stable key breaking exact ties.

use crate::{
    model::{MemberBalances, Money, ParticipantId},
    services::{AtomicUnitConversionError, CurrencyContext, RoundingMode},
};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Decimal net positions, in participant insertion order.
pub type DecimalBalances = IndexMap<ParticipantId, Decimal>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettlementRoundingError {
    /// The input total is further from zero than half a unit; this is data
    /// corruption, not rounding noise.
    #[error("Balances sum to {0} instead of zero")]
    ImbalancedTotal(Decimal),
    #[error(transparent)]
    Conversion(#[from] AtomicUnitConversionError),
    #[error("Rounding residue cannot be distributed across the members")]
    InvalidAdjustmentCount,
    #[error("Quantized balances failed to restore the zero-sum invariant")]
    ZeroSumInvariantViolation,
}

struct Entry {
    id: ParticipantId,
    units: i64,
    // rounded - original
    diff: Decimal,
}

/// Rounds `balances` to minor units so that they sum to exactly zero.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use tallyup_domain::{CurrencyContext, DecimalBalances, Money, ParticipantId, quantize_balances};
///
/// let balances = DecimalBalances::from_iter([
///     (ParticipantId::from("A"), Decimal::new(6667, 2)),
///     (ParticipantId::from("B"), Decimal::new(-3333, 2)),
///     (ParticipantId::from("C"), Decimal::new(-3334, 2)),
/// ]);
///
/// let rounded = quantize_balances(&balances, CurrencyContext::cents_default()).unwrap();
/// assert_eq!(rounded.values().sum::<Money>(), Money::ZERO);
/// ```
pub fn quantize_balances(
    balances: &DecimalBalances,
    context: CurrencyContext,
) -> Result<MemberBalances, SettlementRoundingError> {
    let sum_original = balances
        .values()
        .try_fold(Decimal::ZERO, |acc, balance| acc.checked_add(*balance))
        .ok_or(SettlementRoundingError::Conversion(
            AtomicUnitConversionError::OutOfRange,
        ))?;
    if sum_original.abs() > context.epsilon() {
        tracing::error!(
            reject_reason = "input_imbalance",
            member_count = balances.len(),
            epsilon = %context.epsilon(),
            sum_original = %sum_original,
            "Settlement quantization rejected due to input imbalance"
        );
        return Err(SettlementRoundingError::ImbalancedTotal(sum_original));
    }

    let atomic_unit = context.atomic_unit();
    let mut entries = balances
        .iter()
        .map(|(id, original)| {
            let units = context.round_to_minor_units(*original)?.minor_units();
            let diff = Decimal::from(units) * atomic_unit - *original;
            Ok(Entry {
                id: id.clone(),
                units,
                diff,
            })
        })
        .collect::<Result<Vec<_>, SettlementRoundingError>>()?;

    let residue = units_total(&entries)?;
    if residue != 0 {
        let adjustment_count = usize::try_from(residue.unsigned_abs())
            .map_err(|_| SettlementRoundingError::InvalidAdjustmentCount)?;
        if adjustment_count > entries.len() {
            tracing::error!(
                residue,
                member_count = entries.len(),
                "Rounding residue exceeds participant count"
            );
            return Err(SettlementRoundingError::InvalidAdjustmentCount);
        }

        // V > 0: take back from those who rounded up the most.
        // V < 0: give to those who rounded down the most.
        let score_sign = if residue > 0 {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        };
        let mut ranked: Vec<(usize, Decimal, [u8; 32])> = entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, entry.diff * score_sign, stable_key(&entry.id, context)))
            .collect();
        ranked.sort_by(|(idx_a, score_a, key_a), (idx_b, score_b, key_b)| {
            score_b
                .cmp(score_a)
                .then_with(|| key_a.cmp(key_b))
                .then_with(|| idx_a.cmp(idx_b))
        });

        let step = if residue > 0 { -1 } else { 1 };
        for (idx, _, _) in ranked.iter().take(adjustment_count) {
            entries[*idx].units += step;
        }

        tracing::debug!(
            residue,
            adjustment_count,
            adjusted = ?ranked
                .iter()
                .take(adjustment_count)
                .map(|(idx, _, _)| entries[*idx].id.as_str())
                .collect::<Vec<_>>(),
            "Settlement quantization adjusted rounding residue"
        );

        if units_total(&entries)? != 0 {
            return Err(SettlementRoundingError::ZeroSumInvariantViolation);
        }
    }

    Ok(entries
        .into_iter()
        .map(|entry| (entry.id, Money::from_minor_units(entry.units)))
        .collect())
}

fn units_total(entries: &[Entry]) -> Result<i64, SettlementRoundingError> {
    entries
        .iter()
        .try_fold(0_i64, |acc, entry| acc.checked_add(entry.units))
        .ok_or(SettlementRoundingError::Conversion(
            AtomicUnitConversionError::OutOfRange,
        ))
}

fn stable_key(participant: &ParticipantId, context: CurrencyContext) -> [u8; 32] {
    let rounding_mode_tag = match context.rounding_mode() {
        RoundingMode::HalfUp => 0_u8,
        RoundingMode::HalfEven => 1_u8,
    };

    let mut hasher = Sha256::new();
    hasher.update([1_u8]); // format version
    hasher.update(context.scale().to_be_bytes());
    hasher.update([rounding_mode_tag]);
    hasher.update(participant.as_str().as_bytes());

    let digest = hasher.finalize();
    let mut out = [0_u8; 32];
    out.copy_from_slice(&digest);
    out
}
