use crate::model::{Money, ParticipantId, SplitMap};
use fxhash::FxHashSet;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("Expense total must be positive (got {0})")]
    InvalidAmount(Money),
    #[error("Equal split requires at least one participant")]
    EmptyParticipantSet,
    #[error("Participant '{0}' appears more than once in the split")]
    DuplicateParticipant(ParticipantId),
    #[error("Custom split has no entries")]
    EmptySplit,
    #[error("Split amount for '{participant}' is negative ({amount})")]
    NegativeSplitAmount {
        participant: ParticipantId,
        amount: Money,
    },
    #[error("Split amounts sum to {actual} but the expense total is {expected}")]
    AmountMismatch { expected: Money, actual: Money },
    #[error("Split amounts overflow the minor-unit range")]
    SplitSumOverflow,
}

/// Turns an expense total into per-participant owed amounts that sum to the
/// total exactly.
pub struct SplitCalculator;

impl SplitCalculator {
    /// Divides `total` evenly; leftover minor units go one each to the first
    /// participants in the order supplied.
    pub fn split_equally(
        &self,
        total: Money,
        participants: &[ParticipantId],
    ) -> Result<SplitMap, SplitError> {
        if !total.is_positive() {
            return Err(SplitError::InvalidAmount(total));
        }
        if participants.is_empty() {
            return Err(SplitError::EmptyParticipantSet);
        }

        let mut seen: FxHashSet<&ParticipantId> = FxHashSet::default();
        if let Some(duplicate) = participants.iter().find(|id| !seen.insert(*id)) {
            return Err(SplitError::DuplicateParticipant(duplicate.clone()));
        }

        let splits: SplitMap = participants
            .iter()
            .cloned()
            .zip(total.split_even(participants.len()))
            .collect();

        debug_assert_eq!(splits.values().sum::<Money>(), total);
        Ok(splits)
    }

    /// Checks a caller-provided split against `total` without adjusting it.
    pub fn validate_custom_split(
        &self,
        total: Money,
        splits: SplitMap,
    ) -> Result<SplitMap, SplitError> {
        if !total.is_positive() {
            return Err(SplitError::InvalidAmount(total));
        }
        if splits.is_empty() {
            return Err(SplitError::EmptySplit);
        }
        if let Some((participant, amount)) = splits.iter().find(|(_, amount)| amount.is_negative())
        {
            return Err(SplitError::NegativeSplitAmount {
                participant: participant.clone(),
                amount: *amount,
            });
        }

        let actual = splits
            .values()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(*amount));
        match actual {
            Some(actual) if actual == total => Ok(splits),
            Some(actual) => Err(SplitError::AmountMismatch {
                expected: total,
                actual,
            }),
            None => Err(SplitError::SplitSumOverflow),
        }
    }
}
