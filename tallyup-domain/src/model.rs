use std::{
    borrow::Borrow,
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::services::{SplitCalculator, SplitError};

/// Opaque identifier of a person who can owe or be owed money.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(ArcStr);

impl ParticipantId {
    pub fn new(id: impl Into<ArcStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpenseId(ArcStr);

impl ExpenseId {
    pub fn new(id: impl Into<ArcStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount in integer minor units of the group currency (cents for a scale of 2).
///
/// Decimal forms only exist at the boundary, see [`crate::services::CurrencyContext`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Splits into `parts` shares that sum back to `self` exactly.
    ///
    /// Shares differ by at most one minor unit; the first `self mod parts`
    /// shares carry the extra unit.
    pub fn split_even(self, parts: usize) -> impl Iterator<Item = Money> {
        let divisor = i64::try_from(parts).unwrap_or(i64::MAX).max(1);
        let base = self.0.div_euclid(divisor);
        let remainder = self.0.rem_euclid(divisor) as usize;

        (0..parts).map(move |idx| {
            if idx < remainder {
                Self(base + 1)
            } else {
                Self(base)
            }
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Net position per participant, in participant insertion order.
pub type MemberBalances = IndexMap<ParticipantId, Money>;

/// Per-participant owed amounts of one expense.
pub type SplitMap = IndexMap<ParticipantId, Money>;

/// One shared expense. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseRecord {
    id: ExpenseId,
    payer: ParticipantId,
    total: Money,
    splits: SplitMap,
}

impl ExpenseRecord {
    /// Wraps a record loaded from an external store without validating it.
    ///
    /// Corrupt records are reported by the balance aggregation as
    /// [`LedgerError::ZeroSumViolation`].
    pub fn new(id: ExpenseId, payer: ParticipantId, total: Money, splits: SplitMap) -> Self {
        Self {
            id,
            payer,
            total,
            splits,
        }
    }

    pub fn equal_split(
        id: ExpenseId,
        payer: ParticipantId,
        total: Money,
        participants: &[ParticipantId],
    ) -> Result<Self, SplitError> {
        let splits = SplitCalculator.split_equally(total, participants)?;
        Ok(Self::new(id, payer, total, splits))
    }

    pub fn custom_split(
        id: ExpenseId,
        payer: ParticipantId,
        total: Money,
        splits: SplitMap,
    ) -> Result<Self, SplitError> {
        let splits = SplitCalculator.validate_custom_split(total, splits)?;
        Ok(Self::new(id, payer, total, splits))
    }

    /// Records a confirmed settlement payment as an ordinary expense: the
    /// debtor "pays" and the creditor is the only split entry, so feeding it
    /// back into the ledger moves both balances toward zero.
    pub fn settlement_payment(id: ExpenseId, transfer: &Transfer) -> Self {
        let splits = SplitMap::from_iter([(transfer.to.clone(), transfer.amount)]);
        Self::new(id, transfer.from.clone(), transfer.amount, splits)
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn payer(&self) -> &ParticipantId {
        &self.payer
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn splits(&self) -> &SplitMap {
        &self.splits
    }

    /// `None` when the split entries overflow.
    pub fn split_sum(&self) -> Option<Money> {
        self.splits
            .values()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(*amount))
    }
}

/// `from` pays `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

#[derive(Debug, PartialEq)]
pub struct Settlement {
    pub new_balances: MemberBalances,
    pub transfers: Vec<Transfer>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Expense '{expense}' splits sum to {split_sum} but its total is {total}")]
    ZeroSumViolation {
        expense: ExpenseId,
        total: Money,
        split_sum: Money,
    },
    #[error("Balances sum to {0} instead of zero")]
    ImbalancedBalances(Money),
    #[error("Amounts overflow the minor-unit range")]
    AmountOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exact(Money::from_minor_units(9), 3, vec![3, 3, 3])]
    #[case::one_cent_left(Money::from_minor_units(10_000), 3, vec![3334, 3333, 3333])]
    #[case::two_cents_left(Money::from_minor_units(11), 3, vec![4, 4, 3])]
    #[case::fewer_units_than_parts(Money::from_minor_units(2), 4, vec![1, 1, 0, 0])]
    #[case::negative(Money::from_minor_units(-10), 3, vec![-3, -3, -4])]
    #[case::no_parts(Money::from_minor_units(10), 0, vec![])]
    fn split_even_preserves_total(
        #[case] amount: Money,
        #[case] parts: usize,
        #[case] expected: Vec<i64>,
    ) {
        let shares: Vec<i64> = amount.split_even(parts).map(Money::minor_units).collect();
        assert_eq!(shares, expected);
        if parts > 0 {
            assert_eq!(shares.iter().sum::<i64>(), amount.minor_units());
        }
    }

    #[test]
    fn settlement_payment_credits_the_creditor() {
        let transfer = Transfer {
            from: ParticipantId::from("alice"),
            to: ParticipantId::from("carol"),
            amount: Money::from_minor_units(40_000),
        };

        let record = ExpenseRecord::settlement_payment(ExpenseId::from("settle-1"), &transfer);

        assert_eq!(record.payer().as_str(), "alice");
        assert_eq!(record.total(), transfer.amount);
        assert_eq!(record.splits().len(), 1);
        assert_eq!(record.splits().get("carol"), Some(&transfer.amount));
        assert_eq!(record.split_sum(), Some(record.total()));
    }

    #[test]
    fn participant_id_borrows_as_str() {
        let balances = MemberBalances::from_iter([(ParticipantId::from("bob"), Money::ZERO)]);
        assert!(balances.contains_key("bob"));
        assert_eq!(ParticipantId::from("bob").to_string(), "bob");
    }
}
