#![warn(clippy::uninlined_format_args)]

//! Greedy transfer construction over integer balances.
//!
//! Debtors and creditors are each sorted by magnitude (largest first) and
//! matched with two cursors. Every step retires at least one side, so a plan
//! never exceeds `debtors + creditors - 1` payments.
//!
//! This is not the global minimum: finding the fewest payments for arbitrary
//! balances is NP-hard (it reduces to partitioning balances into zero-sum
//! subsets). The greedy pass is exact for the common "few large debts" shape
//! and deterministic for a given input order.

mod model;

use fxhash::FxHashSet;
use std::{cmp::Ordering, hash::Hash};
use thiserror::Error;

pub use model::{Payment, PersonBalance};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("Sum of balances must be zero (found {0})")]
    ImbalancedTotal(i64),
    #[error("Sum of balances does not fit in 64-bit units")]
    TotalOverflow,
}

struct Position<MemberId> {
    id: MemberId,
    // magnitude; `u64` so that `i64::MIN` has a representation
    remaining: u64,
}

/// Builds a settlement plan that zeroes every balance.
///
/// Equal magnitudes keep their input order (the sort is stable), which makes
/// the result a pure function of the input sequence.
pub fn minimize_transactions<MemberId: Clone>(
    people: impl IntoIterator<Item = PersonBalance<MemberId>>,
) -> Result<Vec<Payment<MemberId>>, SettlementError> {
    let people: Vec<PersonBalance<MemberId>> = people.into_iter().collect();
    ensure_balanced(&people)?;

    let mut debtors = Vec::new();
    let mut creditors = Vec::new();
    for person in people {
        let position = Position {
            remaining: person.balance.unsigned_abs(),
            id: person.id,
        };
        match person.balance.cmp(&0) {
            Ordering::Less => debtors.push(position),
            Ordering::Greater => creditors.push(position),
            Ordering::Equal => {}
        }
    }

    if debtors.is_empty() || creditors.is_empty() {
        return Ok(Vec::new());
    }

    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut payments = Vec::with_capacity(debtors.len() + creditors.len() - 1);
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let amount = debtors[i].remaining.min(creditors[j].remaining);
        if amount > 0 {
            payments.push(Payment {
                from: debtors[i].id.clone(),
                to: creditors[j].id.clone(),
                amount: to_signed(amount),
            });
        }

        debtors[i].remaining -= amount;
        creditors[j].remaining -= amount;
        if debtors[i].remaining == 0 {
            i += 1;
        }
        if creditors[j].remaining == 0 {
            j += 1;
        }
    }

    debug_assert!(i == debtors.len() && j == creditors.len());
    Ok(payments)
}

/// Builds payments that zero only `settle_members`.
///
/// Each listed member is matched against opposite-sign counterparties, other
/// listed members first, then by largest remaining balance. Members outside
/// the list only absorb what is needed to close the listed ones.
pub fn settle_up<MemberId: Clone + Eq + Hash>(
    people: impl IntoIterator<Item = PersonBalance<MemberId>>,
    settle_members: &[MemberId],
) -> Result<Vec<Payment<MemberId>>, SettlementError> {
    let mut working: Vec<PersonBalance<MemberId>> = people.into_iter().collect();
    ensure_balanced(&working)?;

    let settle_lookup: FxHashSet<&MemberId> = settle_members.iter().collect();
    let preferred: Vec<bool> = working
        .iter()
        .map(|person| settle_lookup.contains(&person.id))
        .collect();

    let mut payments = Vec::new();
    let mut visited: FxHashSet<&MemberId> = FxHashSet::default();

    for member in settle_members {
        if !visited.insert(member) {
            continue;
        }
        let Some(idx) = working.iter().position(|person| person.id == *member) else {
            continue;
        };
        let balance = working[idx].balance;
        if balance == 0 {
            continue;
        }

        let mut candidates: Vec<usize> = (0..working.len())
            .filter(|&other| other != idx && working[other].balance.signum() == -balance.signum())
            .collect();
        candidates.sort_by(|&a, &b| {
            preferred[b]
                .cmp(&preferred[a])
                .then_with(|| {
                    working[b]
                        .balance
                        .unsigned_abs()
                        .cmp(&working[a].balance.unsigned_abs())
                })
                .then_with(|| a.cmp(&b))
        });

        let mut remaining = balance.unsigned_abs();
        for other in candidates {
            if remaining == 0 {
                break;
            }
            let amount = to_signed(remaining.min(working[other].balance.unsigned_abs()));
            let (from, to) = if balance > 0 { (other, idx) } else { (idx, other) };

            working[from].balance += amount;
            working[to].balance -= amount;
            remaining -= amount.unsigned_abs();
            payments.push(Payment {
                from: working[from].id.clone(),
                to: working[to].id.clone(),
                amount,
            });
        }

        debug_assert_eq!(remaining, 0);
    }

    Ok(payments)
}

/// Balances left after every payment is made: the payer's debt shrinks and
/// the payee's credit shrinks by the same amount.
pub fn residual_balances<MemberId: Clone + Eq>(
    people: &[PersonBalance<MemberId>],
    payments: &[Payment<MemberId>],
) -> Vec<PersonBalance<MemberId>> {
    let mut residual = people.to_vec();
    for payment in payments {
        if let Some(from) = residual.iter_mut().find(|person| person.id == payment.from) {
            from.balance += payment.amount;
        }
        if let Some(to) = residual.iter_mut().find(|person| person.id == payment.to) {
            to.balance -= payment.amount;
        }
    }
    residual
}

fn ensure_balanced<MemberId>(people: &[PersonBalance<MemberId>]) -> Result<(), SettlementError> {
    let total = people
        .iter()
        .try_fold(0_i64, |acc, person| acc.checked_add(person.balance))
        .ok_or(SettlementError::TotalOverflow)?;
    if total != 0 {
        return Err(SettlementError::ImbalancedTotal(total));
    }
    Ok(())
}

// Every matched amount is bounded by one creditor's balance, which is an `i64`.
fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        Payment, PersonBalance, SettlementError, minimize_transactions, residual_balances,
        settle_up,
    };
    use proptest::prelude::*;
    use rstest::rstest;

    fn person(name: &'static str, balance: i64) -> PersonBalance<&'static str> {
        PersonBalance { id: name, balance }
    }

    fn payment(from: &'static str, to: &'static str, amount: i64) -> Payment<&'static str> {
        Payment { from, to, amount }
    }

    fn assert_all_zero(people: &[PersonBalance<&'static str>], payments: &[Payment<&'static str>]) {
        for residual in residual_balances(people, payments) {
            assert_eq!(residual.balance, 0, "balance mismatch for {}", residual.id);
        }
    }

    #[rstest]
    #[case::two_people(
        vec![person("A", 100), person("B", -100)],
        vec![payment("B", "A", 100)]
    )]
    #[case::cycle_collapses_to_one(
        vec![person("A", -400), person("B", 0), person("C", 400)],
        vec![payment("A", "C", 400)]
    )]
    #[case::largest_debtor_first(
        vec![person("A", 80), person("B", -50), person("C", -30)],
        vec![payment("B", "A", 50), payment("C", "A", 30)]
    )]
    #[case::one_debtor_many_creditors(
        vec![person("A", -90), person("B", 30), person("C", 60)],
        vec![payment("A", "C", 60), payment("A", "B", 30)]
    )]
    #[case::equal_amounts_keep_input_order(
        vec![person("A", -10), person("B", -10), person("C", 10), person("D", 10)],
        vec![payment("A", "C", 10), payment("B", "D", 10)]
    )]
    #[case::partial_overlap(
        vec![person("A", -70), person("B", -30), person("C", 50), person("D", 50)],
        vec![payment("A", "C", 50), payment("A", "D", 20), payment("B", "D", 30)]
    )]
    fn greedy_matching_cases(
        #[case] people: Vec<PersonBalance<&'static str>>,
        #[case] expected: Vec<Payment<&'static str>>,
    ) {
        let payments = minimize_transactions(people.iter().cloned()).expect("balanced input");

        assert_eq!(payments, expected);
        assert_all_zero(&people, &payments);
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::single_zero(vec![person("A", 0)])]
    #[case::all_zero(vec![person("A", 0), person("B", 0), person("C", 0)])]
    fn settled_inputs_produce_no_payments(#[case] people: Vec<PersonBalance<&'static str>>) {
        let payments = minimize_transactions(people).expect("balanced input");
        assert!(payments.is_empty());
    }

    #[rstest]
    #[case::imbalanced(vec![person("A", 50), person("B", -40)], 10)]
    #[case::single_nonzero(vec![person("A", 50)], 50)]
    fn rejects_imbalanced_total(
        #[case] people: Vec<PersonBalance<&'static str>>,
        #[case] expected_total: i64,
    ) {
        assert_eq!(
            minimize_transactions(people),
            Err(SettlementError::ImbalancedTotal(expected_total))
        );
    }

    #[test]
    fn rejects_overflowing_total() {
        let people = vec![person("A", i64::MAX), person("B", 1)];
        assert_eq!(
            minimize_transactions(people),
            Err(SettlementError::TotalOverflow)
        );
    }

    #[rstest]
    #[case::single_creditor(
        vec![person("A", 100), person("B", -100)],
        &["A"],
        vec![payment("B", "A", 100)]
    )]
    #[case::settle_members_matched_together_first(
        vec![person("A", 100), person("B", -40), person("C", -60)],
        &["A", "B"],
        vec![payment("B", "A", 40), payment("C", "A", 60)]
    )]
    #[case::outsider_absorbs_remainder(
        vec![person("A", -50), person("B", 20), person("C", 30)],
        &["A", "B"],
        vec![payment("A", "B", 20), payment("A", "C", 30)]
    )]
    #[case::zero_member_skipped(
        vec![person("A", 0), person("B", 10), person("C", -10)],
        &["A"],
        vec![]
    )]
    #[case::unknown_member_skipped(
        vec![person("A", 10), person("B", -10)],
        &["Z"],
        vec![]
    )]
    #[case::duplicate_member_settled_once(
        vec![person("A", 10), person("B", -10)],
        &["A", "A"],
        vec![payment("B", "A", 10)]
    )]
    fn settle_up_cases(
        #[case] people: Vec<PersonBalance<&'static str>>,
        #[case] settle_members: &[&'static str],
        #[case] expected: Vec<Payment<&'static str>>,
    ) {
        let payments = settle_up(people.iter().cloned(), settle_members).expect("balanced input");
        assert_eq!(payments, expected);

        let residual = residual_balances(&people, &payments);
        for member in settle_members {
            if let Some(person) = residual.iter().find(|person| person.id == *member) {
                assert_eq!(person.balance, 0, "settle member {member} not settled");
            }
        }
    }

    fn balanced_people(balances: &[i64]) -> Vec<PersonBalance<&'static str>> {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut people = Vec::with_capacity(balances.len() + 1);
        let mut sum = 0;
        for (idx, &balance) in balances.iter().enumerate() {
            sum += balance;
            people.push(person(names[idx], balance));
        }
        people.push(person(names[balances.len()], -sum));
        people
    }

    proptest! {
        #[test]
        fn payments_settle_balances(balances in prop::collection::vec(-10_000i64..=10_000, 1..=7)) {
            let people = balanced_people(&balances);
            let payments = minimize_transactions(people.iter().cloned()).expect("balanced input");

            let debtors = people.iter().filter(|p| p.balance < 0).count();
            let creditors = people.iter().filter(|p| p.balance > 0).count();
            prop_assert!(payments.len() <= (debtors + creditors).saturating_sub(1));

            for payment in &payments {
                prop_assert!(payment.amount > 0);
                prop_assert_ne!(payment.from, payment.to);
            }
            for residual in residual_balances(&people, &payments) {
                prop_assert_eq!(residual.balance, 0);
            }
        }

        #[test]
        fn payments_are_deterministic(balances in prop::collection::vec(-500i64..=500, 1..=7)) {
            let people = balanced_people(&balances);
            let first = minimize_transactions(people.iter().cloned()).expect("balanced input");
            let second = minimize_transactions(people.iter().cloned()).expect("balanced input");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn settle_up_zeroes_selected_members(
            balances in prop::collection::vec(-1_000i64..=1_000, 1..=7),
            mask in 1usize..=255,
        ) {
            let people = balanced_people(&balances);
            let selected: Vec<&'static str> = people
                .iter()
                .enumerate()
                .filter(|(idx, _)| mask & (1 << idx) != 0)
                .map(|(_, person)| person.id)
                .collect();

            let payments = settle_up(people.iter().cloned(), &selected).expect("balanced input");
            let residual = residual_balances(&people, &payments);

            for payment in &payments {
                prop_assert!(payment.amount > 0);
            }
            for person in residual.iter().filter(|person| selected.contains(&person.id)) {
                prop_assert_eq!(person.balance, 0);
            }
            prop_assert_eq!(residual.iter().map(|person| person.balance).sum::<i64>(), 0);
        }
    }
}
