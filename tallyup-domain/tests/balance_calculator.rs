use proptest::prelude::*;
use tallyup_domain::{
    BalanceCalculator, ExpenseId, ExpenseRecord, MemberBalances, Money, ParticipantId,
    SettlementSolver, SplitCalculator, SplitMap,
};

const NAMES: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn members(count: usize) -> Vec<ParticipantId> {
    NAMES[..count].iter().copied().map(ParticipantId::from).collect()
}

fn build_expenses(
    member_count: usize,
    amounts: &[i64],
    payer_indexes: &[usize],
    masks: &[usize],
) -> Vec<ExpenseRecord> {
    let group = members(member_count);
    let mut expenses = Vec::with_capacity(amounts.len());

    for (idx, &amount) in amounts.iter().enumerate() {
        let payer = group[payer_indexes.get(idx).copied().unwrap_or(0) % member_count].clone();
        let mask = masks.get(idx).copied().unwrap_or(1);
        let mut participants: Vec<ParticipantId> = group
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, id)| id.clone())
            .collect();
        if participants.is_empty() {
            participants.push(payer.clone());
        }

        let record = ExpenseRecord::equal_split(
            ExpenseId::new(format!("e{idx}")),
            payer,
            Money::from_minor_units(amount),
            &participants,
        )
        .expect("equal split of a positive total");
        expenses.push(record);
    }

    expenses
}

fn all_zero(balances: &MemberBalances) -> bool {
    balances.values().all(|balance| balance.is_zero())
}

proptest! {
    #[test]
    fn split_equally_sums_to_total(
        total in 1i64..=10_000_000,
        member_count in 1usize..=6,
    ) {
        let splits = SplitCalculator
            .split_equally(Money::from_minor_units(total), &members(member_count))
            .expect("valid split");

        prop_assert_eq!(splits.values().sum::<Money>(), Money::from_minor_units(total));

        let min = splits.values().min().copied().unwrap_or(Money::ZERO);
        let max = splits.values().max().copied().unwrap_or(Money::ZERO);
        prop_assert!((max - min).minor_units() <= 1);
    }

    #[test]
    fn balances_sum_to_zero(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=100_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
        masks in prop::collection::vec(0usize..=63, 0..=30),
    ) {
        let expenses = build_expenses(member_count, &amounts, &payer_indexes, &masks);
        let balances = BalanceCalculator
            .compute_balances(&expenses, &members(member_count))
            .expect("valid expenses");

        prop_assert_eq!(balances.len(), member_count);
        prop_assert_eq!(balances.values().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn settlement_zeroes_every_balance(
        member_count in 1usize..=6,
        amounts in prop::collection::vec(1i64..=100_000, 0..=30),
        payer_indexes in prop::collection::vec(0usize..=5, 0..=30),
        masks in prop::collection::vec(0usize..=63, 0..=30),
    ) {
        let expenses = build_expenses(member_count, &amounts, &payer_indexes, &masks);
        let balances = BalanceCalculator
            .compute_balances(&expenses, &members(member_count))
            .expect("valid expenses");

        let transfers = SettlementSolver.settle(&balances).expect("zero-sum balances");

        let non_zero = balances.values().filter(|balance| !balance.is_zero()).count();
        prop_assert!(transfers.len() <= non_zero.saturating_sub(1));
        for transfer in &transfers {
            prop_assert!(transfer.amount.is_positive());
            prop_assert_ne!(&transfer.from, &transfer.to);
        }
        let settled = SettlementSolver::apply_transfers(&balances, &transfers).expect("no overflow");
        prop_assert!(all_zero(&settled));

        let again = SettlementSolver.settle(&balances).expect("zero-sum balances");
        prop_assert_eq!(transfers, again);
    }

    #[test]
    fn recorded_settlements_close_the_ledger(
        member_count in 2usize..=6,
        amounts in prop::collection::vec(1i64..=100_000, 1..=20),
        payer_indexes in prop::collection::vec(0usize..=5, 1..=20),
        masks in prop::collection::vec(0usize..=63, 1..=20),
    ) {
        let group = members(member_count);
        let mut expenses = build_expenses(member_count, &amounts, &payer_indexes, &masks);
        let balances = BalanceCalculator
            .compute_balances(&expenses, &group)
            .expect("valid expenses");

        let transfers = SettlementSolver.settle(&balances).expect("zero-sum balances");
        for (idx, transfer) in transfers.iter().enumerate() {
            expenses.push(ExpenseRecord::settlement_payment(
                ExpenseId::new(format!("settle-{idx}")),
                transfer,
            ));
        }

        let settled = BalanceCalculator
            .compute_balances(&expenses, &group)
            .expect("settlement records are zero-sum");
        prop_assert!(all_zero(&settled));
    }

    #[test]
    fn custom_split_accepts_only_exact_sums(
        shares in prop::collection::vec(0i64..=50_000, 1..=6),
        delta in -3i64..=3,
    ) {
        let splits: SplitMap = shares
            .iter()
            .enumerate()
            .map(|(idx, amount)| (ParticipantId::from(NAMES[idx]), Money::from_minor_units(*amount)))
            .collect();
        let exact: i64 = shares.iter().sum();
        let total = exact + delta;
        prop_assume!(total > 0);

        let result = SplitCalculator.validate_custom_split(Money::from_minor_units(total), splits);
        prop_assert_eq!(result.is_ok(), delta == 0);
    }
}
