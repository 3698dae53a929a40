use tallyup_application::{SettlementOptimizationError, SettlementOptimizer};
use tallyup_domain::{
    LedgerError, MemberBalances, ParticipantId, Settlement, SettlementSolver, Transfer,
};

/// Largest-first greedy matching from the domain solver.
#[derive(Default)]
pub struct GreedySettlementOptimizer;

fn map_ledger_error(err: LedgerError) -> SettlementOptimizationError {
    tracing::warn!(error = %err, "Settlement optimization failed");
    SettlementOptimizationError::Ledger(err)
}

impl SettlementOptimizer for GreedySettlementOptimizer {
    fn optimize(
        &self,
        balances: &MemberBalances,
    ) -> Result<Vec<Transfer>, SettlementOptimizationError> {
        SettlementSolver.settle(balances).map_err(map_ledger_error)
    }

    fn settle_up(
        &self,
        balances: MemberBalances,
        settle_members: &[ParticipantId],
    ) -> Result<Settlement, SettlementOptimizationError> {
        SettlementSolver
            .settle_up(balances, settle_members)
            .map_err(map_ledger_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tallyup_domain::Money;

    fn balances(entries: &[(&str, i64)]) -> MemberBalances {
        entries
            .iter()
            .map(|(name, amount)| (ParticipantId::from(*name), Money::from_minor_units(*amount)))
            .collect()
    }

    #[test]
    fn optimize_zeroes_balances() {
        let input = balances(&[("A", 6_666), ("B", -3_333), ("C", -3_333)]);

        let transfers = GreedySettlementOptimizer
            .optimize(&input)
            .expect("balanced input");

        assert_eq!(transfers.len(), 2);
        assert!(
            SettlementSolver::apply_transfers(&input, &transfers)
                .expect("no overflow")
                .values()
                .all(|balance| balance.is_zero())
        );
    }

    #[rstest]
    #[case::optimize(false)]
    #[case::settle_up(true)]
    fn imbalanced_input_is_reported(#[case] partial: bool) {
        let input = balances(&[("A", 100), ("B", -90)]);
        let expected = SettlementOptimizationError::Ledger(LedgerError::ImbalancedBalances(
            Money::from_minor_units(10),
        ));

        let err = if partial {
            GreedySettlementOptimizer
                .settle_up(input, &[ParticipantId::from("A")])
                .err()
        } else {
            GreedySettlementOptimizer.optimize(&input).err()
        };

        assert_eq!(err, Some(expected));
    }

    #[test]
    fn settle_up_leaves_others_open() {
        let settlement = GreedySettlementOptimizer
            .settle_up(
                balances(&[("A", 100), ("B", -60), ("C", -40)]),
                &[ParticipantId::from("B")],
            )
            .expect("balanced input");

        assert_eq!(settlement.new_balances, balances(&[("A", 40), ("B", 0), ("C", -40)]));
    }
}
