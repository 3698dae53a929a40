use crate::model::{LedgerError, MemberBalances, Money, ParticipantId, Settlement, Transfer};
use tallyup_settlement::{Payment, PersonBalance, SettlementError};

/// Produces settlement plans from net balances.
///
/// Matching is greedy, largest debt against largest credit. It yields at most
/// `debtors + creditors - 1` transfers but is not guaranteed to reach the true
/// minimum count, which is NP-hard to compute for arbitrary balances.
pub struct SettlementSolver;

impl SettlementSolver {
    /// Transfers that zero every balance. Ties between equal amounts follow
    /// the balance map's insertion order.
    pub fn settle(&self, balances: &MemberBalances) -> Result<Vec<Transfer>, LedgerError> {
        tracing::debug!(member_count = balances.len(), "Settlement started");

        let payments =
            tallyup_settlement::minimize_transactions(to_person_balances(balances))
                .map_err(LedgerError::from)?;
        let transfers: Vec<Transfer> = payments.into_iter().map(to_transfer).collect();

        debug_assert!(
            Self::apply_transfers(balances, &transfers)
                .is_ok_and(|settled| settled.values().all(|balance| balance.is_zero()))
        );
        tracing::debug!(
            member_count = balances.len(),
            transfer_count = transfers.len(),
            "Settlement finished"
        );
        Ok(transfers)
    }

    /// Zeroes only `settle_members`, leaving everyone else's remaining
    /// balance in `new_balances`.
    pub fn settle_up(
        &self,
        balances: MemberBalances,
        settle_members: &[ParticipantId],
    ) -> Result<Settlement, LedgerError> {
        if settle_members.is_empty() {
            return Ok(Settlement {
                new_balances: balances,
                transfers: Vec::new(),
            });
        }

        let payments =
            tallyup_settlement::settle_up(to_person_balances(&balances), settle_members)
                .map_err(LedgerError::from)?;
        let transfers: Vec<Transfer> = payments.into_iter().map(to_transfer).collect();
        let new_balances = Self::apply_transfers(&balances, &transfers)?;

        debug_assert!(
            settle_members
                .iter()
                .all(|member| new_balances.get(member).is_none_or(|balance| balance.is_zero()))
        );
        tracing::debug!(
            settle_member_count = settle_members.len(),
            transfer_count = transfers.len(),
            "Settle-up finished"
        );

        Ok(Settlement {
            new_balances,
            transfers,
        })
    }

    /// Balances after every transfer is paid: the payer's balance rises and
    /// the payee's falls by the transferred amount.
    pub fn apply_transfers(
        balances: &MemberBalances,
        transfers: &[Transfer],
    ) -> Result<MemberBalances, LedgerError> {
        let mut updated = balances.clone();
        for transfer in transfers {
            let from = updated.entry(transfer.from.clone()).or_insert(Money::ZERO);
            *from = from
                .checked_add(transfer.amount)
                .ok_or(LedgerError::AmountOverflow)?;
            let to = updated.entry(transfer.to.clone()).or_insert(Money::ZERO);
            *to = to
                .checked_sub(transfer.amount)
                .ok_or(LedgerError::AmountOverflow)?;
        }
        Ok(updated)
    }
}

impl From<SettlementError> for LedgerError {
    fn from(err: SettlementError) -> Self {
        match err {
            SettlementError::ImbalancedTotal(total) => {
                LedgerError::ImbalancedBalances(Money::from_minor_units(total))
            }
            SettlementError::TotalOverflow => LedgerError::AmountOverflow,
        }
    }
}

fn to_person_balances(balances: &MemberBalances) -> Vec<PersonBalance<ParticipantId>> {
    balances
        .iter()
        .map(|(id, balance)| PersonBalance {
            id: id.clone(),
            balance: balance.minor_units(),
        })
        .collect()
}

fn to_transfer(payment: Payment<ParticipantId>) -> Transfer {
    Transfer {
        from: payment.from,
        to: payment.to,
        amount: Money::from_minor_units(payment.amount),
    }
}
