use crate::model::{ExpenseId, ExpenseRecord, LedgerError, MemberBalances, Money, ParticipantId};
use indexmap::IndexMap;

/// Folds expenses into net balances one record at a time.
pub struct BalanceAccumulator {
    balances: MemberBalances,
}

impl BalanceAccumulator {
    /// Every group member starts at zero so settled members are still reported.
    pub fn new(participants: &[ParticipantId]) -> Self {
        let balances = participants
            .iter()
            .cloned()
            .map(|member| (member, Money::ZERO))
            .collect();

        Self { balances }
    }

    /// Credits the payer with the total and debits every split entry.
    ///
    /// A record whose splits do not add up to its total is rejected before
    /// anything is applied.
    pub fn apply(&mut self, expense: &ExpenseRecord) -> Result<(), LedgerError> {
        let split_sum = expense.split_sum().ok_or(LedgerError::AmountOverflow)?;
        if split_sum != expense.total() {
            tracing::error!(
                expense = %expense.id(),
                total = %expense.total(),
                split_sum = %split_sum,
                "Expense record violates the zero-sum invariant"
            );
            return Err(LedgerError::ZeroSumViolation {
                expense: expense.id().clone(),
                total: expense.total(),
                split_sum,
            });
        }

        // Every updated balance is computed before any is written back.
        let mut staged: IndexMap<&ParticipantId, Money> = IndexMap::new();
        let payer_balance = self
            .current(expense.payer())
            .checked_add(expense.total())
            .ok_or_else(|| overflow(expense, expense.payer()))?;
        staged.insert(expense.payer(), payer_balance);
        for (participant, amount) in expense.splits() {
            let current = staged
                .get(participant)
                .copied()
                .unwrap_or_else(|| self.current(participant));
            let updated = current
                .checked_sub(*amount)
                .ok_or_else(|| overflow(expense, participant))?;
            staged.insert(participant, updated);
        }

        for (participant, balance) in staged {
            *self.account(expense.id(), participant) = balance;
        }
        Ok(())
    }

    pub fn balances(&self) -> &MemberBalances {
        &self.balances
    }

    pub fn into_balances(self) -> MemberBalances {
        self.balances
    }

    fn current(&self, participant: &ParticipantId) -> Money {
        self.balances.get(participant).copied().unwrap_or(Money::ZERO)
    }

    fn account(&mut self, expense: &ExpenseId, participant: &ParticipantId) -> &mut Money {
        if !self.balances.contains_key(participant) {
            tracing::warn!(
                expense = %expense,
                participant = %participant,
                "Expense references a participant outside the group"
            );
        }
        self.balances
            .entry(participant.clone())
            .or_insert(Money::ZERO)
    }
}

fn overflow(expense: &ExpenseRecord, participant: &ParticipantId) -> LedgerError {
    tracing::error!(
        expense = %expense.id(),
        participant = %participant,
        "Running balance overflows the minor-unit range"
    );
    LedgerError::AmountOverflow
}

/// Balance aggregation over a snapshot of expenses.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// `balance(p) = paid by p - owed by p`; the result always sums to zero.
    pub fn compute_balances<'e, I>(
        &self,
        expenses: I,
        participants: &[ParticipantId],
    ) -> Result<MemberBalances, LedgerError>
    where
        I: IntoIterator<Item = &'e ExpenseRecord>,
    {
        let mut accumulator = BalanceAccumulator::new(participants);
        for expense in expenses {
            accumulator.apply(expense)?;
        }

        let balances = accumulator.into_balances();
        debug_assert_eq!(balances.values().sum::<Money>(), Money::ZERO);
        Ok(balances)
    }
}
