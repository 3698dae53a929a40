use crate::{
    config::EngineConfig,
    error::{
        ExpenseCreationError, LedgerParseError, ProcessingError, SettlementOptimizationError,
    },
    model::{
        Command, ExpenseInput, Ledger, LedgerStatement, LedgerStatementWithLine, PersonBalance,
        SettleUpContext, SettlementResult, SplitInput,
    },
    ports::{LedgerParser, SettlementOptimizer},
};
use indexmap::map::Entry;
use rust_decimal::Decimal;
use tallyup_domain::{
    BalanceAccumulator, BalanceCalculator, DecimalBalances, ExpenseId, ExpenseRecord,
    MemberBalances, Money, SplitError, SplitMap, Transfer, quantize_balances,
};

#[derive(Clone, Copy)]
pub struct LedgerProcessor<'a> {
    parser: &'a dyn LedgerParser,
    optimizer: &'a dyn SettlementOptimizer,
    config: EngineConfig,
}

struct ReplayResult {
    expenses: Vec<ExpenseRecord>,
    balances: MemberBalances,
    settle_up: Option<SettleUpContext>,
}

impl<'a> LedgerProcessor<'a> {
    pub fn new(
        parser: &'a dyn LedgerParser,
        optimizer: &'a dyn SettlementOptimizer,
        config: EngineConfig,
    ) -> Self {
        Self {
            parser,
            optimizer,
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn parse_ledger(&self, content: &str) -> Result<Ledger, LedgerParseError> {
        self.parser.parse(content)
    }

    /// Converts user input to minor units and builds a validated record.
    pub fn create_expense(
        &self,
        input: &ExpenseInput,
    ) -> Result<ExpenseRecord, ExpenseCreationError> {
        let total = self.to_money(input.total)?;
        let record = match &input.split {
            SplitInput::Equal(participants) => ExpenseRecord::equal_split(
                input.id.clone(),
                input.payer.clone(),
                total,
                participants,
            )?,
            SplitInput::Custom(entries) => {
                let mut splits = SplitMap::with_capacity(entries.len());
                for (participant, amount) in entries {
                    let amount = self.to_money(*amount)?;
                    match splits.entry(participant.clone()) {
                        Entry::Occupied(_) => {
                            return Err(SplitError::DuplicateParticipant(participant.clone()).into());
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(amount);
                        }
                    }
                }
                ExpenseRecord::custom_split(input.id.clone(), input.payer.clone(), total, splits)?
            }
        };

        tracing::debug!(
            expense = %record.id(),
            payer = %record.payer(),
            total = %record.total(),
            split_count = record.splits().len(),
            "Expense created"
        );
        Ok(record)
    }

    /// Records a confirmed transfer as a ledger entry.
    pub fn record_settlement(&self, id: ExpenseId, transfer: &Transfer) -> ExpenseRecord {
        tracing::info!(
            expense = %id,
            from = %transfer.from,
            to = %transfer.to,
            amount = %self.config.currency.format(transfer.amount),
            "Settlement payment recorded"
        );
        ExpenseRecord::settlement_payment(id, transfer)
    }

    /// Every record the ledger produces up to `prefix_len`, settle-up
    /// payments included.
    pub fn materialize_expenses(
        &self,
        ledger: &Ledger,
        prefix_len: Option<usize>,
    ) -> Result<Vec<ExpenseRecord>, ProcessingError> {
        Ok(self.replay(ledger, prefix_len)?.expenses)
    }

    pub fn calculate_balances(&self, ledger: &Ledger) -> Result<MemberBalances, ProcessingError> {
        let expenses = self.materialize_expenses(ledger, None)?;
        Ok(BalanceCalculator.compute_balances(&expenses, ledger.members())?)
    }

    pub fn build_settlement_result(
        &self,
        ledger: &Ledger,
    ) -> Result<SettlementResult, ProcessingError> {
        let replayed = self.replay(ledger, None)?;
        self.build_settlement_result_from_replay(replayed)
    }

    /// Evaluates the ledger as seen by the statement at `prefix_len`.
    pub fn build_settlement_result_for_prefix(
        &self,
        ledger: &Ledger,
        prefix_len: usize,
    ) -> Result<SettlementResult, ProcessingError> {
        let replayed = self.replay(ledger, Some(prefix_len))?;
        self.build_settlement_result_from_replay(replayed)
    }

    /// Settles balances that were computed in decimal elsewhere.
    pub fn settle_decimal_balances(
        &self,
        balances: &DecimalBalances,
    ) -> Result<SettlementResult, ProcessingError> {
        let balances = quantize_balances(balances, self.config.currency)
            .map_err(SettlementOptimizationError::from)?;
        let optimized_transfers = self.optimizer.optimize(&balances)?;

        Ok(SettlementResult {
            balances: PersonBalance::from_balances(&balances),
            optimized_transfers,
            settle_up: None,
        })
    }

    fn build_settlement_result_from_replay(
        &self,
        replayed: ReplayResult,
    ) -> Result<SettlementResult, ProcessingError> {
        let optimized_transfers = self.optimizer.optimize(&replayed.balances)?;

        Ok(SettlementResult {
            balances: PersonBalance::from_balances(&replayed.balances),
            optimized_transfers,
            settle_up: replayed.settle_up,
        })
    }

    fn replay(
        &self,
        ledger: &Ledger,
        prefix_len: Option<usize>,
    ) -> Result<ReplayResult, ProcessingError> {
        let statements = ledger.statements();
        let end = match prefix_len {
            Some(prefix_len) => prefix_end(statements, prefix_len),
            None => statements.len(),
        };

        let mut accumulator = BalanceAccumulator::new(ledger.members());
        let mut expenses = Vec::new();
        let mut settle_up = None;

        for stmt in &statements[..end] {
            match &stmt.statement {
                LedgerStatement::Expense(input) => {
                    let record = self.create_expense(input).map_err(|source| {
                        ProcessingError::Expense {
                            line: stmt.line,
                            source,
                        }
                    })?;
                    accumulator.apply(&record)?;
                    expenses.push(record);
                    settle_up = None;
                }
                LedgerStatement::Command(Command::SettleUp(settle_members)) => {
                    let settlement = self
                        .optimizer
                        .settle_up(accumulator.balances().clone(), settle_members)?;

                    for (idx, transfer) in settlement.transfers.iter().enumerate() {
                        let id = ExpenseId::new(format!("settle-up:{}:{}", stmt.line, idx + 1));
                        let record = self.record_settlement(id, transfer);
                        accumulator.apply(&record)?;
                        expenses.push(record);
                    }
                    debug_assert_eq!(accumulator.balances(), &settlement.new_balances);

                    settle_up = Some(SettleUpContext {
                        settle_members: settle_members.clone(),
                        immediate_transfers: settlement.transfers,
                    });
                }
                LedgerStatement::Command(Command::Balances | Command::Settle) => {
                    settle_up = None;
                }
            }
        }

        let balances = accumulator.into_balances();
        debug_assert_eq!(balances.values().sum::<Money>(), Money::ZERO);
        Ok(ReplayResult {
            expenses,
            balances,
            settle_up,
        })
    }

    fn to_money(&self, amount: Decimal) -> Result<Money, ExpenseCreationError> {
        self.config
            .currency
            .to_minor_units(amount)
            .map_err(|source| ExpenseCreationError::InvalidAmount { amount, source })
    }
}

// A command at `prefix_len` is evaluated with itself included.
fn prefix_end(statements: &[LedgerStatementWithLine], prefix_len: usize) -> usize {
    let prefix_len = prefix_len.min(statements.len());
    if prefix_len < statements.len()
        && matches!(statements[prefix_len].statement, LedgerStatement::Command(_))
    {
        return prefix_len + 1;
    }
    prefix_len
}
