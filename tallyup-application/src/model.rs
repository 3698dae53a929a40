use rust_decimal::Decimal;
use tallyup_domain::{ExpenseId, MemberBalances, Money, ParticipantId, Transfer};

/// How an expense is divided, with amounts still in decimal form.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitInput {
    Equal(Vec<ParticipantId>),
    Custom(Vec<(ParticipantId, Decimal)>),
}

/// An expense as entered by a user, before conversion to minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub id: ExpenseId,
    pub payer: ParticipantId,
    pub total: Decimal,
    pub split: SplitInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Report net balances.
    Balances,
    /// Report a plan that settles everyone.
    Settle,
    /// The listed members pay off their balances now; later statements see
    /// them at zero.
    SettleUp(Vec<ParticipantId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerStatement {
    Expense(ExpenseInput),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStatementWithLine {
    pub line: usize,
    pub statement: LedgerStatement,
}

/// A group's members and its statements in entry order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    members: Vec<ParticipantId>,
    statements: Vec<LedgerStatementWithLine>,
}

impl Ledger {
    pub fn new(members: Vec<ParticipantId>, statements: Vec<LedgerStatementWithLine>) -> Self {
        Self {
            members,
            statements,
        }
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub fn statements(&self) -> &[LedgerStatementWithLine] {
        &self.statements
    }

    pub fn has_commands(&self) -> bool {
        self.statements
            .iter()
            .any(|stmt| matches!(stmt.statement, LedgerStatement::Command(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonBalance {
    pub id: ParticipantId,
    pub balance: Money,
}

impl PersonBalance {
    pub fn from_balances(balances: &MemberBalances) -> Vec<Self> {
        balances
            .iter()
            .map(|(id, balance)| Self {
                id: id.clone(),
                balance: *balance,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettleUpContext {
    pub settle_members: Vec<ParticipantId>,
    /// Payments made by the settle-up itself.
    pub immediate_transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementResult {
    pub balances: Vec<PersonBalance>,
    /// Plan that zeroes `balances`.
    pub optimized_transfers: Vec<Transfer>,
    pub settle_up: Option<SettleUpContext>,
}
