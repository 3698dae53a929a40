use rust_decimal::Decimal;
use tallyup_domain::{AtomicUnitConversionError, LedgerError, SettlementRoundingError, SplitError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerParseError {
    #[error("Ledger is missing the MEMBERS declaration")]
    MissingMembersDeclaration,
    #[error("Undefined member '{name}' at line {line}")]
    UndefinedMember { name: String, line: usize },
    #[error("Invalid amount '{amount}' at line {line}")]
    InvalidAmount { amount: String, line: usize },
    #[error("Syntax error at line {line}: {detail}")]
    SyntaxError { line: usize, detail: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpenseCreationError {
    #[error("Amount {amount} is not representable in the group currency: {source}")]
    InvalidAmount {
        amount: Decimal,
        source: AtomicUnitConversionError,
    },
    #[error(transparent)]
    Split(#[from] SplitError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementOptimizationError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Rounding(#[from] SettlementRoundingError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("Expense at line {line}: {source}")]
    Expense {
        line: usize,
        source: ExpenseCreationError,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Settlement(#[from] SettlementOptimizationError),
}
