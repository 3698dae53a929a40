#![warn(clippy::uninlined_format_args)]

pub mod model;
pub mod services;

pub use model::{
    ExpenseId, ExpenseRecord, LedgerError, MemberBalances, Money, ParticipantId, Settlement,
    SplitMap, Transfer,
};
pub use services::{
    AtomicUnitConversionError, BalanceAccumulator, BalanceCalculator, CurrencyContext,
    DecimalBalances, MAX_CURRENCY_SCALE, RoundingMode, SettlementRoundingError, SettlementSolver,
    SplitCalculator, SplitError, quantize_balances,
};
