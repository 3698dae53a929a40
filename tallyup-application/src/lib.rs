#![warn(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod ledger_processor;
pub mod model;
pub mod ports;

pub use config::{ConfigError, EngineConfig};
pub use error::{
    ExpenseCreationError, LedgerParseError, ProcessingError, SettlementOptimizationError,
};
pub use ledger_processor::LedgerProcessor;
pub use model::{
    Command, ExpenseInput, Ledger, LedgerStatement, LedgerStatementWithLine, PersonBalance,
    SettleUpContext, SettlementResult, SplitInput,
};
pub use ports::{LedgerParser, SettlementOptimizer};
