pub mod balance_calculator;
pub mod currency;
pub mod settlement_rounding;
pub mod settlement_solver;
pub mod split_calculator;

pub use balance_calculator::{BalanceAccumulator, BalanceCalculator};
pub use currency::{AtomicUnitConversionError, CurrencyContext, MAX_CURRENCY_SCALE, RoundingMode};
pub use settlement_rounding::{DecimalBalances, SettlementRoundingError, quantize_balances};
pub use settlement_solver::SettlementSolver;
pub use split_calculator::{SplitCalculator, SplitError};
