//! Conversion between decimal amounts and integer minor units.
//!
//! The engine only ever computes in [`Money`]; decimals appear when amounts
//! enter from the outside (user input, legacy floating records) and when they
//! are displayed.

use crate::model::Money;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Rounding applied when a decimal has more digits than the currency scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundingMode {
    /// Round half away from zero (0.005 -> 0.01, -0.005 -> -0.01).
    HalfUp,
    /// Round half to the nearest even unit (banker's rounding).
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AtomicUnitConversionError {
    #[error("Amount has more decimal places than the currency allows")]
    NonIntegral,
    #[error("Amount is outside the representable range")]
    OutOfRange,
    #[error("Currency scale {scale} is not supported (max {max_supported})")]
    UnsupportedScale { scale: u32, max_supported: u32 },
}

pub const MAX_CURRENCY_SCALE: u32 = 18;

/// Sub-unit digits and rounding of the group's single currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrencyContext {
    scale: u32,
    rounding_mode: RoundingMode,
}

impl CurrencyContext {
    pub fn new(scale: u32, rounding_mode: RoundingMode) -> Result<Self, AtomicUnitConversionError> {
        if scale > MAX_CURRENCY_SCALE {
            return Err(AtomicUnitConversionError::UnsupportedScale {
                scale,
                max_supported: MAX_CURRENCY_SCALE,
            });
        }
        Ok(Self {
            scale,
            rounding_mode,
        })
    }

    /// Two sub-unit digits (cents), half-up rounding.
    pub fn cents_default() -> Self {
        Self {
            scale: 2,
            rounding_mode: RoundingMode::HalfUp,
        }
    }

    /// No sub-units (e.g. JPY), half-up rounding.
    pub fn whole_units_default() -> Self {
        Self {
            scale: 0,
            rounding_mode: RoundingMode::HalfUp,
        }
    }

    pub fn scale(self) -> u32 {
        self.scale
    }

    pub fn rounding_mode(self) -> RoundingMode {
        self.rounding_mode
    }

    /// The smallest representable amount, e.g. `0.01`.
    pub fn atomic_unit(self) -> Decimal {
        Decimal::new(1, self.scale)
    }

    /// Half of one minor unit; decimal residues below it are noise.
    pub fn epsilon(self) -> Decimal {
        Decimal::new(5, self.scale + 1)
    }

    /// Exact conversion; fails when `amount` has more digits than the scale.
    pub fn to_minor_units(self, amount: Decimal) -> Result<Money, AtomicUnitConversionError> {
        let units = self.shift(amount)?;
        if !units.fract().is_zero() {
            return Err(AtomicUnitConversionError::NonIntegral);
        }
        units
            .to_i64()
            .map(Money::from_minor_units)
            .ok_or(AtomicUnitConversionError::OutOfRange)
    }

    /// Conversion that first rounds to the nearest minor unit.
    pub fn round_to_minor_units(self, amount: Decimal) -> Result<Money, AtomicUnitConversionError> {
        self.shift(amount)?
            .round_dp_with_strategy(0, self.rounding_mode.strategy())
            .to_i64()
            .map(Money::from_minor_units)
            .ok_or(AtomicUnitConversionError::OutOfRange)
    }

    pub fn to_decimal(self, amount: Money) -> Decimal {
        Decimal::new(amount.minor_units(), self.scale)
    }

    /// Display form with exactly `scale` fractional digits, e.g. `33.34`.
    pub fn format(self, amount: Money) -> String {
        self.to_decimal(amount).to_string()
    }

    fn shift(self, amount: Decimal) -> Result<Decimal, AtomicUnitConversionError> {
        let factor = Decimal::from_i128_with_scale(10_i128.pow(self.scale), 0);
        amount
            .checked_mul(factor)
            .ok_or(AtomicUnitConversionError::OutOfRange)
    }
}

impl Default for CurrencyContext {
    fn default() -> Self {
        Self::cents_default()
    }
}
