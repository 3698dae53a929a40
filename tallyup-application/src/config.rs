use tallyup_domain::{AtomicUnitConversionError, CurrencyContext, RoundingMode};

pub const CURRENCY_SCALE_VAR: &str = "TALLYUP_CURRENCY_SCALE";
pub const ROUNDING_MODE_VAR: &str = "TALLYUP_ROUNDING_MODE";

/// Engine settings resolved from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub currency: CurrencyContext,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer (got '{value}')")]
    InvalidScale { var: &'static str, value: String },
    #[error("{var} must be 'half_up' or 'half_even' (got '{value}')")]
    InvalidRoundingMode { var: &'static str, value: String },
    #[error(transparent)]
    Currency(#[from] AtomicUnitConversionError),
}

impl EngineConfig {
    pub fn new(currency: CurrencyContext) -> Self {
        Self { currency }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset variables fall back to cents with half-up rounding.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CurrencyContext::default();

        let scale = match lookup(CURRENCY_SCALE_VAR) {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidScale {
                    var: CURRENCY_SCALE_VAR,
                    value,
                })?,
            None => defaults.scale(),
        };

        let rounding_mode = match lookup(ROUNDING_MODE_VAR) {
            Some(value) => parse_rounding_mode(&value).ok_or(ConfigError::InvalidRoundingMode {
                var: ROUNDING_MODE_VAR,
                value,
            })?,
            None => defaults.rounding_mode(),
        };

        let currency = CurrencyContext::new(scale, rounding_mode)?;
        tracing::debug!(scale, ?rounding_mode, "Engine configuration resolved");
        Ok(Self { currency })
    }
}

fn parse_rounding_mode(value: &str) -> Option<RoundingMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "half_up" => Some(RoundingMode::HalfUp),
        "half_even" => Some(RoundingMode::HalfEven),
        _ => None,
    }
}
