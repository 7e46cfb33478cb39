use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest magnitude a `DECIMAL(12, 2)` ledger column can hold
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// The single currency the ledger settles in, with its decimal precision.
///
/// Multi-currency is out of scope: one `Currency` is configured at start-up
/// and every amount in the ledger is rounded with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    scale: u32,
}

impl Currency {
    /// Builds a currency from an ISO-4217 style code (three ASCII letters)
    pub fn new(code: &str, scale: u32) -> Result<Self, String> {
        let code = code.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("Invalid currency code: {}", code));
        }
        if scale > 4 {
            return Err(format!("Unsupported currency scale: {}", scale));
        }
        Ok(Self { code, scale })
    }

    /// Indian Rupee, 2 decimal places
    pub fn inr() -> Self {
        Self {
            code: "INR".to_string(),
            scale: 2,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Rounds a decimal value to the currency precision
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.scale)
    }

    /// Validates that a caller-supplied amount is positive and not over-precise
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), String> {
        if amount.normalize().scale() > self.scale {
            return Err(format!(
                "{} amounts must have at most {} decimal places, got {}",
                self, self.scale, amount
            ));
        }

        if amount <= Decimal::ZERO {
            return Err(format!("{} amount must be positive, got {}", self, amount));
        }

        self.check_range(amount)
    }

    /// Rejects amounts the ledger columns cannot store
    pub fn check_range(&self, amount: Decimal) -> Result<(), String> {
        if amount.abs() > max_amount() {
            return Err(format!(
                "{} amount {} exceeds the maximum of {}",
                self,
                amount,
                max_amount()
            ));
        }

        Ok(())
    }

    /// Adds two amounts and rounds, failing instead of overflowing
    pub fn checked_total(&self, a: Decimal, b: Decimal) -> Result<Decimal, String> {
        let total = a
            .checked_add(b)
            .map(|t| self.round(t))
            .ok_or_else(|| format!("{} total of {} and {} overflows", self, a, b))?;
        self.check_range(total)?;
        Ok(total)
    }

    /// Converts an amount to the smallest unit (e.g. paise) as gateways expect
    pub fn to_minor_units(&self, amount: Decimal) -> Result<i64, String> {
        let factor = Decimal::from(10i64.pow(self.scale));
        self.round(amount)
            .checked_mul(factor)
            .and_then(|minor| minor.to_i64())
            .ok_or_else(|| format!("Amount {} is out of range for {}", amount, self))
    }

    /// Formats an amount for display with the correct decimal places
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!(
            "{} {:.width$}",
            self,
            self.round(amount),
            width = self.scale as usize
        )
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::inr()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::new(s, 2)
    }
}
