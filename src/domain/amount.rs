use anyhow::{anyhow, bail};
use ethers::types::U256;
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Decimal places kept when an amount is rendered for humans.
pub const DISPLAY_DP: u32 = 6;

/// Largest scale (and digit count) a `Decimal` can carry.
const MAX_SCALE: usize = 28;

/// ERC-20 `decimals()` is a uint8.
const MAX_DECIMALS: i64 = 255;

// ==================================================
// TOKEN AMOUNT
// ==================================================

/// Exact non-negative amount `units / 10^scale`.
///
/// Kept in canonical form (no trailing zeros in `units` while `scale > 0`), so
/// two amounts are equal exactly when their values are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenAmount {
    units: U256,
    scale: u32,
}

impl TokenAmount {
    pub fn new(units: U256, scale: u32) -> Self {
        if units.is_zero() {
            return Self::default();
        }

        let ten = U256::from(10u8);
        let (mut units, mut scale) = (units, scale);
        while scale > 0 && (units % ten).is_zero() {
            units = units / ten;
            scale -= 1;
        }

        Self { units, scale }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Rounds half away from zero to `dp` places, exactly.
    pub fn round_dp(&self, dp: u32) -> Self {
        if self.scale <= dp {
            return *self;
        }

        // an overflowing power is more than twice any U256, so the value rounds to zero
        let Some(divisor) = U256::from(10u8).checked_pow(U256::from(self.scale - dp)) else {
            return Self::zero();
        };

        let (quotient, remainder) = self.units.div_mod(divisor);
        let rounded = if remainder >= divisor - remainder {
            quotient + U256::one()
        } else {
            quotient
        };

        Self::new(rounded, dp)
    }

    /// Lossy `Decimal` view for valuation. Fractional digits beyond the 28 a
    /// `Decimal` can hold are dropped; `None` when the integer part alone does
    /// not fit.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let text = self.to_string();
        let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let int_digits = if int == "0" { 0 } else { int.len() };
        if int_digits > MAX_SCALE {
            return None;
        }

        let keep = frac.len().min(MAX_SCALE - int_digits);
        let clipped = if keep == 0 {
            int.to_string()
        } else {
            format!("{}.{}", int, &frac[..keep])
        };

        Decimal::from_str(&clipped).ok()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.units.to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }

        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{}", int, frac)
    }
}

impl FromStr for TokenAmount {
    type Err = anyhow::Error;

    /// Plain decimal notation, e.g. `1500` or `0.25`.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));

        if int.is_empty() && frac.is_empty() {
            bail!("empty amount");
        }
        if !int.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            bail!("invalid amount '{}'", s);
        }

        let units = U256::from_dec_str(&format!("{}{}", int, frac))
            .map_err(|e| anyhow!("invalid amount '{}': {:?}", s, e))?;

        Ok(Self::new(units, frac.len() as u32))
    }
}

// ==================================================
// NORMALIZATION
// ==================================================

/// Normalizes a raw balance given as a decimal integer string.
/// Non-numeric input yields zero; `decimals <= 0` leaves the value unscaled.
pub fn normalize(raw: &str, decimals: i64) -> TokenAmount {
    match U256::from_dec_str(raw.trim()) {
        Ok(units) => TokenAmount::new(units, decimals.clamp(0, MAX_DECIMALS) as u32),
        Err(_) => TokenAmount::zero(),
    }
}

/// Same as [`normalize`] for a JSON string-or-integer balance.
pub fn normalize_value(raw: &Value, decimals: i64) -> TokenAmount {
    match raw {
        Value::String(s) => normalize(s, decimals),
        Value::Number(n) => normalize(&n.to_string(), decimals),
        _ => TokenAmount::zero(),
    }
}

// ==================================================
// PRICES / VALUATION
// ==================================================

/// Parses a unit price. Accepts plain and exponent notation; anything
/// negative or unparsable is treated as no price.
pub fn parse_price(raw: &Value) -> Option<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .filter(|p| !p.is_sign_negative())
}

/// `amount * unit_price`, or zero when the price is unknown.
pub fn fiat_value(amount: &TokenAmount, unit_price: Option<Decimal>) -> Decimal {
    let Some(price) = unit_price.filter(|p| !p.is_sign_negative()) else {
        return Decimal::ZERO;
    };

    match amount.to_decimal().and_then(|a| a.checked_mul(price)) {
        Some(value) => value,
        None => {
            warn!("⚠️ Value of {} at {} is out of range, treating as 0", amount, price);
            Decimal::ZERO
        }
    }
}

// ==================================================
// FORMATTING
// ==================================================

/// Rounds to six places and trims trailing zeros and a dangling point.
pub fn format_amount(amount: &TokenAmount) -> String {
    amount.round_dp(DISPLAY_DP).to_string()
}

/// Two-decimal fiat figure, e.g. `1500.00`.
pub fn format_fiat(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
