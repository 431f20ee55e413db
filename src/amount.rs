//! Exact token amounts
//!
//! Token amounts cross the contract boundary as integer base units scaled by
//! 10^18. [`TokenAmount`] keeps the base units and converts to and from the
//! decimal strings users type and see, without going through floating point.

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Decimals of the donation token
pub const TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn from_base_units(units: U256) -> Self {
        Self(units)
    }

    pub fn base_units(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a decimal string such as `"2.5"` into base units
    ///
    /// Accepts `digits`, `digits.digits`, `.digits` and `digits.`. Signs,
    /// exponents and more than 18 fractional digits are rejected.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("amount is empty".to_string());
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("'{}' is not a decimal number", trimmed));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(format!("'{}' is not a decimal number", trimmed));
        }
        if fraction.len() > TOKEN_DECIMALS as usize {
            return Err(format!(
                "'{}' has more than {} decimal places",
                trimmed, TOKEN_DECIMALS
            ));
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let canonical = if fraction.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, fraction)
        };
        parse_units(&canonical, TOKEN_DECIMALS)
            .map(|units| Self(units.get_absolute()))
            .map_err(|e| format!("'{}' is out of range: {}", trimmed, e))
    }

    /// Decode a `0x`-prefixed hex integer of base units
    pub fn from_hex_str(input: &str) -> Result<Self, String> {
        let digits = input
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| format!("'{}' is missing the 0x prefix", input))?;
        if digits.is_empty() {
            return Err("hex amount has no digits".to_string());
        }
        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| format!("'{}' is not a hex integer: {}", input, e))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padded = format_units(self.0, TOKEN_DECIMALS).map_err(|_| fmt::Error)?;
        // "2.500000000000000000" -> "2.5"
        match padded.split_once('.') {
            Some((whole, fraction)) => match fraction.trim_end_matches('0') {
                "" => f.write_str(whole),
                fraction => write!(f, "{}.{}", whole, fraction),
            },
            None => f.write_str(&padded),
        }
    }
}

// Serialized as the decimal display string, e.g. "2.5"
impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fractional_amount() {
        let amount = TokenAmount::parse("2.5").unwrap();
        assert_eq!(
            amount.base_units(),
            U256::from(2_500_000_000_000_000_000u64)
        );
        assert_eq!(amount.to_string(), "2.5");
    }

    #[test]
    fn test_parse_edge_forms() {
        assert_eq!(TokenAmount::parse("10").unwrap().to_string(), "10");
        assert_eq!(TokenAmount::parse(".5").unwrap().to_string(), "0.5");
        assert_eq!(TokenAmount::parse("7.").unwrap().to_string(), "7");
        assert_eq!(
            TokenAmount::parse("0.000000000000000001").unwrap().base_units(),
            U256::from(1u64)
        );
        assert!(TokenAmount::parse("0.0").unwrap().is_zero());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", " ", ".", "-1", "+1", "1e18", "1.2.3", "abc", "1,5"] {
            assert!(TokenAmount::parse(bad).is_err(), "accepted '{}'", bad);
        }
        assert!(TokenAmount::parse("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_large_amount_is_exact() {
        let amount = TokenAmount::parse("123456789012345678901234.000000000000000001").unwrap();
        assert_eq!(
            amount.to_string(),
            "123456789012345678901234.000000000000000001"
        );
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(TokenAmount::parse("2.50").unwrap().to_string(), "2.5");
        assert_eq!(TokenAmount::parse("10").unwrap().to_string(), "10");
        assert_eq!(TokenAmount::parse(".5").unwrap().to_string(), "0.5");
        assert_eq!(TokenAmount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_from_hex() {
        let amount =
            TokenAmount::from_hex_str("0x00000000000000000000000000000000000000000000000029a2241af62c0000")
                .unwrap();
        assert_eq!(amount.to_string(), "3");
        assert!(TokenAmount::from_hex_str("0x").is_err());
        assert!(TokenAmount::from_hex_str("29a2").is_err());
        assert!(TokenAmount::from_hex_str("0xzz").is_err());
    }
}
