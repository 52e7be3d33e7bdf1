//! Conversion between decimal amounts and on-chain integer units

use crate::error::{MoacError, MoacResult};

use ethers::types::U256;

/// Decimals of the native MOAC coin (1 MOAC = 10^18 sha)
pub const MOAC_DECIMALS: u32 = 18;

/// Parse a decimal amount (e.g. "1.5") into the smallest unit for `decimals`.
///
/// Fractional digits beyond `decimals` are rejected rather than truncated.
pub fn parse_amount(amount: &str, decimals: u32) -> MoacResult<U256> {
    let invalid = || MoacError::InvalidAmount(amount.to_string());

    let trimmed = amount.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(invalid());
    }

    let padded = format!("{}{:0<width$}", whole, fraction, width = decimals as usize);
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }

    U256::from_dec_str(digits).map_err(|_| invalid())
}

/// Parse an amount of MOAC into sha.
pub fn to_sha(amount: &str) -> MoacResult<U256> {
    parse_amount(amount, MOAC_DECIMALS)
}

/// Format an integer amount with `decimals`, keeping full precision.
pub fn format_amount(amount: U256, decimals: u32) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    if decimals == 0 {
        return amount.to_string();
    }

    let divisor = U256::exp10(decimals as usize);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
        format!("{}.{}", whole, decimal_str.trim_end_matches('0'))
    }
}

/// Format sha as MOAC.
pub fn from_sha(amount: U256) -> String {
    format_amount(amount, MOAC_DECIMALS)
}

/// Encode an integer as a `0x`-prefixed quantity without leading zeros.
pub fn to_hex(value: U256) -> String {
    format!("{:#x}", value)
}

/// Decode a `0x`-prefixed hex quantity; "0x" alone decodes to zero.
pub fn parse_quantity(value: &str) -> MoacResult<U256> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| MoacError::Decode(format!("invalid quantity {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_whole() {
        assert_eq!(to_sha("1").unwrap(), U256::exp10(18));
    }

    #[test]
    fn test_parse_amount_decimal() {
        let result = parse_amount("1.5", 18).unwrap();
        assert_eq!(result, U256::from(1_500_000_000_000_000_000u64));

        let result = parse_amount("0.001", 6).unwrap();
        assert_eq!(result, U256::from(1_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
        assert!(parse_amount("1.2.3", 18).is_err());
        assert!(parse_amount("abc", 18).is_err());
        assert!(parse_amount("0.1234567", 6).is_err());
    }

    #[test]
    fn test_parse_amount_zero() {
        assert_eq!(parse_amount("0", 18).unwrap(), U256::zero());
        assert_eq!(parse_amount("0.0", 18).unwrap(), U256::zero());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(from_sha(U256::one()), "0.000000000000000001");
        assert_eq!(from_sha(U256::exp10(18)), "1");
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(42u64), 0), "42");
        assert_eq!(format_amount(U256::zero(), 18), "0");
    }

    #[test]
    fn test_hex_quantities() {
        assert_eq!(to_hex(U256::zero()), "0x0");
        assert_eq!(to_hex(U256::from(200_000u64)), "0x30d40");
        assert_eq!(parse_quantity("0x30d40").unwrap(), U256::from(200_000u64));
        assert_eq!(parse_quantity("0x").unwrap(), U256::zero());
        assert!(parse_quantity("0xzz").is_err());
    }
}
