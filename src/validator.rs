//! Argument guards evaluated before any side effect
//!
//! Operations declare a guard list of `(argument index, check)` pairs and
//! run it over their textual arguments first, so a bad input never reaches
//! the node.

use crate::error::{MoacError, MoacResult};
use crate::wallet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HASH: Regex = Regex::new(r"^0x[0-9a-fA-F]{64}$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap();
}

/// Kind of check applied to one argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    MoacAddress,
    MoacSecret,
    Amount,
    Hash,
    JingtumAddress,
}

impl Check {
    /// Apply the check to a single value
    pub fn check(&self, value: &str) -> MoacResult<()> {
        let ok = match self {
            Check::MoacAddress => wallet::is_valid_address(value),
            Check::MoacSecret => wallet::is_valid_secret(value),
            Check::Amount => is_valid_amount(value),
            Check::Hash => HASH.is_match(value),
            Check::JingtumAddress => wallet::jingtum::is_valid_address(value),
        };
        if ok {
            return Ok(());
        }

        let value = value.to_string();
        Err(match self {
            Check::MoacAddress => MoacError::InvalidAddress(value),
            Check::MoacSecret => MoacError::InvalidSecret(value),
            Check::Amount => MoacError::InvalidAmount(value),
            Check::Hash => MoacError::InvalidHash(value),
            Check::JingtumAddress => MoacError::InvalidJingtumAddress(value),
        })
    }
}

/// Run `guards` over `args`, failing on the first argument that does not pass.
///
/// Guards pointing past the end of `args` are checked against the empty string.
pub fn validate(guards: &[(usize, Check)], args: &[&str]) -> MoacResult<()> {
    for (index, check) in guards {
        let value = args.get(*index).copied().unwrap_or_default();
        check.check(value)?;
    }
    Ok(())
}

/// A decimal number greater than zero
pub fn is_valid_amount(value: &str) -> bool {
    if !DECIMAL.is_match(value) {
        return false;
    }
    value.chars().any(|c| c.is_ascii_digit() && c != '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x9bd4810a407812042f938d2f69f673843301cfa6";
    const SECRET: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_amounts() {
        assert!(is_valid_amount("1"));
        assert!(is_valid_amount("0.001"));
        assert!(is_valid_amount(".5"));
        assert!(is_valid_amount("10."));
        assert!(!is_valid_amount("0"));
        assert!(!is_valid_amount("0.000"));
        assert!(!is_valid_amount("-1"));
        assert!(!is_valid_amount("abc"));
        assert!(!is_valid_amount(""));
        assert!(!is_valid_amount("1.2.3"));
    }

    #[test]
    fn test_guard_order_and_messages() {
        let guards = [(0, Check::MoacSecret), (1, Check::MoacAddress), (2, Check::Amount)];

        assert!(validate(&guards, &[SECRET, ADDRESS, "1"]).is_ok());

        let err = validate(&guards, &[SECRET, ADDRESS, "-1"]).unwrap_err();
        assert_eq!(err.to_string(), "-1 is invalid amount.");

        let err = validate(&guards, &[&SECRET[1..], &ADDRESS[1..], "-1"]).unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid moac secret.", &SECRET[1..]));

        let err = validate(&guards, &[SECRET, &ADDRESS[1..], "1"]).unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid moac address.", &ADDRESS[1..]));
    }

    #[test]
    fn test_hash_check() {
        let hash = format!("0x{}", "a".repeat(64));
        assert!(Check::Hash.check(&hash).is_ok());
        assert_eq!(
            Check::Hash.check(&hash[2..]).unwrap_err(),
            MoacError::InvalidHash(hash[2..].to_string())
        );
    }

    #[test]
    fn test_jingtum_check() {
        assert!(Check::JingtumAddress.check("jG9ntUTuBKqDURPUqbGYZRuRDVzPY6bpxL").is_ok());
        let err = Check::JingtumAddress.check("jG9ntU").unwrap_err();
        assert_eq!(err.to_string(), "jG9ntU is invalid jingtum address.");
    }

    #[test]
    fn test_missing_argument_fails() {
        let err = validate(&[(1, Check::MoacAddress)], &[ADDRESS]).unwrap_err();
        assert_eq!(err, MoacError::InvalidAddress(String::new()));
    }
}
