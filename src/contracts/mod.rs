//! Token and bridge contract wrappers
//!
//! Each wrapper is a `Contract` bound to a static ABI plus the argument
//! shaping of its operations. Reads and call-data both go through the ABI
//! dispatcher, submissions through the `Moac` send pipeline.

pub mod erc20;
pub mod erc721;
pub mod fingate;

pub use erc20::Erc20;
pub use erc721::Erc721;
pub use fingate::{DepositInput, DepositState, DepositTokenInput, Fingate};

use crate::error::{MoacError, MoacResult};
use crate::wallet::prefix_0x;

use ethers::abi::Token;
use ethers::types::{Address, U256};

/// Address used for native MOAC in bridge queries
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

pub(crate) fn address_token(address: &str) -> MoacResult<Token> {
    prefix_0x(address)
        .parse::<Address>()
        .map(Token::Address)
        .map_err(|_| MoacError::InvalidAddress(address.to_string()))
}

/// Token ids and indexes: decimal, or hex with a `0x` prefix
pub(crate) fn uint_token(value: &str) -> MoacResult<Token> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(value).ok(),
    };
    parsed
        .map(Token::Uint)
        .ok_or_else(|| MoacError::Abi(format!("{} is not an unsigned integer", value)))
}
