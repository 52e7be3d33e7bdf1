//! Transaction assembly and submission with nonce and gas price resolution

mod builder;
mod gas;
mod nonce;
mod sender;

pub use builder::{
    MoacTransaction, ResolvedOptions, TransactionBuilder, TransactionOptions, EMPTY_CALL_DATA,
};
pub use gas::{GasPriceAdvisor, DEFAULT_GAS_PRICE};
pub use nonce::NonceResolver;
pub use sender::{TransactionSender, DEFAULT_GAS_LIMIT, DEFAULT_MIN_GAS_PRICE};
