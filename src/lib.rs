//! MOAC toolkit - transaction assembly, signing and contract dispatch
//!
//! Builds, signs and submits transactions against a MOAC node, resolving
//! nonce and gas price from chain state, and routes smart-contract calls
//! through their ABI to either a read or call-data for a transaction.

pub mod abi;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod metrics;
pub mod moac;
pub mod tx;
pub mod units;
pub mod validator;
pub mod wallet;

pub use chain::{MoacProvider, Network, NodeRpc};
pub use config::Settings;
pub use contracts::{DepositInput, DepositState, DepositTokenInput, Erc20, Erc721, Fingate};
pub use error::{MoacError, MoacResult};
pub use moac::Moac;
pub use tx::{MoacTransaction, TransactionOptions};
pub use wallet::WalletModel;
