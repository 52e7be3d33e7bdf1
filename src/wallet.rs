//! Wallet primitives backed by the `ethers` secp256k1 signer
//!
//! Handles:
//! - Address and secret checks
//! - Address derivation and key generation
//! - Signing MOAC transaction records

use crate::error::{MoacError, MoacResult};
use crate::tx::MoacTransaction;
use crate::units::parse_quantity;

use ethers::core::rand::thread_rng;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::rlp::RlpStream;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

lazy_static! {
    static ref MOAC_ADDRESS: Regex = Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").unwrap();
}

/// Freshly generated key pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletModel {
    pub address: String,
    pub secret: String,
}

/// Check a moac address: 40 hex characters, optionally `0x`-prefixed
pub fn is_valid_address(address: &str) -> bool {
    MOAC_ADDRESS.is_match(address)
}

/// Check a moac secret: a 32-byte hex private key on the curve
pub fn is_valid_secret(secret: &str) -> bool {
    local_wallet(secret).is_ok()
}

/// Derive the `0x`-prefixed lowercase address of a secret, `None` if the secret is invalid
pub fn get_address(secret: &str) -> Option<String> {
    local_wallet(secret)
        .ok()
        .map(|wallet| format!("{:#x}", wallet.address()))
}

/// Generate a new random key pair
pub fn create_wallet() -> WalletModel {
    let wallet = LocalWallet::new(&mut thread_rng());
    WalletModel {
        address: format!("{:#x}", wallet.address()),
        secret: format!("0x{}", hex::encode(wallet.signer().to_bytes())),
    }
}

/// Prefix `0x` unless the address is empty or already prefixed
pub fn prefix_0x(address: &str) -> String {
    if !address.is_empty() && !address.starts_with("0x") {
        format!("0x{}", address)
    } else {
        address.to_string()
    }
}

/// Sign a transaction record, returning the `0x`-prefixed raw transaction.
///
/// The payload is `rlp([nonce, systemContract, gasPrice, gasLimit, to, value,
/// data, shardingFlag, via, v, r, s])` where the signed digest replaces
/// `v, r, s` with `chainId, 0, 0` and `v = recovery_id + chainId * 2 + 35`.
pub fn sign_transaction(tx: &MoacTransaction, secret: &str) -> MoacResult<String> {
    let wallet = local_wallet(secret).map_err(|_| MoacError::InvalidSecret(secret.to_string()))?;
    let fields = RawFields::from_record(tx)?;
    let chain_id = u64::try_from(fields.chain_id)
        .map_err(|_| MoacError::Signing(format!("chain id {} exceeds u64", fields.chain_id)))?;

    let mut unsigned = RlpStream::new_list(12);
    fields.append_to(&mut unsigned);
    unsigned.append(&chain_id);
    unsigned.append(&0u8);
    unsigned.append(&0u8);
    let sighash = H256::from(keccak256(&unsigned.out()));

    let signature = wallet
        .sign_hash(sighash)
        .map_err(|e| MoacError::Signing(e.to_string()))?;
    let v = signature.v - 27 + chain_id * 2 + 35;

    let mut signed = RlpStream::new_list(12);
    fields.append_to(&mut signed);
    signed.append(&v);
    signed.append(&signature.r);
    signed.append(&signature.s);

    Ok(format!("0x{}", hex::encode(signed.out())))
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

fn local_wallet(secret: &str) -> Result<LocalWallet, String> {
    let key = secret.strip_prefix("0x").unwrap_or(secret);
    if key.len() != 64 {
        return Err("secret must be 32 bytes".to_string());
    }
    let bytes = hex::decode(key).map_err(|e| e.to_string())?;
    LocalWallet::from_bytes(&bytes).map_err(|e| e.to_string())
}

fn decode_bytes(field: &str, value: &str) -> MoacResult<Bytes> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| MoacError::Decode(format!("invalid {} {}: {}", field, value, e)))
}

/// Record fields decoded back from their wire strings
struct RawFields {
    nonce: U256,
    system_contract: U256,
    gas_price: U256,
    gas_limit: U256,
    to: Option<Address>,
    value: U256,
    data: Bytes,
    sharding_flag: U256,
    via: Bytes,
    chain_id: U256,
}

impl RawFields {
    fn from_record(tx: &MoacTransaction) -> MoacResult<Self> {
        let to = match tx.to.as_deref() {
            Some(to) => {
                let bytes = decode_bytes("to", to)?;
                if bytes.len() != 20 {
                    return Err(MoacError::InvalidAddress(to.to_string()));
                }
                Some(Address::from_slice(&bytes))
            }
            None => None,
        };

        Ok(Self {
            nonce: parse_quantity(&tx.nonce)?,
            system_contract: parse_quantity(&tx.system_contract)?,
            gas_price: parse_quantity(&tx.gas_price)?,
            gas_limit: parse_quantity(&tx.gas_limit)?,
            to,
            value: parse_quantity(&tx.value)?,
            data: decode_bytes("data", &tx.data)?,
            sharding_flag: parse_quantity(&tx.sharding_flag)?,
            via: decode_bytes("via", &tx.via)?,
            chain_id: parse_quantity(&tx.chain_id)?,
        })
    }

    fn append_to(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.system_contract);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        match self.to {
            Some(ref to) => stream.append(to),
            None => stream.append_empty_data(),
        };
        stream.append(&self.value);
        stream.append(&self.data.as_ref());
        stream.append(&self.sharding_flag);
        stream.append(&self.via.as_ref());
    }
}

/// Jingtum (SWTC) account addresses, the counter-chain of the Fingate bridge
pub mod jingtum {
    use sha2::{Digest, Sha256};

    const ALPHABET: &[u8; 58] = b"jpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65rkm8oFqi1tuvAxyz";
    const ACCOUNT_VERSION: u8 = 0;

    /// Check a base58check-encoded Jingtum account address
    pub fn is_valid_address(address: &str) -> bool {
        let decoded = match decode_base58(address) {
            Some(decoded) => decoded,
            None => return false,
        };
        if decoded.len() != 25 || decoded[0] != ACCOUNT_VERSION {
            return false;
        }

        let (payload, checksum) = decoded.split_at(21);
        let digest = Sha256::digest(Sha256::digest(payload));
        &digest[..4] == checksum
    }

    fn decode_base58(input: &str) -> Option<Vec<u8>> {
        if input.is_empty() {
            return None;
        }

        // Little-endian accumulator
        let mut number: Vec<u8> = Vec::new();
        for c in input.bytes() {
            let mut carry = ALPHABET.iter().position(|&a| a == c)? as u32;
            for byte in number.iter_mut() {
                carry += (*byte as u32) * 58;
                *byte = (carry & 0xff) as u8;
                carry >>= 8;
            }
            while carry > 0 {
                number.push((carry & 0xff) as u8);
                carry >>= 8;
            }
        }

        let leading = input.bytes().take_while(|&c| c == ALPHABET[0]).count();
        let mut out = vec![0u8; leading];
        out.extend(number.iter().rev());
        Some(out)
    }
}
