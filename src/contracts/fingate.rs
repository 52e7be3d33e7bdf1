//! Fingate bridge wrapper: deposits from MOAC to Jingtum

use super::{address_token, ZERO_ADDRESS};
use crate::abi::{address_at, string_at, uint_at, Contract, FINGATE_ABI};
use crate::error::{MoacError, MoacResult};
use crate::moac::Moac;
use crate::tx::TransactionOptions;
use crate::units::parse_amount;
use crate::validator::{validate, Check};
use crate::wallet::prefix_0x;

use ethers::abi::Token;
use ethers::types::U256;
use serde::Serialize;
use std::sync::Arc;

/// Outstanding deposit of one account for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositState {
    pub amount: U256,
    pub jingtum_address: String,
    pub time: U256,
}

impl DepositState {
    /// A deposit is pending while it carries an amount or a Jingtum address
    pub fn is_pending(&self) -> bool {
        !self.amount.is_zero() || !self.jingtum_address.is_empty()
    }
}

/// Parameters of a `deposit` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepositInput {
    pub jingtum_address: String,
}

/// Parameters of a `depositToken` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepositTokenInput {
    pub jingtum_address: String,
    pub token: String,
    pub amount: U256,
    pub hash: String,
}

pub struct Fingate {
    moac: Arc<Moac>,
    contract: Contract,
}

impl Fingate {
    pub fn new(moac: Arc<Moac>, address: &str) -> MoacResult<Self> {
        Ok(Self {
            contract: Contract::fingate(address)?,
            moac,
        })
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Deposit state of `address` for `token`, native MOAC when `token` is `None`
    pub async fn deposit_state(&self, address: &str, token: Option<&str>) -> MoacResult<DepositState> {
        let token = token.unwrap_or(ZERO_ADDRESS);
        validate(
            &[(0, Check::MoacAddress), (1, Check::MoacAddress)],
            &[address, token],
        )?;

        let args = [address_token(token)?, address_token(&prefix_0x(address))?];
        let values = self
            .moac
            .call_contract(&self.contract, "depositState", &args)
            .await?
            .into_values()?;

        Ok(DepositState {
            amount: uint_at(&values, 0)?,
            jingtum_address: string_at(&values, 1)?,
            time: uint_at(&values, 2)?,
        })
    }

    /// Deposit `amount` MOAC to be credited to `jt_address` on Jingtum
    pub async fn deposit(
        &self,
        jt_address: &str,
        amount: &str,
        secret: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[(0, Check::JingtumAddress), (1, Check::Amount), (2, Check::MoacSecret)],
            &[jt_address, amount, secret],
        )?;

        let calldata = self
            .encode("deposit", &[Token::String(jt_address.to_string())])
            .await?;
        self.moac
            .send_transaction_with_call_data(secret, &self.contract.address, amount, Some(&calldata), options)
            .await
    }

    /// Register a token deposit made by the transfer `hash`
    #[allow(clippy::too_many_arguments)]
    pub async fn deposit_token(
        &self,
        jt_address: &str,
        token: &str,
        decimals: u32,
        amount: &str,
        hash: &str,
        secret: &str,
        options: &TransactionOptions,
    ) -> MoacResult<String> {
        validate(
            &[
                (0, Check::JingtumAddress),
                (1, Check::MoacAddress),
                (2, Check::Amount),
                (3, Check::Hash),
                (4, Check::MoacSecret),
            ],
            &[jt_address, token, amount, hash, secret],
        )?;

        let value = parse_amount(amount, decimals)?;
        let hash_bytes = hex::decode(&hash[2..])
            .map_err(|_| MoacError::InvalidHash(hash.to_string()))?;
        let args = [
            Token::String(jt_address.to_string()),
            address_token(token)?,
            Token::Uint(value),
            Token::FixedBytes(hash_bytes),
        ];

        let calldata = self.encode("depositToken", &args).await?;
        self.moac
            .send_transaction_with_call_data(secret, &self.contract.address, "0", Some(&calldata), options)
            .await
    }

    /// Recover the Jingtum address from `deposit` call-data.
    /// Input for any other function yields the empty result.
    pub fn parse_deposit_input(input: &str) -> DepositInput {
        let jingtum_address = decode_call("deposit", input)
            .and_then(|values| string_at(&values, 0).ok())
            .unwrap_or_default();
        DepositInput { jingtum_address }
    }

    /// Recover the parameters of `depositToken` call-data, empty on a selector mismatch
    pub fn parse_deposit_token_input(input: &str) -> DepositTokenInput {
        decode_call("depositToken", input)
            .and_then(|values| {
                let hash = match values.get(3) {
                    Some(Token::FixedBytes(bytes)) => format!("0x{}", hex::encode(bytes)),
                    _ => return None,
                };
                Some(DepositTokenInput {
                    jingtum_address: string_at(&values, 0).ok()?,
                    token: address_at(&values, 1).ok()?,
                    amount: uint_at(&values, 2).ok()?,
                    hash,
                })
            })
            .unwrap_or_default()
    }

    async fn encode(&self, name: &str, args: &[Token]) -> MoacResult<String> {
        self.moac
            .call_contract(&self.contract, name, args)
            .await?
            .into_call_data()
    }
}

/// Decode `input` as a call to the Fingate function `name`
fn decode_call(name: &str, input: &str) -> Option<Vec<Token>> {
    let function = FINGATE_ABI.function(name).ok()?;
    let data = hex::decode(input.strip_prefix("0x").unwrap_or(input)).ok()?;
    if data.len() < 4 || data[..4] != function.short_signature()[..] {
        return None;
    }
    function.decode_input(&data[4..]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MockNodeRpc, PendingPoolSnapshot};
    use ethers::abi::encode;
    use ethers::types::Bytes;
    use ethers::utils::rlp::Rlp;
    use std::sync::Mutex;

    const SECRET: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const FINGATE: &str = "0x66c9b619215db959ec137ede6b96f3fa6fd35a87";
    const TOKEN: &str = "0x4c0fbe1bb46612915e7967d2c3213cd4d87257ad";
    const USER: &str = "9bd4810a407812042f938d2f69f673843301cfa6";
    const JT_ADDRESS: &str = "jG9ntUTuBKqDURPUqbGYZRuRDVzPY6bpxL";

    fn fingate(node: MockNodeRpc) -> Fingate {
        Fingate::new(Arc::new(Moac::new(Arc::new(node), true)), FINGATE).unwrap()
    }

    fn state_output(amount: u64, jt: &str, time: u64) -> Bytes {
        Bytes::from(encode(&[
            Token::Uint(U256::from(amount)),
            Token::String(jt.to_string()),
            Token::Uint(U256::from(time)),
        ]))
    }

    /// Node accepting one submission, keeping (value, call-data) of the signed transaction
    fn submitting_node(sent: Arc<Mutex<(U256, Vec<u8>)>>) -> MockNodeRpc {
        let mut node = MockNodeRpc::new();
        node.expect_gas_price()
            .returning(|| Ok(U256::from(20_000_000_000u64)));
        node.expect_get_transaction_count().returning(|_| Ok(0));
        node.expect_txpool_content()
            .returning(|| Ok(PendingPoolSnapshot::default()));
        node.expect_send_raw_transaction()
            .times(1)
            .returning(move |signed| {
                let raw = hex::decode(&signed[2..]).unwrap();
                let rlp = Rlp::new(&raw);
                *sent.lock().unwrap() = (rlp.val_at(5).unwrap(), rlp.val_at(6).unwrap());
                Ok("0xHASH".to_string())
            });
        node
    }

    #[test]
    fn test_is_pending() {
        let state = |amount: u64, jt: &str| DepositState {
            amount: U256::from(amount),
            jingtum_address: jt.to_string(),
            time: U256::one(),
        };
        assert!(state(1, "").is_pending());
        assert!(state(0, "1").is_pending());
        assert!(!state(0, "").is_pending());
    }

    #[tokio::test]
    async fn test_deposit_state_defaults_to_native_token() {
        let expected = format!("0x98e0b39a{:0>64}{:0>64}", "", USER);
        let mut node = MockNodeRpc::new();
        node.expect_call()
            .withf(move |to, data| to == FINGATE && data == expected)
            .times(1)
            .returning(|_, _| Ok(state_output(0, "", 0)));

        let state = fingate(node).deposit_state(USER, None).await.unwrap();
        assert_eq!(
            state,
            DepositState {
                amount: U256::zero(),
                jingtum_address: String::new(),
                time: U256::zero(),
            }
        );
        assert!(!state.is_pending());
    }

    #[tokio::test]
    async fn test_deposit_state_for_token() {
        let expected = format!("0x98e0b39a{:0>64}{:0>64}", &TOKEN[2..], USER);
        let mut node = MockNodeRpc::new();
        node.expect_call()
            .withf(move |_, data| data == expected)
            .returning(|_, _| Ok(state_output(5, JT_ADDRESS, 1_600_000_000)));

        let state = fingate(node).deposit_state(USER, Some(TOKEN)).await.unwrap();
        assert_eq!(state.amount, U256::from(5u64));
        assert_eq!(state.jingtum_address, JT_ADDRESS);
        assert!(state.is_pending());
    }

    #[tokio::test]
    async fn test_deposit_state_guards_and_errors() {
        let client = fingate(MockNodeRpc::new());
        let err = client.deposit_state(&USER[1..], None).await.unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid moac address.", &USER[1..]));
        let err = client.deposit_state(USER, Some(&TOKEN[1..])).await.unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid moac address.", &TOKEN[1..]));

        let mut node = MockNodeRpc::new();
        node.expect_call()
            .returning(|_, _| Err(MoacError::Rpc("get errror".to_string())));
        let err = fingate(node).deposit_state(USER, None).await.unwrap_err();
        assert_eq!(err.to_string(), "get errror");
    }

    #[tokio::test]
    async fn test_deposit_is_payable() {
        let sent = Arc::new(Mutex::new((U256::zero(), Vec::new())));
        let client = fingate(submitting_node(sent.clone()));

        let hash = client
            .deposit(JT_ADDRESS, "1.5", SECRET, &TransactionOptions::default())
            .await
            .unwrap();
        assert_eq!(hash, "0xHASH");

        let (value, data) = sent.lock().unwrap().clone();
        assert_eq!(value, U256::from(15u64) * U256::exp10(17));
        assert_eq!(&data[..4], &[0xa2, 0x6e, 0x11, 0x86]);
        let decoded = client.contract().abi.function("deposit").unwrap().decode_input(&data[4..]).unwrap();
        assert_eq!(decoded, vec![Token::String(JT_ADDRESS.to_string())]);
    }

    #[tokio::test]
    async fn test_deposit_guards() {
        let client = fingate(MockNodeRpc::new());
        let options = TransactionOptions::default();

        let err = client.deposit(&JT_ADDRESS[1..], "1", SECRET, &options).await.unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid jingtum address.", &JT_ADDRESS[1..]));

        let err = client.deposit(JT_ADDRESS, "-1", SECRET, &options).await.unwrap_err();
        assert_eq!(err.to_string(), "-1 is invalid amount.");

        let err = client.deposit(JT_ADDRESS, "1", &SECRET[1..], &options).await.unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid moac secret.", &SECRET[1..]));
    }

    #[tokio::test]
    async fn test_deposit_nonce_error() {
        let mut node = MockNodeRpc::new();
        node.expect_get_transaction_count()
            .returning(|_| Err(MoacError::Rpc("request nonce in error".to_string())));
        let err = fingate(node)
            .deposit(JT_ADDRESS, "1", SECRET, &TransactionOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "request nonce in error");
    }

    #[tokio::test]
    async fn test_deposit_token_encodes_scaled_amount() {
        let sent = Arc::new(Mutex::new((U256::zero(), Vec::new())));
        let client = fingate(submitting_node(sent.clone()));
        let hash = format!("0x{}", "ab".repeat(32));

        client
            .deposit_token(JT_ADDRESS, TOKEN, 18, "2", &hash, SECRET, &TransactionOptions::default())
            .await
            .unwrap();

        let (value, data) = sent.lock().unwrap().clone();
        assert!(value.is_zero());
        assert_eq!(&data[..4], &[0xcc, 0x2c, 0x51, 0x64]);
        let decoded = client
            .contract()
            .abi
            .function("depositToken")
            .unwrap()
            .decode_input(&data[4..])
            .unwrap();
        assert_eq!(decoded[1], Token::Address(TOKEN.parse().unwrap()));
        assert_eq!(decoded[2], Token::Uint(U256::from(2u64) * U256::exp10(18)));
        assert_eq!(decoded[3], Token::FixedBytes(vec![0xab; 32]));
    }

    #[test]
    fn test_parse_deposit_input() {
        let data = FINGATE_ABI
            .function("deposit")
            .unwrap()
            .encode_input(&[Token::String(JT_ADDRESS.to_string())])
            .unwrap();
        let input = format!("0x{}", hex::encode(&data));
        assert_eq!(
            Fingate::parse_deposit_input(&input),
            DepositInput {
                jingtum_address: JT_ADDRESS.to_string()
            }
        );

        // transfer(address,uint256) selector
        let other = format!("0xa9059cbb{}", &input[10..]);
        assert_eq!(Fingate::parse_deposit_input(&other), DepositInput::default());
        assert_eq!(Fingate::parse_deposit_input("0x"), DepositInput::default());
        assert_eq!(Fingate::parse_deposit_input(&input[..20]), DepositInput::default());
    }

    #[tokio::test]
    async fn test_parse_deposit_token_input_inverts_deposit_token() {
        let sent = Arc::new(Mutex::new((U256::zero(), Vec::new())));
        let client = fingate(submitting_node(sent.clone()));
        let hash = format!("0x{}", "cd".repeat(32));
        client
            .deposit_token(JT_ADDRESS, TOKEN, 6, "12.5", &hash, SECRET, &TransactionOptions::default())
            .await
            .unwrap();

        let (_, data) = sent.lock().unwrap().clone();
        let parsed = Fingate::parse_deposit_token_input(&format!("0x{}", hex::encode(&data)));
        assert_eq!(
            parsed,
            DepositTokenInput {
                jingtum_address: JT_ADDRESS.to_string(),
                token: TOKEN.to_string(),
                amount: U256::from(12_500_000u64),
                hash,
            }
        );

        let deposit = format!("0xa26e1186{}", hex::encode(&data[4..]));
        assert_eq!(Fingate::parse_deposit_token_input(&deposit), DepositTokenInput::default());
    }

    #[tokio::test]
    async fn test_deposit_token_guards() {
        let client = fingate(MockNodeRpc::new());
        let options = TransactionOptions::default();
        let hash = format!("0x{}", "ab".repeat(32));

        let err = client
            .deposit_token(JT_ADDRESS, TOKEN, 18, "1", &hash[1..], SECRET, &options)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("{} is invalid hash.", &hash[1..]));

        let err = client
            .deposit_token(JT_ADDRESS, TOKEN, 18, "-1", &hash, SECRET, &options)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "-1 is invalid amount.");

        let err = client
            .deposit_token(&JT_ADDRESS[1..], TOKEN, 18, "1", &hash, SECRET, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, MoacError::InvalidJingtumAddress(_)));
    }
}
