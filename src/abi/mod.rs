//! ABI dispatcher
//!
//! A function call is routed by the mutability of its ABI entry alone:
//! `view` and `pure` functions are executed with `mc_call` and their outputs
//! decoded, everything else is encoded into call-data for a transaction and
//! the node is not contacted.

use crate::chain::NodeRpc;
use crate::error::{MoacError, MoacResult};
use crate::metrics;
use crate::validator::{validate, Check};
use crate::wallet::prefix_0x;

use ethers::abi::token::{LenientTokenizer, Tokenizer};
use ethers::abi::{Abi, Function, ParamType, StateMutability, Token};
use ethers::types::U256;
use lazy_static::lazy_static;
use tracing::debug;

lazy_static! {
    pub static ref ERC20_ABI: Abi = serde_json::from_str(include_str!("erc20.json")).unwrap();
    pub static ref ERC721_ABI: Abi = serde_json::from_str(include_str!("erc721.json")).unwrap();
    pub static ref FINGATE_ABI: Abi = serde_json::from_str(include_str!("fingate.json")).unwrap();
}

/// A deployed contract: its address and interface
#[derive(Debug, Clone)]
pub struct Contract {
    pub address: String,
    pub abi: Abi,
}

/// Outcome of a dispatched call
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Decoded outputs of a read
    Value(Vec<Token>),
    /// `0x`-prefixed call-data for a state-mutating transaction
    CallData(String),
}

impl Dispatch {
    pub fn into_values(self) -> MoacResult<Vec<Token>> {
        match self {
            Dispatch::Value(values) => Ok(values),
            Dispatch::CallData(_) => Err(MoacError::Abi(
                "expected a read but the function mutates state".to_string(),
            )),
        }
    }

    pub fn into_call_data(self) -> MoacResult<String> {
        match self {
            Dispatch::CallData(data) => Ok(data),
            Dispatch::Value(_) => Err(MoacError::Abi(
                "expected call-data but the function is read-only".to_string(),
            )),
        }
    }
}

impl Contract {
    /// Bind `abi` to the contract at `address`
    pub fn new(address: &str, abi: Abi) -> MoacResult<Self> {
        validate(&[(0, Check::MoacAddress)], &[address])?;
        Ok(Self {
            address: prefix_0x(address),
            abi,
        })
    }

    /// Bind a JSON ABI definition to the contract at `address`
    pub fn from_json(address: &str, json: &str) -> MoacResult<Self> {
        let abi: Abi = serde_json::from_str(json).map_err(|e| MoacError::Abi(e.to_string()))?;
        Self::new(address, abi)
    }

    pub fn erc20(address: &str) -> MoacResult<Self> {
        Self::new(address, ERC20_ABI.clone())
    }

    pub fn erc721(address: &str) -> MoacResult<Self> {
        Self::new(address, ERC721_ABI.clone())
    }

    pub fn fingate(address: &str) -> MoacResult<Self> {
        Self::new(address, FINGATE_ABI.clone())
    }

    /// Overload of `name` whose inputs accept `args`
    pub fn function(&self, name: &str, args: &[Token]) -> MoacResult<&Function> {
        self.overloads(name, args.len())
            .find(|f| {
                f.inputs
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| arg.type_check(&param.kind))
            })
            .ok_or_else(|| MoacError::FunctionNotFound {
                name: name.to_string(),
                arity: args.len(),
            })
    }

    /// Encode a call to `name` regardless of its mutability
    pub fn encode(&self, name: &str, args: &[Token]) -> MoacResult<String> {
        let function = self.function(name, args)?;
        encode_call(function, args)
    }

    fn overloads(&self, name: &str, arity: usize) -> impl Iterator<Item = &Function> + '_ {
        self.abi
            .functions
            .get(name)
            .into_iter()
            .flatten()
            .filter(move |f| f.inputs.len() == arity)
    }
}

/// Call `name` on `contract`, reading through the node for view/pure
/// functions and returning call-data otherwise
pub async fn dispatch(
    node: &dyn NodeRpc,
    contract: &Contract,
    name: &str,
    args: &[Token],
) -> MoacResult<Dispatch> {
    let function = contract.function(name, args)?;
    let data = encode_call(function, args)?;

    match function.state_mutability {
        StateMutability::View | StateMutability::Pure => {
            debug!("Calling {}.{} via mc_call", contract.address, name);
            metrics::record_dispatch("call");
            let output = node.call(&contract.address, &data).await?;
            let values = function
                .decode_output(&output)
                .map_err(|e| MoacError::Decode(format!("{} output: {}", name, e)))?;
            Ok(Dispatch::Value(values))
        }
        StateMutability::NonPayable | StateMutability::Payable => {
            debug!("Encoded call-data for {}.{}", contract.address, name);
            metrics::record_dispatch("encode");
            Ok(Dispatch::CallData(data))
        }
    }
}

/// Convert textual arguments into tokens for the overload of `name` taking
/// `args.len()` inputs
pub fn tokenize(contract: &Contract, name: &str, args: &[&str]) -> MoacResult<Vec<Token>> {
    let mut last_error = None;
    for function in contract.overloads(name, args.len()) {
        let tokens: MoacResult<Vec<Token>> = function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| tokenize_arg(&param.kind, arg))
            .collect();
        match tokens {
            Ok(tokens) => return Ok(tokens),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| MoacError::FunctionNotFound {
        name: name.to_string(),
        arity: args.len(),
    }))
}

fn tokenize_arg(kind: &ParamType, arg: &str) -> MoacResult<Token> {
    let value = match kind {
        ParamType::Address | ParamType::Bytes | ParamType::FixedBytes(_) => {
            arg.strip_prefix("0x").unwrap_or(arg)
        }
        _ => arg,
    };
    LenientTokenizer::tokenize(kind, value)
        .map_err(|e| MoacError::Abi(format!("cannot parse {} as {}: {}", arg, kind, e)))
}

fn encode_call(function: &Function, args: &[Token]) -> MoacResult<String> {
    let data = function
        .encode_input(args)
        .map_err(|e| MoacError::Abi(format!("{}: {}", function.name, e)))?;
    Ok(format!("0x{}", hex::encode(data)))
}

// Output extraction

pub fn uint_at(values: &[Token], index: usize) -> MoacResult<U256> {
    match values.get(index) {
        Some(Token::Uint(value)) | Some(Token::Int(value)) => Ok(*value),
        other => Err(unexpected("uint", index, other)),
    }
}

pub fn string_at(values: &[Token], index: usize) -> MoacResult<String> {
    match values.get(index) {
        Some(Token::String(value)) => Ok(value.clone()),
        other => Err(unexpected("string", index, other)),
    }
}

/// `0x`-prefixed lowercase address
pub fn address_at(values: &[Token], index: usize) -> MoacResult<String> {
    match values.get(index) {
        Some(Token::Address(value)) => Ok(format!("{:#x}", value)),
        other => Err(unexpected("address", index, other)),
    }
}

pub fn bool_at(values: &[Token], index: usize) -> MoacResult<bool> {
    match values.get(index) {
        Some(Token::Bool(value)) => Ok(*value),
        other => Err(unexpected("bool", index, other)),
    }
}

/// Human readable rendering of a decoded output
pub fn render(token: &Token) -> String {
    match token {
        Token::Address(address) => format!("{:#x}", address),
        Token::Uint(value) | Token::Int(value) => value.to_string(),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => format!("0x{}", hex::encode(bytes)),
        Token::Array(items) | Token::FixedArray(items) | Token::Tuple(items) => {
            let items: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

fn unexpected(kind: &str, index: usize, found: Option<&Token>) -> MoacError {
    MoacError::Decode(format!("expected {} output at {}, found {:?}", kind, index, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockNodeRpc;
    use ethers::abi::encode;
    use ethers::types::{Address, Bytes};

    const TOKEN: &str = "0x4c0fbe1bb46612915e7967d2c3213cd4d87257ad";
    const OWNER: &str = "0x9bd4810a407812042f938d2f69f673843301cfa6";

    fn owner() -> Token {
        Token::Address(OWNER.parse::<Address>().unwrap())
    }

    #[test]
    fn test_static_abis_parse() {
        assert_eq!(ERC20_ABI.functions_by_name("transfer").unwrap().len(), 1);
        assert_eq!(ERC721_ABI.functions_by_name("safeTransferFrom").unwrap().len(), 2);
        assert!(FINGATE_ABI.function("depositState").is_ok());
    }

    #[tokio::test]
    async fn test_view_function_reads_through_node() {
        let expected_data = format!("0x70a08231{:0>64}", &OWNER[2..]);
        let mut node = MockNodeRpc::new();
        node.expect_call()
            .withf(move |to, data| to == TOKEN && data == expected_data)
            .times(1)
            .returning(|_, _| Ok(Bytes::from(encode(&[Token::Uint(U256::from(1000u64))]))));

        let contract = Contract::erc20(TOKEN).unwrap();
        let result = dispatch(&node, &contract, "balanceOf", &[owner()]).await.unwrap();
        assert_eq!(result, Dispatch::Value(vec![Token::Uint(U256::from(1000u64))]));
    }

    #[tokio::test]
    async fn test_mutating_function_returns_call_data() {
        let node = MockNodeRpc::new();
        let contract = Contract::erc20(TOKEN).unwrap();
        let result = dispatch(
            &node,
            &contract,
            "transfer",
            &[owner(), Token::Uint(U256::from(5u64))],
        )
        .await
        .unwrap();

        let data = result.into_call_data().unwrap();
        assert!(data.starts_with("0xa9059cbb"));
        assert_eq!(data.len(), 2 + 8 + 64 * 2);
        assert!(data.ends_with("05"));
    }

    #[tokio::test]
    async fn test_routing_follows_mutability_only() {
        let json = r#"[{"type":"function","name":"balanceOf","stateMutability":"nonpayable",
            "inputs":[{"name":"_owner","type":"address"}],
            "outputs":[{"name":"","type":"uint256"}]}]"#;
        let node = MockNodeRpc::new();
        let contract = Contract::from_json(TOKEN, json).unwrap();
        let result = dispatch(&node, &contract, "balanceOf", &[owner()]).await.unwrap();
        assert!(matches!(result, Dispatch::CallData(data) if data.starts_with("0x70a08231")));
    }

    #[tokio::test]
    async fn test_overload_selected_by_arity() {
        let node = MockNodeRpc::new();
        let contract = Contract::erc721(TOKEN).unwrap();
        let base = [owner(), owner(), Token::Uint(U256::one())];

        let three = dispatch(&node, &contract, "safeTransferFrom", &base)
            .await
            .unwrap()
            .into_call_data()
            .unwrap();
        let mut with_data = base.to_vec();
        with_data.push(Token::Bytes(vec![0xaa]));
        let four = dispatch(&node, &contract, "safeTransferFrom", &with_data)
            .await
            .unwrap()
            .into_call_data()
            .unwrap();

        assert!(three.starts_with("0x42842e0e"));
        assert!(four.starts_with("0xb88d4fde"));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let node = MockNodeRpc::new();
        let contract = Contract::erc20(TOKEN).unwrap();
        let err = dispatch(&node, &contract, "mint", &[]).await.unwrap_err();
        assert_eq!(
            err,
            MoacError::FunctionNotFound {
                name: "mint".to_string(),
                arity: 0
            }
        );

        let err = dispatch(&node, &contract, "balanceOf", &[Token::Bool(true)])
            .await
            .unwrap_err();
        assert!(matches!(err, MoacError::FunctionNotFound { arity: 1, .. }));
    }

    #[test]
    fn test_contract_address_is_validated() {
        let err = Contract::erc20(&TOKEN[1..]).unwrap_err();
        assert_eq!(err, MoacError::InvalidAddress(TOKEN[1..].to_string()));
        assert_eq!(Contract::erc20(&TOKEN[2..]).unwrap().address, TOKEN);
    }

    #[test]
    fn test_tokenize_text_arguments() {
        let contract = Contract::erc20(TOKEN).unwrap();
        let tokens = tokenize(&contract, "transfer", &[OWNER, "1000"]).unwrap();
        assert_eq!(tokens, vec![owner(), Token::Uint(U256::from(1000u64))]);

        let fingate = Contract::fingate(TOKEN).unwrap();
        let hash = format!("0x{}", "ab".repeat(32));
        let tokens = tokenize(
            &fingate,
            "depositToken",
            &["jG9ntUTuBKqDURPUqbGYZRuRDVzPY6bpxL", TOKEN, "1", &hash],
        )
        .unwrap();
        assert_eq!(tokens[3], Token::FixedBytes(vec![0xab; 32]));

        assert!(tokenize(&contract, "transfer", &[OWNER, "not a number"]).is_err());
        assert!(matches!(
            tokenize(&contract, "transfer", &[OWNER]),
            Err(MoacError::FunctionNotFound { arity: 1, .. })
        ));
    }

    #[test]
    fn test_output_helpers() {
        let values = vec![
            Token::Uint(U256::from(7u64)),
            Token::String("jabc".to_string()),
            owner(),
            Token::Bool(true),
        ];
        assert_eq!(uint_at(&values, 0).unwrap(), U256::from(7u64));
        assert_eq!(string_at(&values, 1).unwrap(), "jabc");
        assert_eq!(address_at(&values, 2).unwrap(), OWNER);
        assert!(bool_at(&values, 3).unwrap());
        assert!(uint_at(&values, 1).is_err());
        assert!(string_at(&values, 9).is_err());
        assert_eq!(render(&values[2]), OWNER);
        assert_eq!(render(&values[0]), "7");
    }
}
