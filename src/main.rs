//! MOAC toolkit CLI - query a MOAC node, transfer MOAC and tokens, and
//! drive Fingate deposits from the command line.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers::types::U256;
use moac_toolkit::abi::{self, Contract, Dispatch};
use moac_toolkit::{metrics, wallet, Erc20, Fingate, Moac, Settings, TransactionOptions};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "moac-toolkit", version, about = "Transaction toolkit for MOAC nodes")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "MOAC_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// Print collected metrics after the command
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// MOAC balance of an address
    Balance { address: String },
    /// Next usable nonce of an address
    Nonce { address: String },
    /// Current gas price in sha
    GasPrice {
        #[arg(long)]
        floor: Option<u64>,
    },
    /// Transfer MOAC from the configured wallet
    Transfer {
        to: String,
        amount: String,
        #[arg(long)]
        memo: Option<String>,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Transaction by hash
    Tx { hash: String },
    /// Transaction receipt by hash
    Receipt { hash: String },
    /// Block by number, hash or tag
    Block {
        #[arg(default_value = "latest")]
        id: String,
    },
    /// Generate a new key pair
    CreateWallet,
    /// ERC20 balance; the token is a configured symbol or an address
    Erc20Balance { token: String, address: String },
    /// Transfer ERC20 tokens from the configured wallet
    Erc20Transfer {
        token: String,
        to: String,
        amount: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Fingate deposit state of an address
    DepositState {
        address: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Deposit MOAC to a Jingtum address through Fingate
    Deposit {
        jingtum_address: String,
        amount: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Decode Fingate deposit call-data
    ParseDeposit { input: String },
    /// Call any contract function through its JSON ABI
    Call {
        address: String,
        abi: PathBuf,
        function: String,
        args: Vec<String>,
        /// Submit the call-data of a state-mutating function
        #[arg(long)]
        send: bool,
        /// MOAC attached to a submitted call
        #[arg(long, default_value = "0")]
        value: String,
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct OptionArgs {
    #[arg(long)]
    nonce: Option<u64>,
    /// Gas price in sha
    #[arg(long)]
    gas_price: Option<u64>,
    #[arg(long)]
    gas_limit: Option<u64>,
}

impl From<&OptionArgs> for TransactionOptions {
    fn from(args: &OptionArgs) -> Self {
        TransactionOptions {
            gas_limit: args.gas_limit.map(U256::from),
            gas_price: args.gas_price.map(U256::from),
            nonce: args.nonce,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    let cli = Cli::parse();

    // Key generation and call-data decoding need no node
    match &cli.command {
        Command::CreateWallet => return print_new_wallet(),
        Command::ParseDeposit { input } => return print_deposit_input(input),
        _ => {}
    }

    // Load configuration
    let settings = Settings::load_from(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let moac = Arc::new(Moac::connect(&settings)?);
    run(cli.command, &settings, moac).await?;

    if cli.metrics {
        print!("{}", metrics::gather_text());
    }
    Ok(())
}

async fn run(command: Command, settings: &Settings, moac: Arc<Moac>) -> Result<()> {
    match command {
        Command::Balance { address } => {
            println!("{}", moac.get_balance(&address).await);
        }
        Command::Nonce { address } => {
            println!("{}", moac.get_nonce(&address).await?);
        }
        Command::GasPrice { floor } => {
            println!("{}", moac.get_gas_price(floor.map(U256::from)).await);
        }
        Command::Transfer {
            to,
            amount,
            memo,
            options,
        } => {
            let secret = settings.secret()?;
            let hash = moac
                .transfer_moac(&secret, &to, &amount, memo.as_deref(), &(&options).into())
                .await?;
            println!("{}", hash);
        }
        Command::Tx { hash } => {
            let tx = moac.get_transaction(&hash).await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Command::Receipt { hash } => {
            let receipt = moac.get_transaction_receipt(&hash).await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        Command::Block { id } => {
            let block = moac.get_block(&id).await;
            println!("{}", serde_json::to_string_pretty(&block)?);
        }
        Command::CreateWallet => print_new_wallet()?,
        Command::ParseDeposit { input } => print_deposit_input(&input)?,
        Command::Erc20Balance { token, address } => {
            let erc20 = Erc20::new(moac, resolve_token(settings, &token)?)?;
            println!("{}", erc20.balance_of(&address).await);
        }
        Command::Erc20Transfer {
            token,
            to,
            amount,
            options,
        } => {
            let secret = settings.secret()?;
            let erc20 = Erc20::new(moac, resolve_token(settings, &token)?)?;
            let hash = erc20.transfer(&secret, &to, &amount, &(&options).into()).await?;
            println!("{}", hash);
        }
        Command::DepositState { address, token } => {
            let fingate = Fingate::new(moac, fingate_address(settings)?)?;
            let state = fingate.deposit_state(&address, token.as_deref()).await?;
            let output = json!({
                "amount": state.amount.to_string(),
                "jingtumAddress": state.jingtum_address,
                "time": state.time.to_string(),
                "pending": state.is_pending(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Deposit {
            jingtum_address,
            amount,
            options,
        } => {
            let secret = settings.secret()?;
            let fingate = Fingate::new(moac, fingate_address(settings)?)?;
            let hash = fingate
                .deposit(&jingtum_address, &amount, &secret, &(&options).into())
                .await?;
            println!("{}", hash);
        }
        Command::Call {
            address,
            abi: abi_path,
            function,
            args,
            send,
            value,
            options,
        } => {
            let abi_json = std::fs::read_to_string(&abi_path)
                .with_context(|| format!("Failed to read ABI file: {:?}", abi_path))?;
            let contract = Contract::from_json(&address, &abi_json)?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let tokens = abi::tokenize(&contract, &function, &args)?;

            match moac.call_contract(&contract, &function, &tokens).await? {
                Dispatch::Value(values) => {
                    for value in &values {
                        println!("{}", abi::render(value));
                    }
                }
                Dispatch::CallData(data) if send => {
                    let secret = settings.secret()?;
                    let hash = moac
                        .send_transaction_with_call_data(
                            &secret,
                            &contract.address,
                            &value,
                            Some(&data),
                            &(&options).into(),
                        )
                        .await?;
                    println!("{}", hash);
                }
                Dispatch::CallData(data) => println!("{}", data),
            }
        }
    }
    Ok(())
}

fn print_new_wallet() -> Result<()> {
    let created = wallet::create_wallet();
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

fn print_deposit_input(input: &str) -> Result<()> {
    let output = match input.get(..10) {
        Some("0xcc2c5164") => serde_json::to_value(Fingate::parse_deposit_token_input(input))?,
        _ => serde_json::to_value(Fingate::parse_deposit_input(input))?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn resolve_token<'a>(settings: &'a Settings, token: &'a str) -> Result<&'a str> {
    if wallet::is_valid_address(token) {
        return Ok(token);
    }
    settings
        .token_address(token)
        .ok_or_else(|| anyhow!("Token {} is neither an address nor a configured symbol", token))
}

fn fingate_address(settings: &Settings) -> Result<&str> {
    settings
        .contracts
        .fingate
        .as_deref()
        .ok_or_else(|| anyhow!("No Fingate address configured under [contracts]"))
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,moac_toolkit=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
