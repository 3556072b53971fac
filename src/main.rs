use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tokenbook::chat::ChatBoard;
use tokenbook::greeting::Greeting;
use tokenbook::runtime::{CallFailure, CallOutcome, Contract, ContractHost};
use tokenbook::storage::SledStorage;
use tokenbook::types::{AccountId, TokenConfig};
use tokenbook::Token;

#[derive(Debug, Parser)]
#[command(name = "tokenbook", about = "Token account book and event ledger over a sled store")]
struct Cli {
    /// Directory of the sled database holding contract state
    #[arg(long, default_value = "tokenbook_data")]
    db: PathBuf,

    /// Identity of the contract account
    #[arg(long, default_value = "example-token")]
    contract: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Call the token contract
    Token {
        #[command(flatten)]
        call: CallArgs,

        /// JSON token configuration, used by `customize`
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Call the chat contract
    Chat {
        #[command(flatten)]
        call: CallArgs,
    },
    /// Call the greeting contract
    Greeting {
        #[command(flatten)]
        call: CallArgs,
    },
    /// Print the SHA-256 digest of the stored state
    Digest,
}

#[derive(Debug, Args)]
struct CallArgs {
    /// Signer of the call
    #[arg(long = "as", value_name = "ACCOUNT")]
    signer: String,

    /// Method name, e.g. `transfer` or `balance_of`
    method: String,

    /// Method arguments as a JSON object
    args: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let storage = SledStorage::new(&cli.db)?;
    let host = ContractHost::new(std::sync::Arc::new(storage), cli.contract.as_str());

    let result = match cli.command {
        Command::Token { call, config } => {
            let args = token_args(&call.method, call.args.as_deref(), config.as_deref())?;
            dispatch(&host, &Token::new(), &call.signer, &call.method, args)
        }
        Command::Chat { call } => {
            let args = parse_args(call.args.as_deref())?;
            dispatch(&host, &ChatBoard::new(), &call.signer, &call.method, args)
        }
        Command::Greeting { call } => {
            let args = parse_args(call.args.as_deref())?;
            dispatch(&host, &Greeting, &call.signer, &call.method, args)
        }
        Command::Digest => {
            println!("{}", host.state_digest()?);
            return Ok(ExitCode::SUCCESS);
        }
    };
    host.storage().flush()?;

    match result {
        Ok(outcome) => {
            print_logs(&outcome.logs);
            println!("{}", serde_json::to_string_pretty(&outcome.value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            print_logs(&failure.logs);
            eprintln!("call failed: {}", failure.error);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Resolves the arguments of a token call. `--config` only feeds `customize`
/// and cannot be combined with inline args.
fn token_args(
    method: &str,
    raw: Option<&str>,
    config: Option<&Path>,
) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match config {
        None => Ok(parse_args(raw)?),
        Some(_) if method != "customize" => {
            Err(format!("--config only applies to `customize`, not `{}`", method).into())
        }
        Some(_) if raw.is_some() => {
            Err("give the token configuration either with --config or as args, not both".into())
        }
        Some(path) => {
            let config: TokenConfig = serde_json::from_slice(&std::fs::read(path)?)?;
            Ok(Some(serde_json::to_value(config)?))
        }
    }
}

fn parse_args(raw: Option<&str>) -> Result<Option<Value>, serde_json::Error> {
    raw.map(serde_json::from_str::<Value>).transpose()
}

fn dispatch<C: Contract>(
    host: &ContractHost<SledStorage>,
    contract: &C,
    signer: &str,
    method: &str,
    args: Option<Value>,
) -> Result<CallOutcome, CallFailure> {
    host.invoke_json(contract, &AccountId::new(signer), method, args)
}

fn print_logs(logs: &[String]) {
    for line in logs {
        eprintln!("log: {}", line);
    }
}
