//! Ballot deployer and client
//!
//! A command-line interface for deploying the ballot contract and voting on it.

use clap::{Args, Parser, Subcommand};
use ethers::types::Address;
use std::path::PathBuf;
use std::time::Duration;
use voting_dapp::cli;
use voting_dapp::client::{CandidateRegistry, ClientConfig};
use voting_dapp::deploy::{DeployConfig, DEFAULT_ENDPOINT, DEFAULT_GAS_LIMIT};
use voting_dapp::storage::DEFAULT_DESCRIPTOR_PATH;

#[derive(Parser)]
#[command(name = "voting")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Deploy a Solidity ballot to a local Ethereum node and vote on it", long_about = None)]
struct Cli {
    /// RPC endpoint of the Ethereum node
    #[arg(short, long, global = true, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Deployment descriptor file
    #[arg(short, long, global = true, default_value = DEFAULT_DESCRIPTOR_PATH)]
    descriptor: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the node's unlocked accounts
    Accounts,

    /// Compile a contract and print its ABI
    Compile {
        /// Solidity source file
        #[arg(short, long, default_value = "contracts/Voting.sol")]
        file: PathBuf,

        /// Contract name inside the source
        #[arg(short, long, default_value = "Voting")]
        contract: String,

        /// Path to the solc binary
        #[arg(long)]
        solc: Option<PathBuf>,
    },

    /// Compile, deploy and write the descriptor
    Deploy {
        /// Solidity source file
        #[arg(short, long, default_value = "contracts/Voting.sol")]
        file: PathBuf,

        /// Contract name inside the source
        #[arg(short, long, default_value = "Voting")]
        contract: String,

        /// Path to the solc binary
        #[arg(long)]
        solc: Option<PathBuf>,

        /// Index of the signing account
        #[arg(short, long, default_value = "0")]
        account: usize,

        /// Gas limit for the creation transaction
        #[arg(short, long, default_value_t = DEFAULT_GAS_LIMIT)]
        gas: u64,

        /// Constructor arguments (candidate names)
        #[arg(long = "arg", num_args = 1.., default_values_t = ["==".to_string(), "= =".to_string()])]
        args: Vec<String>,

        /// Seconds to wait for the transaction to be mined
        #[arg(long, default_value = "120")]
        timeout_secs: u64,
    },

    /// Show every candidate's tally
    Tally {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Vote for a candidate
    Vote {
        /// Candidate identifier, matched exactly
        #[arg(short, long)]
        candidate: String,

        /// Sender address (defaults to the configured account index)
        #[arg(long)]
        from: Option<String>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Serve the ballot page
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Args)]
struct ClientArgs {
    /// Candidate to display location, as `<candidate>:<location>` (repeatable)
    #[arg(long = "slot")]
    slots: Vec<String>,

    /// Index of the signing account
    #[arg(short, long, default_value = "0")]
    account: usize,

    /// Gas limit for vote transactions
    #[arg(short, long, default_value_t = DEFAULT_GAS_LIMIT)]
    gas: u64,

    /// Seconds to wait for a call or vote to complete
    #[arg(long, default_value = "60")]
    timeout_secs: u64,
}

impl ClientArgs {
    fn into_config(
        self,
        endpoint: String,
        descriptor_path: PathBuf,
    ) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let registry = if self.slots.is_empty() {
            CandidateRegistry::default()
        } else {
            CandidateRegistry::parse_entries(&self.slots)?
        };
        Ok(ClientConfig {
            endpoint,
            descriptor_path,
            sender_index: self.account,
            gas_limit: self.gas,
            call_timeout: Duration::from_secs(self.timeout_secs),
            registry,
            ..Default::default()
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        match cli.command {
            Commands::Accounts => cli::cmd_accounts(&cli.endpoint).await,

            Commands::Compile {
                file,
                contract,
                solc,
            } => cli::cmd_compile(&file, &contract, solc.as_deref()).await,

            Commands::Deploy {
                file,
                contract,
                solc,
                account,
                gas,
                args,
                timeout_secs,
            } => {
                let config = DeployConfig {
                    endpoint: cli.endpoint,
                    sender_index: account,
                    gas_limit: gas,
                    constructor_args: args,
                    contract_name: contract,
                    descriptor_path: cli.descriptor,
                    mining_timeout: Duration::from_secs(timeout_secs),
                    ..Default::default()
                };
                cli::cmd_deploy(config, &file, solc.as_deref()).await
            }

            Commands::Tally { client } => {
                let config = client.into_config(cli.endpoint, cli.descriptor)?;
                cli::cmd_tally(config).await
            }

            Commands::Vote {
                candidate,
                from,
                client,
            } => {
                let config = client.into_config(cli.endpoint, cli.descriptor)?;
                let sender = match from {
                    Some(text) => Some(
                        text.parse::<Address>()
                            .map_err(|e| format!("invalid sender address {:?}: {}", text, e))?,
                    ),
                    None => None,
                };
                cli::cmd_vote(config, &candidate, sender).await
            }

            Commands::Serve { port, client } => {
                let config = client.into_config(cli.endpoint, cli.descriptor)?;
                cli::cmd_serve(config, port).await
            }
        }
    })
}
