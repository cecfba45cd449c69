//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{create_pool, deploy_contracts, fund_accounts},
    config::{DeployConfig, Network},
    constants::{
        DEFAULT_DEPENDENCY_ARTIFACTS_DIR, DEFAULT_DEPENDENCY_CONTRACTS_FILE,
        DEFAULT_EVENT_TIMEOUT_SECS, DEFAULT_OUTPUT_FILE, DEFAULT_SECRETS_FILE, PRIVATE_KEY_ENV,
    },
    deploy::PlanKind,
    errors::ScriptError,
    liquidity::PoolPolicy,
};

/// Scripts for deploying the Hands contracts & bootstrapping their liquidity
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer, falls back to the secrets file
    #[arg(short, long, env = PRIVATE_KEY_ENV, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Target network
    #[arg(short, long, value_enum, default_value_t = Network::Local)]
    pub network: Network,

    /// Network RPC URL, defaults to the one of the target network
    #[arg(short, long)]
    pub rpc_url: Option<String>,

    /// Secrets file holding the deployer keys
    #[arg(long, default_value = DEFAULT_SECRETS_FILE)]
    pub secrets_file: PathBuf,

    /// Compiled artifacts of the Hands contracts, defaults to the build of the target network
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Compiled artifacts of the SyncSwap contracts
    #[arg(long, default_value = DEFAULT_DEPENDENCY_ARTIFACTS_DIR)]
    pub dependency_artifacts_dir: PathBuf,

    /// Addresses of the SyncSwap contracts
    #[arg(long, default_value = DEFAULT_DEPENDENCY_CONTRACTS_FILE)]
    pub dependency_contracts: PathBuf,

    /// Output manifest
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Seconds to wait for an awaited event
    #[arg(long, default_value_t = DEFAULT_EVENT_TIMEOUT_SECS)]
    pub event_timeout_secs: u64,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The possible CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the contracts of a plan & write the manifest
    DeployContracts(DeployContractsArgs),
    /// Create the HandsToken / wETH pool of an existing deployment
    CreatePool(CreatePoolArgs),
    /// Send ETH and HandsToken to some test accounts
    FundAccounts(FundAccountsArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self, config: &DeployConfig) -> Result<(), ScriptError> {
        match self {
            Command::DeployContracts(args) => {
                info!("Deploying contracts...");
                deploy_contracts(args, config).await
            }
            Command::CreatePool(args) => {
                info!("Creating pool...");
                create_pool(args, config).await
            }
            Command::FundAccounts(args) => {
                info!("Funding accounts...");
                fund_accounts(args, config).await
            }
        }
    }
}

/// Deploy contracts
#[derive(Args)]
pub struct DeployContractsArgs {
    /// Which contracts to deploy
    #[arg(long, value_enum, default_value_t = PlanKind::Full)]
    pub plan: PlanKind,

    /// Point the affiliate & staking contracts at the bank once it is deployed
    #[arg(long)]
    pub wire_bank: bool,

    /// Create the HandsToken / wETH pool after the deployment
    #[arg(long)]
    pub with_pool: bool,

    /// What a missing `PoolCreated` event means
    #[arg(long, value_enum, default_value_t = PoolPolicy::Required)]
    pub pool: PoolPolicy,
}

/// Create the pool
#[derive(Args)]
pub struct CreatePoolArgs {
    /// What a missing `PoolCreated` event means
    #[arg(long, value_enum, default_value_t = PoolPolicy::Required)]
    pub pool: PoolPolicy,
}

/// Fund test accounts
#[derive(Args)]
pub struct FundAccountsArgs {
    /// Accounts to fund
    #[arg(long, required = true, num_args = 1..)]
    pub receiver: Vec<Address>,

    /// ETH sent to each account
    #[arg(long, default_value = "1")]
    pub eth: String,

    /// HandsToken sent to each account, in whole tokens
    #[arg(long, default_value = "100")]
    pub tokens: String,
}
