//! The deploy, pool & funding commands

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactStore,
    cli::{CreatePoolArgs, DeployContractsArgs, FundAccountsArgs},
    config::DeployConfig,
    constants::TOKEN_CONTRACT_NAME,
    dependencies::{load_dependencies, syncswap_artifacts, DependencyManifest},
    deploy::{DeployedContracts, Deployment},
    errors::ScriptError,
    liquidity::{bootstrap_pool, PoolPolicy},
    output_writer::{read_output_file, write_output_file, OutputManifest},
    tx::{
        chain::ChainClient,
        client::create_rpc_client,
        reader::read_token_balance,
        sender::{send_eth, send_token_transfer},
    },
};

/// Deploy the contracts of the chosen plan
pub async fn deploy_contracts(
    args: DeployContractsArgs,
    config: &DeployConfig,
) -> Result<(), ScriptError> {
    let plan = args.plan.build(args.wire_bank)?;
    if args.with_pool && !plan.with_dependencies {
        return Err(ScriptError::Config(format!(
            "the {} plan has no SyncSwap dependencies to create a pool with",
            plan.name
        )));
    }

    // Everything read from disk is checked before we reach the network
    let dependencies = if plan.with_dependencies {
        load_dependencies(
            &config.dependency_contracts_file,
            &syncswap_artifacts(&config.dependency_artifacts_dir),
        )?
    } else {
        DependencyManifest::default()
    };
    let deployment = Deployment::prepare(
        plan,
        &dependencies,
        &ArtifactStore::new(&config.artifacts_dir),
    )?;

    let client = create_rpc_client(config).await?;

    let pool = args.with_pool.then_some(args.pool);
    run_deployment(&client, &deployment, &dependencies, pool, config).await?;

    Ok(())
}

/// Deploy a prepared plan, create the pool when asked to and write the manifest
pub async fn run_deployment<C: ChainClient>(
    client: &C,
    deployment: &Deployment,
    dependencies: &DependencyManifest,
    pool: Option<PoolPolicy>,
    config: &DeployConfig,
) -> Result<DeployedContracts, ScriptError> {
    let mut deployed = deployment.run(client, dependencies).await?;

    if let Some(policy) = pool {
        bootstrap_pool(
            client,
            dependencies,
            &mut deployed,
            policy,
            config.event_timeout,
        )
        .await?;
    }

    if deployment.plan().with_dependencies {
        let manifest = OutputManifest::new(dependencies, &deployed);
        write_output_file(&config.output_file, &manifest)?;
    } else {
        for contract in deployed.iter() {
            info!("{}: {}", contract.name, contract.address);
        }
    }

    Ok(deployed)
}

/// Create the pool of a previous deployment
pub async fn create_pool(args: CreatePoolArgs, config: &DeployConfig) -> Result<(), ScriptError> {
    let manifest = read_output_file(&config.output_file)?;
    let client = create_rpc_client(config).await?;

    add_pool(&client, manifest, args.pool, config).await?;

    Ok(())
}

/// Create the pool for the contracts of `manifest` and rewrite it with the pool added
pub async fn add_pool<C: ChainClient>(
    client: &C,
    manifest: OutputManifest,
    policy: PoolPolicy,
    config: &DeployConfig,
) -> Result<Option<Address>, ScriptError> {
    let dependencies = manifest.dependencies();
    let mut deployed = manifest.deployed();

    let pool = bootstrap_pool(
        client,
        &dependencies,
        &mut deployed,
        policy,
        config.event_timeout,
    )
    .await?;

    match pool {
        Some(_) => {
            write_output_file(
                &config.output_file,
                &OutputManifest::new(&dependencies, &deployed),
            )?;
        }
        None => warn!("No pool created, {} left untouched", config.output_file.display()),
    }

    Ok(pool)
}

/// Send ETH & tokens to the test accounts
pub async fn fund_accounts(
    args: FundAccountsArgs,
    config: &DeployConfig,
) -> Result<(), ScriptError> {
    let eth = parse_amount(&args.eth)?;
    let tokens = parse_amount(&args.tokens)?;

    let manifest = read_output_file(&config.output_file)?;
    let token = manifest.deployed().address(TOKEN_CONTRACT_NAME).ok_or_else(|| {
        ScriptError::UnresolvedReference(format!(
            "{TOKEN_CONTRACT_NAME} is not in {}",
            config.output_file.display()
        ))
    })?;

    let client = create_rpc_client(config).await?;
    fund(&client, token, &args.receiver, eth, tokens).await
}

/// Send `eth` wei and `tokens` of `token` to every receiver, one transfer at a time
pub async fn fund<C: ChainClient>(
    client: &C,
    token: Address,
    receivers: &[Address],
    eth: U256,
    tokens: U256,
) -> Result<(), ScriptError> {
    for receiver in receivers {
        send_eth(client, *receiver, eth).await?;
        send_token_transfer(client, token, *receiver, tokens).await?;
    }

    for receiver in receivers {
        let eth_balance = client.balance(*receiver).await?;
        let token_balance = read_token_balance(client, token, *receiver).await?;
        info!(
            "{}: {} ETH, {} {}",
            receiver,
            format_ether(eth_balance),
            format_ether(token_balance),
            TOKEN_CONTRACT_NAME
        );
    }

    Ok(())
}

/// Parse a decimal amount of 18 decimals units
fn parse_amount(amount: &str) -> Result<U256, ScriptError> {
    parse_ether(amount).map_err(|e| ScriptError::Config(format!("amount {amount}: {e}")))
}
