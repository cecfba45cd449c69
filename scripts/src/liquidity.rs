//! Creation of the wETH / HandsToken pool through the SyncSwap router

use std::time::Duration;

use alloy::{
    primitives::{Address, Log},
    rpc::types::Filter,
    sol_types::SolEvent,
};
use clap::ValueEnum;
use futures::{Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    constants::{POOL_CONTRACT_NAME, TOKEN_CONTRACT_NAME},
    dependencies::DependencyManifest,
    deploy::{DeployedContract, DeployedContracts},
    errors::ScriptError,
    tx::{abi::IPoolFactory::PoolCreated, chain::ChainClient, sender::send_create_pool},
};

/// What to do when the pool address never shows up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PoolPolicy {
    /// Abort the run
    #[default]
    Required,
    /// Log a warning and leave the pool out of the manifest
    BestEffort,
}

/// The addresses involved in a pool creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolRequest {
    /// SyncSwap router
    pub router: Address,
    /// Classic pool factory, emitter of `PoolCreated`
    pub factory: Address,
    /// First token of the pair
    pub token_a: Address,
    /// Second token of the pair
    pub token_b: Address,
}

impl PoolRequest {
    /// The wETH / HandsToken classic pool
    pub fn hands_weth(
        dependencies: &DependencyManifest,
        deployed: &DeployedContracts,
    ) -> Result<Self, ScriptError> {
        let token = deployed.address(TOKEN_CONTRACT_NAME).ok_or_else(|| {
            ScriptError::UnresolvedReference(format!("{TOKEN_CONTRACT_NAME} is not deployed"))
        })?;

        Ok(PoolRequest {
            router: dependencies.require("router")?,
            factory: dependencies.require("classicFactory")?,
            token_a: dependencies.require("wETH")?,
            token_b: token,
        })
    }

    /// Whether `token0` / `token1` is our pair, in any order
    fn is_pair(&self, token0: Address, token1: Address) -> bool {
        (token0 == self.token_a && token1 == self.token_b)
            || (token0 == self.token_b && token1 == self.token_a)
    }

    /// Pool address carried by `log`, if it is the creation of our pair
    fn pool_from_log(&self, log: &Log) -> Option<Address> {
        if log.address != self.factory {
            return None;
        }
        let event = PoolCreated::decode_log(log).ok()?.data;
        if !self.is_pair(event.token0, event.token1) {
            return None;
        }

        info!(
            "PoolCreated event received: token0: {}, token1: {}, pool: {}",
            event.token0, event.token1, event.pool
        );
        Some(event.pool)
    }
}

/// Create the pool and return its address.
///
/// The `PoolCreated` subscription is opened before the transaction is sent.
/// The address is taken from the receipt logs when they carry the event,
/// from the subscription otherwise, for at most `timeout`. The subscription
/// is owned by this call and released on every return path.
pub async fn create_pool<C: ChainClient>(
    client: &C,
    request: &PoolRequest,
    timeout: Duration,
) -> Result<Address, ScriptError> {
    let filter = Filter::new()
        .address(request.factory)
        .event_signature(PoolCreated::SIGNATURE_HASH);
    let subscription = client.subscribe_logs(&filter).await?;

    info!(
        "Creating pool of {} and {} through router {}",
        request.token_a, request.token_b, request.router
    );
    let confirmation = send_create_pool(
        client,
        request.router,
        request.factory,
        request.token_a,
        request.token_b,
    )
    .await?;

    if let Some(pool) = confirmation
        .logs
        .iter()
        .find_map(|log| request.pool_from_log(log))
    {
        return Ok(pool);
    }

    wait_for_pool_created(subscription, request, timeout).await
}

/// Wait for the creation event of our pair, consuming the subscription
pub async fn wait_for_pool_created<S>(
    mut events: S,
    request: &PoolRequest,
    timeout: Duration,
) -> Result<Address, ScriptError>
where
    S: Stream<Item = Log> + Unpin,
{
    let wait = async {
        while let Some(log) = events.next().await {
            if let Some(pool) = request.pool_from_log(&log) {
                return Ok(pool);
            }
        }
        Err(ScriptError::ContractInteraction(
            "PoolCreated subscription closed".to_string(),
        ))
    };

    tokio::time::timeout(timeout, wait).await.map_err(|_| {
        ScriptError::Timeout(format!(
            "PoolCreated event not received within {}s",
            timeout.as_secs()
        ))
    })?
}

/// Create the pool and record it among the deployed contracts, as `policy` allows
pub async fn bootstrap_pool<C: ChainClient>(
    client: &C,
    dependencies: &DependencyManifest,
    deployed: &mut DeployedContracts,
    policy: PoolPolicy,
    timeout: Duration,
) -> Result<Option<Address>, ScriptError> {
    let request = PoolRequest::hands_weth(dependencies, deployed)?;

    match create_pool(client, &request, timeout).await {
        Ok(pool) => {
            info!("{} was created at {}", POOL_CONTRACT_NAME, pool);
            deployed.push(DeployedContract {
                name: POOL_CONTRACT_NAME.to_string(),
                address: pool,
                abi: dependencies
                    .abis
                    .get("classicPool")
                    .cloned()
                    .unwrap_or_else(|| json::array![]),
            });
            Ok(Some(pool))
        }
        Err(ScriptError::Timeout(msg)) if policy == PoolPolicy::BestEffort => {
            warn!("{msg}, leaving the pool out of the manifest");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
