//! Runs a deployment plan against a chain

use std::collections::BTreeMap;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{utils::format_ether, Address},
};
use tracing::{info, warn};

use crate::{
    artifacts::{ArtifactStore, ContractArtifact},
    dependencies::DependencyManifest,
    deploy::{
        deployed::{DeployedContract, DeployedContracts},
        plan::{Arg, Plan, PostDeployHook},
    },
    errors::ScriptError,
    tx::{
        chain::{ChainClient, TxPayload},
        reader::read_owner,
        sender::{send_contract_call, send_deployment},
    },
};

/// A validated plan with all of its artifacts loaded
#[derive(Debug, Clone)]
pub struct Deployment {
    /// The plan to run
    plan: Plan,
    /// Artifact of every step, by contract name
    artifacts: BTreeMap<String, ContractArtifact>,
}

impl Deployment {
    /// Validate `plan` and load its artifacts, without touching the network
    pub fn prepare(
        plan: Plan,
        dependencies: &DependencyManifest,
        store: &ArtifactStore,
    ) -> Result<Self, ScriptError> {
        plan.validate(dependencies)?;

        let mut artifacts = BTreeMap::new();
        for step in &plan.steps {
            let artifact = store.load(&step.name)?;
            if artifact.bytecode.is_none() {
                return Err(ScriptError::Parse(format!(
                    "artifact of {} has no bytecode",
                    step.name
                )));
            }
            artifacts.insert(step.name.clone(), artifact);
        }

        Ok(Deployment { plan, artifacts })
    }

    /// The plan being run
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Deploy every step in order, each one confirmed before the next starts.
    ///
    /// The first failure aborts the remaining steps.
    pub async fn run<C: ChainClient>(
        &self,
        client: &C,
        dependencies: &DependencyManifest,
    ) -> Result<DeployedContracts, ScriptError> {
        info!("Running the {} deployment plan", self.plan.name);
        let mut deployed = DeployedContracts::default();

        for step in &self.plan.steps {
            let artifact = self.artifact(&step.name)?;

            let args = step
                .args
                .iter()
                .map(|arg| resolve_arg(arg, client.sender(), dependencies, &deployed))
                .collect::<Result<Vec<_>, _>>()?;
            let payload = artifact.deployment(&args)?;

            log_deployment_fee(client, &step.name, &payload).await;

            let address = send_deployment(client, &step.name, payload).await?;
            info!("{} was deployed to {}", step.name, address);

            deployed.push(DeployedContract {
                name: step.name.clone(),
                address,
                abi: artifact.abi_json.clone(),
            });

            for hook in &step.hooks {
                self.run_hook(client, hook, dependencies, &deployed).await?;
            }
        }

        Ok(deployed)
    }

    /// Run a post deploy call and wait for it to be mined
    async fn run_hook<C: ChainClient>(
        &self,
        client: &C,
        hook: &PostDeployHook,
        dependencies: &DependencyManifest,
        deployed: &DeployedContracts,
    ) -> Result<(), ScriptError> {
        let PostDeployHook::Call {
            target,
            function,
            args,
        } = hook;

        let target_address = deployed.address(target).ok_or_else(|| {
            ScriptError::UnresolvedReference(format!("{target} is not deployed"))
        })?;
        let artifact = self.artifact(target)?;

        // A setter guarded by `onlyOwner` would revert, fail with a clear message instead
        if artifact.abi.function("owner").is_some() {
            let owner = read_owner(client, target_address).await?;
            info!("Owner of the {} contract: {}", target, owner);
            if owner != client.sender() {
                return Err(ScriptError::ContractInteraction(format!(
                    "{target} is owned by {owner}, not by the deployer {}",
                    client.sender()
                )));
            }
        }

        let args = args
            .iter()
            .map(|arg| resolve_arg(arg, client.sender(), dependencies, deployed))
            .collect::<Result<Vec<_>, _>>()?;
        let calldata = artifact.encode_call(function, &args)?;

        let what = format!("{target}.{function}");
        send_contract_call(client, target_address, calldata, &what).await?;

        Ok(())
    }

    /// Artifact loaded for `name`
    fn artifact(&self, name: &str) -> Result<&ContractArtifact, ScriptError> {
        self.artifacts.get(name).ok_or_else(|| {
            ScriptError::UnresolvedReference(format!("no artifact loaded for {name}"))
        })
    }
}

/// Turn a plan argument into an abi value
pub fn resolve_arg(
    arg: &Arg,
    deployer: Address,
    dependencies: &DependencyManifest,
    deployed: &DeployedContracts,
) -> Result<DynSolValue, ScriptError> {
    let value = match arg {
        Arg::Deployed(name) => DynSolValue::Address(deployed.address(name).ok_or_else(|| {
            ScriptError::UnresolvedReference(format!("{name} is not deployed yet"))
        })?),
        Arg::Dependency(name) => DynSolValue::Address(dependencies.require(name)?),
        Arg::Deployer => DynSolValue::Address(deployer),
        Arg::Address(address) => DynSolValue::Address(*address),
        Arg::Uint(value) => DynSolValue::Uint(*value, 256),
    };

    Ok(value)
}

/// Log the estimated cost of a deployment, a failed estimate is only logged
async fn log_deployment_fee<C: ChainClient>(client: &C, name: &str, payload: &TxPayload) {
    match client.estimate_fee(payload).await {
        Ok(fee) => info!(
            "The {} deployment is estimated to cost {} ETH",
            name,
            format_ether(fee)
        ),
        Err(e) => warn!("Could not estimate the {} deployment fee: {}", name, e),
    }
}
