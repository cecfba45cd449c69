//! Declarative description of what a run deploys, and in which order

use std::collections::BTreeSet;

use alloy::primitives::{utils::parse_ether, Address, U256};
use clap::ValueEnum;

use crate::{
    constants::{HANDS_TOKEN_PREMINT, HANDS_TOKEN_SUPPLY_CAP},
    dependencies::DependencyManifest,
    errors::ScriptError,
};

/// Where the value of a constructor or hook argument comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Address of a contract deployed by an earlier step
    Deployed(String),
    /// Address of a dependency contract
    Dependency(String),
    /// Address of the deployer key
    Deployer,
    /// A fixed address
    Address(Address),
    /// A fixed uint256
    Uint(U256),
}

/// A call made once a step is confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDeployHook {
    /// Call `function` on the deployed contract `target`
    Call {
        /// Plan name of the called contract, deployed by this step or an earlier one
        target: String,
        /// Function to call, its overload is picked by the number of args
        function: String,
        /// Arguments, resolved when the hook runs
        args: Vec<Arg>,
    },
}

/// One contract deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Artifact name of the contract
    pub name: String,
    /// Constructor arguments, in order
    pub args: Vec<Arg>,
    /// Calls to run once the contract is deployed
    pub hooks: Vec<PostDeployHook>,
}

impl Step {
    /// A step without args nor hooks
    pub fn new(name: &str) -> Self {
        Step {
            name: name.to_string(),
            args: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Append a constructor arg
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Inform `target` of some address through its `function` setter
    pub fn call_after(mut self, target: &str, function: &str, args: Vec<Arg>) -> Self {
        self.hooks.push(PostDeployHook::Call {
            target: target.to_string(),
            function: function.to_string(),
            args,
        });
        self
    }
}

/// An ordered list of deployments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Name used in the logs
    pub name: String,
    /// Steps, in deployment order
    pub steps: Vec<Step>,
    /// Whether the SyncSwap dependencies are loaded and the manifest written
    pub with_dependencies: bool,
}

/// The built-in plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanKind {
    /// Token, affiliate, staking, bank and game contracts
    Full,
    /// Bankroll and game contracts only
    Minimal,
}

impl PlanKind {
    /// Build the plan
    pub fn build(self, wire_bank: bool) -> Result<Plan, ScriptError> {
        match self {
            PlanKind::Full => Plan::full(wire_bank),
            PlanKind::Minimal => Ok(Plan::minimal()),
        }
    }
}

impl Plan {
    /// HandsToken -> Affiliate -> Staking -> Bank -> Hands.
    ///
    /// With `wire_bank`, the affiliate and staking contracts are told the
    /// bank address once it is deployed.
    pub fn full(wire_bank: bool) -> Result<Plan, ScriptError> {
        let premint = parse_ether(HANDS_TOKEN_PREMINT)
            .map_err(|e| ScriptError::Config(format!("premint amount: {e}")))?;
        let supply_cap = parse_ether(HANDS_TOKEN_SUPPLY_CAP)
            .map_err(|e| ScriptError::Config(format!("supply cap: {e}")))?;

        let mut bank = Step::new("Bank")
            .arg(Arg::Deployed("Affiliate".into()))
            .arg(Arg::Deployed("Staking".into()));
        if wire_bank {
            bank = bank
                .call_after(
                    "Affiliate",
                    "setBankContract",
                    vec![Arg::Deployed("Bank".into())],
                )
                .call_after(
                    "Staking",
                    "setBankContract",
                    vec![Arg::Deployed("Bank".into())],
                );
        }

        Ok(Plan {
            name: "full".to_string(),
            steps: vec![
                Step::new("HandsToken")
                    .arg(Arg::Deployer)
                    .arg(Arg::Uint(premint))
                    .arg(Arg::Uint(supply_cap)),
                Step::new("Affiliate"),
                Step::new("Staking").arg(Arg::Deployed("HandsToken".into())),
                bank,
                Step::new("Hands").arg(Arg::Deployed("Bank".into())),
            ],
            with_dependencies: true,
        })
    }

    /// Bankroll -> Hands, without dependencies nor manifest
    pub fn minimal() -> Plan {
        Plan {
            name: "minimal".to_string(),
            steps: vec![
                Step::new("Bankroll"),
                Step::new("Hands").arg(Arg::Deployed("Bankroll".into())),
            ],
            with_dependencies: false,
        }
    }

    /// Check the plan is a strict topological order.
    ///
    /// Constructor args may only reference strictly earlier steps, hooks may
    /// also reference their own step, dependency references must exist in
    /// `dependencies`.
    pub fn validate(&self, dependencies: &DependencyManifest) -> Result<(), ScriptError> {
        let mut resolved: BTreeSet<&str> = BTreeSet::new();

        for step in &self.steps {
            for arg in &step.args {
                check_arg(arg, &resolved, dependencies, &step.name)?;
            }

            if !resolved.insert(step.name.as_str()) {
                return Err(ScriptError::UnresolvedReference(format!(
                    "{} is deployed twice",
                    step.name
                )));
            }

            for PostDeployHook::Call { target, args, .. } in &step.hooks {
                check_arg(
                    &Arg::Deployed(target.clone()),
                    &resolved,
                    dependencies,
                    &step.name,
                )?;
                for arg in args {
                    check_arg(arg, &resolved, dependencies, &step.name)?;
                }
            }
        }

        Ok(())
    }
}

/// Fail if `arg` can't be resolved with what is deployed at this point
fn check_arg(
    arg: &Arg,
    resolved: &BTreeSet<&str>,
    dependencies: &DependencyManifest,
    step: &str,
) -> Result<(), ScriptError> {
    match arg {
        Arg::Deployed(name) if !resolved.contains(name.as_str()) => {
            Err(ScriptError::UnresolvedReference(format!(
                "{step} references {name} before it is deployed"
            )))
        }
        Arg::Dependency(name) if dependencies.address(name).is_none() => {
            Err(ScriptError::UnresolvedReference(format!(
                "{step} references unknown dependency {name}"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    fn position(plan: &Plan, name: &str) -> usize {
        plan.steps.iter().position(|s| s.name == name).unwrap()
    }

    #[test]
    fn full_plan_is_topologically_ordered() {
        let plan = Plan::full(true).unwrap();
        plan.validate(&DependencyManifest::default()).unwrap();

        assert!(position(&plan, "HandsToken") < position(&plan, "Staking"));
        assert!(position(&plan, "Affiliate") < position(&plan, "Bank"));
        assert!(position(&plan, "Staking") < position(&plan, "Bank"));
        assert!(position(&plan, "Bank") < position(&plan, "Hands"));
    }

    #[test]
    fn token_premint_is_one_million_tokens() {
        let plan = Plan::full(false).unwrap();
        let expected = U256::from(1_000_000u64) * U256::from(10u64).pow(U256::from(18));
        assert_eq!(
            plan.steps[0].args,
            vec![Arg::Deployer, Arg::Uint(expected), Arg::Uint(expected)]
        );
    }

    #[test]
    fn wiring_is_opt_in() {
        let bank = |plan: Plan| plan.steps.into_iter().find(|s| s.name == "Bank").unwrap();
        assert!(bank(Plan::full(false).unwrap()).hooks.is_empty());
        assert_eq!(bank(Plan::full(true).unwrap()).hooks.len(), 2);
    }

    #[test]
    fn forward_reference_is_rejected() {
        let plan = Plan {
            name: "broken".into(),
            steps: vec![
                Step::new("Staking").arg(Arg::Deployed("HandsToken".into())),
                Step::new("HandsToken"),
            ],
            with_dependencies: false,
        };
        let err = plan.validate(&DependencyManifest::default()).unwrap_err();
        assert!(matches!(err, ScriptError::UnresolvedReference(_)));
    }

    #[test]
    fn self_reference_in_constructor_is_rejected() {
        let plan = Plan {
            name: "broken".into(),
            steps: vec![Step::new("Bank").arg(Arg::Deployed("Bank".into()))],
            with_dependencies: false,
        };
        assert!(plan.validate(&DependencyManifest::default()).is_err());
    }

    #[test]
    fn duplicate_step_is_rejected() {
        let plan = Plan {
            name: "broken".into(),
            steps: vec![Step::new("Hands"), Step::new("Hands")],
            with_dependencies: false,
        };
        assert!(plan.validate(&DependencyManifest::default()).is_err());
    }

    #[test]
    fn hook_on_a_later_contract_is_rejected() {
        let plan = Plan {
            name: "broken".into(),
            steps: vec![
                Step::new("Bank").call_after("Staking", "setBankContract", vec![]),
                Step::new("Staking"),
            ],
            with_dependencies: false,
        };
        assert!(plan.validate(&DependencyManifest::default()).is_err());
    }

    #[test]
    fn dependency_references_need_an_address() {
        let plan = Plan {
            name: "router".into(),
            steps: vec![Step::new("Zap").arg(Arg::Dependency("router".into()))],
            with_dependencies: true,
        };
        assert!(plan.validate(&DependencyManifest::default()).is_err());

        let mut dependencies = DependencyManifest::default();
        dependencies.addresses.insert(
            "router".into(),
            address!("0x000000000000000000000000000000000000bbbb"),
        );
        plan.validate(&dependencies).unwrap();
    }
}
