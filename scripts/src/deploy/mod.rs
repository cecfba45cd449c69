//! Sequential deployment of a plan of contracts

pub mod deployed;
pub mod orchestrator;
pub mod plan;

pub use deployed::{DeployedContract, DeployedContracts};
pub use orchestrator::Deployment;
pub use plan::{Arg, Plan, PlanKind, PostDeployHook, Step};
