//! Scripts for deploying the Hands contracts & bootstrapping their liquidity.

#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod dependencies;
pub mod errors;
pub mod liquidity;
pub mod output_writer;

/// Our deploy utils
pub mod deploy;

pub mod tx;
