//! Everything that crosses the RPC boundary

pub mod abi;
pub mod chain;
pub mod client;
pub mod reader;
pub mod sender;
pub mod zksync;
