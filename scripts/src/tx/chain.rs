//! The network boundary of the deploy pipeline.
//!
//! The pipeline never talks to a provider directly, it goes through
//! [`ChainClient`] so that the whole flow can be driven by an in-memory
//! chain in tests.

use alloy::{
    primitives::{Address, Bytes, Log, TxHash, U256},
    rpc::types::Filter,
};
use futures::Stream;

use crate::errors::ScriptError;

/// A transaction to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPayload {
    /// Target of the call, `None` for a contract creation
    pub to: Option<Address>,
    /// Calldata, or creation code followed by the constructor args
    pub input: Bytes,
    /// Wei sent along
    pub value: U256,
    /// Length of the creation code at the start of `input`, zero for calls
    pub code_len: usize,
}

impl TxPayload {
    /// A contract creation of `bytecode` with its abi-encoded constructor args
    pub fn create(bytecode: Bytes, constructor_args: Bytes) -> Self {
        let code_len = bytecode.len();
        let mut input = bytecode.to_vec();
        input.extend_from_slice(&constructor_args);

        TxPayload {
            to: None,
            input: input.into(),
            value: U256::ZERO,
            code_len,
        }
    }

    /// A call to `to` without value
    pub fn call(to: Address, input: Bytes) -> Self {
        TxPayload {
            to: Some(to),
            input,
            value: U256::ZERO,
            code_len: 0,
        }
    }

    /// A plain value transfer
    pub fn transfer(to: Address, value: U256) -> Self {
        TxPayload {
            to: Some(to),
            input: Bytes::new(),
            value,
            code_len: 0,
        }
    }

    /// The creation code and the constructor args, `None` for calls
    pub fn creation_parts(&self) -> Option<(Bytes, Bytes)> {
        if self.to.is_some() {
            return None;
        }
        Some((
            self.input.slice(..self.code_len),
            self.input.slice(self.code_len..),
        ))
    }
}

/// What we keep from a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Hash of the transaction
    pub tx_hash: TxHash,
    /// Block in which it was included
    pub block_number: Option<u64>,
    /// Whether the execution succeeded
    pub success: bool,
    /// The created contract, for deployments
    pub contract_address: Option<Address>,
    /// Logs emitted by the transaction
    pub logs: Vec<Log>,
}

/// The operations the deploy pipeline needs from the chain
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Stream of logs matching a subscription, dropping it unsubscribes
    type LogStream: Stream<Item = Log> + Unpin;

    /// Address signing every transaction
    fn sender(&self) -> Address;

    /// Estimated fee of `payload`, in wei
    async fn estimate_fee(&self, payload: &TxPayload) -> Result<U256, ScriptError>;

    /// Submit `payload` and block until it is mined, `what` is only used for logging
    async fn send_and_confirm(
        &self,
        payload: TxPayload,
        what: &str,
    ) -> Result<Confirmation, ScriptError>;

    /// Read-only call, returns the raw output
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError>;

    /// Native balance of `owner`
    async fn balance(&self, owner: Address) -> Result<U256, ScriptError>;

    /// Subscribe to the logs matching `filter`
    async fn subscribe_logs(&self, filter: &Filter) -> Result<Self::LogStream, ScriptError>;
}
