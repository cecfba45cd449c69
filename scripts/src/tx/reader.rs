//! Read-only calls

use alloy::{
    primitives::{Address, U256},
    sol_types::{SolCall, SolValue},
};

use crate::{
    errors::ScriptError,
    tx::{
        abi::{IOwnable, IERC20},
        chain::ChainClient,
    },
};

/// Get the current owner of an ownable contract
pub async fn read_owner<C: ChainClient>(
    client: &C,
    contract_address: Address,
) -> Result<Address, ScriptError> {
    // Read the smart contract
    let output = client
        .call(contract_address, IOwnable::ownerCall {}.abi_encode().into())
        .await?;

    Address::abi_decode(&output)
        .map_err(|e| ScriptError::ContractInteraction(format!("owner() output: {e}")))
}

/// Get the token balance of `holder`
pub async fn read_token_balance<C: ChainClient>(
    client: &C,
    token_address: Address,
    holder: Address,
) -> Result<U256, ScriptError> {
    // Read the smart contract
    let output = client
        .call(
            token_address,
            IERC20::balanceOfCall { account: holder }.abi_encode().into(),
        )
        .await?;

    U256::abi_decode(&output)
        .map_err(|e| ScriptError::ContractInteraction(format!("balanceOf() output: {e}")))
}
