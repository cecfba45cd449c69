//! Helpers that send a transaction & check its receipt

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, SolValue},
};
use tracing::info;

use crate::{
    errors::ScriptError,
    tx::{
        abi::{ISyncSwapRouter, IERC20},
        chain::{ChainClient, Confirmation, TxPayload},
    },
};

/// Deploy a contract from its creation payload, returning its address once mined
pub async fn send_deployment<C: ChainClient>(
    client: &C,
    name: &str,
    payload: TxPayload,
) -> Result<Address, ScriptError> {
    let confirmation = client
        .send_and_confirm(payload, &format!("{name} deployment"))
        .await?;

    if !confirmation.success {
        return Err(ScriptError::ContractDeployment(format!(
            "{name} constructor reverted in tx {}",
            confirmation.tx_hash
        )));
    }

    confirmation.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "no contract address in the receipt of tx {}",
            confirmation.tx_hash
        ))
    })
}

/// Send a state changing call and wait for it to be mined
pub async fn send_contract_call<C: ChainClient>(
    client: &C,
    contract: Address,
    calldata: Bytes,
    what: &str,
) -> Result<Confirmation, ScriptError> {
    let confirmation = client
        .send_and_confirm(TxPayload::call(contract, calldata), what)
        .await?;

    if !confirmation.success {
        return Err(ScriptError::ContractInteraction(format!(
            "{what} reverted in tx {}",
            confirmation.tx_hash
        )));
    }

    Ok(confirmation)
}

/// Ask the router to create the classic pool of `token_a` and `token_b`
pub async fn send_create_pool<C: ChainClient>(
    client: &C,
    router: Address,
    factory: Address,
    token_a: Address,
    token_b: Address,
) -> Result<Confirmation, ScriptError> {
    // The factory decodes the pair as `(address, address)`
    let data = (token_a, token_b).abi_encode_params();
    let calldata = ISyncSwapRouter::createPoolCall {
        _factory: factory,
        data: data.into(),
    }
    .abi_encode();

    send_contract_call(client, router, calldata.into(), "create pool").await
}

/// Send `amount` wei to `receiver`
pub async fn send_eth<C: ChainClient>(
    client: &C,
    receiver: Address,
    amount: U256,
) -> Result<Confirmation, ScriptError> {
    let confirmation = client
        .send_and_confirm(TxPayload::transfer(receiver, amount), "eth transfer")
        .await?;

    if !confirmation.success {
        return Err(ScriptError::ContractInteraction(format!(
            "eth transfer to {receiver} failed in tx {}",
            confirmation.tx_hash
        )));
    }
    info!("Sent {} wei to {}", amount, receiver);

    Ok(confirmation)
}

/// Transfer `amount` of `token` to `receiver`
pub async fn send_token_transfer<C: ChainClient>(
    client: &C,
    token: Address,
    receiver: Address,
    amount: U256,
) -> Result<Confirmation, ScriptError> {
    let calldata = IERC20::transferCall {
        to: receiver,
        amount,
    }
    .abi_encode();

    let confirmation =
        send_contract_call(client, token, calldata.into(), "token transfer").await?;
    info!("Sent {} tokens to {}", amount, receiver);

    Ok(confirmation)
}
