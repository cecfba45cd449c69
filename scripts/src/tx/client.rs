//! JSON-RPC implementation of the chain client

use std::time::Duration;

use alloy::{
    network::{AnyTransactionReceipt, EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, Log, TxHash, U256, U64},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use futures::{stream::LocalBoxStream, StreamExt};
use reqwest::Url;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::{
    config::DeployConfig,
    errors::ScriptError,
    tx::{
        chain::{ChainClient, Confirmation, TxPayload},
        zksync::{deployed_address, Eip712Transaction},
    },
};

/// Delay between two receipt lookups of an era deployment
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long an era deployment may stay pending
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// An alloy provider that signs with the deployer key & interfaces with
/// the RPC endpoint over HTTP
pub type RpcProvider = DynProvider;

/// [`ChainClient`] backed by a JSON-RPC endpoint
#[derive(Clone)]
pub struct RpcClient {
    /// The signing provider
    provider: RpcProvider,
    /// The deployer key, signs the era deployments
    signer: PrivateKeySigner,
    /// Address of the deployer key
    sender: Address,
    /// Chain id of the endpoint
    chain_id: u64,
    /// Deploy through the era `ContractDeployer` rather than with a plain CREATE
    zksync: bool,
}

/// Sets up the signing client from the run configuration
pub async fn create_rpc_client(config: &DeployConfig) -> Result<RpcClient, ScriptError> {
    // Create our signer
    let signer = config
        .private_key
        .parse::<PrivateKeySigner>()
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();
    let wallet = EthereumWallet::from(signer.clone());

    let url = config
        .rpc_url
        .parse::<Url>()
        .map_err(|e| ScriptError::Config(format!("rpc url {}: {e}", config.rpc_url)))?;

    // Create our provider with the rpc client + signer
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(url)
        .erased();

    // Fetch chain id
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    info!("Build client on chain ID: {}", chain_id);
    info!("Deployer address: {}", sender);

    Ok(RpcClient {
        provider,
        signer,
        sender,
        chain_id,
        zksync: config.network.is_zksync(),
    })
}

impl RpcClient {
    /// The era deployment transaction of `payload`, `None` when a plain transaction does
    fn era_deployment(
        &self,
        payload: &TxPayload,
    ) -> Result<Option<Eip712Transaction>, ScriptError> {
        if !self.zksync || payload.to.is_some() {
            return Ok(None);
        }
        Eip712Transaction::deployment(self.chain_id, self.sender, payload).map(Some)
    }

    /// Gas needed by an era transaction, factory deps included
    async fn estimate_era_gas(&self, tx: &Eip712Transaction) -> Result<u64, String> {
        let gas: U64 = self
            .provider
            .raw_request("eth_estimateGas".into(), (tx.estimate_request(),))
            .await
            .map_err(|e| e.to_string())?;

        Ok(gas.to::<u64>())
    }

    /// Sign & send an era deployment, then wait for its receipt
    async fn send_era_deployment(
        &self,
        mut tx: Eip712Transaction,
        what: &str,
    ) -> Result<Confirmation, ScriptError> {
        let to_error = ScriptError::ContractDeployment;

        tx.nonce = self
            .provider
            .get_transaction_count(self.sender)
            .await
            .map_err(|e| to_error(e.to_string()))?;
        tx.max_fee_per_gas = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| to_error(e.to_string()))?;
        tx.gas_limit = self.estimate_era_gas(&tx).await.map_err(to_error)?;
        debug!("{} gas limit {}, nonce {}", what, tx.gas_limit, tx.nonce);

        let raw = tx.sign(&self.signer)?;
        let pending_tx = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| to_error(e.to_string()))?;
        let tx_hash = *pending_tx.tx_hash();
        info!("Pending {} transaction... {}", what, tx_hash);

        // Era receipts carry the 0x71 type, which the ethereum receipt type rejects
        let receipt = self.era_receipt(tx_hash).await?;
        let receipt = &receipt.inner;
        info!(
            "{} tx done on block: {}",
            what,
            receipt.block_number.unwrap_or_default()
        );

        let logs: Vec<Log> = receipt.logs().iter().map(|log| log.inner.clone()).collect();
        Ok(Confirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: ReceiptResponse::status(receipt),
            contract_address: receipt
                .contract_address
                .or_else(|| deployed_address(&logs)),
            logs,
        })
    }

    /// Poll the receipt of `tx_hash` until it is mined
    async fn era_receipt(&self, tx_hash: TxHash) -> Result<AnyTransactionReceipt, ScriptError> {
        let deadline = Instant::now() + RECEIPT_TIMEOUT;
        loop {
            let receipt: Option<AnyTransactionReceipt> = self
                .provider
                .raw_request("eth_getTransactionReceipt".into(), (tx_hash,))
                .await
                .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                return Err(ScriptError::Timeout(format!(
                    "tx {tx_hash} still pending after {}s",
                    RECEIPT_TIMEOUT.as_secs()
                )));
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    /// Turn a payload into a request sent from our deployer
    fn request(&self, payload: &TxPayload) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_value(payload.value);

        match payload.to {
            Some(to) => request.with_to(to).with_input(payload.input.clone()),
            None => request.with_deploy_code(payload.input.clone()),
        }
    }
}

impl ChainClient for RpcClient {
    type LogStream = LocalBoxStream<'static, Log>;

    fn sender(&self) -> Address {
        self.sender
    }

    async fn estimate_fee(&self, payload: &TxPayload) -> Result<U256, ScriptError> {
        let gas = match self.era_deployment(payload)? {
            Some(tx) => self
                .estimate_era_gas(&tx)
                .await
                .map_err(ScriptError::FeeEstimation)?,
            None => self
                .provider
                .estimate_gas(self.request(payload))
                .await
                .map_err(|e| ScriptError::FeeEstimation(e.to_string()))?,
        };
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| ScriptError::FeeEstimation(e.to_string()))?;

        Ok(U256::from(gas) * U256::from(gas_price))
    }

    async fn send_and_confirm(
        &self,
        payload: TxPayload,
        what: &str,
    ) -> Result<Confirmation, ScriptError> {
        if let Some(tx) = self.era_deployment(&payload)? {
            return self.send_era_deployment(tx, what).await;
        }

        let deployment = payload.to.is_none();
        let to_error = |e: String| {
            if deployment {
                ScriptError::ContractDeployment(e)
            } else {
                ScriptError::ContractInteraction(e)
            }
        };

        // Send it
        let pending_tx = self
            .provider
            .send_transaction(self.request(&payload))
            .await
            .map_err(|e| to_error(e.to_string()))?;
        info!("Pending {} transaction... {}", what, pending_tx.tx_hash());

        // Wait for the transaction to be included.
        let receipt = pending_tx
            .get_receipt()
            .await
            .map_err(|e| to_error(e.to_string()))?;
        info!(
            "{} tx done on block: {}",
            what,
            receipt.block_number.unwrap_or_default()
        );

        Ok(Confirmation {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            contract_address: receipt.contract_address,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        })
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ScriptError> {
        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(input);

        self.provider
            .call(request)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn balance(&self, owner: Address) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn subscribe_logs(&self, filter: &Filter) -> Result<Self::LogStream, ScriptError> {
        let poller = self
            .provider
            .watch_logs(filter)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(poller
            .into_stream()
            .flat_map(futures::stream::iter)
            .map(|log| log.inner)
            .boxed_local())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::TxKind;

    use super::*;
    use crate::tx::zksync::CONTRACT_DEPLOYER;

    /// A client that never reaches its endpoint
    fn offline_client(zksync: bool) -> RpcClient {
        let signer = PrivateKeySigner::random();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http("http://127.0.0.1:1".parse().unwrap())
            .erased();

        RpcClient {
            provider,
            sender: signer.address(),
            signer,
            chain_id: 270,
            zksync,
        }
    }

    fn creation() -> TxPayload {
        TxPayload::create(vec![0u8; 32].into(), Bytes::new())
    }

    #[test]
    fn era_creations_go_through_the_contract_deployer() {
        let client = offline_client(true);

        let tx = client.era_deployment(&creation()).unwrap().unwrap();
        assert_eq!(tx.to, CONTRACT_DEPLOYER);
        assert_eq!(tx.from, client.sender);
        assert_eq!(tx.chain_id, 270);
        assert_eq!(tx.factory_deps, vec![Bytes::from(vec![0u8; 32])]);

        // Calls stay plain transactions
        let call = TxPayload::call(CONTRACT_DEPLOYER, Bytes::new());
        assert_eq!(client.era_deployment(&call).unwrap(), None);
    }

    #[test]
    fn evm_creations_are_plain_creates() {
        let client = offline_client(false);
        let payload = creation();

        assert_eq!(client.era_deployment(&payload).unwrap(), None);

        let request = client.request(&payload);
        assert_eq!(request.to, Some(TxKind::Create));
        assert_eq!(request.input.input(), Some(&payload.input));
    }

    #[test]
    fn evm_bytecode_cannot_be_deployed_on_era() {
        let client = offline_client(true);
        let payload = TxPayload::create(vec![0x60, 0x80, 0x60, 0x40, 0x52].into(), Bytes::new());

        assert!(matches!(
            client.era_deployment(&payload),
            Err(ScriptError::Parse(_))
        ));
    }
}
